use scoutdesk_fetch::WebSearch;
use scoutdesk_llm::{extract_json_output, ChatRequest, LlmClient};
use tracing::warn;

use crate::schema::{IntentAnalysis, IntentAnalysisRaw, NotebookPurpose, ResearchDepth, TimeSensitivity};

const INTENT_SYSTEM_PROMPT: &str = "You are a research-intake classifier. Given a notebook's \
stated intent and focus areas, return a single JSON object with keys: purpose (one of \
company_research, topic_research, product_research, skill_development, person_tracking, \
industry_monitoring, project_knowledge, personal_interests), entities (array of strings), \
industry (string or null), competitors (array of strings), keywords (array of strings), \
geographic_focus (string or null), time_sensitivity (breaking|daily|weekly|normal|archival), \
research_depth (surface|standard|deep), primary_topic (string), ticker (string or null), \
is_private (boolean or null). Respond with JSON only.";

/// Stage 1 of spec.md §4.2: classify notebook purpose and extract
/// entities/keywords/time-sensitivity/depth. When `subject` is supplied it
/// overrides the model's own `primary_topic` guess.
pub async fn analyze_intent(
    llm: &dyn LlmClient,
    web_search: Option<&(dyn WebSearch + Send + Sync)>,
    intent: &str,
    focus_areas: &[String],
    subject: Option<&str>,
    model: &str,
) -> IntentAnalysis {
    let prompt = format!(
        "Intent: {intent}\nFocus areas: {}\nSubject hint: {}",
        focus_areas.join(", "),
        subject.unwrap_or("(none provided)")
    );

    let request = ChatRequest::new(prompt, model).with_system(INTENT_SYSTEM_PROMPT);
    let raw = match llm.chat_completion(request).await {
        Ok(response) if !response.looks_like_error() => {
            extract_json_output::<IntentAnalysisRaw>(&response.text).unwrap_or_default()
        }
        Ok(response) => {
            warn!(response = %response.text, "intent analysis model returned an error-shaped response");
            IntentAnalysisRaw::default()
        }
        Err(error) => {
            warn!(%error, "intent analysis chat_completion failed");
            IntentAnalysisRaw::default()
        }
    };

    let purpose = NotebookPurpose::from_str_loose(&raw.purpose);
    let primary_topic = subject
        .map(|s| s.to_string())
        .or(raw.primary_topic)
        .unwrap_or_else(|| intent.to_string());

    let mut analysis = IntentAnalysis {
        purpose,
        primary_topic,
        entities: raw.entities,
        industry: raw.industry,
        competitors: raw.competitors,
        keywords: raw.keywords,
        geographic_focus: raw.geographic_focus,
        time_sensitivity: TimeSensitivity::from_str_loose(&raw.time_sensitivity),
        research_depth: ResearchDepth::from_str_loose(&raw.research_depth),
        ticker: raw.ticker,
        is_private: raw.is_private.unwrap_or(false),
        needs_clarification: false,
    };

    if analysis.purpose == NotebookPurpose::CompanyResearch && analysis.ticker.is_none() {
        enrich_company_entity(&mut analysis, web_search).await;
    }

    analysis
}

/// For `company_research` notebooks missing a ticker: a web-search lookup
/// enriches ticker/private-flag/industry. If the entity can't be
/// identified, `needs_clarification` is set so the caller prompts the user
/// instead of guessing (spec.md §4.2).
async fn enrich_company_entity(analysis: &mut IntentAnalysis, web_search: Option<&(dyn WebSearch + Send + Sync)>) {
    let Some(search) = web_search else {
        analysis.needs_clarification = true;
        return;
    };

    let query = format!("{} stock ticker symbol", analysis.primary_topic);
    let hits = match search.search(&query, 5).await {
        Ok(hits) => hits,
        Err(error) => {
            warn!(%error, "company ticker enrichment search failed");
            analysis.needs_clarification = true;
            return;
        }
    };

    let ticker = hits.iter().find_map(|hit| extract_ticker_guess(&hit.snippet).or_else(|| extract_ticker_guess(&hit.title)));

    match ticker {
        Some(t) => analysis.ticker = Some(t),
        None => {
            analysis.is_private = hits.iter().any(|h| h.snippet.to_lowercase().contains("privately held"));
            if !analysis.is_private {
                analysis.needs_clarification = true;
            }
        }
    }
}

fn extract_ticker_guess(text: &str) -> Option<String> {
    let upper_words: Vec<&str> = text
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| w.len() >= 1 && w.len() <= 5 && w.chars().all(|c| c.is_ascii_uppercase()))
        .collect();
    upper_words.first().map(|w| w.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_plausible_ticker_token() {
        assert_eq!(extract_ticker_guess("NASDAQ: COST is trading higher"), Some("COST".to_string()));
        assert_eq!(extract_ticker_guess("shares of the company rose today"), None);
    }
}
