use std::collections::HashMap;
use std::time::Duration;

use scoutdesk_fetch::{SearchHit, WebSearch};
use scoutdesk_llm::{extract_json_output, ChatRequest, LlmClient};
use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::schema::{DiscoveredSource, IntentAnalysis, NotebookPurpose};

const SEARCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Per-purpose web-search query templates, run in parallel. Every purpose
/// additionally gets news/video-keyword/community overlays, and
/// topic/skill/industry purposes also get podcast + newsletter overlays
/// (spec.md §4.2).
fn queries_for_purpose(analysis: &IntentAnalysis) -> Vec<String> {
    let topic = &analysis.primary_topic;
    let mut queries = match analysis.purpose {
        NotebookPurpose::CompanyResearch => vec![
            format!("{topic} investor relations"),
            format!("{topic} official blog"),
            format!("{topic} competitors"),
        ],
        NotebookPurpose::ProductResearch => vec![format!("{topic} reviews"), format!("{topic} comparison")],
        NotebookPurpose::PersonTracking => vec![format!("{topic} interviews"), format!("{topic} recent statements")],
        NotebookPurpose::IndustryMonitoring => vec![format!("{topic} industry report"), format!("{topic} market trends")],
        NotebookPurpose::SkillDevelopment => vec![format!("{topic} tutorial"), format!("{topic} best practices")],
        NotebookPurpose::ProjectKnowledge => vec![format!("{topic} documentation")],
        NotebookPurpose::TopicResearch | NotebookPurpose::PersonalInterests => {
            vec![format!("{topic} overview"), format!("{topic} latest developments")]
        }
    };

    queries.push(format!("{topic} news"));
    queries.push(format!("{topic} community forum"));

    if matches!(
        analysis.purpose,
        NotebookPurpose::TopicResearch | NotebookPurpose::SkillDevelopment | NotebookPurpose::IndustryMonitoring
    ) {
        queries.push(format!("{topic} podcast"));
        queries.push(format!("{topic} newsletter"));
    }

    queries
}

#[derive(Debug, Default, Deserialize)]
struct CategorizedHit {
    #[serde(default)]
    kind: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    confidence: f32,
    #[serde(default)]
    rationale: String,
}

#[derive(Debug, Default, Deserialize)]
struct CategorizationResponse {
    #[serde(default)]
    sources: Vec<CategorizedHit>,
}

const CATEGORIZE_SYSTEM_PROMPT: &str = "You categorize web-search hits into source entries for a \
research collection system. For each hit decide: kind (one of feed, web_page, video_keyword, \
news_keyword, paper_category, paper_query), a short name, and a confidence in [0,1] reflecting \
how likely this source is a high-value, on-topic, trustworthy origin. Respond as JSON: \
{\"sources\": [{\"kind\": ..., \"name\": ..., \"confidence\": ..., \"rationale\": ...}]}.";

async fn categorize_hits(llm: &dyn LlmClient, model: &str, topic: &str, hits: &[SearchHit]) -> Vec<DiscoveredSource> {
    if hits.is_empty() {
        return Vec::new();
    }

    let snippets: String = hits
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{i}. {} — {}\n   {}", h.title, h.url, h.snippet))
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = format!("Topic: {topic}\nCandidate hits:\n{snippets}");
    let request = ChatRequest::new(prompt, model).with_system(CATEGORIZE_SYSTEM_PROMPT);

    let response = match llm.chat_completion(request).await {
        Ok(r) if !r.looks_like_error() => r,
        _ => return fallback_from_hits(hits),
    };

    let parsed = extract_json_output::<CategorizationResponse>(&response.text);
    match parsed {
        Some(categorization) if categorization.sources.len() == hits.len() => categorization
            .sources
            .into_iter()
            .zip(hits.iter())
            .map(|(cat, hit)| {
                DiscoveredSource::new(
                    if cat.kind.is_empty() { "web_page".to_string() } else { cat.kind },
                    hit.url.clone(),
                    if cat.name.is_empty() { hit.title.clone() } else { cat.name },
                    cat.confidence,
                )
                .with_rationale(cat.rationale)
            })
            .collect(),
        _ => fallback_from_hits(hits),
    }
}

fn fallback_from_hits(hits: &[SearchHit]) -> Vec<DiscoveredSource> {
    hits.iter()
        .map(|h| DiscoveredSource::new("web_page", h.url.clone(), h.title.clone(), 0.5).with_rationale("uncategorized search hit"))
        .collect()
}

/// Extracts recurring domains from a notebook's existing source URLs and
/// emits "seed" sources — proven-valuable origins worth treating as
/// first-class sources rather than one-off hits (spec.md §4.2).
pub fn seed_sources_from_existing(existing_urls: &[String]) -> Vec<DiscoveredSource> {
    let mut domain_counts: HashMap<String, u32> = HashMap::new();
    for raw in existing_urls {
        if let Ok(url) = Url::parse(raw) {
            if let Some(host) = url.host_str() {
                *domain_counts.entry(host.to_string()).or_insert(0) += 1;
            }
        }
    }

    domain_counts
        .into_iter()
        .filter(|(_, count)| *count >= 2)
        .map(|(domain, count)| {
            let confidence = (0.6 + 0.1 * (count as f32 - 2.0)).min(0.95);
            DiscoveredSource::new("web_page", format!("https://{domain}"), domain.clone(), confidence)
                .with_rationale(format!("recurring domain across {count} existing sources"))
        })
        .collect()
}

/// Deterministic fallback set used when web search itself is unavailable
/// (spec.md §4.2): news-keyword + video-keyword feeds, plus a paper
/// category for research-flavored purposes.
pub fn deterministic_fallback(analysis: &IntentAnalysis) -> Vec<DiscoveredSource> {
    let topic = &analysis.primary_topic;
    let mut sources = vec![
        DiscoveredSource::new("news_keyword", topic.clone(), format!("{topic} news"), 0.6),
        DiscoveredSource::new("video_keyword", topic.clone(), format!("{topic} videos"), 0.55),
    ];

    if matches!(
        analysis.purpose,
        NotebookPurpose::TopicResearch | NotebookPurpose::SkillDevelopment | NotebookPurpose::IndustryMonitoring
    ) {
        sources.push(DiscoveredSource::new("paper_category", "cs.AI", format!("{topic} research papers"), 0.4));
    }

    sources
}

/// Stage 2 of spec.md §4.2: run purpose-dispatched search queries in
/// parallel (each with its own timeout), categorize the results via
/// chat-completion, and fold in seed sources from existing URLs.
pub async fn discover_sources(
    llm: &dyn LlmClient,
    web_search: Option<&(dyn WebSearch + Send + Sync)>,
    model: &str,
    analysis: &IntentAnalysis,
    existing_urls: &[String],
) -> (Vec<DiscoveredSource>, Vec<String>) {
    let mut errors = Vec::new();

    let Some(search) = web_search else {
        return (deterministic_fallback(analysis), vec!["web search unavailable; used deterministic fallback".to_string()]);
    };

    let queries = queries_for_purpose(analysis);
    let mut hit_batches = Vec::new();
    for query in &queries {
        match tokio::time::timeout(SEARCH_TIMEOUT, search.search(query, 5)).await {
            Ok(Ok(hits)) => hit_batches.push(hits),
            Ok(Err(error)) => errors.push(format!("search '{query}' failed: {error}")),
            Err(_) => errors.push(format!("search '{query}' timed out")),
        }
    }

    if hit_batches.iter().all(|b| b.is_empty()) && !queries.is_empty() {
        warn!(topic = %analysis.primary_topic, "all discovery searches returned nothing; using deterministic fallback");
        errors.push("all searches returned zero hits".to_string());
        let mut fallback = deterministic_fallback(analysis);
        fallback.extend(seed_sources_from_existing(existing_urls));
        return (fallback, errors);
    }

    let all_hits: Vec<SearchHit> = hit_batches.into_iter().flatten().collect();
    let mut sources = categorize_hits(llm, model, &analysis.primary_topic, &all_hits).await;
    sources.extend(seed_sources_from_existing(existing_urls));
    (sources, errors)
}
