use scoutdesk_discovery::DiscoveredSource;
use scoutdesk_llm::{ChatRequest, LlmClient};
use tracing::warn;

use crate::schema::ValidatedSource;

const HIGH_CONFIDENCE: f32 = 0.85;
const MEDIUM_CONFIDENCE: f32 = 0.5;
const LOW_CONFIDENCE_FLOOR: f32 = 0.4;

#[derive(Debug, serde::Deserialize)]
struct SourceVerdict {
    #[serde(default)]
    recommendation: String,
    #[serde(default)]
    reason: String,
}

async fn validate_single_source(llm: &dyn LlmClient, model: &str, source: &DiscoveredSource, intent: &str) -> ValidatedSource {
    if source.confidence >= HIGH_CONFIDENCE && source.auto_approve {
        return ValidatedSource {
            source: source.clone(),
            still_relevant: true,
            rationale: "High relevance source for your research".to_string(),
        };
    }

    if source.confidence >= MEDIUM_CONFIDENCE {
        let prompt = format!(
            "Research Intent: {intent}\n\nSource to evaluate:\n- Name: {}\n- Type: {}\n- Description: {}\n\n\
Should this source be included? Consider:\n\
1. Is it directly relevant to the research intent?\n\
2. Is it a reputable/useful source type?\n\n\
Respond with JSON only: {{\"recommendation\": \"suggest\" or \"skip\", \"reason\": \"one sentence explanation\"}}",
            source.name, source.kind, source.rationale,
        );
        let request = ChatRequest::new(prompt, model).with_temperature(0.3);
        match llm.chat_completion(request).await {
            Ok(response) if !response.looks_like_error() => {
                if let Some(verdict) = scoutdesk_llm::extract_json_output::<SourceVerdict>(&response.text) {
                    return ValidatedSource {
                        source: source.clone(),
                        still_relevant: verdict.recommendation != "skip",
                        rationale: if verdict.reason.is_empty() { "Potentially relevant source".to_string() } else { verdict.reason },
                    };
                }
            }
            Ok(_) => {}
            Err(error) => warn!(%error, source = %source.name, "source validation chat_completion failed"),
        }
    }

    ValidatedSource {
        source: source.clone(),
        still_relevant: source.confidence >= LOW_CONFIDENCE_FLOOR,
        rationale: "Lower confidence — review before including".to_string(),
    }
}

/// Reviews discovered sources and attaches a recommendation and rationale,
/// sorted auto-approve-equivalent first (spec.md §4.4). A non-relevant
/// verdict is the Rust analogue of the original's `skip` recommendation.
pub async fn validate_discovered_sources(llm: &dyn LlmClient, model: &str, intent: &str, sources: &[DiscoveredSource]) -> Vec<ValidatedSource> {
    let mut validated = Vec::with_capacity(sources.len());
    for source in sources {
        validated.push(validate_single_source(llm, model, source, intent).await);
    }
    validated.sort_by(|a, b| b.still_relevant.cmp(&a.still_relevant).then(b.source.confidence.total_cmp(&a.source.confidence)));
    validated
}
