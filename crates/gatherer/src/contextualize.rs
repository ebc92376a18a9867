use scoutdesk_llm::{ChatRequest, LlmClient};
use scoutdesk_memory::ArchiveHit;
use tracing::warn;

use crate::schema::CollectedItem;

const CONTEXTUALIZE_SYSTEM_PROMPT: &str = "Given a newly collected item and related prior records \
from the same research notebook, answer three things as JSON: delta_summary (what is new here \
relative to the related records, or null if nothing), temporal_context (a short phrase placing \
this in time relative to the related records, or null), is_new_topic (boolean — true if this item \
introduces a topic not covered by the related records). Respond with JSON only.";

#[derive(Debug, Default, serde::Deserialize)]
struct ContextualizeResponse {
    #[serde(default)]
    delta_summary: Option<String>,
    #[serde(default)]
    temporal_context: Option<String>,
    #[serde(default)]
    is_new_topic: bool,
}

/// `knowledge_overlap = 0.6*max_sim + 0.4*avg_top5_sim` (spec.md §4.3 step 6).
pub fn knowledge_overlap(similarities: &[f32]) -> f32 {
    if similarities.is_empty() {
        return 0.0;
    }
    let max_sim = similarities.iter().cloned().fold(0.0_f32, f32::max);
    let top5: Vec<f32> = {
        let mut sorted = similarities.to_vec();
        sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        sorted.into_iter().take(5).collect()
    };
    let avg_top5 = top5.iter().sum::<f32>() / top5.len() as f32;
    (0.6 * max_sim + 0.4 * avg_top5).clamp(0.0, 1.0)
}

/// spec.md §4.3 step 6: semantic-search ≤10 related records with
/// similarity >0.3, compute knowledge_overlap, ask for delta/temporal
/// context, and attach the first 80 chars of the top 3 related titles.
pub async fn contextualize(llm: &dyn LlmClient, model: &str, item: &mut CollectedItem, related: &[ArchiveHit<'_>]) {
    let similarities: Vec<f32> = related.iter().map(|h| h.similarity).collect();
    item.knowledge_overlap = knowledge_overlap(&similarities);
    item.related_titles = related
        .iter()
        .take(3)
        .map(|h| h.record.content.chars().take(80).collect::<String>())
        .collect();

    if related.is_empty() {
        item.is_new_topic = true;
        return;
    }

    let related_text: String = related
        .iter()
        .take(10)
        .map(|h| format!("- {}", h.record.content.chars().take(200).collect::<String>()))
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = format!(
        "New item:\nTitle: {}\nContent: {}\n\nRelated records:\n{related_text}",
        item.title,
        item.content.chars().take(1000).collect::<String>()
    );

    let request = ChatRequest::new(prompt, model).with_system(CONTEXTUALIZE_SYSTEM_PROMPT);
    match llm.chat_completion(request).await {
        Ok(response) if !response.looks_like_error() => {
            if let Some(parsed) = scoutdesk_llm::extract_json_output::<ContextualizeResponse>(&response.text) {
                item.delta_summary = parsed.delta_summary;
                item.temporal_context = parsed.temporal_context;
                item.is_new_topic = parsed.is_new_topic;
                return;
            }
            warn!(title = %item.title, "contextualize response failed to parse as JSON");
        }
        Ok(response) => warn!(response = %response.text, "contextualize chat_completion returned an error-shaped response"),
        Err(error) => warn!(%error, "contextualize chat_completion failed"),
    }

    item.is_new_topic = item.knowledge_overlap < 0.3;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn knowledge_overlap_weights_max_and_top5_average() {
        let sims = vec![1.0, 0.5, 0.4, 0.3, 0.2, 0.1];
        let overlap = knowledge_overlap(&sims);
        assert!(overlap > 0.0 && overlap <= 1.0);
    }

    #[test]
    fn empty_related_yields_zero_overlap() {
        assert_eq!(knowledge_overlap(&[]), 0.0);
    }
}
