use scoutdesk_config::OversightThresholds;
use scoutdesk_gatherer::CollectedItem;
use scoutdesk_llm::{ChatRequest, LlmClient};
use tracing::warn;

use crate::schema::{Decision, JudgmentResult};

const JUDGE_SYSTEM_PROMPT: &str = "You are judging whether a collected research item should be \
approved, rejected, or deferred to the user for a notebook with the given intent. Respond with \
JSON: {\"decision\": \"approve\"|\"reject\"|\"defer_to_user\", \"reason\": string, \"confidence\": \
number between 0 and 1, \"modifications\": string or null}.";

#[derive(Debug, serde::Deserialize)]
struct JudgeResponse {
    decision: String,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    confidence: f32,
    #[serde(default)]
    modifications: Option<String>,
}

const OVERLAP_SIGNAL_PHRASES: &[&str] = &["no new", "no significant", "already"];

/// `_judge_single_item` from spec.md §4.4 — four steps, in order:
/// auto-approve at the threshold, defer below the floor, reject an
/// overlap with an absent/flat delta summary, otherwise ask an LLM judge.
pub async fn judge_single_item(
    llm: &dyn LlmClient,
    model: &str,
    intent: &str,
    item: &CollectedItem,
    thresholds: OversightThresholds,
) -> JudgmentResult {
    if item.overall_confidence >= thresholds.auto_approve_threshold {
        return JudgmentResult {
            item_id: item.id,
            decision: Decision::Approve,
            reason: format!("confidence {:.2} at or above auto-approve threshold", item.overall_confidence),
            confidence: item.overall_confidence,
            modifications: None,
        };
    }

    if item.overall_confidence < thresholds.confidence_floor {
        return JudgmentResult {
            item_id: item.id,
            decision: Decision::DeferToUser,
            reason: format!("confidence {:.2} below the floor", item.overall_confidence),
            confidence: item.overall_confidence,
            modifications: None,
        };
    }

    if item.knowledge_overlap > thresholds.overlap_reject_threshold {
        let delta_is_flat = match &item.delta_summary {
            None => true,
            Some(summary) => {
                let lower = summary.to_lowercase();
                OVERLAP_SIGNAL_PHRASES.iter().any(|phrase| lower.contains(phrase))
            }
        };
        if delta_is_flat {
            return JudgmentResult {
                item_id: item.id,
                decision: Decision::Reject,
                reason: "no significant new information".to_string(),
                confidence: item.overall_confidence,
                modifications: None,
            };
        }
    }

    let prompt = format!(
        "Notebook intent: {intent}\nTitle: {}\nSource: {}\nPreview: {}",
        item.title, item.source_name, item.preview
    );
    let request = ChatRequest::new(prompt, model).with_system(JUDGE_SYSTEM_PROMPT);
    match llm.chat_completion(request).await {
        Ok(response) if !response.looks_like_error() => {
            match scoutdesk_llm::extract_json_output::<JudgeResponse>(&response.text) {
                Some(parsed) => {
                    let decision = match parsed.decision.to_lowercase().as_str() {
                        "approve" => Decision::Approve,
                        "reject" => Decision::Reject,
                        _ => Decision::DeferToUser,
                    };
                    JudgmentResult {
                        item_id: item.id,
                        decision,
                        reason: parsed.reason,
                        confidence: parsed.confidence.clamp(0.0, 1.0),
                        modifications: parsed.modifications,
                    }
                }
                None => {
                    warn!(title = %item.title, "judge response failed to parse as JSON; deferring to user");
                    JudgmentResult {
                        item_id: item.id,
                        decision: Decision::DeferToUser,
                        reason: "judge response was not parseable JSON".to_string(),
                        confidence: item.overall_confidence,
                        modifications: None,
                    }
                }
            }
        }
        Ok(response) => {
            warn!(response = %response.text, "judge chat_completion returned an error-shaped response");
            JudgmentResult {
                item_id: item.id,
                decision: Decision::DeferToUser,
                reason: "judge model unavailable".to_string(),
                confidence: item.overall_confidence,
                modifications: None,
            }
        }
        Err(error) => {
            warn!(%error, "judge chat_completion failed");
            JudgmentResult {
                item_id: item.id,
                decision: Decision::DeferToUser,
                reason: "judge model call failed".to_string(),
                confidence: item.overall_confidence,
                modifications: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use scoutdesk_fetch::{FetchedItem, SourceKind};
    use scoutdesk_llm::LlmResponse;

    struct StubLlm;

    #[async_trait]
    impl LlmClient for StubLlm {
        async fn chat_completion(&self, _request: ChatRequest) -> Result<LlmResponse> {
            Ok(LlmResponse::new("unreachable"))
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![])
        }
    }

    fn item_with(confidence: f32, overlap: f32, delta: Option<&str>) -> CollectedItem {
        let mut item = CollectedItem::from_fetched(&FetchedItem::new("t", "c", "s", SourceKind::WebPage, "u"));
        item.overall_confidence = confidence;
        item.knowledge_overlap = overlap;
        item.delta_summary = delta.map(str::to_string);
        item
    }

    #[tokio::test]
    async fn auto_approves_above_threshold() {
        let item = item_with(0.9, 0.0, None);
        let result = judge_single_item(&StubLlm, "m", "intent", &item, OversightThresholds::default()).await;
        assert_eq!(result.decision, Decision::Approve);
    }

    #[tokio::test]
    async fn defers_below_floor() {
        let item = item_with(0.4, 0.0, None);
        let result = judge_single_item(&StubLlm, "m", "intent", &item, OversightThresholds::default()).await;
        assert_eq!(result.decision, Decision::DeferToUser);
    }

    #[tokio::test]
    async fn rejects_high_overlap_with_flat_delta() {
        let item = item_with(0.7, 0.9, Some("Already known, no new details"));
        let result = judge_single_item(&StubLlm, "m", "intent", &item, OversightThresholds::default()).await;
        assert_eq!(result.decision, Decision::Reject);
    }
}
