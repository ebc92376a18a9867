use scoutdesk_llm::{ChatRequest, LlmClient};
use scoutdesk_memory::{MemoryManager, SignalType, UserSignal};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

const USER_ITEM_SYSTEM_PROMPT: &str = "Analyze user-provided content for a research notebook. Respond with \
JSON only: {\"relevance_score\": 0.0-1.0, \"topics\": [string], \"entities\": [string], \"importance\": \
\"low\"|\"medium\"|\"high\"|\"critical\"}.";

const USER_WEIGHT_BONUS: f32 = 1.5;
const MAX_TOPIC_SIGNALS: usize = 5;

#[derive(Debug, Default, Deserialize)]
struct UserItemAnalysis {
    #[serde(default)]
    relevance_score: f32,
    #[serde(default)]
    topics: Vec<String>,
    #[serde(default)]
    entities: Vec<String>,
    #[serde(default = "default_importance")]
    importance: String,
}

fn default_importance() -> String {
    "medium".to_string()
}

/// What manually capturing content into a notebook returns to the caller
/// for display/storage — mirrors `score_user_item`'s result dict.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredUserItem {
    pub relevance_score: f32,
    pub effective_score: f32,
    pub topics: Vec<String>,
    pub entities: Vec<String>,
    pub importance: String,
}

/// A user manually adding content to a notebook is a strong signal of what
/// they care about. Scores it against the notebook's intent, then records
/// an amplified-weight `user_capture` signal plus one `topic_interest`
/// signal per extracted topic (spec.md §4.4).
pub async fn score_user_item(
    llm: &dyn LlmClient,
    model: &str,
    memory: &MemoryManager,
    notebook_id: Uuid,
    intent: &str,
    focus_areas: &[String],
    title: &str,
    content: &str,
    url: Option<&str>,
    source_type: &str,
) -> anyhow::Result<ScoredUserItem> {
    let mut analysis = UserItemAnalysis {
        relevance_score: 0.5,
        ..Default::default()
    };

    if !intent.is_empty() || !focus_areas.is_empty() {
        let prompt = format!(
            "Notebook intent: {intent}\nFocus areas: {}\n\nContent title: {title}\nContent preview: {}",
            if focus_areas.is_empty() { "Not specified".to_string() } else { focus_areas.join(", ") },
            content.chars().take(1000).collect::<String>(),
        );
        let request = ChatRequest::new(prompt, model).with_system(USER_ITEM_SYSTEM_PROMPT);
        match llm.chat_completion(request).await {
            Ok(response) if !response.looks_like_error() => {
                if let Some(parsed) = scoutdesk_llm::extract_json_output::<UserItemAnalysis>(&response.text) {
                    analysis = parsed;
                } else {
                    warn!(title, "user-item analysis response failed to parse as JSON");
                }
            }
            Ok(response) => warn!(response = %response.text, "user-item analysis returned an error-shaped response"),
            Err(error) => warn!(%error, "user-item analysis chat_completion failed"),
        }
    }

    let relevance_score = analysis.relevance_score.clamp(0.0, 1.0);
    let effective_score = (relevance_score * USER_WEIGHT_BONUS).min(1.0);

    let capture_signal = UserSignal::new(notebook_id, SignalType::UserCapture).with_metadata(serde_json::json!({
        "title": title.chars().take(200).collect::<String>(),
        "url": url,
        "source_type": source_type,
        "topics": analysis.topics,
        "entities": analysis.entities,
        "relevance_score": relevance_score,
        "importance": analysis.importance,
    }));
    memory.record_signal(capture_signal).await?;

    for topic in analysis.topics.iter().take(MAX_TOPIC_SIGNALS) {
        let topic_signal = UserSignal::new(notebook_id, SignalType::TopicInterest)
            .with_metadata(serde_json::json!({ "topic": topic, "source": "user_capture" }));
        memory.record_signal(topic_signal).await?;
    }

    Ok(ScoredUserItem {
        relevance_score,
        effective_score,
        topics: analysis.topics,
        entities: analysis.entities,
        importance: analysis.importance,
    })
}
