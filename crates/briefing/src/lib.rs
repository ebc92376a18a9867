pub mod emerging;
pub mod narrative;
pub mod schema;
pub mod stats;

pub use narrative::generate_briefing;
pub use schema::{Briefing, NotebookBriefingStats, RecentStory};
pub use stats::gather_notebook_stats;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn briefing_excludes_inactive_notebooks() {
        let quiet = NotebookBriefingStats {
            notebook_name: "quiet".to_string(),
            ..Default::default()
        };
        assert!(!quiet.has_activity());

        let active = NotebookBriefingStats { new_items: 3, ..quiet.clone() };
        assert!(active.has_activity());
    }

    #[tokio::test]
    async fn generate_briefing_with_no_active_notebooks_skips_llm() {
        struct UnreachableLlm;
        #[async_trait::async_trait]
        impl scoutdesk_llm::LlmClient for UnreachableLlm {
            async fn chat_completion(&self, _request: scoutdesk_llm::ChatRequest) -> anyhow::Result<scoutdesk_llm::LlmResponse> {
                panic!("should not be called when no notebook has activity");
            }
            async fn embed(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
                panic!("should not be called");
            }
        }

        let briefing = generate_briefing(&UnreachableLlm, "test-model", Utc::now(), vec![NotebookBriefingStats::default()]).await;
        assert!(briefing.notebooks.is_empty());
        assert!(!briefing.narrative.is_empty());
    }
}
