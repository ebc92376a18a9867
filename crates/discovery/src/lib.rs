pub mod discover;
pub mod intent;
pub mod schema;

use scoutdesk_fetch::WebSearch;
use scoutdesk_llm::LlmClient;

pub use schema::{
    DiscoveredSource, DiscoveryResult, Disposition, IntentAnalysis, NotebookPurpose, ResearchDepth, TimeSensitivity,
    AUTO_APPROVE_CONFIDENCE,
};

/// `discover(intent, focus_areas, subject?, existing_urls?, purpose_override?, entity_details?)`
/// from spec.md §4.2, run as the two documented stages.
#[allow(clippy::too_many_arguments)]
pub async fn discover(
    llm: &dyn LlmClient,
    web_search: Option<&(dyn WebSearch + Send + Sync)>,
    model: &str,
    intent: &str,
    focus_areas: &[String],
    subject: Option<&str>,
    existing_urls: &[String],
    purpose_override: Option<NotebookPurpose>,
) -> DiscoveryResult {
    let mut analysis = intent::analyze_intent(llm, web_search, intent, focus_areas, subject, model).await;
    if let Some(purpose) = purpose_override {
        analysis.purpose = purpose;
    }

    let (mut sources, errors) = discover::discover_sources(llm, web_search, model, &analysis, existing_urls).await;
    schema::sort_sources(&mut sources);

    DiscoveryResult { analysis, sources, errors }
}
