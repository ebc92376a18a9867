use scoutdesk_gatherer::CollectionTask;
use scoutdesk_llm::LlmClient;
use scoutdesk_memory::{MemoryManager, Reader};
use tracing::warn;
use uuid::Uuid;

const LOOKBACK_HITS: usize = 5;
const AVOID_SIMILAR_PREFIXES: usize = 3;
const AVOID_SIMILAR_PREFIX_LEN: usize = 400;

async fn embed_or_empty(llm: &dyn LlmClient, text: &str) -> Vec<f32> {
    match llm.embed(text).await {
        Ok(embedding) => embedding,
        Err(error) => {
            warn!(%error, "embedding call failed while building a collection task");
            Vec::new()
        }
    }
}

/// Builds a collection task the way `_create_collection_task` does: before
/// dispatch, looks back at the notebook's own GATHERER archive for near
/// hits on the intent, and asks the Gatherer to favor novel information
/// over what it already has (spec.md §4.4).
#[allow(clippy::too_many_arguments)]
pub async fn build_task(
    llm: &dyn LlmClient,
    memory: &mut MemoryManager,
    notebook_id: Uuid,
    intent: &str,
    focus_areas: Vec<String>,
    mode: impl Into<String>,
    specific_query: Option<String>,
    smart_queries: Vec<String>,
) -> CollectionTask {
    let embedding = embed_or_empty(llm, intent).await;
    let hits = memory.search_archive(Reader::Gatherer { notebook_id }, &embedding, LOOKBACK_HITS, 0.0);

    let avoid_similar_to: Vec<String> = hits
        .iter()
        .filter_map(|(id, _)| memory.get_archive_record(*id))
        .take(AVOID_SIMILAR_PREFIXES)
        .map(|record| record.content.chars().take(AVOID_SIMILAR_PREFIX_LEN).collect())
        .collect();

    let supervisor_directive = if avoid_similar_to.is_empty() {
        None
    } else {
        Some("Favor novel information not already covered by the notebook's existing archive.".to_string())
    };

    CollectionTask {
        notebook_id,
        intent: intent.to_string(),
        focus_areas,
        mode: mode.into(),
        avoid_similar_to,
        supervisor_directive,
        specific_query,
        smart_queries,
    }
}
