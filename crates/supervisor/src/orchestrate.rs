use std::time::Duration;

use anyhow::Result;
use futures::future::join_all;
use scoutdesk_config::OversightThresholds;
use scoutdesk_gatherer::{CollectedItem, Gatherer, ItemStatus, LearnedPreferences};
use scoutdesk_llm::LlmClient;
use scoutdesk_memory::MemoryManager;
use tracing::{error, warn};
use uuid::Uuid;

use crate::schema::{Decision, ImmediateCollectionOutcome, JudgmentResult};
use crate::task::build_task;

const IMMEDIATE_COLLECTION_DEADLINE: Duration = Duration::from_secs(60);
const ORCHESTRATED_COLLECTION_DEADLINE: Duration = Duration::from_secs(90);

fn learned_preferences_from(prefs: &scoutdesk_preferences::Preferences) -> LearnedPreferences {
    LearnedPreferences {
        preferred_topics: prefs.preferred_topics.clone(),
        preferred_sources: prefs.preferred_sources.clone(),
        rejected_patterns: prefs.rejected_patterns.clone(),
    }
}

/// `judge_collection` from spec.md §4.4 — judges every proposed item
/// concurrently (no shared mutable state is needed across judgments).
pub async fn judge_collection(llm: &dyn LlmClient, model: &str, intent: &str, items: &[CollectedItem], thresholds: OversightThresholds) -> Vec<JudgmentResult> {
    join_all(items.iter().map(|item| crate::judge::judge_single_item(llm, model, intent, item, thresholds))).await
}

/// Applies a judgment to one item exactly as `assign_immediate_collection`
/// does, without the hard confidence floor (that's the immediate-collect
/// caller's responsibility since it's described as specific to that path).
async fn apply_judgment(
    gatherer: &mut Gatherer,
    client: &reqwest::Client,
    llm: &dyn LlmClient,
    memory: &mut MemoryManager,
    item: CollectedItem,
    judgment: &JudgmentResult,
) -> Result<(&'static str, String)> {
    match judgment.decision {
        Decision::Approve => {
            let title = item.title.clone();
            let stored = gatherer.persist_approval(item, client, llm, memory).await?;
            if stored.status == ItemStatus::Approved {
                Ok(("approved", title))
            } else {
                Ok(("filtered", title))
            }
        }
        Decision::Reject => Ok(("rejected", item.title.clone())),
        Decision::DeferToUser => {
            let title = item.title.clone();
            let status = gatherer.route_item(item, client, llm, memory).await?;
            if status == ItemStatus::Approved {
                Ok(("approved", title))
            } else {
                Ok(("pending", title))
            }
        }
    }
}

/// `assign_immediate_collection` from spec.md §4.4: user-triggered
/// "collect now". Enforces the hard confidence floor before judgments are
/// even consulted, then applies each judgment's outcome.
pub async fn assign_immediate_collection(
    gatherer: &mut Gatherer,
    client: &reqwest::Client,
    llm: &dyn LlmClient,
    model: &str,
    memory: &mut MemoryManager,
    thresholds: OversightThresholds,
    specific_query: Option<String>,
) -> Result<ImmediateCollectionOutcome> {
    let intent = gatherer.profile.intent.clone();
    let focus_areas = gatherer.profile.focus_areas.clone();
    let notebook_id = gatherer.notebook_id;

    let mut task = build_task(llm, memory, notebook_id, &intent, focus_areas, "immediate", specific_query.clone(), Vec::new()).await;
    if let Some(query) = &specific_query {
        task.supervisor_directive = Some(format!("Focus on: {query}"));
    }

    let prefs = scoutdesk_preferences::learn_preferences(memory, notebook_id).unwrap_or_default();
    let learned = learned_preferences_from(&prefs);

    let outcome = gatherer
        .execute_collection_task(&task, client, llm, model, memory, &learned, IMMEDIATE_COLLECTION_DEADLINE)
        .await?;

    let mut result = ImmediateCollectionOutcome { partial: outcome.partial, ..Default::default() };
    if outcome.items.is_empty() {
        return Ok(result);
    }

    let judgments = judge_collection(llm, model, &intent, &outcome.items, thresholds).await;

    for (item, judgment) in outcome.items.into_iter().zip(judgments) {
        if item.overall_confidence < thresholds.confidence_floor {
            result.filtered.push((item.id, item.title));
            continue;
        }

        let id = item.id;
        match apply_judgment(gatherer, client, llm, memory, item, &judgment).await {
            Ok(("approved", title)) => result.approved.push((id, title)),
            Ok(("rejected", title)) => result.rejected.push((id, title)),
            Ok(("pending", title)) => result.pending.push((id, title)),
            Ok((_, title)) => result.filtered.push((id, title)),
            Err(error) => {
                error!(%error, item_id = %id, "failed to apply judgment to collected item");
                result.filtered.push((id, "<storage error>".to_string()));
            }
        }
    }

    gatherer.save()?;
    Ok(result)
}

/// One notebook's slice of `orchestrate_collection`. A notebook with an
/// empty intent is considered unconfigured and skipped, mirroring the
/// original orchestrator's "Collector not configured" short-circuit.
pub async fn orchestrate_notebook_collection(
    gatherer: &mut Gatherer,
    client: &reqwest::Client,
    llm: &dyn LlmClient,
    model: &str,
    memory: &mut MemoryManager,
    thresholds: OversightThresholds,
) -> Result<ImmediateCollectionOutcome> {
    if gatherer.profile.intent.trim().is_empty() {
        return Ok(ImmediateCollectionOutcome::default());
    }

    let intent = gatherer.profile.intent.clone();
    let focus_areas = gatherer.profile.focus_areas.clone();
    let notebook_id = gatherer.notebook_id;

    let task = build_task(llm, memory, notebook_id, &intent, focus_areas, "scheduled", None, Vec::new()).await;
    let prefs = scoutdesk_preferences::learn_preferences(memory, notebook_id).unwrap_or_default();
    let learned = learned_preferences_from(&prefs);

    let outcome = gatherer
        .execute_collection_task(&task, client, llm, model, memory, &learned, ORCHESTRATED_COLLECTION_DEADLINE)
        .await?;

    let mut result = ImmediateCollectionOutcome { partial: outcome.partial, ..Default::default() };
    if outcome.items.is_empty() {
        return Ok(result);
    }

    let judgments = judge_collection(llm, model, &intent, &outcome.items, thresholds).await;
    for (item, judgment) in outcome.items.into_iter().zip(judgments) {
        let id = item.id;
        match apply_judgment(gatherer, client, llm, memory, item, &judgment).await {
            Ok(("approved", title)) => result.approved.push((id, title)),
            Ok(("rejected", title)) => result.rejected.push((id, title)),
            Ok(("pending", title)) => result.pending.push((id, title)),
            Ok((_, title)) => result.filtered.push((id, title)),
            Err(error) => {
                error!(%error, item_id = %id, "failed to apply judgment to collected item");
                result.filtered.push((id, "<storage error>".to_string()));
            }
        }
    }

    gatherer.save()?;
    Ok(result)
}

/// `orchestrate_collection(notebook_ids?)` — iterates notebooks, builds
/// tasks, delegates to Gatherers, judges results (spec.md §4.4). Failures
/// on one notebook don't abort the run; they're logged and the notebook is
/// simply absent from the returned map.
pub async fn orchestrate_collection(
    data_root: &std::path::Path,
    notebook_ids: &[Uuid],
    client: &reqwest::Client,
    llm: &dyn LlmClient,
    model: &str,
    memory: &mut MemoryManager,
    thresholds: OversightThresholds,
) -> Vec<(Uuid, ImmediateCollectionOutcome)> {
    let mut results = Vec::with_capacity(notebook_ids.len());
    for &notebook_id in notebook_ids {
        let mut gatherer = match Gatherer::open(data_root, notebook_id) {
            Ok(g) => g,
            Err(error) => {
                warn!(%error, %notebook_id, "failed to open gatherer during orchestration");
                continue;
            }
        };
        match orchestrate_notebook_collection(&mut gatherer, client, llm, model, memory, thresholds).await {
            Ok(outcome) => results.push((notebook_id, outcome)),
            Err(error) => warn!(%error, %notebook_id, "orchestration failed for notebook"),
        }
    }
    results
}
