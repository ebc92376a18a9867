use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use cron::Schedule;
use scoutdesk_config::{CollectionMode, NotebookProfile, OversightThresholds};
use scoutdesk_llm::LlmClient;
use scoutdesk_memory::{MemoryManager, RecentExchange};
use scoutdesk_supervisor::ImmediateCollectionOutcome;
use tracing::{debug, warn};
use uuid::Uuid;

/// Maps a notebook's `schedule.frequency` label to a 6-field (with-seconds)
/// cron expression; an unrecognized label is passed through as a literal
/// cron expression (spec.md §4.7 allows "daily", "weekly", or an explicit
/// expression).
fn cron_expression_for(frequency: &str) -> &str {
    match frequency {
        "hourly" => "0 0 * * * *",
        "daily" => "0 0 0 * * *",
        "weekly" => "0 0 0 * * SUN",
        other => other,
    }
}

/// True if `frequency`'s schedule has a fire time in `(last_run, now]`. A
/// notebook that has never run is due immediately. An unparseable
/// expression is never due rather than panicking the tick.
pub fn is_due(frequency: &str, last_run: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    let Some(last_run) = last_run else { return true };

    let expr = cron_expression_for(frequency);
    let schedule = match Schedule::from_str(expr) {
        Ok(schedule) => schedule,
        Err(error) => {
            warn!(%error, %frequency, "unparseable collection schedule; skipping");
            return false;
        }
    };
    schedule.after(&last_run).next().is_some_and(|next| next <= now)
}

#[derive(Debug, Default)]
pub struct TickReport {
    pub collected: Vec<(Uuid, ImmediateCollectionOutcome)>,
    pub skipped_manual: Vec<Uuid>,
    pub not_due: Vec<Uuid>,
    pub working_facts_evicted: usize,
    pub summarized_notebooks: Vec<Uuid>,
}

/// Deterministic summary used as `maybe_summarize_recent`'s narrate
/// closure. The callback is synchronous, so an LLM round trip can't be
/// awaited inside it without blocking the runtime; a structured summary is
/// used instead (documented as an Open Question decision in DESIGN.md).
fn deterministic_recent_summary(exchanges: &[RecentExchange]) -> String {
    let Some(first) = exchanges.first() else {
        return "No exchanges to summarize.".to_string();
    };
    let last = exchanges.last().unwrap_or(first);
    let mut topics: Vec<&str> = exchanges.iter().flat_map(|e| e.topic_tags.iter().map(String::as_str)).collect();
    topics.sort_unstable();
    topics.dedup();

    let topic_line = if topics.is_empty() { String::new() } else { format!(" Topics touched: {}.", topics.join(", ")) };
    format!(
        "Summarized {} exchanges from {} to {}.{topic_line}",
        exchanges.len(),
        first.timestamp.format("%Y-%m-%d"),
        last.timestamp.format("%Y-%m-%d"),
    )
}

/// One pass of the Ambient Orchestrator (spec.md §4.7): dispatches due
/// collections respecting `collection_mode`, then runs the idempotent
/// working-facts and recent-exchange compression passes. Safe to call on
/// any cadence — notebooks not due, and tiers already under threshold, are
/// no-ops.
#[allow(clippy::too_many_arguments)]
pub async fn tick(
    data_root: &Path,
    profiles: &[NotebookProfile],
    last_collection_runs: &HashMap<Uuid, DateTime<Utc>>,
    client: &reqwest::Client,
    llm: &dyn LlmClient,
    model: &str,
    memory: &mut MemoryManager,
    thresholds: OversightThresholds,
    now: DateTime<Utc>,
) -> TickReport {
    let mut report = TickReport::default();
    let mut due_ids = Vec::new();

    for profile in profiles {
        if profile.collection_mode == CollectionMode::Manual {
            report.skipped_manual.push(profile.notebook_id);
            continue;
        }
        if is_due(&profile.schedule.frequency, last_collection_runs.get(&profile.notebook_id).copied(), now) {
            due_ids.push(profile.notebook_id);
        } else {
            report.not_due.push(profile.notebook_id);
        }
    }

    if !due_ids.is_empty() {
        debug!(count = due_ids.len(), "ambient orchestrator dispatching due collections");
        report.collected = scoutdesk_supervisor::orchestrate_collection(data_root, &due_ids, client, llm, model, memory, thresholds).await;
    }

    match memory.compress_working_facts() {
        Ok(evicted) => report.working_facts_evicted = evicted,
        Err(error) => warn!(%error, "working-facts compression failed"),
    }

    for profile in profiles {
        match memory.maybe_summarize_recent(profile.notebook_id, deterministic_recent_summary) {
            Ok(true) => report.summarized_notebooks.push(profile.notebook_id),
            Ok(false) => {}
            Err(error) => warn!(%error, notebook_id = %profile.notebook_id, "recent-exchange summarization failed"),
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn never_run_notebook_is_due() {
        assert!(is_due("daily", None, Utc::now()));
    }

    #[test]
    fn daily_schedule_not_due_minutes_after_last_run() {
        let now = Utc::now();
        assert!(!is_due("daily", Some(now - Duration::minutes(5)), now));
    }

    #[test]
    fn daily_schedule_due_after_a_full_day() {
        let now = Utc::now();
        assert!(is_due("daily", Some(now - Duration::hours(25)), now));
    }

    #[test]
    fn garbage_expression_is_never_due() {
        let now = Utc::now();
        assert!(!is_due("not a cron expression", Some(now - Duration::days(10)), now));
    }
}
