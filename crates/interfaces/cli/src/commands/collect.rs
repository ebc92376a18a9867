use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use scoutdesk_config::NotebookProfile;
use scoutdesk_gatherer::Gatherer;
use scoutdesk_orchestrator::{FileNotebookStore, NotebookStore};
use scoutdesk_supervisor::Supervisor;
use uuid::Uuid;

use crate::context::AppContext;

fn last_runs_path(data_root: &Path) -> PathBuf {
    data_root.join("orchestrator_last_runs.json")
}

pub(crate) fn load_last_runs(data_root: &Path) -> HashMap<Uuid, DateTime<Utc>> {
    fs::read_to_string(last_runs_path(data_root)).ok().and_then(|raw| serde_json::from_str(&raw).ok()).unwrap_or_default()
}

fn save_last_runs(data_root: &Path, last_runs: &HashMap<Uuid, DateTime<Utc>>) -> Result<()> {
    let rendered = serde_json::to_string_pretty(last_runs)?;
    fs::write(last_runs_path(data_root), rendered)?;
    Ok(())
}

/// `collect run` — one Ambient Orchestrator tick (spec.md §4.7).
pub async fn run_ambient_tick(ctx: &AppContext) -> Result<()> {
    let data_root = ctx.data_root();
    let store = FileNotebookStore::new(&data_root);
    let summaries = store.list().await?;

    let profiles: Vec<NotebookProfile> =
        summaries.iter().map(|s| NotebookProfile::load_or_default(&data_root, s.notebook_id)).collect::<Result<_>>()?;

    let supervisor = Supervisor::open(&data_root)?;
    let mut last_runs = load_last_runs(&data_root);
    let mut memory = ctx.open_memory()?;

    let report = scoutdesk_orchestrator::tick(
        &data_root,
        &profiles,
        &last_runs,
        &ctx.http,
        ctx.llm_client(),
        ctx.model(),
        &mut memory,
        supervisor.config.thresholds,
        Utc::now(),
    )
    .await;

    let now = Utc::now();
    for (notebook_id, _) in &report.collected {
        last_runs.insert(*notebook_id, now);
    }
    save_last_runs(&data_root, &last_runs)?;

    println!("collected {} notebook(s), {} not due, {} manual (skipped)", report.collected.len(), report.not_due.len(), report.skipped_manual.len());
    for (notebook_id, outcome) in &report.collected {
        println!(
            "  {notebook_id}: {} approved, {} pending, {} rejected, {} filtered",
            outcome.approved.len(),
            outcome.pending.len(),
            outcome.rejected.len(),
            outcome.filtered.len()
        );
    }
    if report.working_facts_evicted > 0 {
        println!("compressed {} working fact(s) into the archive", report.working_facts_evicted);
    }
    if !report.summarized_notebooks.is_empty() {
        println!("summarized recent exchanges for {} notebook(s)", report.summarized_notebooks.len());
    }
    Ok(())
}

/// `collect now <notebook_id>` — user-triggered immediate collection.
pub async fn collect_now(ctx: &AppContext, notebook_id: Uuid, query: Option<String>) -> Result<()> {
    let data_root = ctx.data_root();
    let mut gatherer = Gatherer::open(&data_root, notebook_id).with_context(|| format!("opening gatherer for {notebook_id}"))?;
    let supervisor = Supervisor::open(&data_root)?;
    let mut memory = ctx.open_memory()?;

    let outcome = scoutdesk_supervisor::assign_immediate_collection(
        &mut gatherer,
        &ctx.http,
        ctx.llm_client(),
        ctx.model(),
        &mut memory,
        supervisor.config.thresholds,
        query,
    )
    .await?;

    println!("approved: {}", outcome.approved.len());
    for (id, title) in &outcome.approved {
        println!("  {id}  {title}");
    }
    println!("pending review: {}", outcome.pending.len());
    for (id, title) in &outcome.pending {
        println!("  {id}  {title}");
    }
    println!("rejected: {}, filtered: {}", outcome.rejected.len(), outcome.filtered.len());
    if outcome.partial {
        println!("(collection hit its deadline — results are partial)");
    }
    Ok(())
}
