use anyhow::Result;
use chrono::{Duration, Utc};
use scoutdesk_gatherer::Gatherer;
use scoutdesk_orchestrator::{FileNotebookStore, NotebookStore};

use crate::commands::collect::load_last_runs;
use crate::context::AppContext;

/// `briefing show` — spec.md §4.5. `--since-days` stands in for the "last
/// seen" timestamp a real UI would track per operator.
pub async fn show(ctx: &AppContext, since_days: i64) -> Result<()> {
    let data_root = ctx.data_root();
    let last_seen = Utc::now() - Duration::days(since_days.max(0));

    let store = FileNotebookStore::new(&data_root);
    let summaries = store.list().await?;
    let last_runs = load_last_runs(&data_root);
    let mut memory = ctx.open_memory()?;

    let mut stats = Vec::with_capacity(summaries.len());
    for summary in &summaries {
        let gatherer = match Gatherer::open(&data_root, summary.notebook_id) {
            Ok(gatherer) => gatherer,
            Err(error) => {
                tracing::warn!(%error, notebook_id = %summary.notebook_id, "skipping notebook in briefing");
                continue;
            }
        };
        let collection_runs = if last_runs.get(&summary.notebook_id).is_some_and(|t| *t > last_seen) { 1 } else { 0 };
        stats.push(scoutdesk_briefing::gather_notebook_stats(&mut memory, &gatherer, &summary.subject, last_seen, collection_runs));
    }

    let briefing = scoutdesk_briefing::generate_briefing(ctx.llm_client(), ctx.model(), last_seen, stats).await;
    println!("{}", briefing.narrative);
    Ok(())
}
