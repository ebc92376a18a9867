use anyhow::{Context, Result};
use scoutdesk_config::NotebookProfile;
use uuid::Uuid;

use crate::context::AppContext;

/// `discover <notebook_id>` — spec.md §4.2. No external web-search backend
/// is wired into this workspace (spec.md §6 boundary), so discovery runs
/// against the LLM's own knowledge and the deterministic fallback sources.
pub async fn run(ctx: &AppContext, notebook_id: Uuid) -> Result<()> {
    let profile = NotebookProfile::load_or_default(ctx.data_root(), notebook_id).with_context(|| format!("loading notebook {notebook_id}"))?;
    let existing_urls: Vec<String> = profile.sources.feed.iter().chain(profile.sources.web_page.iter()).cloned().collect();

    let result = scoutdesk_discovery::discover(
        ctx.llm_client(),
        None,
        ctx.model(),
        &profile.intent,
        &profile.focus_areas,
        Some(&profile.subject),
        &existing_urls,
        None,
    )
    .await;

    println!("purpose: {:?}, depth: {:?}", result.analysis.purpose, result.analysis.research_depth);
    for source in &result.sources {
        let mark = if source.auto_approve { "*" } else { " " };
        println!("{mark} [{:.2}] {:<10} {}  — {}", source.confidence, source.kind, source.value, source.rationale);
    }
    if !result.errors.is_empty() {
        println!("errors:");
        for error in &result.errors {
            println!("  {error}");
        }
    }
    Ok(())
}
