use anyhow::Result;
use scoutdesk_config::{ApprovalMode, CollectionMode, NotebookProfile};
use scoutdesk_gatherer::Gatherer;
use scoutdesk_orchestrator::{FileNotebookStore, NotebookStore};
use tracing::info;
use uuid::Uuid;

use crate::context::AppContext;

pub async fn create(ctx: &AppContext, subject: String, intent: String, focus_areas: Vec<String>) -> Result<()> {
    let notebook_id = Uuid::new_v4();
    let mut profile = NotebookProfile::new(notebook_id, subject, intent);
    profile.focus_areas = focus_areas;
    profile.save(ctx.data_root())?;

    let mut memory = ctx.open_memory()?;
    let mut gatherer = Gatherer::open(&ctx.data_root(), notebook_id)?;
    let outcome = gatherer.run_first_sweep(&ctx.http, ctx.llm_client(), ctx.model(), &mut memory).await?;
    gatherer.save()?;

    info!(%notebook_id, items = outcome.items.len(), "notebook created");
    println!("created notebook {notebook_id}");
    println!("first sweep collected {} candidate item(s) (pending review)", outcome.items.len());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn update(
    ctx: &AppContext,
    notebook_id: Uuid,
    subject: Option<String>,
    intent: Option<String>,
    focus_areas: Option<Vec<String>>,
    collection_mode: Option<CollectionMode>,
    approval_mode: Option<ApprovalMode>,
) -> Result<()> {
    let mut profile = NotebookProfile::load_or_default(ctx.data_root(), notebook_id)?;
    if let Some(subject) = subject {
        profile.subject = subject;
    }
    if let Some(intent) = intent {
        profile.intent = intent;
    }
    if let Some(focus_areas) = focus_areas {
        profile.focus_areas = focus_areas;
    }
    if let Some(collection_mode) = collection_mode {
        profile.collection_mode = collection_mode;
    }
    if let Some(approval_mode) = approval_mode {
        profile.approval_mode = approval_mode;
    }
    profile.touch();
    profile.save(ctx.data_root())?;
    println!("updated notebook {notebook_id}");
    Ok(())
}

pub async fn list(ctx: &AppContext) -> Result<()> {
    let store = FileNotebookStore::new(ctx.data_root());
    let summaries = store.list().await?;
    if summaries.is_empty() {
        println!("no notebooks yet — create one with `scoutdesk notebook create`");
        return Ok(());
    }
    for summary in summaries {
        println!("{}  {}", summary.notebook_id, summary.subject);
    }
    Ok(())
}
