use anyhow::{Context, Result};
use scoutdesk_gatherer::{FeedbackType, Gatherer};
use uuid::Uuid;

use crate::context::AppContext;

pub fn list(ctx: &AppContext, notebook_id: Uuid) -> Result<()> {
    let gatherer = Gatherer::open(&ctx.data_root(), notebook_id).with_context(|| format!("opening gatherer for {notebook_id}"))?;
    let pending = gatherer.get_pending_approvals();
    if pending.is_empty() {
        println!("no items pending approval");
        return Ok(());
    }
    for item in pending {
        println!("{}  [{:.2}]  {}", item.id, item.overall_confidence, item.title);
        if let Some(url) = &item.url {
            println!("    {url}");
        }
    }
    Ok(())
}

pub fn approve(ctx: &AppContext, notebook_id: Uuid, item_id: Uuid) -> Result<()> {
    let mut gatherer = Gatherer::open(&ctx.data_root(), notebook_id).with_context(|| format!("opening gatherer for {notebook_id}"))?;
    match gatherer.approve_item(item_id)? {
        Some(item) => {
            gatherer.save()?;
            println!("approved: {}", item.title);
        }
        None => println!("no pending item {item_id} found"),
    }
    Ok(())
}

pub fn reject(ctx: &AppContext, notebook_id: Uuid, item_id: Uuid, feedback: FeedbackType) -> Result<()> {
    let mut gatherer = Gatherer::open(&ctx.data_root(), notebook_id).with_context(|| format!("opening gatherer for {notebook_id}"))?;
    match gatherer.reject_item(item_id, feedback)? {
        Some(item) => {
            gatherer.save()?;
            println!("rejected: {}", item.title);
        }
        None => println!("no pending item {item_id} found"),
    }
    Ok(())
}
