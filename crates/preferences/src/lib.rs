pub mod aggregate;
pub mod schema;

use anyhow::Result;
use uuid::Uuid;

pub use aggregate::{aggregate_preferences, SIGNAL_WINDOW_DAYS, TOP_N};
pub use schema::Preferences;

/// Convenience wrapper: load a notebook's signal log and aggregate it.
pub fn learn_preferences(memory: &scoutdesk_memory::MemoryManager, notebook_id: Uuid) -> Result<Preferences> {
    let signals = memory.signals_for(notebook_id)?;
    Ok(aggregate_preferences(&signals))
}
