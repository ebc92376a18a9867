pub mod conversation;
pub mod cross_notebook;
pub mod judge;
pub mod orchestrate;
pub mod schema;
pub mod task;
pub mod user_item;
pub mod validate;

pub use conversation::{conversational_reply, HistoryTurn};
pub use cross_notebook::{discover_cross_workspace_patterns, find_counterarguments, generate_overwatch_aside, surface_insight_if_relevant, synthesize_across_notebooks, CounterargumentResult, SynthesisResult, SynthesisSource};
pub use judge::judge_single_item;
pub use orchestrate::{assign_immediate_collection, judge_collection, orchestrate_collection, orchestrate_notebook_collection};
pub use schema::{Decision, ImmediateCollectionOutcome, Insight, JudgmentResult, ValidatedSource};
pub use task::build_task;
pub use user_item::{score_user_item, ScoredUserItem};
pub use validate::validate_discovered_sources;

use anyhow::Result;
use scoutdesk_config::SupervisorConfig;
use scoutdesk_memory::MemoryManager;
use uuid::Uuid;

/// The global overseer's persisted state: personality and oversight
/// thresholds. Everything else the Supervisor does is a free function over
/// a `MemoryManager` and an `LlmClient`, so it can run cross-notebook
/// without owning any one notebook's data (spec.md §4.4).
pub struct Supervisor {
    data_root: std::path::PathBuf,
    pub config: SupervisorConfig,
}

impl Supervisor {
    pub fn open(data_root: impl Into<std::path::PathBuf>) -> Result<Self> {
        let data_root = data_root.into();
        let config = SupervisorConfig::load_or_default(&data_root)?;
        Ok(Self { data_root, config })
    }

    pub fn save(&self) -> Result<()> {
        self.config.save(&self.data_root)
    }

    pub fn data_root(&self) -> &std::path::Path {
        &self.data_root
    }

    /// `get_learned_preferences(notebook_id) -> Preferences` (spec.md §4.4),
    /// delegated entirely to the Preference Learner.
    pub fn get_learned_preferences(&self, memory: &MemoryManager, notebook_id: Uuid) -> Result<scoutdesk_preferences::Preferences> {
        scoutdesk_preferences::learn_preferences(memory, notebook_id)
    }
}
