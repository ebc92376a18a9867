use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One recent finding surfaced in a notebook's briefing section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentStory {
    pub title: String,
    pub source: Option<String>,
    pub summary: String,
}

/// Raw per-notebook activity stats for one briefing window (spec.md §4.5).
/// `person_changes` is always empty here — it's sourced from the external
/// people/knowledge-graph module, which spec.md §1 scopes out of the core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotebookBriefingStats {
    pub notebook_id: Uuid,
    pub notebook_name: String,
    pub new_items: usize,
    pub pending_approvals: usize,
    pub top_finding: Option<String>,
    pub recent_stories: Vec<RecentStory>,
    pub person_changes: Vec<String>,
    pub upcoming_key_dates: Vec<String>,
    pub collection_runs: usize,
    pub library_growth_this_week: usize,
    pub library_growth_last_week: usize,
    pub summarized_count: usize,
    pub unread_count: usize,
    pub highlights_this_window: usize,
    pub unfinished_threads: Vec<String>,
    pub emerging_topics: Vec<String>,
    pub one_week_ago_titles: Vec<String>,
    pub cross_notebook_insight: Option<String>,
}

impl NotebookBriefingStats {
    /// Only notebooks with any activity signal are included in a briefing
    /// (spec.md §4.5).
    pub fn has_activity(&self) -> bool {
        self.new_items > 0
            || self.pending_approvals > 0
            || self.collection_runs > 0
            || self.highlights_this_window > 0
            || !self.unfinished_threads.is_empty()
            || !self.emerging_topics.is_empty()
            || self.cross_notebook_insight.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Briefing {
    pub generated_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub narrative: String,
    pub notebooks: Vec<NotebookBriefingStats>,
}
