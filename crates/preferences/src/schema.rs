use serde::{Deserialize, Serialize};

/// Output shape of the Preference Learner (spec.md §4.6), consumed by
/// `scoutdesk-gatherer::scoring::LearnedPreferences` and the Supervisor's
/// `get_learned_preferences`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Preferences {
    pub preferred_topics: Vec<String>,
    pub preferred_sources: Vec<String>,
    pub rejected_patterns: Vec<String>,
    pub capture_count: u32,
    pub approval_rate: f32,
    pub highlight_count: u32,
}
