use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `_judge_single_item`'s possible verdicts (spec.md §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Reject,
    DeferToUser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgmentResult {
    pub item_id: Uuid,
    pub decision: Decision,
    pub reason: String,
    pub confidence: f32,
    pub modifications: Option<String>,
}

/// Cross-notebook observation surfaced by overwatch/pattern discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    pub kind: String,
    /// The shared entity driving a `cross_reference` insight, when there
    /// is one — lets `surface_insight_if_relevant` match it against a
    /// user's query without re-parsing `summary`.
    pub entity: Option<String>,
    pub summary: String,
    pub notebook_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatedSource {
    pub source: scoutdesk_discovery::DiscoveredSource,
    pub still_relevant: bool,
    pub rationale: String,
}

/// spec.md §4.4 immediate-collect bucketing: approved / pending / rejected
/// / filtered, each with per-item titles for the user-facing summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImmediateCollectionOutcome {
    pub approved: Vec<(Uuid, String)>,
    pub pending: Vec<(Uuid, String)>,
    pub rejected: Vec<(Uuid, String)>,
    pub filtered: Vec<(Uuid, String)>,
    pub partial: bool,
}

impl ImmediateCollectionOutcome {
    pub fn counts(&self) -> HashMap<&'static str, usize> {
        HashMap::from([
            ("approved", self.approved.len()),
            ("pending", self.pending.len()),
            ("rejected", self.rejected.len()),
            ("filtered", self.filtered.len()),
        ])
    }
}
