use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    Approved,
    Rejected,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceHealth {
    Healthy,
    Degraded,
    Failing,
    Dead,
    Unknown,
}

impl SourceHealth {
    /// spec.md §4.3 scoring contract: healthy=0.9, degraded=0.6,
    /// failing/dead=0.3, unknown=0.5.
    pub fn trust_score(&self) -> f32 {
        match self {
            SourceHealth::Healthy => 0.9,
            SourceHealth::Degraded => 0.6,
            SourceHealth::Failing | SourceHealth::Dead => 0.3,
            SourceHealth::Unknown => 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceHealthRecord {
    pub source_name: String,
    pub health: SourceHealth,
    pub last_success: Option<DateTime<Utc>>,
    pub last_failure: Option<DateTime<Utc>>,
    pub failure_count: u32,
    pub avg_response_time_ms: f64,
    pub items_collected: u64,
}

impl SourceHealthRecord {
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            health: SourceHealth::Unknown,
            last_success: None,
            last_failure: None,
            failure_count: 0,
            avg_response_time_ms: 0.0,
            items_collected: 0,
        }
    }

    /// `bad_source` rejection feedback degrades health by one step
    /// (spec.md §4.3 rejection handling).
    pub fn degrade(&mut self) {
        self.health = match self.health {
            SourceHealth::Healthy => SourceHealth::Degraded,
            SourceHealth::Degraded | SourceHealth::Unknown => SourceHealth::Failing,
            SourceHealth::Failing => SourceHealth::Dead,
            SourceHealth::Dead => SourceHealth::Dead,
        };
        self.failure_count += 1;
        self.last_failure = Some(Utc::now());
    }

    pub fn record_success(&mut self) {
        self.health = SourceHealth::Healthy;
        self.last_success = Some(Utc::now());
        self.items_collected += 1;
    }
}

/// Ephemeral item — never persisted once `is_duplicate` is true
/// (spec.md §3 invariant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectedItem {
    pub id: Uuid,
    pub title: String,
    pub url: Option<String>,
    pub content: String,
    pub preview: String,
    pub source_name: String,
    pub source_kind: String,
    pub collected_at: DateTime<Utc>,

    pub relevance_score: f32,
    pub source_trust: f32,
    pub freshness_score: f32,
    pub overall_confidence: f32,
    pub confidence_reasons: Vec<String>,

    pub content_hash: String,
    pub is_duplicate: bool,
    pub duplicate_of: Option<Uuid>,

    pub delta_summary: Option<String>,
    pub is_new_topic: bool,
    pub temporal_context: Option<String>,
    pub knowledge_overlap: f32,
    pub related_titles: Vec<String>,

    pub status: ItemStatus,
}

impl CollectedItem {
    pub fn from_fetched(fetched: &scoutdesk_fetch::FetchedItem) -> Self {
        let preview = fetched.content.chars().take(280).collect::<String>();
        Self {
            id: Uuid::new_v4(),
            title: fetched.title.clone(),
            url: fetched.url.clone(),
            content: fetched.content.clone(),
            preview,
            source_name: fetched.source_name.clone(),
            source_kind: fetched.source_kind.as_str().to_string(),
            collected_at: fetched.published_date.unwrap_or_else(Utc::now),
            relevance_score: 0.0,
            source_trust: 0.5,
            freshness_score: 0.0,
            overall_confidence: 0.0,
            confidence_reasons: Vec::new(),
            content_hash: fetched.content_hash.clone(),
            is_duplicate: false,
            duplicate_of: None,
            delta_summary: None,
            is_new_topic: true,
            temporal_context: None,
            knowledge_overlap: 0.0,
            related_titles: Vec::new(),
            status: ItemStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalQueueEntry {
    pub item: CollectedItem,
    pub queued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// spec.md §3: queue entries expire 7 days after queueing.
pub const QUEUE_ENTRY_TTL_DAYS: i64 = 7;

impl ApprovalQueueEntry {
    pub fn new(item: CollectedItem) -> Self {
        let queued_at = Utc::now();
        Self {
            item,
            queued_at,
            expires_at: queued_at + chrono::Duration::days(QUEUE_ENTRY_TTL_DAYS),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackType {
    WrongTopic,
    BadSource,
    TooOld,
    AlreadyKnew,
    Other,
}

/// Collection task handed to the Gatherer by the Supervisor (spec.md §4.4).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionTask {
    pub notebook_id: Uuid,
    pub intent: String,
    pub focus_areas: Vec<String>,
    pub mode: String,
    pub avoid_similar_to: Vec<String>,
    pub supervisor_directive: Option<String>,
    pub specific_query: Option<String>,
    pub smart_queries: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionOutcome {
    pub items: Vec<CollectedItem>,
    pub partial: bool,
}
