use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Access scope tag on archive records — enforces the agent boundary
/// between the per-notebook Gatherer and the global Supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    System,
    Supervisor,
    Gatherer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactCategory {
    UserFact,
    Preference,
    ProjectContext,
    Decision,
    Date,
    Relationship,
    Theme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactImportance {
    Low,
    Medium,
    High,
    Critical,
}

/// A small key/value assertion in the working-facts tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingFact {
    pub id: Uuid,
    pub notebook_id: Option<Uuid>,
    pub category: FactCategory,
    pub importance: FactImportance,
    pub key: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
}

impl WorkingFact {
    /// Rough token cost used for the working-facts budget: ~4 chars/token,
    /// the same heuristic the teacher's prompt builder uses for context
    /// windows.
    pub fn approx_tokens(&self) -> usize {
        (self.key.len() + self.value.len()) / 4 + 1
    }
}

/// One entry in the append-only recent-exchanges log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentExchange {
    pub id: Uuid,
    pub notebook_id: Uuid,
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub topic_tags: Vec<String>,
    #[serde(default)]
    pub entity_tags: Vec<String>,
    #[serde(default)]
    pub summarized: bool,
}

/// A long-term archive record. Immutable once written — the only mutable
/// state tracked per record is the access-counter side table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveRecord {
    pub id: Uuid,
    pub namespace: Namespace,
    pub source_notebook_id: Option<Uuid>,
    pub content: String,
    pub content_type: String,
    pub source_type: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub entities: Vec<String>,
    pub importance: f32,
    pub created_at: DateTime<Utc>,
    /// The embedding is never assumed normalized by callers — similarity
    /// always goes through cosine, never a raw dot product.
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

/// Mutable side table for an immutable archive record (spec.md §3 —
/// "Archive records are immutable except for an access-counter side table").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessStats {
    pub access_count: u64,
    pub last_accessed: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    View,
    Click,
    Ignore,
    ItemApproved,
    ItemRejected,
    SourceApproved,
    SourceRejected,
    UserCapture,
    TopicInterest,
    ContentHighlighted,
    SearchMiss,
}

/// One append-only entry in the user-signals log. Signals are never
/// mutated; the Preference Learner derives a profile by aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSignal {
    pub id: Uuid,
    pub notebook_id: Uuid,
    pub signal_type: SignalType,
    #[serde(default)]
    pub item_id: Option<Uuid>,
    #[serde(default)]
    pub query: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl UserSignal {
    pub fn new(notebook_id: Uuid, signal_type: SignalType) -> Self {
        Self {
            id: Uuid::new_v4(),
            notebook_id,
            signal_type,
            item_id: None,
            query: None,
            timestamp: Utc::now(),
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_item(mut self, item_id: Uuid) -> Self {
        self.item_id = Some(item_id);
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}
