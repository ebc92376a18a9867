pub mod contextualize;
pub mod dedup;
pub mod diversity;
pub mod gatherer;
pub mod health;
pub mod keywords;
pub mod queue;
pub mod resource_list;
pub mod schema;
pub mod scoring;

pub use gatherer::Gatherer;
pub use queue::{decide, ApprovalQueue, QueueDecision};
pub use scoring::LearnedPreferences;
pub use schema::{
    ApprovalQueueEntry, CollectedItem, CollectionOutcome, CollectionTask, FeedbackType, ItemStatus,
    SourceHealth, SourceHealthRecord, QUEUE_ENTRY_TTL_DAYS,
};
