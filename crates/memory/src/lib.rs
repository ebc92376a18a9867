pub mod archive;
pub mod event_log;
pub mod manager;
pub mod recent;
pub mod schema;
pub mod signals;
pub mod store;

pub use archive::{Archive, ArchiveHit, MemoryError, Reader};
pub use manager::{MemoryManager, MemoryStats};
pub use recent::{RecentExchangeStore, SUMMARIZATION_TRIGGER};
pub use schema::{
    AccessStats, ArchiveRecord, FactCategory, FactImportance, Namespace, RecentExchange,
    SignalType, UserSignal, WorkingFact,
};
pub use signals::SignalLog;
pub use store::{WorkingFactStore, WORKING_FACTS_TOKEN_BUDGET};
