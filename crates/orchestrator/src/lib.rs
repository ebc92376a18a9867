pub mod interfaces;
pub mod trigger;

pub use interfaces::{
    FileNotebookStore, FileSourceStore, NotebookStore, NotebookSummary, RagIngestor, SearchHit, SourceRecord, SourceStore,
    SourceUpdatedEvent, WebScrape, WebSearch, Notifier,
};
pub use trigger::{is_due, tick, TickReport};
