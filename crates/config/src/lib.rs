pub mod app;
pub mod notebook;
pub mod supervisor;

pub use app::AppConfig;
pub use notebook::{
    ApprovalMode, CollectionMode, Filters, FilingSource, NotebookProfile, Schedule, SourcesConfig,
};
pub use supervisor::{OversightThresholds, SupervisorConfig};
