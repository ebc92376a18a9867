pub mod approvals;
pub mod briefing;
pub mod collect;
pub mod discover;
pub mod notebook;
