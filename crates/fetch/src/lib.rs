pub mod adapters;
pub mod fetcher;
pub mod html;
pub mod schema;
pub mod search;

pub use fetcher::{fetch_all, FetchOutcome, DEFAULT_ADAPTER_TIMEOUT};
pub use schema::{content_hash, FetchedItem, SourceKind, POLITE_USER_AGENT};
pub use search::{ReqwestScraper, SearchHit, WebScrape, WebSearch};
