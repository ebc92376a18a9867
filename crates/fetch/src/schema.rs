use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Feed,
    WebPage,
    Filing,
    VideoChannel,
    VideoKeyword,
    PaperCategory,
    PaperQuery,
    NewsKeyword,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Feed => "feed",
            SourceKind::WebPage => "web_page",
            SourceKind::Filing => "filing",
            SourceKind::VideoChannel => "video_channel",
            SourceKind::VideoKeyword => "video_keyword",
            SourceKind::PaperCategory => "paper_category",
            SourceKind::PaperQuery => "paper_query",
            SourceKind::NewsKeyword => "news_keyword",
        }
    }
}

/// One item returned by an adapter, before dedup/scoring in
/// `scoutdesk-gatherer` (spec.md §4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedItem {
    pub title: String,
    pub url: Option<String>,
    pub content: String,
    pub summary: String,
    pub source_name: String,
    pub source_kind: SourceKind,
    pub source_url: String,
    pub published_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub content_hash: String,
}

impl FetchedItem {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        source_name: impl Into<String>,
        source_kind: SourceKind,
        source_url: impl Into<String>,
    ) -> Self {
        let title = title.into();
        let content = content.into();
        let content_hash = content_hash(&title, &content);
        Self {
            title,
            url: None,
            content,
            summary: String::new(),
            source_name: source_name.into(),
            source_kind,
            source_url: source_url.into(),
            published_date: None,
            metadata: serde_json::Value::Null,
            content_hash,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn with_published_date(mut self, date: DateTime<Utc>) -> Self {
        self.published_date = Some(date);
        self
    }
}

/// `truncatedSHA256(lowercase(title + content[:500]))` — spec.md §4.1's
/// adapter contract, kept as a standalone function so every adapter and the
/// gatherer's dedup pass compute it identically.
pub fn content_hash(title: &str, content: &str) -> String {
    let prefix: String = content.chars().take(500).collect();
    let basis = format!("{title}{prefix}").to_lowercase();
    let mut hasher = Sha256::new();
    hasher.update(basis.as_bytes());
    let digest = hasher.finalize();
    format!("{digest:x}")[..16].to_string()
}

pub const POLITE_USER_AGENT: &str = "scoutdesk/0.1 (+https://github.com/your-org/scoutdesk)";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_case_insensitive_and_prefix_bounded() {
        let a = content_hash("Title", "Some Content here");
        let b = content_hash("title", "some content here");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }
}
