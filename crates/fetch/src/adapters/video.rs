use anyhow::Result;
use serde_json::json;
use tracing::warn;
use url::form_urlencoded;

use crate::adapters::feed::fetch_feed;
use crate::schema::{FetchedItem, SourceKind};

const YOUTUBE_CHANNEL_RSS: &str = "https://www.youtube.com/feeds/videos.xml";

/// Fetches recent uploads from a channel's RSS feed, then applies a
/// title-only keyword filter when keywords are given — a channel monitor
/// cares about relevance, unlike a keyword search which already targets it.
pub async fn fetch_channel(client: &reqwest::Client, channel_id: &str, keywords: &[String]) -> Result<Vec<FetchedItem>> {
    let feed_url = format!("{YOUTUBE_CHANNEL_RSS}?channel_id={channel_id}");
    let mut items = fetch_feed(client, &feed_url).await.unwrap_or_else(|e| {
        warn!(channel_id, error = %e, "youtube channel feed fetch failed");
        Vec::new()
    });

    items.retain(|item| {
        keywords.is_empty() || keywords.iter().any(|kw| item.title.to_lowercase().contains(&kw.to_lowercase()))
    });
    for item in &mut items {
        item.source_kind = SourceKind::VideoChannel;
        item.source_name = format!("YouTube channel {channel_id}");
        item.metadata = json!({"channel_id": channel_id});
    }
    Ok(items)
}

/// No public YouTube search RSS exists. This produces a single
/// monitoring marker item rather than fabricating video results — a
/// real implementation would need the YouTube Data API and an
/// injected credential, which is outside this crate's boundary.
pub fn fetch_keyword_marker(keyword: &str) -> FetchedItem {
    let query: String = form_urlencoded::byte_serialize(keyword.as_bytes()).collect();
    let mut item = FetchedItem::new(
        format!("YouTube monitoring: {keyword}"),
        format!("Monitoring YouTube for videos about '{keyword}'"),
        "YouTube Search",
        SourceKind::VideoKeyword,
        "https://www.youtube.com",
    )
    .with_url(format!("https://www.youtube.com/results?search_query={query}"))
    .with_summary(format!("YouTube search results for '{keyword}'"));
    item.metadata = json!({"keyword": keyword, "search_type": "keyword_monitoring"});
    item
}
