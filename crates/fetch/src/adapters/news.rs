use anyhow::Result;
use serde_json::json;
use tracing::info;
use url::form_urlencoded;

use crate::adapters::feed::fetch_feed;
use crate::schema::SourceKind;
use crate::schema::FetchedItem;

const GOOGLE_NEWS_RSS: &str = "https://news.google.com/rss/search";

/// Google News RSS search for a keyword. Deliberately no secondary
/// substring filter on top of the search query — a multi-word smart
/// query ("transformer scaling laws 2026") rarely appears verbatim in
/// article titles, so filtering again here would just discard hits.
pub async fn fetch_keyword(client: &reqwest::Client, keyword: &str) -> Result<Vec<FetchedItem>> {
    let q: String = form_urlencoded::byte_serialize(keyword.as_bytes()).collect();
    let feed_url = format!("{GOOGLE_NEWS_RSS}?q={q}&hl=en-US&gl=US&ceid=US:en");

    let mut items = fetch_feed(client, &feed_url).await.unwrap_or_default();
    for item in &mut items {
        item.source_kind = SourceKind::NewsKeyword;
        item.source_name = "Google News".to_string();
        item.metadata = json!({"keyword": keyword});
    }
    info!(keyword, count = items.len(), "news keyword fetch complete");
    Ok(items)
}
