use anyhow::{Context, Result};
use tracing::debug;

use crate::html::{extract_links, extract_structured_data, html_to_text};
use crate::schema::{FetchedItem, SourceKind, POLITE_USER_AGENT};

/// Fetches a single page and extracts readable text plus any structured
/// metadata (title, `og:*`, LD+JSON) that survives a JS-rendered shell.
/// The raw hrefs are kept under `metadata.links` — the rendered `content`
/// is plain text, so this is the only place downstream resource-list
/// detection can still see the page's outbound URLs.
pub async fn fetch_web_page(client: &reqwest::Client, url: &str) -> Result<FetchedItem> {
    let body = client
        .get(url)
        .header("User-Agent", POLITE_USER_AGENT)
        .send()
        .await
        .with_context(|| format!("requesting page {url}"))?
        .text()
        .await
        .with_context(|| format!("reading page body {url}"))?;

    let text = html_to_text(&body, 20_000);
    let structured = extract_structured_data(&body);
    let links = extract_links(&body);

    let title = structured
        .lines()
        .find(|l| l.starts_with("Title: "))
        .map(|l| l.trim_start_matches("Title: ").to_string())
        .unwrap_or_else(|| url.to_string());

    let content = if structured.is_empty() {
        text
    } else {
        format!("{structured}\n\n{text}")
    };

    debug!(url, content_len = content.len(), link_count = links.len(), "fetched web page");

    let mut item = FetchedItem::new(title, content, url, SourceKind::WebPage, url).with_url(url);
    item.metadata = serde_json::json!({ "links": links });
    Ok(item)
}
