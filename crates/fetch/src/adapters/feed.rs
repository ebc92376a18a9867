use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::schema::{FetchedItem, SourceKind, POLITE_USER_AGENT};

/// spec.md §4.1: per-feed cap of 20 entries — a load-bearing constant, not
/// a tuning knob. Feeds that publish more than this in one poll get
/// truncated rather than flooding a single notebook's run.
pub const PER_FEED_ENTRY_CAP: usize = 20;

pub async fn fetch_feed(client: &reqwest::Client, feed_url: &str) -> Result<Vec<FetchedItem>> {
    let bytes = client
        .get(feed_url)
        .header("User-Agent", POLITE_USER_AGENT)
        .send()
        .await
        .with_context(|| format!("requesting feed {feed_url}"))?
        .bytes()
        .await
        .with_context(|| format!("reading feed body {feed_url}"))?;

    let channel = rss::Channel::read_from(&bytes[..])
        .with_context(|| format!("parsing feed {feed_url} as RSS/Atom"))?;

    let mut items = Vec::new();
    for entry in channel.items().iter().take(PER_FEED_ENTRY_CAP) {
        let title = entry.title().unwrap_or("(untitled)").to_string();
        let content = entry
            .content()
            .or_else(|| entry.description())
            .unwrap_or_default()
            .to_string();
        if content.trim().is_empty() {
            debug!(feed_url, title, "skipping feed entry with empty body");
            continue;
        }

        let published = entry
            .pub_date()
            .and_then(|d| DateTime::parse_from_rfc2822(d).ok())
            .map(|d| d.with_timezone(&Utc));

        let mut item = FetchedItem::new(
            title,
            crate::html::html_to_text(&content, 20_000),
            channel.title().to_string(),
            SourceKind::Feed,
            feed_url,
        );
        if let Some(link) = entry.link() {
            item = item.with_url(link);
        }
        if let Some(p) = published {
            item = item.with_published_date(p);
        }
        items.push(item);
    }

    if items.is_empty() {
        warn!(feed_url, "feed parsed but yielded zero usable entries");
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_feed_cap_is_twenty() {
        assert_eq!(PER_FEED_ENTRY_CAP, 20);
    }
}
