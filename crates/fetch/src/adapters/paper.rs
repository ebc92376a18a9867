use anyhow::{Context, Result};
use serde_json::json;
use tracing::info;

use crate::adapters::feed::fetch_feed;
use crate::schema::{FetchedItem, SourceKind};

const ARXIV_API_BASE: &str = "http://export.arxiv.org/api/query";
const ARXIV_RSS_BASE: &str = "http://export.arxiv.org/rss";

/// Recent papers in a category via arXiv's per-category RSS feed,
/// keyword-filtered against title+summary (category feeds are broad;
/// a category alone doesn't guarantee topical relevance).
pub async fn fetch_category(client: &reqwest::Client, category: &str, keywords: &[String]) -> Result<Vec<FetchedItem>> {
    let feed_url = format!("{ARXIV_RSS_BASE}/{category}");
    let mut items = fetch_feed(client, &feed_url).await.unwrap_or_default();

    items.retain(|item| {
        if keywords.is_empty() {
            return true;
        }
        let haystack = format!("{} {}", item.title, item.content).to_lowercase();
        keywords.iter().any(|kw| haystack.contains(&kw.to_lowercase()))
    });
    for item in &mut items {
        item.source_kind = SourceKind::PaperCategory;
        item.source_name = format!("arXiv {category}");
        item.metadata = json!({"category": category});
    }
    info!(category, count = items.len(), "arXiv category fetch complete");
    Ok(items)
}

/// Direct arXiv API search. No secondary keyword filter — the search
/// query itself already targets relevant content.
pub async fn fetch_query(client: &reqwest::Client, query: &str) -> Result<Vec<FetchedItem>> {
    let resp = client
        .get(ARXIV_API_BASE)
        .query(&[
            ("search_query", format!("all:{query}")),
            ("start", "0".to_string()),
            ("max_results", "10".to_string()),
            ("sortBy", "submittedDate".to_string()),
            ("sortOrder", "descending".to_string()),
        ])
        .send()
        .await
        .with_context(|| format!("querying arXiv API for {query}"))?;

    if !resp.status().is_success() {
        return Ok(Vec::new());
    }
    let xml_text = resp.text().await?;
    let items = parse_arxiv_atom(&xml_text, query);
    info!(query, count = items.len(), "arXiv search complete");
    Ok(items)
}

fn parse_arxiv_atom(xml: &str, query: &str) -> Vec<FetchedItem> {
    let mut items = Vec::new();
    let mut search_from = 0;
    while let Some(start) = xml[search_from..].find("<entry>") {
        let abs_start = search_from + start;
        let end = match xml[abs_start..].find("</entry>") {
            Some(e) => abs_start + e,
            None => break,
        };
        let entry = &xml[abs_start..end];

        let title = extract_tag(entry, "title").unwrap_or_default().replace('\n', " ").trim().to_string();
        let summary = extract_tag(entry, "summary").unwrap_or_default().replace('\n', " ").trim().to_string();
        let link = extract_tag(entry, "id").unwrap_or_default();

        if !title.is_empty() {
            let item = FetchedItem::new(title, summary.clone(), "arXiv Search", SourceKind::PaperQuery, ARXIV_API_BASE)
                .with_url(link)
                .with_summary(summary.chars().take(300).collect::<String>());
            let mut item = item;
            item.metadata = json!({"query": query});
            items.push(item);
        }

        search_from = end + "</entry>".len();
    }
    items
}

fn extract_tag(entry: &str, tag: &str) -> Option<String> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = entry.find(&open)? + open.len();
    let end = entry[start..].find(&close)? + start;
    Some(entry[start..end].to_string())
}
