use std::collections::HashSet;

use url::Url;

const LIST_TITLE_CUES: &[&str] = &["top", "best", "awesome", "resources", "ultimate guide", "roundup"];
const FEED_HINTS: &[&str] = &["/rss", "/feed", ".xml", "/atom"];

/// spec.md §4.3 step 4: a page is a list page if its title carries list
/// cues with ≥5 unique-domain URLs, OR it has ≥8 URLs with URL density
/// >1.5 per 100 words, OR it simply has ≥10 unique-domain URLs.
pub fn is_resource_list_page(title: &str, body_word_count: usize, urls: &[String]) -> bool {
    let unique_domains = unique_domain_count(urls);
    let title_lower = title.to_lowercase();
    let has_list_cue = LIST_TITLE_CUES.iter().any(|cue| title_lower.contains(cue));

    if has_list_cue && unique_domains >= 5 {
        return true;
    }

    let density = if body_word_count > 0 {
        urls.len() as f32 / (body_word_count as f32 / 100.0)
    } else {
        0.0
    };
    if urls.len() >= 8 && density > 1.5 {
        return true;
    }

    unique_domains >= 10
}

fn unique_domain_count(urls: &[String]) -> usize {
    urls.iter()
        .filter_map(|u| Url::parse(u).ok())
        .filter_map(|u| u.host_str().map(|h| h.to_string()))
        .collect::<HashSet<_>>()
        .len()
}

#[derive(Debug, Default)]
pub struct PartitionedLinks {
    pub feed_like: Vec<String>,
    pub regular: Vec<String>,
}

/// Partitions a list page's extracted URLs by feed-like path/filename
/// hints so the expander knows which to treat as feeds vs. plain pages.
pub fn partition_links(urls: &[String]) -> PartitionedLinks {
    let mut out = PartitionedLinks::default();
    for url in urls {
        let lower = url.to_lowercase();
        if FEED_HINTS.iter().any(|hint| lower.contains(hint)) {
            out.feed_like.push(url.clone());
        } else {
            out.regular.push(url.clone());
        }
    }
    out
}

/// spec.md §4.3 step 4: fetch the top 8 feeds (2 articles each) and scrape
/// the top 8 regular pages; the original list page is always dropped.
pub const MAX_EXPANDED_FEEDS: usize = 8;
pub const MAX_ARTICLES_PER_FEED: usize = 2;
pub const MAX_EXPANDED_PAGES: usize = 8;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_urls_is_not_a_list_page() {
        let urls: Vec<String> = (0..4).map(|i| format!("https://site{i}.example.com/a")).collect();
        assert!(!is_resource_list_page("Best tools", 500, &urls));
    }

    #[test]
    fn five_urls_with_list_title_is_a_list_page() {
        let urls: Vec<String> = (0..5).map(|i| format!("https://site{i}.example.com/a")).collect();
        assert!(is_resource_list_page("Top 5 Resources", 500, &urls));
    }

    #[test]
    fn ten_unique_domains_is_always_a_list_page() {
        let urls: Vec<String> = (0..10).map(|i| format!("https://site{i}.example.com/a")).collect();
        assert!(is_resource_list_page("Untitled page", 5000, &urls));
    }

    #[test]
    fn feed_hints_partition_correctly() {
        let urls = vec![
            "https://a.com/rss".to_string(),
            "https://b.com/feed.xml".to_string(),
            "https://c.com/article".to_string(),
        ];
        let partitioned = partition_links(&urls);
        assert_eq!(partitioned.feed_like.len(), 2);
        assert_eq!(partitioned.regular.len(), 1);
    }
}
