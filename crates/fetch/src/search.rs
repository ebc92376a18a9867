use async_trait::async_trait;

/// One hit returned by [`WebSearch`] — deliberately thin, the fetcher and
/// discovery crates each shape it into their own record types.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// External web-search capability (spec.md §6). The core never embeds a
/// particular search provider; callers inject an implementation.
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> anyhow::Result<Vec<SearchHit>>;
}

/// External single-page scrape capability, distinct from [`WebSearch`] —
/// `video_keyword`/`paper_query`/`news_keyword` sources search, while
/// source discovery also needs to pull a specific candidate URL's text.
#[async_trait]
pub trait WebScrape: Send + Sync {
    async fn scrape(&self, url: &str) -> anyhow::Result<String>;
}

/// A [`WebScrape`] backed by this crate's own page fetcher and HTML
/// extractor — the in-process default when no external scraping
/// capability is injected.
pub struct ReqwestScraper {
    client: reqwest::Client,
}

impl ReqwestScraper {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WebScrape for ReqwestScraper {
    async fn scrape(&self, url: &str) -> anyhow::Result<String> {
        let item = crate::adapters::web_page::fetch_web_page(&self.client, url).await?;
        Ok(item.content)
    }
}
