use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::schema::{FetchedItem, SourceKind};

const SEC_SUBMISSIONS_BASE: &str = "https://data.sec.gov/submissions";
const SEC_EFTS_URL: &str = "https://efts.sec.gov/LATEST/search-index";
const SEC_TICKERS_URL: &str = "https://www.sec.gov/files/company_tickers.json";
const SEC_USER_AGENT: &str = "scoutdesk research@scoutdesk.app";

const MAX_FILINGS_PER_TICKER: usize = 10;
const MIN_FILING_DATE: &str = "2023-01-01";

#[derive(Debug, Deserialize)]
struct TickerEntry {
    cik_str: serde_json::Value,
    ticker: String,
    title: String,
}

/// Resolves a bare ticker (e.g. `"COST"`) to its SEC CIK and display name.
///
/// This lookup exists for exactly one reason: EDGAR's full-text search
/// collides tickers with common English words ("COST" vs. the word
/// "cost"). The submissions API keyed by CIK sidesteps the problem
/// entirely, so ticker resolution always comes before any text search.
pub async fn resolve_ticker(client: &reqwest::Client, ticker: &str) -> Result<Option<(String, String)>> {
    let resp = client
        .get(SEC_TICKERS_URL)
        .header("Accept", "application/json")
        .header("User-Agent", SEC_USER_AGENT)
        .send()
        .await?;

    if !resp.status().is_success() {
        warn!(status = %resp.status(), "SEC company_tickers.json request failed");
        return Ok(None);
    }

    let map: std::collections::HashMap<String, TickerEntry> = resp.json().await?;
    let ticker_upper = ticker.to_ascii_uppercase();
    for entry in map.values() {
        if entry.ticker.to_ascii_uppercase() == ticker_upper {
            let cik = entry.cik_str.to_string().trim_matches('"').to_string();
            return Ok(Some((cik, entry.title.clone())));
        }
    }
    Ok(None)
}

async fn fetch_via_submissions(
    client: &reqwest::Client,
    ticker: &str,
    company_name: &str,
    cik: &str,
    filing_types: &[String],
) -> Result<Vec<FetchedItem>> {
    let cik_padded = format!("{cik:0>10}");
    let url = format!("{SEC_SUBMISSIONS_BASE}/CIK{cik_padded}.json");

    let resp = client
        .get(&url)
        .header("Accept", "application/json")
        .header("User-Agent", SEC_USER_AGENT)
        .send()
        .await?;

    if !resp.status().is_success() {
        return Ok(Vec::new());
    }

    let data: serde_json::Value = resp.json().await?;
    let recent = &data["filings"]["recent"];
    let forms = recent["form"].as_array().cloned().unwrap_or_default();
    let dates = recent["filingDate"].as_array().cloned().unwrap_or_default();
    let accessions = recent["accessionNumber"].as_array().cloned().unwrap_or_default();
    let primary_docs = recent["primaryDocument"].as_array().cloned().unwrap_or_default();
    let descriptions = recent["primaryDocDescription"].as_array().cloned().unwrap_or_default();
    let display_name = data["name"].as_str().unwrap_or(company_name).to_string();

    let mut items = Vec::new();
    for i in 0..forms.len().min(50) {
        let form = forms[i].as_str().unwrap_or_default();
        if !filing_types.iter().any(|f| f == form) {
            continue;
        }
        let filing_date = dates.get(i).and_then(|d| d.as_str()).unwrap_or_default();
        if !filing_date.is_empty() && filing_date < MIN_FILING_DATE {
            continue;
        }

        let accession_raw = accessions.get(i).and_then(|a| a.as_str()).unwrap_or_default();
        let accession = accession_raw.replace('-', "");
        let primary_doc = primary_docs.get(i).and_then(|d| d.as_str()).unwrap_or_default();
        let description = descriptions
            .get(i)
            .and_then(|d| d.as_str())
            .filter(|d| !d.is_empty())
            .map(|d| d.to_string())
            .unwrap_or_else(|| format!("{form} filing"));

        let filing_url = if !accession.is_empty() && !primary_doc.is_empty() {
            format!("https://www.sec.gov/Archives/edgar/data/{cik}/{accession}/{primary_doc}")
        } else {
            format!("https://www.sec.gov/cgi-bin/browse-edgar?action=getcompany&CIK={cik}&type={form}")
        };

        let published = NaiveDate::parse_from_str(filing_date, "%Y-%m-%d")
            .ok()
            .map(|d| DateTime::<Utc>::from_naive_utc_and_offset(d.and_hms_opt(0, 0, 0).unwrap(), Utc));

        let title = format!("{display_name} ({ticker}) - {form}: {description}");
        let content = format!("{form} filing for {display_name} ({ticker}) filed on {filing_date}. {description}");

        let mut item = FetchedItem::new(
            title,
            content,
            format!("SEC EDGAR - {display_name}"),
            SourceKind::Filing,
            SEC_SUBMISSIONS_BASE,
        )
        .with_url(filing_url)
        .with_summary(format!("{form} filing for {display_name} filed {filing_date}"));
        item.metadata = json!({
            "ticker": ticker,
            "company_name": display_name,
            "filing_type": form,
            "cik": cik,
            "accession": accession_raw,
        });
        if let Some(p) = published {
            item = item.with_published_date(p);
        }
        items.push(item);

        if items.len() >= MAX_FILINGS_PER_TICKER {
            break;
        }
    }

    Ok(items)
}

/// Fallback path when no CIK can be resolved: EFTS full-text search using
/// a *quoted* company name. Never issues a bare-ticker text search.
async fn fetch_via_efts(
    client: &reqwest::Client,
    ticker: &str,
    company_name: &str,
    filing_types: &[String],
) -> Result<Vec<FetchedItem>> {
    let search_name = if company_name.is_empty() { ticker } else { company_name };
    let search_term = format!("\"{search_name}\"");

    let mut items = Vec::new();
    for filing_type in filing_types.iter().take(3) {
        let resp = client
            .get(SEC_EFTS_URL)
            .query(&[
                ("q", search_term.as_str()),
                ("dateRange", "custom"),
                ("startdt", MIN_FILING_DATE),
                ("forms", filing_type.as_str()),
            ])
            .header("Accept", "application/json")
            .header("User-Agent", SEC_USER_AGENT)
            .send()
            .await?;

        if !resp.status().is_success() {
            continue;
        }
        let data: serde_json::Value = resp.json().await?;
        let hits = data["hits"]["hits"].as_array().cloned().unwrap_or_default();

        for hit in hits.iter().take(3) {
            let source = &hit["_source"];
            let display_name = source["display_names"][0].as_str().unwrap_or("Filing");
            let file_date = source["file_date"].as_str().unwrap_or_default();
            let cik = source["ciks"][0].as_str().unwrap_or_default();

            let title = format!("{search_name} {filing_type}: {display_name}");
            let content = source["file_description"]
                .as_str()
                .filter(|d| !d.is_empty())
                .map(|d| d.to_string())
                .unwrap_or_else(|| format!("{filing_type} filing for {search_name}"));

            let mut item = FetchedItem::new(
                title,
                content,
                format!("SEC EDGAR - {search_name}"),
                SourceKind::Filing,
                SEC_SUBMISSIONS_BASE,
            )
            .with_url(format!(
                "https://www.sec.gov/cgi-bin/browse-edgar?action=getcompany&CIK={ticker}&type={filing_type}"
            ))
            .with_summary(format!("{filing_type} filing for {search_name}"));
            item.metadata = json!({
                "ticker": ticker,
                "company_name": company_name,
                "filing_type": filing_type,
                "cik": cik,
            });
            if let Ok(d) = NaiveDate::parse_from_str(file_date, "%Y-%m-%d") {
                item = item.with_published_date(DateTime::<Utc>::from_naive_utc_and_offset(
                    d.and_hms_opt(0, 0, 0).unwrap(),
                    Utc,
                ));
            }
            items.push(item);
        }
    }

    Ok(items)
}

/// Fetches recent SEC filings for one ticker/company. Always resolves
/// through CIK-based lookup first; only falls back to quoted-name EFTS
/// search when no CIK could be resolved.
pub async fn fetch_filings(
    client: &reqwest::Client,
    ticker: Option<&str>,
    company_name: Option<&str>,
    filing_types: &[String],
) -> Result<Vec<FetchedItem>> {
    let company_name = company_name.unwrap_or_default();
    let ticker = match (ticker, company_name.is_empty()) {
        (None, true) => return Ok(Vec::new()),
        (Some(t), _) => t,
        (None, false) => "",
    };

    if !ticker.is_empty() {
        if let Some((cik, resolved_name)) = resolve_ticker(client, ticker).await.unwrap_or(None) {
            let name = if company_name.is_empty() { resolved_name.as_str() } else { company_name };
            let items = fetch_via_submissions(client, ticker, name, &cik, filing_types).await?;
            if !items.is_empty() {
                info!(ticker, count = items.len(), "SEC filings via submissions API");
                return Ok(items);
            }
        }
    }

    let items = fetch_via_efts(client, ticker, company_name, filing_types).await?;
    info!(ticker, company_name, count = items.len(), "SEC filings via EFTS fallback");
    Ok(items)
}
