use chrono::{DateTime, Duration, Utc};
use scoutdesk_gatherer::Gatherer;
use scoutdesk_memory::{FactCategory, MemoryManager, Reader, SignalType};

use crate::emerging::emerging_topics;
use crate::schema::{NotebookBriefingStats, RecentStory};

const ENUMERATE_LIMIT: usize = 500;
const TOP_STORIES: usize = 5;
const ONE_WEEK_AGO_MIN_DAYS: i64 = 6;
const ONE_WEEK_AGO_MAX_DAYS: i64 = 8;
const PRIOR_WINDOW_MAX_DAYS: i64 = 30;
const PRIOR_WINDOW_MIN_DAYS: i64 = 7;

fn title_of(content: &str) -> String {
    content.lines().next().unwrap_or(content).chars().take(120).collect()
}

/// Gathers one notebook's raw activity stats for the window since
/// `last_seen` (spec.md §4.5). `collection_runs` is supplied by the caller
/// (the Ambient Orchestrator tracks how many runs it dispatched this
/// window) rather than re-derived here.
pub fn gather_notebook_stats(
    memory: &mut MemoryManager,
    gatherer: &Gatherer,
    notebook_name: &str,
    last_seen: DateTime<Utc>,
    collection_runs: usize,
) -> NotebookBriefingStats {
    let notebook_id = gatherer.notebook_id;
    let now = Utc::now();

    // Enumerate every archive record this notebook's Gatherer can see, via
    // the empty-query + min_similarity=-1.0 trick: `cosine_similarity`
    // returns exactly 0.0 on a length mismatch, which is always > -1.0, so
    // every record carrying an embedding matches.
    let hits = memory.search_archive(Reader::Gatherer { notebook_id }, &[], ENUMERATE_LIMIT, -1.0);
    let mut records: Vec<&scoutdesk_memory::ArchiveRecord> =
        hits.into_iter().filter_map(|(id, _)| memory.get_archive_record(id)).collect();
    records.sort_by_key(|r| std::cmp::Reverse(r.created_at));

    let collected: Vec<&scoutdesk_memory::ArchiveRecord> =
        records.iter().copied().filter(|r| r.content_type == "collected_item").collect();

    let new_items = collected.iter().copied().filter(|r| r.created_at > last_seen).count();

    let this_week_start = now - Duration::days(7);
    let last_week_start = now - Duration::days(14);
    let library_growth_this_week = collected.iter().copied().filter(|r| r.created_at > this_week_start).count();
    let library_growth_last_week = collected
        .iter()
        .copied()
        .filter(|r| r.created_at > last_week_start && r.created_at <= this_week_start)
        .count();

    let top_finding = collected
        .iter()
        .copied()
        .filter(|r| r.created_at > last_seen)
        .max_by(|a, b| a.importance.total_cmp(&b.importance))
        .map(|r| title_of(&r.content));

    let mut since_last_seen: Vec<&scoutdesk_memory::ArchiveRecord> =
        collected.iter().copied().filter(|r| r.created_at > last_seen).collect();
    since_last_seen.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    let recent_stories = since_last_seen
        .iter()
        .copied()
        .take(TOP_STORIES)
        .map(|r| RecentStory {
            title: title_of(&r.content),
            source: Some(r.source_type.clone()),
            summary: r.content.chars().take(200).collect(),
        })
        .collect();

    let one_week_ago_titles = collected
        .iter()
        .copied()
        .filter(|r| {
            let age = now - r.created_at;
            age >= Duration::days(ONE_WEEK_AGO_MIN_DAYS) && age <= Duration::days(ONE_WEEK_AGO_MAX_DAYS)
        })
        .map(|r| title_of(&r.content))
        .collect();

    let this_week_titles: Vec<String> = collected
        .iter()
        .copied()
        .filter(|r| r.created_at > this_week_start)
        .map(|r| title_of(&r.content))
        .collect();
    let prior_window_titles: Vec<String> = collected
        .iter()
        .copied()
        .filter(|r| {
            let age = now - r.created_at;
            age > Duration::days(PRIOR_WINDOW_MIN_DAYS) && age <= Duration::days(PRIOR_WINDOW_MAX_DAYS)
        })
        .map(|r| title_of(&r.content))
        .collect();
    let topics = emerging_topics(&this_week_titles, &prior_window_titles);

    let pending_approvals = gatherer.get_pending_approvals().len();

    let signals = memory.signals_for(notebook_id).unwrap_or_default();
    let highlights_this_window = signals
        .iter()
        .filter(|s| s.signal_type == SignalType::ContentHighlighted && s.timestamp > last_seen)
        .count();

    let exchanges = memory.recent_exchanges(notebook_id, 200).unwrap_or_default();
    let summarized_count = exchanges.iter().filter(|e| e.summarized).count();
    let unread_count = exchanges.iter().filter(|e| !e.summarized).count();
    let unfinished_threads = match exchanges.last() {
        Some(last) if last.role == "user" && last.content.trim_end().ends_with('?') => {
            vec![title_of(&last.content)]
        }
        _ if exchanges.len() <= 3 && !exchanges.is_empty() => vec!["a conversation just getting started".to_string()],
        _ => Vec::new(),
    };

    let upcoming_key_dates = memory
        .working_facts()
        .iter()
        .filter(|f| f.category == FactCategory::Date && (f.notebook_id.is_none() || f.notebook_id == Some(notebook_id)))
        .filter_map(|f| {
            let date: DateTime<Utc> = f.value.parse().ok()?;
            let delta = date - now;
            (delta >= Duration::zero() && delta <= Duration::days(7)).then(|| format!("{}: {}", f.key, f.value))
        })
        .collect();

    NotebookBriefingStats {
        notebook_id,
        notebook_name: notebook_name.to_string(),
        new_items,
        pending_approvals,
        top_finding,
        recent_stories,
        person_changes: Vec::new(),
        upcoming_key_dates,
        collection_runs,
        library_growth_this_week,
        library_growth_last_week,
        summarized_count,
        unread_count,
        highlights_this_window,
        unfinished_threads,
        emerging_topics: topics,
        one_week_ago_titles,
        cross_notebook_insight: None,
    }
}
