use chrono::{DateTime, Utc};
use scoutdesk_llm::{ChatRequest, LlmClient};
use tracing::warn;

use crate::schema::{Briefing, NotebookBriefingStats};

const MIN_WORDS: usize = 200;
const MAX_WORDS: usize = 400;

fn structured_stats_json(notebooks: &[NotebookBriefingStats]) -> String {
    serde_json::to_string_pretty(notebooks).unwrap_or_default()
}

/// Deterministic fallback used when the model returns nothing usable
/// (spec.md §4.5, §7 "briefing falls back to structured text").
fn fallback_narrative(notebooks: &[NotebookBriefingStats]) -> String {
    let mut out = String::from("# Briefing\n\n");
    if notebooks.is_empty() {
        out.push_str("Nothing new since your last visit.\n");
        return out;
    }
    for notebook in notebooks {
        out.push_str(&format!("## {}\n", notebook.notebook_name));
        out.push_str(&format!(
            "- {} new item(s), {} pending approval(s)\n",
            notebook.new_items, notebook.pending_approvals
        ));
        if let Some(top) = &notebook.top_finding {
            out.push_str(&format!("- Top finding: {top}\n"));
        }
        for story in notebook.recent_stories.iter().take(3) {
            out.push_str(&format!("- {}\n", story.title));
        }
        if !notebook.emerging_topics.is_empty() {
            out.push_str(&format!("- Emerging: {}\n", notebook.emerging_topics.join(", ")));
        }
        if !notebook.one_week_ago_titles.is_empty() {
            out.push_str(&format!("- One week ago: {}\n", notebook.one_week_ago_titles.join(", ")));
        }
        if let Some(insight) = &notebook.cross_notebook_insight {
            out.push_str(&format!("- {insight}\n"));
        }
        out.push('\n');
    }
    out
}

/// `generate_briefing(last_seen) -> Briefing` (spec.md §4.4/§4.5). Builds
/// structured per-notebook stats into a prompt and asks for a concise
/// markdown narrative; falls back to a deterministic structured summary on
/// an empty or error-shaped response.
pub async fn generate_briefing(
    llm: &dyn LlmClient,
    model: &str,
    last_seen: DateTime<Utc>,
    notebooks: Vec<NotebookBriefingStats>,
) -> Briefing {
    let active: Vec<NotebookBriefingStats> = notebooks.into_iter().filter(|n| n.has_activity()).collect();

    let narrative = if active.is_empty() {
        "Nothing new since your last visit — check back after the next collection run.".to_string()
    } else {
        let stats_json = structured_stats_json(&active);
        let prompt = format!(
            "Here is structured activity data for a set of research notebooks since {last_seen}:\n\n{stats_json}\n\n\
Write a concise ({MIN_WORDS}-{MAX_WORDS} word) markdown briefing with these sections, in order: \
lead, per-notebook updates, research momentum, coming up, unfinished threads, emerging interests, \
\"one week ago\", did-you-know (only if the other sections are thin), suggested action.\n\
Be specific, reference actual titles and numbers from the data, and skip a section entirely if \
there's nothing to say."
        );
        let request = ChatRequest::new(prompt, model).with_temperature(0.6).with_timeout(std::time::Duration::from_secs(45));
        match llm.chat_completion(request).await {
            Ok(response) if !response.looks_like_error() && response.text.split_whitespace().count() > 10 => response.text,
            Ok(response) => {
                warn!(response = %response.text, "briefing narrative response too thin or error-shaped; using fallback");
                fallback_narrative(&active)
            }
            Err(error) => {
                warn!(%error, "briefing narrative chat_completion failed; using fallback");
                fallback_narrative(&active)
            }
        }
    };

    Briefing { generated_at: Utc::now(), last_seen, narrative, notebooks: active }
}
