use std::collections::HashMap;

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "of", "in", "on", "at", "to", "for", "with", "by",
    "from", "as", "is", "are", "was", "were", "be", "been", "being", "this", "that", "these",
    "those", "it", "its", "new", "update", "updates", "report", "reports", "says", "said", "will",
    "has", "have", "had", "not", "no", "about", "after", "over", "into", "than", "more", "most",
];

const MIN_WORD_LEN: usize = 4;
const MIN_OCCURRENCES: usize = 2;
const MAX_TOPICS: usize = 8;

fn words(titles: &[String]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for title in titles {
        for word in title.split_whitespace() {
            let cleaned: String = word.chars().filter(|c| c.is_alphanumeric()).collect::<String>().to_lowercase();
            if cleaned.len() < MIN_WORD_LEN || STOP_WORDS.contains(&cleaned.as_str()) {
                continue;
            }
            *counts.entry(cleaned).or_insert(0) += 1;
        }
    }
    counts
}

/// Words appearing ≥2× in this week's titles and never in the prior
/// 7-to-30-day window, after a stop-word filter (spec.md §4.5). Title-only
/// and heuristic by design, not semantic — a cheap signal, not a topic
/// model.
pub fn emerging_topics(this_week_titles: &[String], prior_window_titles: &[String]) -> Vec<String> {
    let this_week = words(this_week_titles);
    let prior = words(prior_window_titles);

    let mut emerging: Vec<(String, usize)> = this_week
        .into_iter()
        .filter(|(word, count)| *count >= MIN_OCCURRENCES && !prior.contains_key(word))
        .collect();
    emerging.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    emerging.into_iter().take(MAX_TOPICS).map(|(word, _)| word).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_seen_only_this_week_twice_is_emerging() {
        let this_week = vec!["Tariff policy shakes markets".to_string(), "New tariff fight begins".to_string()];
        let prior = vec!["Quarterly earnings beat expectations".to_string()];
        let topics = emerging_topics(&this_week, &prior);
        assert!(topics.contains(&"tariff".to_string()));
    }

    #[test]
    fn word_present_in_prior_window_is_not_emerging() {
        let this_week = vec!["Tariff policy shakes markets".to_string(), "New tariff fight begins".to_string()];
        let prior = vec!["Tariff talks resume".to_string()];
        let topics = emerging_topics(&this_week, &prior);
        assert!(!topics.contains(&"tariff".to_string()));
    }

    #[test]
    fn single_occurrence_does_not_qualify() {
        let this_week = vec!["Solitary mention of gizmo".to_string()];
        let topics = emerging_topics(&this_week, &[]);
        assert!(topics.is_empty());
    }
}
