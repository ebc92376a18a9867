use std::collections::HashMap;

use chrono::{Duration, Utc};
use scoutdesk_memory::{SignalType, UserSignal};

use crate::schema::Preferences;

/// spec.md §4.6: aggregate the last 90 days of signals.
pub const SIGNAL_WINDOW_DAYS: i64 = 90;
pub const TOP_N: usize = 10;

fn string_field(metadata: &serde_json::Value, key: &str) -> Option<String> {
    metadata.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

fn string_list(metadata: &serde_json::Value, key: &str) -> Vec<String> {
    metadata
        .get(key)
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

fn top_n(weights: HashMap<String, f32>, n: usize) -> Vec<String> {
    let mut ranked: Vec<(String, f32)> = weights.into_iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.into_iter().take(n).map(|(k, _)| k).collect()
}

fn dedup_preserve_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items.into_iter().filter(|item| seen.insert(item.clone())).collect()
}

/// Signal-weight aggregation: `content_highlighted` contributes ×3 to
/// topic counts and ×2 to entity counts (folded into the same
/// `preferred_topics` ranking since the output shape has no separate
/// entities field); `user_capture` ×2; `topic_interest` ×1;
/// `item_approved`/`source_approved` increment source counts;
/// `source_rejected` feeds `rejected_patterns`.
pub fn aggregate_preferences(signals: &[UserSignal]) -> Preferences {
    let cutoff = Utc::now() - Duration::days(SIGNAL_WINDOW_DAYS);

    let mut topic_weights: HashMap<String, f32> = HashMap::new();
    let mut source_weights: HashMap<String, f32> = HashMap::new();
    let mut rejected_patterns = Vec::new();
    let mut capture_count = 0u32;
    let mut highlight_count = 0u32;
    let mut approvals = 0u32;
    let mut rejections = 0u32;

    for signal in signals {
        if signal.timestamp < cutoff {
            continue;
        }

        match signal.signal_type {
            SignalType::ContentHighlighted => {
                highlight_count += 1;
                for topic in string_list(&signal.metadata, "topics") {
                    *topic_weights.entry(topic).or_insert(0.0) += 3.0;
                }
                for entity in string_list(&signal.metadata, "entities") {
                    *topic_weights.entry(entity).or_insert(0.0) += 2.0;
                }
            }
            SignalType::UserCapture => {
                capture_count += 1;
                for topic in string_list(&signal.metadata, "topics") {
                    *topic_weights.entry(topic).or_insert(0.0) += 2.0;
                }
            }
            SignalType::TopicInterest => {
                let topic = string_field(&signal.metadata, "topic").or_else(|| signal.query.clone());
                if let Some(topic) = topic {
                    *topic_weights.entry(topic).or_insert(0.0) += 1.0;
                }
            }
            SignalType::ItemApproved | SignalType::SourceApproved => {
                approvals += u32::from(signal.signal_type == SignalType::ItemApproved);
                if let Some(source) = string_field(&signal.metadata, "source_name") {
                    *source_weights.entry(source).or_insert(0.0) += 1.0;
                }
            }
            SignalType::ItemRejected => {
                rejections += 1;
            }
            SignalType::SourceRejected => {
                rejections += 1;
                let pattern = string_field(&signal.metadata, "pattern").or_else(|| string_field(&signal.metadata, "source_name"));
                if let Some(pattern) = pattern {
                    rejected_patterns.push(pattern);
                }
            }
            SignalType::View | SignalType::Click | SignalType::Ignore | SignalType::SearchMiss => {}
        }
    }

    let approval_rate = if approvals + rejections > 0 {
        approvals as f32 / (approvals + rejections) as f32
    } else {
        0.0
    };

    Preferences {
        preferred_topics: top_n(topic_weights, TOP_N),
        preferred_sources: top_n(source_weights, TOP_N),
        rejected_patterns: dedup_preserve_order(rejected_patterns),
        capture_count,
        approval_rate,
        highlight_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scoutdesk_memory::SignalType as ST;
    use uuid::Uuid;

    fn signal(kind: ST, metadata: serde_json::Value) -> UserSignal {
        let mut s = UserSignal::new(Uuid::new_v4(), kind);
        s.metadata = metadata;
        s
    }

    #[test]
    fn content_highlighted_outweighs_topic_interest() {
        let signals = vec![
            signal(ST::ContentHighlighted, serde_json::json!({"topics": ["rust"]})),
            signal(ST::TopicInterest, serde_json::json!({"topic": "golang"})),
        ];
        let prefs = aggregate_preferences(&signals);
        assert_eq!(prefs.preferred_topics.first(), Some(&"rust".to_string()));
        assert_eq!(prefs.highlight_count, 1);
    }

    #[test]
    fn approval_rate_divides_approvals_by_total() {
        let signals = vec![
            signal(ST::ItemApproved, serde_json::json!({})),
            signal(ST::ItemApproved, serde_json::json!({})),
            signal(ST::ItemRejected, serde_json::json!({})),
        ];
        let prefs = aggregate_preferences(&signals);
        assert!((prefs.approval_rate - (2.0 / 3.0)).abs() < 1e-6);
    }

    #[test]
    fn source_rejected_feeds_rejected_patterns() {
        let signals = vec![signal(ST::SourceRejected, serde_json::json!({"pattern": "spamsite.com"}))];
        let prefs = aggregate_preferences(&signals);
        assert_eq!(prefs.rejected_patterns, vec!["spamsite.com".to_string()]);
    }

    #[test]
    fn old_signals_outside_window_are_ignored() {
        let mut old = signal(ST::ContentHighlighted, serde_json::json!({"topics": ["stale"]}));
        old.timestamp = Utc::now() - Duration::days(200);
        let prefs = aggregate_preferences(&[old]);
        assert!(prefs.preferred_topics.is_empty());
    }
}
