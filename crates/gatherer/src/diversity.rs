use std::collections::HashMap;

use url::Url;

use crate::schema::CollectedItem;

/// Per-domain cap and total per-run cap (spec.md §4.3 step 7, §5 backpressure).
pub const PER_DOMAIN_CAP: u32 = 3;
pub const TOTAL_RUN_CAP: usize = 15;

fn effective_domain(url: Option<&str>) -> String {
    url.and_then(|u| Url::parse(u).ok())
        .and_then(|u| u.host_str().map(|h| h.to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Per-item diversity score from spec.md §4.3 step 7:
/// `0.3*is_new_topic + 0.3*(1 - knowledge_overlap) + 0.2/(1+count_selected_from_domain)
/// + 0.2*overall_confidence`, with a hard -1.0 penalty once the domain hits
/// its per-domain cap.
fn diversity_score(item: &CollectedItem, count_selected_from_domain: u32) -> f32 {
    let mut score = 0.3 * (item.is_new_topic as i32 as f32)
        + 0.3 * (1.0 - item.knowledge_overlap)
        + 0.2 / (1.0 + count_selected_from_domain as f32)
        + 0.2 * item.overall_confidence;

    if count_selected_from_domain >= PER_DOMAIN_CAP {
        score -= 1.0;
    }
    score
}

/// Greedy descending selection up to `min(max_items_per_run, 15)`,
/// enforcing the per-domain cap via the hard penalty above.
pub fn enforce_diversity(items: Vec<CollectedItem>, max_items_per_run: usize) -> Vec<CollectedItem> {
    let cap = max_items_per_run.min(TOTAL_RUN_CAP);
    let mut remaining = items;
    let mut selected: Vec<CollectedItem> = Vec::new();
    let mut domain_counts: HashMap<String, u32> = HashMap::new();

    while selected.len() < cap && !remaining.is_empty() {
        let mut best_idx = 0;
        let mut best_score = f32::MIN;
        for (idx, item) in remaining.iter().enumerate() {
            let domain = effective_domain(item.url.as_deref());
            let count = *domain_counts.get(&domain).unwrap_or(&0);
            let score = diversity_score(item, count);
            if score > best_score {
                best_score = score;
                best_idx = idx;
            }
        }

        if best_score <= -1.0 {
            // Every remaining item is already at its domain cap; stop
            // rather than force a capped-domain item through.
            break;
        }

        let picked = remaining.remove(best_idx);
        let domain = effective_domain(picked.url.as_deref());
        *domain_counts.entry(domain).or_insert(0) += 1;
        selected.push(picked);
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn make_item(domain: &str, confidence: f32) -> CollectedItem {
        CollectedItem {
            id: Uuid::new_v4(),
            title: "t".to_string(),
            url: Some(format!("https://{domain}/a")),
            content: "c".to_string(),
            preview: "c".to_string(),
            source_name: "s".to_string(),
            source_kind: "web_page".to_string(),
            collected_at: Utc::now(),
            relevance_score: confidence,
            source_trust: 0.9,
            freshness_score: 1.0,
            overall_confidence: confidence,
            confidence_reasons: vec![],
            content_hash: Uuid::new_v4().to_string(),
            is_duplicate: false,
            duplicate_of: None,
            delta_summary: None,
            is_new_topic: true,
            temporal_context: None,
            knowledge_overlap: 0.0,
            related_titles: vec![],
            status: crate::schema::ItemStatus::Pending,
        }
    }

    #[test]
    fn caps_selection_per_domain_at_three() {
        let items: Vec<CollectedItem> = (0..6).map(|_| make_item("same.example.com", 0.9)).collect();
        let selected = enforce_diversity(items, 15);
        assert_eq!(selected.len(), 3);
    }

    #[test]
    fn total_cap_is_respected() {
        let items: Vec<CollectedItem> = (0..20).map(|i| make_item(&format!("site{i}.example.com"), 0.9)).collect();
        let selected = enforce_diversity(items, 15);
        assert_eq!(selected.len(), 15);
    }
}
