use std::collections::HashMap;

use crate::schema::CollectionTask;

/// spec.md §4.3 step 1: keyword assembly, priority order (a) smart
/// queries, (b) coverage-gap keywords, (c) a caller-provided specific
/// query at the front, (d) static fallback from `subject × focus_areas`.
/// The subject is guaranteed to appear at least once.
pub fn assemble_keywords(task: &CollectionTask, subject: &str, focus_area_mentions: &HashMap<String, u32>) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();

    if let Some(query) = &task.specific_query {
        keywords.push(query.clone());
    }

    keywords.extend(task.smart_queries.iter().cloned());

    for gap in coverage_gap_keywords(&task.focus_areas, focus_area_mentions, subject) {
        keywords.push(gap);
    }

    if keywords.is_empty() {
        keywords.extend(static_fallback_keywords(subject, &task.focus_areas));
    }

    if !keywords.iter().any(|k| k.to_lowercase().contains(&subject.to_lowercase())) {
        keywords.push(subject.to_string());
    }

    dedup_preserve_order(keywords)
}

/// Areas whose existing-source mention count is under 40% of the mean
/// across all focus areas are under-served; add them verbatim, combined
/// with the subject unless the subject is already in the area string.
fn coverage_gap_keywords(focus_areas: &[String], mentions: &HashMap<String, u32>, subject: &str) -> Vec<String> {
    if focus_areas.is_empty() {
        return Vec::new();
    }

    let total: u32 = focus_areas.iter().map(|a| *mentions.get(a).unwrap_or(&0)).sum();
    let mean = total as f32 / focus_areas.len() as f32;
    if mean <= 0.0 {
        return focus_areas.to_vec();
    }

    focus_areas
        .iter()
        .filter(|area| {
            let count = *mentions.get(*area).unwrap_or(&0) as f32;
            count < mean * 0.4
        })
        .map(|area| {
            if area.to_lowercase().contains(&subject.to_lowercase()) {
                area.clone()
            } else {
                format!("{subject} {area}")
            }
        })
        .collect()
}

fn static_fallback_keywords(subject: &str, focus_areas: &[String]) -> Vec<String> {
    if focus_areas.is_empty() {
        return vec![subject.to_string()];
    }
    focus_areas.iter().map(|area| format!("{subject} {area}")).collect()
}

fn dedup_preserve_order(keywords: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    keywords
        .into_iter()
        .filter(|k| seen.insert(k.to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_always_present() {
        let task = CollectionTask { focus_areas: vec![], ..Default::default() };
        let keywords = assemble_keywords(&task, "Acme Corp", &HashMap::new());
        assert!(keywords.iter().any(|k| k.to_lowercase().contains("acme corp")));
    }

    #[test]
    fn specific_query_comes_first() {
        let task = CollectionTask {
            specific_query: Some("breaking news".to_string()),
            smart_queries: vec!["smart one".to_string()],
            ..Default::default()
        };
        let keywords = assemble_keywords(&task, "Acme", &HashMap::new());
        assert_eq!(keywords[0], "breaking news");
    }

    #[test]
    fn underserved_focus_area_is_added() {
        let mut mentions = HashMap::new();
        mentions.insert("pricing".to_string(), 10);
        mentions.insert("hiring".to_string(), 0);
        let task = CollectionTask {
            focus_areas: vec!["pricing".to_string(), "hiring".to_string()],
            ..Default::default()
        };
        let keywords = assemble_keywords(&task, "Acme", &mentions);
        assert!(keywords.iter().any(|k| k.to_lowercase().contains("hiring")));
    }
}
