use std::collections::HashSet;

/// Tracks URL and content-hash sets primed from the external source store
/// and approval queue on construction (spec.md §4.3 Gatherer state).
#[derive(Debug, Default)]
pub struct DedupSets {
    pub urls: HashSet<String>,
    pub hashes: HashSet<String>,
}

impl DedupSets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen_url(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn seen_hash(&self, hash: &str) -> bool {
        self.hashes.contains(hash)
    }

    pub fn record(&mut self, url: Option<&str>, hash: &str) {
        if let Some(u) = url {
            self.urls.insert(u.to_string());
        }
        self.hashes.insert(hash.to_string());
    }
}

/// Semantic-dedup threshold: cosine ≥0.92 against the notebook's GATHERER
/// archive counts as a duplicate (spec.md §4.3 step 5).
pub const SEMANTIC_DEDUP_THRESHOLD: f32 = 0.92;

/// `avoid_similar_to` token-overlap threshold — items at or above this
/// Jaccard overlap with any sample are dropped (spec.md §4.3 step 5).
pub const AVOID_SIMILAR_TOKEN_OVERLAP: f32 = 0.8;

fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
        .map(|w| w.to_string())
        .collect()
}

fn jaccard_overlap(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count() as f32;
    let union = a.union(b).count() as f32;
    if union == 0.0 {
        0.0
    } else {
        intersection / union
    }
}

/// True when `content` overlaps ≥0.8 (token Jaccard) with any sample in
/// `avoid_similar_to` — these items get dropped before scoring.
pub fn is_similar_to_avoid_list(content: &str, avoid_similar_to: &[String]) -> bool {
    if avoid_similar_to.is_empty() {
        return false;
    }
    let tokens = tokenize(content);
    avoid_similar_to.iter().any(|sample| jaccard_overlap(&tokens, &tokenize(sample)) >= AVOID_SIMILAR_TOKEN_OVERLAP)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_text_is_fully_similar() {
        let content = "Acme Corp announces new product launch in the widget market";
        assert!(is_similar_to_avoid_list(content, &[content.to_string()]));
    }

    #[test]
    fn unrelated_text_is_not_similar() {
        let content = "Acme Corp announces new product launch";
        let avoid = vec!["completely different topic about gardening tips".to_string()];
        assert!(!is_similar_to_avoid_list(content, &avoid));
    }

    #[test]
    fn empty_avoid_list_never_flags() {
        assert!(!is_similar_to_avoid_list("anything", &[]));
    }
}
