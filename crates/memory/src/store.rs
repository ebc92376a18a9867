use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use crate::schema::WorkingFact;

/// Token budget for the working-facts tier (spec.md §3 — "Bounded by token
/// budget (~2000); overflow spills to archive").
pub const WORKING_FACTS_TOKEN_BUDGET: usize = 2000;

/// Insertion-order-preserving store for the working-facts tier, with O(1)
/// id lookup.
#[derive(Debug, Default)]
pub struct WorkingFactStore {
    facts: Vec<WorkingFact>,
    by_id: HashMap<Uuid, usize>,
}

impl WorkingFactStore {
    pub fn insert(&mut self, fact: WorkingFact) {
        let idx = self.facts.len();
        self.by_id.insert(fact.id, idx);
        self.facts.push(fact);
    }

    pub fn all(&self) -> &[WorkingFact] {
        &self.facts
    }

    pub fn get(&self, id: Uuid) -> Option<&WorkingFact> {
        self.by_id.get(&id).and_then(|&i| self.facts.get(i))
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn token_total(&self) -> usize {
        self.facts.iter().map(WorkingFact::approx_tokens).sum()
    }

    fn reindex(&mut self) {
        self.by_id = self
            .facts
            .iter()
            .enumerate()
            .map(|(i, f)| (f.id, i))
            .collect();
    }

    /// Compress the tier down to (at most) `budget` tokens.
    ///
    /// Sorts by `(importance, recency)` ascending and pops from the front
    /// until under budget — each popped fact is returned to the caller so it
    /// can be written to the archive as a `compressed_working_fact` record
    /// (spec.md §4.7 "Compression... must move lowest-importance /
    /// least-recent facts to archive").
    pub fn compress(&mut self, budget: usize) -> Vec<WorkingFact> {
        if self.token_total() <= budget {
            return Vec::new();
        }

        let mut ordered: Vec<WorkingFact> = self.facts.drain(..).collect();
        ordered.sort_by(|a, b| {
            a.importance
                .cmp(&b.importance)
                .then(a.created_at.cmp(&b.created_at))
        });

        let mut evicted = Vec::new();
        let mut total: usize = ordered.iter().map(WorkingFact::approx_tokens).sum();
        let mut remaining = ordered;

        while total > budget && !remaining.is_empty() {
            let popped = remaining.remove(0);
            total -= popped.approx_tokens();
            evicted.push(popped);
        }

        self.facts = remaining;
        self.reindex();
        evicted
    }

    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.facts.len();
        self.facts.retain(|f| f.id != id);
        if self.facts.len() < before {
            self.reindex();
            true
        } else {
            false
        }
    }
}

pub fn now_fact(
    notebook_id: Option<Uuid>,
    category: crate::schema::FactCategory,
    importance: crate::schema::FactImportance,
    key: impl Into<String>,
    value: impl Into<String>,
) -> WorkingFact {
    WorkingFact {
        id: Uuid::new_v4(),
        notebook_id,
        category,
        importance,
        key: key.into(),
        value: value.into(),
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FactCategory, FactImportance};

    fn fact(importance: FactImportance, value_len: usize) -> WorkingFact {
        now_fact(
            None,
            FactCategory::UserFact,
            importance,
            "k",
            "v".repeat(value_len),
        )
    }

    #[test]
    fn compress_evicts_lowest_importance_first() {
        let mut store = WorkingFactStore::default();
        store.insert(fact(FactImportance::Critical, 400));
        store.insert(fact(FactImportance::Low, 400));
        store.insert(fact(FactImportance::High, 400));

        let evicted = store.compress(300);
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].importance, FactImportance::Low);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn compress_is_noop_under_budget() {
        let mut store = WorkingFactStore::default();
        store.insert(fact(FactImportance::Low, 10));
        assert!(store.compress(WORKING_FACTS_TOKEN_BUDGET).is_empty());
        assert_eq!(store.len(), 1);
    }
}
