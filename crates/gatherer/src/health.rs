use std::collections::HashMap;

use crate::schema::{SourceHealth, SourceHealthRecord};

/// In-memory per-notebook source-health table (spec.md §4.3 Gatherer state).
#[derive(Debug, Default)]
pub struct HealthTable {
    records: HashMap<String, SourceHealthRecord>,
}

impl HealthTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_default(&mut self, source_name: &str) -> &mut SourceHealthRecord {
        self.records.entry(source_name.to_string()).or_insert_with(|| SourceHealthRecord::new(source_name))
    }

    pub fn health_of(&self, source_name: &str) -> SourceHealth {
        self.records.get(source_name).map(|r| r.health).unwrap_or(SourceHealth::Unknown)
    }

    pub fn record_success(&mut self, source_name: &str) {
        self.get_or_default(source_name).record_success();
    }

    pub fn degrade(&mut self, source_name: &str) {
        self.get_or_default(source_name).degrade();
    }

    pub fn all(&self) -> impl Iterator<Item = &SourceHealthRecord> {
        self.records.values()
    }
}
