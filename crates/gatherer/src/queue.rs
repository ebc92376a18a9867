use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use scoutdesk_config::ApprovalMode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{ApprovalQueueEntry, CollectedItem};

#[derive(Debug, Default, Serialize, Deserialize)]
struct QueueFile {
    entries: Vec<ApprovalQueueEntry>,
}

/// Persisted, rewrite-on-mutation approval queue (spec.md §3, §5 shared
/// resources). Filters expired entries on every load.
#[derive(Debug)]
pub struct ApprovalQueue {
    path: PathBuf,
    entries: Vec<ApprovalQueueEntry>,
}

impl ApprovalQueue {
    pub fn path_for(data_root: &Path, notebook_id: Uuid) -> PathBuf {
        data_root.join("notebooks").join(notebook_id.to_string()).join("approval_queue.json")
    }

    pub fn load_or_default(data_root: &Path, notebook_id: Uuid) -> Result<Self> {
        let path = Self::path_for(data_root, notebook_id);
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => {
                let file: QueueFile = serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
                let now = Utc::now();
                file.entries.into_iter().filter(|e| !e.is_expired(now)).collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
        };
        Ok(Self { path, entries })
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = QueueFile { entries: self.entries.clone() };
        let rendered = serde_json::to_string_pretty(&file)?;
        let tmp_path = self.path.with_extension("json.tmp");
        {
            let mut f = std::fs::File::create(&tmp_path)?;
            use std::io::Write;
            f.write_all(rendered.as_bytes())?;
            f.sync_all()?;
        }
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    pub fn push(&mut self, item: CollectedItem) -> Result<()> {
        self.entries.push(ApprovalQueueEntry::new(item));
        self.save()
    }

    pub fn entries(&self) -> &[ApprovalQueueEntry] {
        &self.entries
    }

    pub fn expiring_within(&self, days: i64) -> Vec<&ApprovalQueueEntry> {
        let cutoff = Utc::now() + chrono::Duration::days(days);
        self.entries.iter().filter(|e| e.expires_at <= cutoff).collect()
    }

    pub fn remove(&mut self, id: Uuid) -> Result<Option<ApprovalQueueEntry>> {
        let idx = self.entries.iter().position(|e| e.item.id == id);
        let removed = idx.map(|i| self.entries.remove(i));
        if removed.is_some() {
            self.save()?;
        }
        Ok(removed)
    }

    pub fn remove_all_from_source(&mut self, source_name: &str) -> Result<Vec<ApprovalQueueEntry>> {
        let (matched, rest): (Vec<_>, Vec<_>) = self.entries.drain(..).partition(|e| e.item.source_name == source_name);
        self.entries = rest;
        self.save()?;
        Ok(matched)
    }
}

/// spec.md §4.3 approval queue policy: `trust_me` approves everything
/// immediately, `review` queues everything, `mixed` auto-approves at
/// `overall_confidence >= 0.85` and queues the rest.
pub enum QueueDecision {
    AutoApprove,
    Queue,
}

pub fn decide(mode: ApprovalMode, item: &CollectedItem) -> QueueDecision {
    match mode {
        ApprovalMode::Auto => QueueDecision::AutoApprove,
        ApprovalMode::Review => QueueDecision::Queue,
        ApprovalMode::Mixed => {
            if item.overall_confidence >= 0.85 {
                QueueDecision::AutoApprove
            } else {
                QueueDecision::Queue
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scoutdesk_fetch::{FetchedItem, SourceKind};

    fn sample_item(confidence: f32) -> CollectedItem {
        let mut item = CollectedItem::from_fetched(&FetchedItem::new("t", "c", "s", SourceKind::WebPage, "u"));
        item.overall_confidence = confidence;
        item
    }

    #[test]
    fn mixed_mode_auto_approves_at_threshold() {
        assert!(matches!(decide(ApprovalMode::Mixed, &sample_item(0.85)), QueueDecision::AutoApprove));
        assert!(matches!(decide(ApprovalMode::Mixed, &sample_item(0.84)), QueueDecision::Queue));
    }

    #[test]
    fn review_mode_always_queues() {
        assert!(matches!(decide(ApprovalMode::Review, &sample_item(0.99)), QueueDecision::Queue));
    }

    #[test]
    fn queue_round_trips_through_disk() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let notebook_id = Uuid::new_v4();
        let mut queue = ApprovalQueue::load_or_default(dir.path(), notebook_id)?;
        queue.push(sample_item(0.5))?;
        assert_eq!(queue.entries().len(), 1);

        let reloaded = ApprovalQueue::load_or_default(dir.path(), notebook_id)?;
        assert_eq!(reloaded.entries().len(), 1);
        Ok(())
    }
}
