use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::archive::{Archive, Reader};
use crate::recent::{RecentExchangeStore, SUMMARIZATION_TRIGGER};
use crate::schema::{ArchiveRecord, Namespace, UserSignal, WorkingFact};
use crate::signals::SignalLog;
use crate::store::{WorkingFactStore, WORKING_FACTS_TOKEN_BUDGET};

#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryStats {
    pub working_facts: usize,
    pub working_fact_tokens: usize,
    pub archive_records: usize,
}

/// Tiered memory facade: working facts, recent exchanges, archive, and the
/// user-signal log. One instance is shared across the workspace; callers
/// identify themselves via [`Reader`] so the archive can enforce the
/// namespace boundary.
pub struct MemoryManager {
    data_root: PathBuf,
    working: WorkingFactStore,
    recent: RecentExchangeStore,
    archive: Archive,
    signals: SignalLog,
}

impl MemoryManager {
    pub fn open(data_root: impl Into<PathBuf>) -> Result<Self> {
        let data_root = data_root.into();
        let memory_dir = data_root.join("memory");
        let recent = RecentExchangeStore::open(memory_dir.join("recall_memory.db"))?;
        let archive = Archive::load(
            memory_dir.join("archival_memory").join("records.json"),
            memory_dir.join("archival_memory").join("access_stats.json"),
        )?;
        let working = load_working_facts(&memory_dir.join("core_memory.json"))?;
        let signals = SignalLog::new(memory_dir.join("user_signals.jsonl"));

        info!(
            working_facts = working.len(),
            archive_records = archive.len(),
            "memory manager opened"
        );

        Ok(Self {
            data_root,
            working,
            recent,
            archive,
            signals,
        })
    }

    pub fn stats(&self) -> MemoryStats {
        MemoryStats {
            working_facts: self.working.len(),
            working_fact_tokens: self.working.token_total(),
            archive_records: self.archive.len(),
        }
    }

    // ── working facts ────────────────────────────────────────────────────

    pub fn add_working_fact(&mut self, fact: WorkingFact) -> Result<()> {
        self.working.insert(fact);
        self.persist_working_facts()?;
        Ok(())
    }

    pub fn working_facts(&self) -> &[WorkingFact] {
        self.working.all()
    }

    /// Run compression if the working-facts tier is over budget. Evicted
    /// facts become archive records tagged `compressed_working_fact`
    /// (spec.md §4.7). Idempotent: a second call with nothing to evict is a
    /// no-op.
    pub fn compress_working_facts(&mut self) -> Result<usize> {
        let evicted = self.working.compress(WORKING_FACTS_TOKEN_BUDGET);
        let count = evicted.len();
        for fact in evicted {
            self.archive.insert(ArchiveRecord {
                id: Uuid::new_v4(),
                namespace: Namespace::System,
                source_notebook_id: fact.notebook_id,
                content: format!("{}: {}", fact.key, fact.value),
                content_type: "text".to_string(),
                source_type: "compressed_working_fact".to_string(),
                topics: vec![],
                entities: vec![],
                importance: 0.3,
                created_at: Utc::now(),
                embedding: None,
            });
        }
        if count > 0 {
            self.persist_working_facts()?;
            self.persist_archive()?;
            debug!(evicted = count, "working facts compressed into archive");
        }
        Ok(count)
    }

    fn persist_working_facts(&self) -> Result<()> {
        let path = self.data_root.join("memory").join("core_memory.json");
        write_json_atomic(&path, self.working.all())
    }

    // ── recent exchanges ─────────────────────────────────────────────────

    pub fn record_exchange(&self, exchange: crate::schema::RecentExchange) -> Result<()> {
        self.recent.append(&exchange)
    }

    pub fn recent_exchanges(&self, notebook_id: Uuid, limit: usize) -> Result<Vec<crate::schema::RecentExchange>> {
        self.recent.list(notebook_id, limit)
    }

    /// Summarize a notebook's unsummarized exchanges into one archive
    /// record, once the trigger threshold is reached (spec.md §4.7).
    /// `narrate` turns the raw exchange text into a summary string —
    /// callers supply an LLM-backed closure; a deterministic fallback is
    /// used for empty input.
    pub fn maybe_summarize_recent<F>(&mut self, notebook_id: Uuid, narrate: F) -> Result<bool>
    where
        F: FnOnce(&[crate::schema::RecentExchange]) -> String,
    {
        let unsummarized = self.recent.unsummarized(notebook_id)?;
        if unsummarized.len() < SUMMARIZATION_TRIGGER {
            return Ok(false);
        }

        let summary = narrate(&unsummarized);
        self.archive.insert(ArchiveRecord {
            id: Uuid::new_v4(),
            namespace: Namespace::Gatherer,
            source_notebook_id: Some(notebook_id),
            content: summary,
            content_type: "text".to_string(),
            source_type: "conversation_summary".to_string(),
            topics: vec![],
            entities: vec![],
            importance: 0.5,
            created_at: Utc::now(),
            embedding: None,
        });
        self.persist_archive()?;

        let ids: Vec<Uuid> = unsummarized.iter().map(|e| e.id).collect();
        self.recent.mark_summarized(&ids)?;
        info!(notebook = %notebook_id, count = ids.len(), "recent exchanges summarized into archive");
        Ok(true)
    }

    // ── archive ───────────────────────────────────────────────────────────

    pub fn add_archive_record(&mut self, record: ArchiveRecord) -> Result<Uuid> {
        let id = record.id;
        self.archive.insert(record);
        self.persist_archive()?;
        Ok(id)
    }

    pub fn search_archive(
        &mut self,
        reader: Reader,
        query_embedding: &[f32],
        limit: usize,
        min_similarity: f32,
    ) -> Vec<(Uuid, f32)> {
        self.archive.search(reader, query_embedding, limit, min_similarity)
    }

    pub fn get_archive_record(&self, id: Uuid) -> Option<&ArchiveRecord> {
        self.archive.get(id)
    }

    fn persist_archive(&self) -> Result<()> {
        let memory_dir = self.data_root.join("memory").join("archival_memory");
        self.archive.save(
            memory_dir.join("records.json"),
            memory_dir.join("access_stats.json"),
        )
    }

    // ── signals ───────────────────────────────────────────────────────────

    pub async fn record_signal(&self, signal: UserSignal) -> Result<()> {
        self.signals.record(signal).await
    }

    pub fn signals_for(&self, notebook_id: Uuid) -> Result<Vec<UserSignal>> {
        self.signals.for_notebook(notebook_id)
    }

    pub fn all_signals(&self) -> Result<Vec<UserSignal>> {
        self.signals.all()
    }
}

fn load_working_facts(path: &Path) -> Result<WorkingFactStore> {
    let mut store = WorkingFactStore::default();
    match std::fs::read_to_string(path) {
        Ok(raw) => {
            let facts: Vec<WorkingFact> = serde_json::from_str(&raw)?;
            for fact in facts {
                store.insert(fact);
            }
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(err.into()),
    }
    Ok(store)
}

fn write_json_atomic<T: serde::Serialize>(path: &Path, value: T) -> Result<()> {
    use std::io::Write as _;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let rendered = serde_json::to_vec_pretty(&value)?;
    let tmp = path.with_extension("json.tmp");
    {
        let mut f = std::fs::File::create(&tmp)?;
        f.write_all(&rendered)?;
        f.sync_all()?;
    }
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FactCategory, FactImportance};
    use crate::store::now_fact;

    #[test]
    fn reopen_recovers_working_facts_and_archive() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut mgr = MemoryManager::open(dir.path()).unwrap();
            mgr.add_working_fact(now_fact(
                None,
                FactCategory::UserFact,
                FactImportance::High,
                "name",
                "Ada",
            ))
            .unwrap();
            mgr.add_archive_record(ArchiveRecord {
                id: Uuid::new_v4(),
                namespace: Namespace::System,
                source_notebook_id: None,
                content: "seed".into(),
                content_type: "text".into(),
                source_type: "note".into(),
                topics: vec![],
                entities: vec![],
                importance: 0.4,
                created_at: Utc::now(),
                embedding: None,
            })
            .unwrap();
        }

        let reopened = MemoryManager::open(dir.path()).unwrap();
        assert_eq!(reopened.stats().working_facts, 1);
        assert_eq!(reopened.stats().archive_records, 1);
    }

    #[test]
    fn compress_is_idempotent_when_under_budget() {
        let dir = tempfile::tempdir().unwrap();
        let mut mgr = MemoryManager::open(dir.path()).unwrap();
        assert_eq!(mgr.compress_working_facts().unwrap(), 0);
        assert_eq!(mgr.compress_working_facts().unwrap(), 0);
    }
}
