use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scoutdesk_config::NotebookProfile;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

pub use scoutdesk_fetch::{SearchHit, WebScrape, WebSearch};

/// One approved, externally-stored source (spec.md §6
/// `source_store.{create,update,list,list_all,get,delete,set_tags}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRecord {
    pub id: Uuid,
    pub notebook_id: Uuid,
    pub url: String,
    pub title: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotebookSummary {
    pub notebook_id: Uuid,
    pub subject: String,
}

/// External persistent store of approved sources (spec.md §6). The core
/// only consumes this boundary; it never owns the real backend.
#[async_trait]
pub trait SourceStore: Send + Sync {
    async fn create(&self, record: SourceRecord) -> Result<()>;
    async fn update(&self, record: SourceRecord) -> Result<()>;
    async fn list(&self, notebook_id: Uuid) -> Result<Vec<SourceRecord>>;
    async fn list_all(&self) -> Result<Vec<SourceRecord>>;
    async fn get(&self, id: Uuid) -> Result<Option<SourceRecord>>;
    async fn delete(&self, id: Uuid) -> Result<()>;
    async fn set_tags(&self, id: Uuid, tags: Vec<String>) -> Result<()>;
}

/// Enumerates workspaces (spec.md §6 `notebook_store.list()`).
#[async_trait]
pub trait NotebookStore: Send + Sync {
    async fn list(&self) -> Result<Vec<NotebookSummary>>;
}

/// Passes an approved item's text through to the external RAG pipeline
/// (spec.md §6 `rag_ingest`); returns the chunk count the ingestor
/// produced.
#[async_trait]
pub trait RagIngestor: Send + Sync {
    async fn rag_ingest(&self, notebook_id: Uuid, source_id: Uuid, text: &str, filename: &str, source_type: &str) -> Result<usize>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceUpdatedEvent {
    pub notebook_id: Uuid,
    pub source_id: Uuid,
    pub kind: String,
}

/// UI fan-out (spec.md §6 `notify_source_updated`). Failure here is
/// non-fatal to the caller by contract — implementations should swallow
/// their own errors rather than propagate them.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_source_updated(&self, event: SourceUpdatedEvent);
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let rendered = serde_json::to_string_pretty(value)?;
    let tmp_path = path.with_extension("json.tmp");
    {
        let mut tmp = fs::File::create(&tmp_path)?;
        tmp.write_all(rendered.as_bytes())?;
        tmp.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// In-process, file-backed default `SourceStore` — a boundary stub so the
/// workspace runs end-to-end without a real external integration, not a
/// feature the core defines. Entire list is rewritten on every mutation,
/// matching the approval queue's own persistence style
/// (`scoutdesk-gatherer::queue`).
pub struct FileSourceStore {
    path: PathBuf,
    records: Mutex<Vec<SourceRecord>>,
}

impl FileSourceStore {
    pub fn open(data_root: impl AsRef<Path>) -> Result<Self> {
        let path = data_root.as_ref().join("sources.json");
        let records = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(error) => return Err(error).with_context(|| format!("reading {}", path.display())),
        };
        Ok(Self { path, records: Mutex::new(records) })
    }

    fn persist(&self, records: &[SourceRecord]) -> Result<()> {
        write_json_atomic(&self.path, &records)
    }
}

#[async_trait]
impl SourceStore for FileSourceStore {
    async fn create(&self, record: SourceRecord) -> Result<()> {
        let mut records = self.records.lock().expect("source store lock poisoned");
        records.retain(|r| r.id != record.id);
        records.push(record);
        self.persist(&records)
    }

    async fn update(&self, record: SourceRecord) -> Result<()> {
        self.create(record).await
    }

    async fn list(&self, notebook_id: Uuid) -> Result<Vec<SourceRecord>> {
        let records = self.records.lock().expect("source store lock poisoned");
        Ok(records.iter().filter(|r| r.notebook_id == notebook_id).cloned().collect())
    }

    async fn list_all(&self) -> Result<Vec<SourceRecord>> {
        Ok(self.records.lock().expect("source store lock poisoned").clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<SourceRecord>> {
        Ok(self.records.lock().expect("source store lock poisoned").iter().find(|r| r.id == id).cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut records = self.records.lock().expect("source store lock poisoned");
        records.retain(|r| r.id != id);
        self.persist(&records)
    }

    async fn set_tags(&self, id: Uuid, tags: Vec<String>) -> Result<()> {
        let mut records = self.records.lock().expect("source store lock poisoned");
        if let Some(record) = records.iter_mut().find(|r| r.id == id) {
            record.tags = tags;
        }
        self.persist(&records)
    }
}

/// In-process `NotebookStore` backed by the `<data>/notebooks/*/collector.yaml`
/// layout already written by `scoutdesk-config` — no separate storage of
/// its own, it just enumerates what's already on disk.
pub struct FileNotebookStore {
    data_root: PathBuf,
}

impl FileNotebookStore {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self { data_root: data_root.into() }
    }
}

#[async_trait]
impl NotebookStore for FileNotebookStore {
    async fn list(&self) -> Result<Vec<NotebookSummary>> {
        let notebooks_dir = self.data_root.join("notebooks");
        let entries = match fs::read_dir(&notebooks_dir) {
            Ok(entries) => entries,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(error).with_context(|| format!("reading {}", notebooks_dir.display())),
        };

        let mut summaries = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Some(notebook_id) = entry.file_name().to_str().and_then(|name| Uuid::parse_str(name).ok()) else {
                warn!(dir = ?entry.file_name(), "skipping non-uuid notebook directory");
                continue;
            };
            let profile = NotebookProfile::load_or_default(&self.data_root, notebook_id)?;
            summaries.push(NotebookSummary { notebook_id, subject: profile.subject });
        }
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_source_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSourceStore::open(dir.path()).unwrap();
        let notebook_id = Uuid::new_v4();
        let record = SourceRecord {
            id: Uuid::new_v4(),
            notebook_id,
            url: "https://example.com".to_string(),
            title: "Example".to_string(),
            tags: vec![],
            created_at: Utc::now(),
        };
        store.create(record.clone()).await.unwrap();
        assert_eq!(store.list(notebook_id).await.unwrap().len(), 1);

        store.set_tags(record.id, vec!["econ".to_string()]).await.unwrap();
        let fetched = store.get(record.id).await.unwrap().unwrap();
        assert_eq!(fetched.tags, vec!["econ".to_string()]);

        store.delete(record.id).await.unwrap();
        assert!(store.get(record.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_notebook_store_lists_created_notebooks() {
        let dir = tempfile::tempdir().unwrap();
        let notebook_id = Uuid::new_v4();
        let profile = NotebookProfile::new(notebook_id, "Costco", "Track Costco Wholesale");
        profile.save(dir.path()).unwrap();

        let store = FileNotebookStore::new(dir.path());
        let summaries = store.list().await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].subject, "Costco");
    }
}
