use std::collections::HashMap;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::schema::{AccessStats, ArchiveRecord, Namespace};

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("namespace violation: {reader:?} may not read {owner:?} records")]
    NamespaceViolation { reader: Namespace, owner: Namespace },
}

/// Who is performing an archive search, and whether the Supervisor is
/// crossing notebook boundaries for this call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reader {
    System,
    Supervisor { cross_notebook: bool },
    Gatherer { notebook_id: Uuid },
}

fn can_read(reader: Reader, record: &ArchiveRecord) -> bool {
    match record.namespace {
        Namespace::System => true,
        Namespace::Supervisor => match reader {
            Reader::System => true,
            // Supervisor records are always visible to the Supervisor
            // itself, with or without cross_notebook.
            Reader::Supervisor { .. } => true,
            Reader::Gatherer { .. } => false,
        },
        Namespace::Gatherer => match reader {
            Reader::System => true,
            Reader::Supervisor { cross_notebook } => cross_notebook,
            Reader::Gatherer { notebook_id } => Some(notebook_id) == record.source_notebook_id,
        },
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    // Embeddings are never assumed normalized by upstream callers (spec.md
    // §6) — always go through the full cosine formula.
    dot / (norm_a * norm_b)
}

#[derive(Debug, Clone)]
pub struct ArchiveHit<'a> {
    pub record: &'a ArchiveRecord,
    pub similarity: f32,
}

/// Vector-indexed long-term archive. Records are write-once; the mutable
/// access-counter side table lives alongside it, matching spec.md §3/§5
/// ("kept in the recent-tier DB since vector store may lack in-place
/// update").
#[derive(Debug, Default)]
pub struct Archive {
    records: Vec<ArchiveRecord>,
    access: HashMap<Uuid, AccessStats>,
}

impl Archive {
    pub fn insert(&mut self, record: ArchiveRecord) {
        self.access.entry(record.id).or_default();
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn all(&self) -> &[ArchiveRecord] {
        &self.records
    }

    pub fn access_stats(&self, id: Uuid) -> AccessStats {
        self.access.get(&id).cloned().unwrap_or_default()
    }

    fn bump_access(&mut self, id: Uuid) {
        let stats = self.access.entry(id).or_default();
        stats.access_count += 1;
        stats.last_accessed = Some(Utc::now());
    }

    /// Semantic search with namespace enforcement: violations fail closed —
    /// they return an empty result set, never a silent cross-boundary read.
    pub fn search(
        &mut self,
        reader: Reader,
        query_embedding: &[f32],
        limit: usize,
        min_similarity: f32,
    ) -> Vec<(Uuid, f32)> {
        let mut hits: Vec<(Uuid, f32)> = self
            .records
            .iter()
            .filter(|r| can_read(reader, r))
            .filter_map(|r| {
                let embedding = r.embedding.as_deref()?;
                let sim = cosine_similarity(query_embedding, embedding);
                (sim > min_similarity).then_some((r.id, sim))
            })
            .collect();

        hits.sort_by(|a, b| b.1.total_cmp(&a.1));
        hits.truncate(limit);
        for (id, _) in &hits {
            self.bump_access(*id);
        }
        hits
    }

    pub fn get(&self, id: Uuid) -> Option<&ArchiveRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Namespace-checked lookup that returns the record only if `reader`
    /// may see it; otherwise an explicit [`MemoryError::NamespaceViolation`].
    pub fn get_checked(&self, reader: Reader, id: Uuid) -> Result<Option<&ArchiveRecord>, MemoryError> {
        let Some(record) = self.get(id) else {
            return Ok(None);
        };
        if can_read(reader, record) {
            Ok(Some(record))
        } else {
            Err(MemoryError::NamespaceViolation {
                reader: match reader {
                    Reader::System => Namespace::System,
                    Reader::Supervisor { .. } => Namespace::Supervisor,
                    Reader::Gatherer { .. } => Namespace::Gatherer,
                },
                owner: record.namespace,
            })
        }
    }

    /// Persist records (write-once log, append-friendly) and the access
    /// side table (small JSON file, rewritten atomically on every mutation).
    pub fn save(&self, records_path: impl AsRef<Path>, access_path: impl AsRef<Path>) -> Result<()> {
        write_atomic(&records_path, &serde_json::to_vec_pretty(&self.records)?)?;
        write_atomic(&access_path, &serde_json::to_vec_pretty(&self.access)?)?;
        Ok(())
    }

    pub fn load(records_path: impl AsRef<Path>, access_path: impl AsRef<Path>) -> Result<Self> {
        let records: Vec<ArchiveRecord> = match fs::read_to_string(&records_path) {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(err.into()),
        };
        let access: HashMap<Uuid, AccessStats> = match fs::read_to_string(&access_path) {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self { records, access })
    }
}

fn write_atomic(path: impl AsRef<Path>, bytes: &[u8]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp: PathBuf = path.with_extension("json.tmp");
    {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(namespace: Namespace, notebook: Option<Uuid>) -> ArchiveRecord {
        ArchiveRecord {
            id: Uuid::new_v4(),
            namespace,
            source_notebook_id: notebook,
            content: "some content".into(),
            content_type: "text".into(),
            source_type: "note".into(),
            topics: vec![],
            entities: vec![],
            importance: 0.5,
            created_at: Utc::now(),
            embedding: Some(vec![1.0, 0.0, 0.0]),
        }
    }

    #[test]
    fn gatherer_cannot_read_other_notebooks_namespace() {
        let mut archive = Archive::default();
        let notebook_a = Uuid::new_v4();
        let notebook_b = Uuid::new_v4();
        archive.insert(record(Namespace::Gatherer, Some(notebook_a)));

        let hits = archive.search(
            Reader::Gatherer {
                notebook_id: notebook_b,
            },
            &[1.0, 0.0, 0.0],
            10,
            -1.0,
        );
        assert!(hits.is_empty());
    }

    #[test]
    fn supervisor_without_cross_notebook_is_scoped_out_of_gatherer_namespace() {
        let mut archive = Archive::default();
        archive.insert(record(Namespace::Gatherer, Some(Uuid::new_v4())));

        let hits = archive.search(
            Reader::Supervisor {
                cross_notebook: false,
            },
            &[1.0, 0.0, 0.0],
            10,
            -1.0,
        );
        assert!(hits.is_empty());
    }

    #[test]
    fn supervisor_with_cross_notebook_sees_gatherer_namespace() {
        let mut archive = Archive::default();
        archive.insert(record(Namespace::Gatherer, Some(Uuid::new_v4())));

        let hits = archive.search(
            Reader::Supervisor {
                cross_notebook: true,
            },
            &[1.0, 0.0, 0.0],
            10,
            -1.0,
        );
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn system_namespace_visible_to_all() {
        let mut archive = Archive::default();
        archive.insert(record(Namespace::System, None));
        let hits = archive.search(
            Reader::Gatherer {
                notebook_id: Uuid::new_v4(),
            },
            &[1.0, 0.0, 0.0],
            10,
            -1.0,
        );
        assert_eq!(hits.len(), 1);
    }
}
