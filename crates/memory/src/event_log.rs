use std::fs;
use std::io::{BufRead, BufReader, Write as _};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::AsyncWriteExt;

/// Append-only JSONL log, generic over its record type. Generalized from a
/// single-purpose memory event log into the persistence primitive shared by
/// every append-only tier in this crate (recent exchanges, user signals) and
/// by the approval queue elsewhere in the workspace.
#[derive(Debug, Clone)]
pub struct JsonlLog<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T> JsonlLog<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, record: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        let line = serde_json::to_string(record)?;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;
        file.sync_all().await?;
        Ok(())
    }

    /// Atomically replace the log with a new set of records: write to a
    /// `.tmp` sibling, fsync, then rename over the original. A crash before
    /// the rename leaves the original untouched; a crash after leaves a
    /// consistent new file.
    pub async fn overwrite(&self, records: &[T]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp_path = {
            let filename = self
                .path
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "log.jsonl".to_string());
            self.path.with_file_name(format!("{filename}.tmp"))
        };

        let write_result: Result<()> = async {
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)
                .await?;
            for record in records {
                let line = serde_json::to_string(record)?;
                file.write_all(line.as_bytes()).await?;
                file.write_all(b"\n").await?;
            }
            file.flush().await?;
            file.sync_all().await?;
            Ok(())
        }
        .await;

        if let Err(err) = write_result {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(err);
        }

        if let Err(err) = tokio::fs::rename(&tmp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(err.into());
        }

        Ok(())
    }

    /// Copy the live log to a `.bak` sibling. No-op if the log doesn't exist
    /// yet.
    pub fn backup(&self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        let filename = self
            .path
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_else(|| "log.jsonl".to_string());
        let bak_path = self.path.with_file_name(format!("{filename}.bak"));
        fs::copy(&self.path, &bak_path)?;
        Ok(())
    }

    /// Load every well-formed record. Corrupt lines are quarantined to a
    /// `.corrupt` sidecar rather than aborting the load.
    pub fn load(&self) -> Result<Vec<T>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = fs::OpenOptions::new().read(true).open(&self.path)?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();
        let mut corrupt_count = 0usize;

        for (line_idx, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<T>(&line) {
                Ok(record) => records.push(record),
                Err(err) => {
                    corrupt_count += 1;
                    tracing::warn!(
                        line = line_idx + 1,
                        error = %err,
                        path = %self.path.display(),
                        "corrupt JSONL record — skipping line (original preserved in .corrupt file)"
                    );
                    let corrupt_path = self.path.with_extension("jsonl.corrupt");
                    if let Ok(mut bad) = fs::OpenOptions::new()
                        .create(true)
                        .append(true)
                        .open(&corrupt_path)
                    {
                        let _ = writeln!(bad, "{line}");
                    }
                }
            }
        }

        if corrupt_count > 0 {
            tracing::warn!(
                corrupt_lines = corrupt_count,
                path = %self.path.display(),
                "log loaded with skipped corrupt lines — inspect .corrupt sidecar"
            );
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Rec {
        n: u32,
    }

    #[tokio::test]
    async fn append_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let log = JsonlLog::<Rec>::new(dir.path().join("x.jsonl"));
        log.append(&Rec { n: 1 }).await.unwrap();
        log.append(&Rec { n: 2 }).await.unwrap();
        let loaded = log.load().unwrap();
        assert_eq!(loaded, vec![Rec { n: 1 }, Rec { n: 2 }]);
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = JsonlLog::<Rec>::new(dir.path().join("missing.jsonl"));
        assert!(log.load().unwrap().is_empty());
    }

    #[test]
    fn corrupt_line_is_quarantined_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.jsonl");
        fs::write(&path, "{\"n\":1}\nnot json\n{\"n\":2}\n").unwrap();
        let log = JsonlLog::<Rec>::new(path);
        let loaded = log.load().unwrap();
        assert_eq!(loaded, vec![Rec { n: 1 }, Rec { n: 2 }]);
    }
}
