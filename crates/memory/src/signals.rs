use std::path::Path;

use anyhow::Result;
use uuid::Uuid;

use crate::event_log::JsonlLog;
use crate::schema::UserSignal;

/// Append-only, per-notebook FIFO log of user signals. Never mutated;
/// `scoutdesk-preferences` aggregates over it to derive a preference
/// profile.
pub struct SignalLog {
    log: JsonlLog<UserSignal>,
}

impl SignalLog {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            log: JsonlLog::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.log.path()
    }

    pub async fn record(&self, signal: UserSignal) -> Result<()> {
        self.log.append(&signal).await
    }

    pub fn all(&self) -> Result<Vec<UserSignal>> {
        self.log.load()
    }

    pub fn for_notebook(&self, notebook_id: Uuid) -> Result<Vec<UserSignal>> {
        Ok(self
            .all()?
            .into_iter()
            .filter(|s| s.notebook_id == notebook_id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SignalType;

    #[tokio::test]
    async fn log_is_append_only_fifo_per_notebook() {
        let dir = tempfile::tempdir().unwrap();
        let log = SignalLog::new(dir.path().join("signals.jsonl"));
        let notebook = Uuid::new_v4();
        let other = Uuid::new_v4();

        log.record(UserSignal::new(notebook, SignalType::View))
            .await
            .unwrap();
        log.record(UserSignal::new(other, SignalType::View))
            .await
            .unwrap();
        log.record(UserSignal::new(notebook, SignalType::ItemApproved))
            .await
            .unwrap();

        let mine = log.for_notebook(notebook).unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].signal_type, SignalType::View);
        assert_eq!(mine[1].signal_type, SignalType::ItemApproved);
    }
}
