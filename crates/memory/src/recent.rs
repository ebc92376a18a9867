use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::schema::RecentExchange;

/// Unsummarized-conversation trigger for archive compression (spec.md §4.7).
pub const SUMMARIZATION_TRIGGER: usize = 100;

/// Recent-exchanges tier. SQLite-backed with WAL journaling so readers and
/// writers can share one file, per spec.md §5 ("recent-exchanges DB uses
/// WAL journaling... A 5s busy-timeout is enforced").
pub struct RecentExchangeStore {
    conn: Connection,
}

impl RecentExchangeStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path.as_ref())
            .with_context(|| format!("opening recall store at {}", path.as_ref().display()))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS exchanges (
                id TEXT PRIMARY KEY,
                notebook_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                topic_tags TEXT NOT NULL,
                entity_tags TEXT NOT NULL,
                summarized INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_exchanges_notebook ON exchanges(notebook_id);",
        )?;
        Ok(Self { conn })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(
            "CREATE TABLE exchanges (
                id TEXT PRIMARY KEY,
                notebook_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                topic_tags TEXT NOT NULL,
                entity_tags TEXT NOT NULL,
                summarized INTEGER NOT NULL
            );",
        )?;
        Ok(Self { conn })
    }

    pub fn append(&self, exchange: &RecentExchange) -> Result<()> {
        self.conn.execute(
            "INSERT INTO exchanges
                (id, notebook_id, role, content, timestamp, topic_tags, entity_tags, summarized)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                exchange.id.to_string(),
                exchange.notebook_id.to_string(),
                exchange.role,
                exchange.content,
                exchange.timestamp.to_rfc3339(),
                serde_json::to_string(&exchange.topic_tags)?,
                serde_json::to_string(&exchange.entity_tags)?,
                exchange.summarized as i64,
            ],
        )?;
        Ok(())
    }

    pub fn list(&self, notebook_id: Uuid, limit: usize) -> Result<Vec<RecentExchange>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, notebook_id, role, content, timestamp, topic_tags, entity_tags, summarized
             FROM exchanges WHERE notebook_id = ?1 ORDER BY timestamp ASC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![notebook_id.to_string(), limit as i64], row_to_exchange)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    pub fn unsummarized_count(&self, notebook_id: Uuid) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM exchanges WHERE notebook_id = ?1 AND summarized = 0",
            params![notebook_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn unsummarized(&self, notebook_id: Uuid) -> Result<Vec<RecentExchange>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, notebook_id, role, content, timestamp, topic_tags, entity_tags, summarized
             FROM exchanges WHERE notebook_id = ?1 AND summarized = 0 ORDER BY timestamp ASC",
        )?;
        let rows = stmt.query_map(params![notebook_id.to_string()], row_to_exchange)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    pub fn mark_summarized(&self, ids: &[Uuid]) -> Result<()> {
        for id in ids {
            self.conn.execute(
                "UPDATE exchanges SET summarized = 1 WHERE id = ?1",
                params![id.to_string()],
            )?;
        }
        Ok(())
    }
}

fn row_to_exchange(row: &rusqlite::Row) -> rusqlite::Result<RecentExchange> {
    let id: String = row.get(0)?;
    let notebook_id: String = row.get(1)?;
    let timestamp: String = row.get(4)?;
    let topic_tags: String = row.get(5)?;
    let entity_tags: String = row.get(6)?;
    let summarized: i64 = row.get(7)?;
    Ok(RecentExchange {
        id: id.parse().unwrap_or_else(|_| Uuid::nil()),
        notebook_id: notebook_id.parse().unwrap_or_else(|_| Uuid::nil()),
        role: row.get(2)?,
        content: row.get(3)?,
        timestamp: timestamp
            .parse::<DateTime<Utc>>()
            .unwrap_or_else(|_| Utc::now()),
        topic_tags: serde_json::from_str(&topic_tags).unwrap_or_default(),
        entity_tags: serde_json::from_str(&entity_tags).unwrap_or_default(),
        summarized: summarized != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange(notebook_id: Uuid, role: &str) -> RecentExchange {
        RecentExchange {
            id: Uuid::new_v4(),
            notebook_id,
            role: role.to_string(),
            content: "hello".to_string(),
            timestamp: Utc::now(),
            topic_tags: vec![],
            entity_tags: vec![],
            summarized: false,
        }
    }

    #[test]
    fn append_then_list_preserves_fifo_order() {
        let store = RecentExchangeStore::in_memory().unwrap();
        let notebook = Uuid::new_v4();
        store.append(&exchange(notebook, "user")).unwrap();
        store.append(&exchange(notebook, "assistant")).unwrap();

        let listed = store.list(notebook, 10).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].role, "user");
        assert_eq!(listed[1].role, "assistant");
    }

    #[test]
    fn summarization_trigger_counts_unsummarized_only() {
        let store = RecentExchangeStore::in_memory().unwrap();
        let notebook = Uuid::new_v4();
        for _ in 0..3 {
            store.append(&exchange(notebook, "user")).unwrap();
        }
        assert_eq!(store.unsummarized_count(notebook).unwrap(), 3);

        let unsummarized = store.unsummarized(notebook).unwrap();
        let ids: Vec<Uuid> = unsummarized.iter().map(|e| e.id).collect();
        store.mark_summarized(&ids[..1]).unwrap();
        assert_eq!(store.unsummarized_count(notebook).unwrap(), 2);
    }
}
