//! SQLite-backed leaderboard.
//!
//! One row per entry. The full entry is stored as JSON next to the columns
//! used for lookups and ordering.

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

use super::{normalize_id, LeaderboardEntry, LeaderboardStore};
use crate::error::{QuizError, QuizResult};

/// SQLite leaderboard store
pub struct SqliteLeaderboard {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLeaderboard {
    /// Open or create a leaderboard database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> QuizResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                QuizError::Storage(format!("Failed to create {:?}: {}", parent, e))
            })?;
        }

        let conn = Connection::open(path.as_ref())?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        store.init_schema()?;

        info!(path = ?path.as_ref(), "Leaderboard store opened");
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> QuizResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        store.init_schema()?;

        debug!("In-memory leaderboard store created");
        Ok(store)
    }

    fn lock(&self) -> QuizResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| QuizError::Storage("leaderboard connection lock poisoned".into()))
    }

    fn init_schema(&self) -> QuizResult<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS leaderboard_entries (
                id TEXT PRIMARY KEY,
                saved_at TEXT NOT NULL,
                total_profit_loss REAL NOT NULL,
                payload TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_leaderboard_pnl ON leaderboard_entries(total_profit_loss);
            "#,
        )?;

        debug!("Leaderboard schema initialized");
        Ok(())
    }

    fn decode(payload: &str) -> QuizResult<LeaderboardEntry> {
        Ok(serde_json::from_str(payload)?)
    }
}

impl LeaderboardStore for SqliteLeaderboard {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn upsert(&self, id: &str, mut entry: LeaderboardEntry, overwrite: bool) -> QuizResult<()> {
        let id = normalize_id(id)?;
        entry.id = id.clone();
        let payload = serde_json::to_string(&entry)?;

        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let exists = tx
            .query_row(
                "SELECT 1 FROM leaderboard_entries WHERE id = ?1",
                params![id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();

        if exists && !overwrite {
            return Err(QuizError::DuplicateLeaderboardId(id));
        }

        tx.execute(
            r#"
            INSERT OR REPLACE INTO leaderboard_entries (id, saved_at, total_profit_loss, payload)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                id,
                entry.saved_at.to_rfc3339(),
                entry.total_profit_loss,
                payload,
            ],
        )?;
        tx.commit()?;

        debug!(id = %id, overwrite, "Leaderboard entry saved");
        Ok(())
    }

    fn list(&self) -> QuizResult<Vec<LeaderboardEntry>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT payload FROM leaderboard_entries")?;

        let payloads = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        payloads.iter().map(|p| Self::decode(p)).collect()
    }

    fn get(&self, id: &str) -> QuizResult<Option<LeaderboardEntry>> {
        let conn = self.lock()?;

        let payload: Option<String> = conn
            .query_row(
                "SELECT payload FROM leaderboard_entries WHERE id = ?1",
                params![id.trim()],
                |row| row.get(0),
            )
            .optional()?;

        payload.as_deref().map(Self::decode).transpose()
    }

    fn remove(&self, id: &str) -> QuizResult<bool> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM leaderboard_entries WHERE id = ?1",
            params![id.trim()],
        )?;

        if removed > 0 {
            debug!(id, "Leaderboard entry removed");
        }
        Ok(removed > 0)
    }

    fn clear(&self) -> QuizResult<usize> {
        let conn = self.lock()?;
        let cleared = conn.execute("DELETE FROM leaderboard_entries", [])?;

        info!(cleared, "Leaderboard cleared");
        Ok(cleared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::tests::entry;

    #[test]
    fn test_upsert_and_get() {
        let store = SqliteLeaderboard::in_memory().unwrap();
        let original = entry("alice", 12.5);
        store.upsert("alice", original.clone(), false).unwrap();

        let loaded = store.get("alice").unwrap().unwrap();
        assert_eq!(loaded, original);
        assert!(store.get("nobody").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_leaves_entry_unmodified() {
        let store = SqliteLeaderboard::in_memory().unwrap();
        store.upsert("alice", entry("alice", 3.0), false).unwrap();

        let err = store.upsert("alice", entry("alice", 50.0), false).unwrap_err();
        assert_eq!(err, QuizError::DuplicateLeaderboardId("alice".into()));

        let kept = store.get("alice").unwrap().unwrap();
        assert!((kept.total_profit_loss - 3.0).abs() < 1e-9);

        store.upsert("alice", entry("alice", 50.0), true).unwrap();
        let replaced = store.get("alice").unwrap().unwrap();
        assert!((replaced.total_profit_loss - 50.0).abs() < 1e-9);
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("leaderboard.db");

        {
            let store = SqliteLeaderboard::open(&path).unwrap();
            store.upsert("bob", entry("bob", 1.0), false).unwrap();
            store.upsert("carol", entry("carol", 2.0), false).unwrap();
        }

        let reopened = SqliteLeaderboard::open(&path).unwrap();
        assert_eq!(reopened.list().unwrap().len(), 2);
        assert!(reopened.remove("bob").unwrap());
        assert_eq!(reopened.clear().unwrap(), 1);
    }
}
