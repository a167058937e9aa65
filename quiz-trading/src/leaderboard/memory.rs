//! In-process leaderboard.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use super::{normalize_id, LeaderboardEntry, LeaderboardStore};
use crate::error::{QuizError, QuizResult};

/// Leaderboard held in a mutex-guarded map.
#[derive(Default)]
pub struct MemoryLeaderboard {
    entries: Mutex<HashMap<String, LeaderboardEntry>>,
}

impl MemoryLeaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> QuizResult<MutexGuard<'_, HashMap<String, LeaderboardEntry>>> {
        self.entries
            .lock()
            .map_err(|_| QuizError::Storage("leaderboard lock poisoned".into()))
    }
}

impl LeaderboardStore for MemoryLeaderboard {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn upsert(&self, id: &str, mut entry: LeaderboardEntry, overwrite: bool) -> QuizResult<()> {
        let id = normalize_id(id)?;
        let mut entries = self.lock()?;

        if entries.contains_key(&id) && !overwrite {
            return Err(QuizError::DuplicateLeaderboardId(id));
        }

        entry.id = id.clone();
        entries.insert(id.clone(), entry);

        debug!(id = %id, overwrite, "Leaderboard entry saved");
        Ok(())
    }

    fn list(&self) -> QuizResult<Vec<LeaderboardEntry>> {
        Ok(self.lock()?.values().cloned().collect())
    }

    fn get(&self, id: &str) -> QuizResult<Option<LeaderboardEntry>> {
        Ok(self.lock()?.get(id.trim()).cloned())
    }

    fn remove(&self, id: &str) -> QuizResult<bool> {
        Ok(self.lock()?.remove(id.trim()).is_some())
    }

    fn clear(&self) -> QuizResult<usize> {
        let mut entries = self.lock()?;
        let cleared = entries.len();
        entries.clear();
        Ok(cleared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::tests::entry;
    use std::sync::Arc;

    #[test]
    fn test_duplicate_without_overwrite() {
        let store = MemoryLeaderboard::new();
        store.upsert("alice", entry("alice", 5.0), false).unwrap();

        let err = store.upsert("alice", entry("alice", 99.0), false).unwrap_err();
        assert_eq!(err, QuizError::DuplicateLeaderboardId("alice".into()));

        let kept = store.get("alice").unwrap().unwrap();
        assert!((kept.total_profit_loss - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_overwrite() {
        let store = MemoryLeaderboard::new();
        store.upsert("alice", entry("alice", 5.0), false).unwrap();
        store.upsert("alice", entry("alice", 7.0), true).unwrap();

        assert_eq!(store.list().unwrap().len(), 1);
        let kept = store.get("alice").unwrap().unwrap();
        assert!((kept.total_profit_loss - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_remove_and_clear() {
        let store = MemoryLeaderboard::new();
        store.upsert("a", entry("a", 1.0), false).unwrap();
        store.upsert("b", entry("b", 2.0), false).unwrap();

        assert!(store.remove("a").unwrap());
        assert!(!store.remove("a").unwrap());
        assert_eq!(store.clear().unwrap(), 1);
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_concurrent_upsert_single_winner() {
        let store = Arc::new(MemoryLeaderboard::new());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.upsert("race", entry("race", i as f64), false))
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|r| r.is_ok())
            .count();

        assert_eq!(successes, 1);
        assert_eq!(store.list().unwrap().len(), 1);
    }
}
