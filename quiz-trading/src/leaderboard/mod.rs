//! Shared leaderboard of saved session snapshots.
//!
//! # Backends
//! - [`MemoryLeaderboard`]: process-local map, lost on restart
//! - [`SqliteLeaderboard`]: single-file SQLite database
//!
//! Entries are keyed by a user-chosen id. Writing to an existing id needs
//! an explicit overwrite flag; without it the store reports
//! [`QuizError::DuplicateLeaderboardId`] and leaves the entry untouched.

mod memory;
mod sqlite;

pub use memory::MemoryLeaderboard;
pub use sqlite::SqliteLeaderboard;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{QuizError, QuizResult};
use crate::session::{SessionStats, TradeSummary};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Maximum accepted id length, in characters
pub const MAX_ID_LEN: usize = 64;

// ============================================================================
// Entry
// ============================================================================

/// Named, timestamped snapshot of a session's statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: String,
    pub saved_at: DateTime<Utc>,
    /// First trade of the session (the save time for an empty session)
    pub start_date: DateTime<Utc>,
    /// Whole days between `start_date` and `saved_at`, at least 1
    pub period_days: i64,
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub total_profit_loss: f64,
    pub total_profit_loss_percent: f64,
    pub avg_profit_loss_percent: f64,
    pub avg_holding_periods: f64,
    pub best_trade: Option<TradeSummary>,
    pub worst_trade: Option<TradeSummary>,
    pub profit_per_day: f64,
}

impl LeaderboardEntry {
    /// Take a snapshot of `stats` under `id` at `saved_at`.
    pub fn snapshot(id: &str, stats: &SessionStats, saved_at: DateTime<Utc>) -> QuizResult<Self> {
        let id = normalize_id(id)?;
        let start_date = stats.first_trade_at.unwrap_or(saved_at);
        let period_days = period_days(start_date, saved_at);

        Ok(Self {
            id,
            saved_at,
            start_date,
            period_days,
            total_trades: stats.total_trades,
            wins: stats.wins,
            losses: stats.losses,
            win_rate: stats.win_rate(),
            total_profit_loss: stats.total_profit_loss,
            total_profit_loss_percent: stats.total_profit_loss_percent,
            avg_profit_loss_percent: stats.avg_profit_loss_percent(),
            avg_holding_periods: stats.avg_holding_periods(),
            best_trade: stats.best_trade.clone(),
            worst_trade: stats.worst_trade.clone(),
            profit_per_day: stats.total_profit_loss / period_days as f64,
        })
    }
}

/// `max(1, ceil(elapsed / 1 day))`
fn period_days(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let elapsed_ms = (end - start).num_milliseconds() as f64;
    ((elapsed_ms / MILLIS_PER_DAY).ceil() as i64).max(1)
}

/// Trim an id and reject empty or oversized ones.
pub fn normalize_id(id: &str) -> QuizResult<String> {
    let id = id.trim();
    if id.is_empty() {
        return Err(QuizError::InvalidLeaderboardId("id must not be empty".into()));
    }
    if id.chars().count() > MAX_ID_LEN {
        return Err(QuizError::InvalidLeaderboardId(format!(
            "id longer than {} characters",
            MAX_ID_LEN
        )));
    }
    Ok(id.to_string())
}

// ============================================================================
// Store Trait
// ============================================================================

/// Keyed store of leaderboard entries.
///
/// `upsert` performs its existence check and write as one critical
/// section, so two callers racing on the same id cannot both succeed
/// without `overwrite`.
pub trait LeaderboardStore: Send + Sync {
    /// Backend name (e.g., "memory", "sqlite")
    fn name(&self) -> &'static str;

    /// Insert `entry` under `id`, replacing an existing one only when `overwrite` is set
    fn upsert(&self, id: &str, entry: LeaderboardEntry, overwrite: bool) -> QuizResult<()>;

    /// All entries, in no particular order
    fn list(&self) -> QuizResult<Vec<LeaderboardEntry>>;

    fn get(&self, id: &str) -> QuizResult<Option<LeaderboardEntry>>;

    /// Returns whether an entry was removed
    fn remove(&self, id: &str) -> QuizResult<bool>;

    /// Returns the number of entries removed
    fn clear(&self) -> QuizResult<usize>;
}

// ============================================================================
// Presentation
// ============================================================================

/// Sort entries by total P/L, best first.
pub fn rank_by_total_profit_loss(mut entries: Vec<LeaderboardEntry>) -> Vec<LeaderboardEntry> {
    entries.sort_by(|a, b| b.total_profit_loss.total_cmp(&a.total_profit_loss));
    entries
}

/// Ranked entries plus headline figures.
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardSummary {
    pub entries: Vec<LeaderboardEntry>,
    pub total_entries: usize,
    pub top_performer: Option<String>,
    pub avg_win_rate: f64,
}

impl LeaderboardSummary {
    pub fn from_entries(entries: Vec<LeaderboardEntry>) -> Self {
        let entries = rank_by_total_profit_loss(entries);
        let avg_win_rate = if entries.is_empty() {
            0.0
        } else {
            entries.iter().map(|e| e.win_rate).sum::<f64>() / entries.len() as f64
        };

        Self {
            total_entries: entries.len(),
            top_performer: entries.first().map(|e| e.id.clone()),
            avg_win_rate,
            entries,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
