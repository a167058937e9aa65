//! In-memory registry of quiz sessions.
//!
//! Each session owns its running statistics. Quizzes handed out to a
//! session are parked here with their hidden window until the strategy is
//! submitted, so the future prices never leave the server.

use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::SessionStats;
use crate::backtest::TradeOutcome;
use crate::data::{AssetType, InstrumentMetadata};
use crate::quiz::QuizSnapshot;

/// A quiz waiting for its strategy submission.
#[derive(Debug, Clone)]
pub struct PendingQuiz {
    pub quiz_id: String,
    pub session_id: String,
    pub symbol: String,
    pub asset_type: AssetType,
    pub metadata: InstrumentMetadata,
    pub snapshot: QuizSnapshot,
    pub created_at: DateTime<Utc>,
}

/// Session manager
#[derive(Default)]
pub struct SessionManager {
    sessions: RwLock<HashMap<String, SessionStats>>,
    quizzes: RwLock<HashMap<String, PendingQuiz>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park a quiz until its strategy arrives
    pub async fn register_quiz(&self, quiz: PendingQuiz) {
        debug!(quiz_id = %quiz.quiz_id, session_id = %quiz.session_id, symbol = %quiz.symbol, "Quiz registered");
        // Lock order: sessions, then quizzes
        let mut sessions = self.sessions.write().await;
        let mut quizzes = self.quizzes.write().await;
        sessions.entry(quiz.session_id.clone()).or_default();
        quizzes.insert(quiz.quiz_id.clone(), quiz);
    }

    /// Copy of a pending quiz, left in place
    pub async fn peek_quiz(&self, quiz_id: &str) -> Option<PendingQuiz> {
        self.quizzes.read().await.get(quiz_id).cloned()
    }

    pub async fn pending_count(&self) -> usize {
        self.quizzes.read().await.len()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Consume a pending quiz and fold its outcome into the session's stats.
    ///
    /// Both happen under one lock, so a quiz is answered once and a reset
    /// in between discards the outcome. Returns `None` when the quiz is no
    /// longer pending.
    pub async fn complete_quiz(
        &self,
        quiz_id: &str,
        outcome: &TradeOutcome,
        now: DateTime<Utc>,
    ) -> Option<(PendingQuiz, SessionStats)> {
        let mut sessions = self.sessions.write().await;
        let quiz = self.quizzes.write().await.remove(quiz_id)?;

        let stats = sessions.entry(quiz.session_id.clone()).or_default();
        stats.apply(outcome, &quiz.symbol, now);
        let stats = stats.clone();
        Some((quiz, stats))
    }

    /// Current stats; unknown sessions have empty stats
    pub async fn stats(&self, session_id: &str) -> SessionStats {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Clear a session's stats and its pending quizzes.
    ///
    /// Returns whether the session was known.
    pub async fn reset(&self, session_id: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        let mut quizzes = self.quizzes.write().await;

        let known = sessions
            .get_mut(session_id)
            .map(SessionStats::reset)
            .is_some();
        quizzes.retain(|_, quiz| quiz.session_id != session_id);

        if known {
            info!(session_id, "Session reset");
        }
        known
    }

    /// Drop pending quizzes older than `max_age`, then sessions with no
    /// trades and nothing pending. Returns how many quizzes were dropped.
    pub async fn prune_expired(&self, max_age: Duration, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let mut quizzes = self.quizzes.write().await;

        let before = quizzes.len();
        quizzes.retain(|_, quiz| now - quiz.created_at <= max_age);
        let pruned = before - quizzes.len();

        let live: HashSet<&str> = quizzes.values().map(|q| q.session_id.as_str()).collect();
        let sessions_before = sessions.len();
        sessions.retain(|id, stats| stats.total_trades > 0 || live.contains(id.as_str()));
        let idle = sessions_before - sessions.len();

        if pruned > 0 || idle > 0 {
            debug!(pruned, idle_sessions = idle, "Expired quizzes pruned");
        }
        pruned
    }
}

// ============================================================================
// Tests
// ============================================================================
