//! Error kinds raised by the quiz engine.
//!
//! Every variant is a local, recoverable condition reported to the
//! immediate caller. The HTTP layer maps them onto status codes through
//! `quiz_common::Error`.

use thiserror::Error;

/// Result alias for quiz engine operations.
pub type QuizResult<T> = std::result::Result<T, QuizError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuizError {
    /// Series too short to build a quiz
    #[error("Insufficient data: {available} points available, {required} required")]
    InsufficientData { available: usize, required: usize },

    /// No valid cutoff index exists
    #[error("Insufficient range: cutoff window [{min_index}, {max_index}) is empty")]
    InsufficientRange { min_index: usize, max_index: usize },

    /// Take-profit, stop-loss or holding period out of bounds
    #[error("Invalid strategy: {0}")]
    InvalidStrategy(String),

    /// No bars after the cutoff
    #[error("Hidden window is empty")]
    EmptyHiddenWindow,

    /// Leaderboard id empty or too long
    #[error("Invalid leaderboard id: {0}")]
    InvalidLeaderboardId(String),

    /// Upsert on an existing id without overwrite
    #[error("Leaderboard entry already exists: {0}")]
    DuplicateLeaderboardId(String),

    /// Persistent leaderboard backend failure
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<rusqlite::Error> for QuizError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for QuizError {
    fn from(e: serde_json::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<QuizError> for quiz_common::Error {
    fn from(e: QuizError) -> Self {
        match e {
            QuizError::DuplicateLeaderboardId(_) => Self::Conflict(e.to_string()),
            QuizError::Storage(msg) => Self::Internal(msg),
            other => Self::InvalidInput(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let dup: quiz_common::Error = QuizError::DuplicateLeaderboardId("alice".into()).into();
        assert_eq!(dup.status_code(), 409);

        let short: quiz_common::Error = QuizError::InsufficientData {
            available: 100,
            required: 210,
        }
        .into();
        assert_eq!(short.status_code(), 400);

        let storage: quiz_common::Error = QuizError::Storage("disk full".into()).into();
        assert_eq!(storage.status_code(), 500);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            QuizError::InsufficientData {
                available: 120,
                required: 210
            }
            .to_string(),
            "Insufficient data: 120 points available, 210 required"
        );
        assert_eq!(QuizError::EmptyHiddenWindow.to_string(), "Hidden window is empty");
    }
}
