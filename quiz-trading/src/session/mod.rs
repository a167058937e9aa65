//! Quiz sessions.
//!
//! A session is one user's run of quizzes. Its statistics live in memory
//! for as long as the service runs and can be snapshotted to the
//! leaderboard.

mod manager;
mod stats;

pub use manager::{PendingQuiz, SessionManager};
pub use stats::{SessionStats, TradeSummary};
