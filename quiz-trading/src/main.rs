//! Quiz Trading - chart quiz HTTP service.
//!
//! Serves random historical chart cutoffs for stocks and crypto, backtests
//! the user's exit strategy on the hidden bars and keeps a leaderboard.

use anyhow::Result;
use quiz_common::config::Config;
use quiz_common::logging::init_logging_with_exclusions;
use quiz_trading::QuizServer;

#[tokio::main]
async fn main() -> Result<()> {
    let startup_start = std::time::Instant::now();

    // Load configuration (file, then QUIZ_* env overrides) and validate
    let config = Config::load_and_validate()?;

    init_logging_with_exclusions(
        &config.observability.log_level,
        &config.observability.log_format,
        &config.observability.excluded_targets,
    );

    tracing::info!("Quiz Trading v{}", env!("CARGO_PKG_VERSION"));

    let server = QuizServer::new(config)?;

    let startup_duration = startup_start.elapsed();
    tracing::info!(
        duration_ms = startup_duration.as_millis() as u64,
        "Service initialized in {:?}",
        startup_duration
    );

    server.start().await
}
