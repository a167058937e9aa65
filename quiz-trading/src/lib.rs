//! Quiz Trading - chart quiz service.
//!
//! Shows a price history cut at a random date, lets the user set a
//! take-profit, stop-loss and holding limit, then backtests that trade on
//! the hidden bars and keeps score.
//!
//! # Modules
//! - [`data`]: price series model, Yahoo/CoinGecko providers, file cache
//! - [`quiz`]: series validation and cutoff selection
//! - [`backtest`]: single-trade simulation and grading
//! - [`session`]: per-session running statistics
//! - [`leaderboard`]: saved session snapshots (memory or SQLite)
//! - [`service`]: orchestration used by the HTTP routes

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod backtest;
pub mod data;
pub mod error;
pub mod leaderboard;
pub mod quiz;
pub mod routes;
pub mod service;
pub mod session;

pub use error::{QuizError, QuizResult};
pub use service::QuizService;

use anyhow::Result;
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, timeout::TimeoutLayer};
use quiz_common::config::Config;

/// Request bodies are small JSON documents
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Shared state for the HTTP handlers
pub struct QuizState {
    pub config: Config,
    pub service: Arc<QuizService>,
}

impl QuizState {
    pub fn new(config: Config, service: QuizService) -> Self {
        Self {
            config,
            service: Arc::new(service),
        }
    }
}

/// Build the HTTP router
pub fn build_router(state: Arc<QuizState>) -> Router {
    let timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    Router::new()
        .route("/health", get(routes::health))
        .route("/api/v1/quiz/:asset/:symbol", get(routes::start_quiz))
        .route("/api/v1/quizzes/:quiz_id/strategy", post(routes::submit_strategy))
        .route(
            "/api/v1/sessions/:session_id/stats",
            get(routes::get_session_stats).delete(routes::reset_session_stats),
        )
        .route(
            "/api/v1/leaderboard",
            get(routes::get_leaderboard)
                .post(routes::save_leaderboard_entry)
                .delete(routes::clear_leaderboard),
        )
        .route("/api/v1/leaderboard/:id", delete(routes::delete_leaderboard_entry))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TimeoutLayer::new(timeout))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Quiz HTTP service
pub struct QuizServer {
    state: Arc<QuizState>,
}

impl QuizServer {
    /// Create the production service from config
    pub fn new(config: Config) -> Result<Self> {
        let service = QuizService::from_config(&config)?;
        Ok(Self {
            state: Arc::new(QuizState::new(config, service)),
        })
    }

    pub async fn start(self) -> Result<()> {
        let app = build_router(Arc::clone(&self.state));

        let addr: SocketAddr = self.state.config.bind_address().parse()?;
        tracing::info!(address = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
    }
}
