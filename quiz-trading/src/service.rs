//! Quiz service.
//!
//! Ties the data layer, the quiz engine, sessions and the leaderboard
//! together. This is the only layer that reads the clock or draws random
//! numbers; everything below it takes those as arguments.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

use quiz_common::{Config, Error, Result};

use crate::backtest::{
    format_session_report, format_trade_report, BacktestEngine, StrategyParams, TradeAnalysis,
    TradeOutcome,
};
use crate::data::{
    AssetType, CoinGeckoProvider, InstrumentMetadata, PricePoint, Series, SeriesCache,
    SeriesProvider, Timeframe, YahooProvider,
};
use crate::leaderboard::{
    LeaderboardEntry, LeaderboardStore, LeaderboardSummary, MemoryLeaderboard, SqliteLeaderboard,
};
use crate::quiz::{CutoffSelector, SeriesValidator};
use crate::session::{PendingQuiz, SessionManager, SessionStats};

/// Unanswered quizzes are dropped after this long
const PENDING_QUIZ_TTL_HOURS: i64 = 24;

// ============================================================================
// Response Types
// ============================================================================

/// A freshly generated quiz. Only the visible window is included.
#[derive(Debug, Clone, Serialize)]
pub struct QuizStart {
    pub quiz_id: String,
    pub session_id: String,
    pub symbol: String,
    pub asset_type: AssetType,
    pub timeframe: Timeframe,
    pub cutoff_date: DateTime<Utc>,
    pub entry_price: f64,
    /// Bars available for the backtest
    pub hidden_periods: usize,
    pub data: Vec<PricePoint>,
    pub metadata: InstrumentMetadata,
}

/// Result of a strategy submission.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyResult {
    pub quiz_id: String,
    pub session_id: String,
    pub symbol: String,
    pub asset_type: AssetType,
    pub metadata: InstrumentMetadata,
    pub params: StrategyParams,
    pub outcome: TradeOutcome,
    pub analysis: TradeAnalysis,
    /// The hidden bars, revealed once the quiz is answered
    pub future_data: Vec<PricePoint>,
    pub stats: SessionStats,
    pub report: String,
}

/// Session statistics with derived figures.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: String,
    pub stats: SessionStats,
    pub win_rate: f64,
    pub avg_profit_loss_percent: f64,
    pub avg_holding_periods: f64,
    pub report: String,
}

impl SessionView {
    fn new(session_id: &str, stats: SessionStats) -> Self {
        Self {
            session_id: session_id.to_string(),
            win_rate: stats.win_rate(),
            avg_profit_loss_percent: stats.avg_profit_loss_percent(),
            avg_holding_periods: stats.avg_holding_periods(),
            report: format_session_report(&stats),
            stats,
        }
    }
}

// ============================================================================
// Service
// ============================================================================

/// Quiz service
pub struct QuizService {
    providers: HashMap<AssetType, Arc<dyn SeriesProvider>>,
    cache: Option<SeriesCache>,
    validator: SeriesValidator,
    selector: CutoffSelector,
    engine: BacktestEngine,
    sessions: SessionManager,
    leaderboard: Arc<dyn LeaderboardStore>,
    default_timeframe: Timeframe,
    rng: Mutex<StdRng>,
}

impl QuizService {
    /// Create a service with no providers and no cache
    pub fn new(config: &Config, leaderboard: Arc<dyn LeaderboardStore>) -> Self {
        let default_timeframe =
            Timeframe::from_str(&config.quiz.default_timeframe).unwrap_or_default();

        Self {
            providers: HashMap::new(),
            cache: None,
            validator: SeriesValidator::from_config(&config.quiz),
            selector: CutoffSelector::from_config(&config.quiz),
            engine: BacktestEngine::from_config(&config.quiz),
            sessions: SessionManager::new(),
            leaderboard,
            default_timeframe,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Build the production service: Yahoo and CoinGecko providers, the
    /// file cache and the configured leaderboard backend.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let leaderboard: Arc<dyn LeaderboardStore> = match config.leaderboard.backend.as_str() {
            "memory" => Arc::new(MemoryLeaderboard::new()),
            _ => Arc::new(SqliteLeaderboard::open(config.leaderboard.path())?),
        };

        info!(backend = leaderboard.name(), "Leaderboard backend ready");

        Ok(Self::new(config, leaderboard)
            .with_provider(Arc::new(YahooProvider::from_config(config)))
            .with_provider(Arc::new(CoinGeckoProvider::from_config(config)))
            .with_cache(SeriesCache::from_config(config)))
    }

    /// Register a provider for its asset type, replacing any previous one
    pub fn with_provider(mut self, provider: Arc<dyn SeriesProvider>) -> Self {
        self.providers.insert(provider.asset_type(), provider);
        self
    }

    pub fn with_cache(mut self, cache: SeriesCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Use a seeded RNG for cutoff selection
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    // ========================================================================
    // Quiz Operations
    // ========================================================================

    /// Fetch a series, draw a cutoff and park the hidden window for `session_id`.
    ///
    /// A new session id is issued when none is given.
    pub async fn start_quiz(
        &self,
        asset_type: AssetType,
        symbol: &str,
        timeframe: Option<Timeframe>,
        session_id: Option<String>,
    ) -> Result<QuizStart> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(Error::InvalidInput("Symbol is required".into()));
        }
        // Tickers are upper case, CoinGecko ids lower case
        let symbol = match asset_type {
            AssetType::Stock => symbol.to_uppercase(),
            AssetType::Crypto => symbol.to_lowercase(),
        };
        let symbol = symbol.as_str();

        let timeframe = timeframe.unwrap_or(self.default_timeframe);
        let session_id = session_id
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let series = self.load_series(asset_type, symbol, timeframe).await?;
        self.validator.validate(&series)?;

        let snapshot = {
            let mut rng = self
                .rng
                .lock()
                .map_err(|_| Error::Internal("RNG lock poisoned".into()))?;
            self.selector.select_cutoff(&series, &mut *rng)?.to_snapshot()
        };

        let now = Utc::now();
        self.sessions
            .prune_expired(Duration::hours(PENDING_QUIZ_TTL_HOURS), now)
            .await;

        let quiz_id = Uuid::new_v4().to_string();
        let start = QuizStart {
            quiz_id: quiz_id.clone(),
            session_id: session_id.clone(),
            symbol: series.symbol.clone(),
            asset_type,
            timeframe,
            cutoff_date: snapshot.cutoff_timestamp,
            entry_price: snapshot.entry_price(),
            hidden_periods: snapshot.hidden.len(),
            data: snapshot.visible.clone(),
            metadata: series.metadata.clone(),
        };

        self.sessions
            .register_quiz(PendingQuiz {
                quiz_id,
                session_id,
                symbol: series.symbol,
                asset_type,
                metadata: series.metadata,
                snapshot,
                created_at: now,
            })
            .await;

        info!(
            quiz_id = %start.quiz_id,
            symbol = %start.symbol,
            cutoff = %start.cutoff_date,
            "Quiz generated"
        );
        Ok(start)
    }

    /// Backtest `params` against a pending quiz and record the outcome.
    ///
    /// A quiz is answered once. A submission rejected for bad parameters
    /// leaves the quiz pending, and an answer racing a session reset is
    /// discarded.
    pub async fn submit_strategy(
        &self,
        quiz_id: &str,
        params: StrategyParams,
    ) -> Result<StrategyResult> {
        let pending = self
            .sessions
            .peek_quiz(quiz_id)
            .await
            .ok_or_else(|| Error::NotFound(format!("Quiz {}", quiz_id)))?;

        let entry_price = pending.snapshot.entry_price();
        let outcome = self
            .engine
            .run(entry_price, &pending.snapshot.hidden, &params)
            .map_err(|e| {
                debug!(quiz_id, error = %e, "Strategy rejected");
                Error::from(e)
            })?;

        // Answered concurrently, or its session was reset meanwhile
        let (quiz, stats) = self
            .sessions
            .complete_quiz(quiz_id, &outcome, Utc::now())
            .await
            .ok_or_else(|| Error::NotFound(format!("Quiz {}", quiz_id)))?;
        let analysis = TradeAnalysis::of(&outcome, &params);

        info!(
            quiz_id,
            symbol = %quiz.symbol,
            exit_reason = %outcome.exit_reason.as_str(),
            profit_loss = outcome.profit_loss,
            "Strategy evaluated"
        );

        Ok(StrategyResult {
            quiz_id: quiz.quiz_id,
            session_id: quiz.session_id,
            report: format_trade_report(&quiz.symbol, &outcome, &params, &analysis),
            symbol: quiz.symbol,
            asset_type: quiz.asset_type,
            metadata: quiz.metadata,
            params,
            outcome,
            analysis,
            future_data: quiz.snapshot.hidden,
            stats,
        })
    }

    pub async fn session_stats(&self, session_id: &str) -> SessionView {
        SessionView::new(session_id, self.sessions.stats(session_id).await)
    }

    /// Clear a session. Returns whether it existed.
    pub async fn reset_session(&self, session_id: &str) -> bool {
        self.sessions.reset(session_id).await
    }

    // ========================================================================
    // Leaderboard Operations
    // ========================================================================

    /// Snapshot a session's stats under `id`.
    pub async fn save_to_leaderboard(
        &self,
        session_id: &str,
        id: &str,
        overwrite: bool,
    ) -> Result<LeaderboardEntry> {
        let stats = self.sessions.stats(session_id).await;
        if stats.total_trades == 0 {
            return Err(Error::InvalidInput(
                "No statistics to save. Complete at least one quiz first".into(),
            ));
        }

        let entry = LeaderboardEntry::snapshot(id, &stats, Utc::now())?;
        self.leaderboard.upsert(&entry.id, entry.clone(), overwrite)?;

        info!(id = %entry.id, session_id, overwrite, "Saved to leaderboard");
        Ok(entry)
    }

    pub fn leaderboard(&self) -> Result<LeaderboardSummary> {
        Ok(LeaderboardSummary::from_entries(self.leaderboard.list()?))
    }

    pub fn delete_entry(&self, id: &str) -> Result<()> {
        if self.leaderboard.remove(id)? {
            info!(id, "Leaderboard entry deleted");
            Ok(())
        } else {
            Err(Error::NotFound(format!("Leaderboard entry {}", id)))
        }
    }

    pub fn clear_leaderboard(&self) -> Result<usize> {
        Ok(self.leaderboard.clear()?)
    }

    // ========================================================================
    // Data
    // ========================================================================

    /// Cached series if fresh, otherwise fetch and refresh the cache.
    async fn load_series(
        &self,
        asset_type: AssetType,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<Series> {
        if let Some(series) = self
            .cache
            .as_ref()
            .and_then(|cache| cache.load(asset_type, symbol, timeframe))
        {
            return Ok(series);
        }

        let provider = self.providers.get(&asset_type).ok_or_else(|| {
            Error::DataUnavailable(format!("No data provider for {}", asset_type))
        })?;

        let series = provider
            .fetch_series(symbol, timeframe)
            .await
            .map_err(|e| {
                warn!(provider = provider.name(), symbol, error = %e, "Series fetch failed");
                Error::DataUnavailable(format!("Failed to fetch data for {}", symbol))
            })?;

        if let Some(cache) = &self.cache {
            cache.save(&series, timeframe);
        }

        debug!(provider = provider.name(), symbol, points = series.len(), "Series fetched");
        Ok(series)
    }
}
