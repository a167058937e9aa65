//! Configuration management for the quiz services.
//!
//! All services share one configuration file at `~/.chart-quiz/config.json`.
//!
//! # Configuration Priority
//!
//! 1. Environment variables (QUIZ_* prefix)
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `QUIZ_PORT` → server.port
//! - `QUIZ_BIND_ADDRESS` → network.bind
//! - `QUIZ_LOG_LEVEL` → observability.log_level
//! - `QUIZ_CACHE_DIR` → data.cache_dir
//! - `QUIZ_LEADERBOARD_PATH` → leaderboard.path

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".chart-quiz"),
        |dirs| dirs.home_dir().join(".chart-quiz"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

// ============================================================================
// Network / Server
// ============================================================================

/// Network configuration.
///
/// Default is `127.0.0.1` (local only). Set to `0.0.0.0` to allow remote access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_bind_address")]
    pub bind: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind: default_bind_address(),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout for the HTTP layer, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

// ============================================================================
// Observability
// ============================================================================

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,

    /// Additional module targets forced to `warn`.
    #[serde(default)]
    pub excluded_targets: Vec<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            excluded_targets: Vec::new(),
        }
    }
}

// ============================================================================
// Quiz
// ============================================================================

/// Quiz window configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizConfig {
    /// Periods of history shown before the cutoff
    #[serde(default = "default_lookback_periods")]
    pub lookback_periods: usize,

    /// Periods hidden after the cutoff; also the max holding horizon
    #[serde(default = "default_horizon_periods")]
    pub horizon_periods: usize,

    /// History range requested from providers (e.g. "2Y")
    #[serde(default = "default_timeframe")]
    pub default_timeframe: String,
}

impl QuizConfig {
    /// Minimum series length a quiz can be generated from.
    pub fn min_required_points(&self) -> usize {
        self.lookback_periods + self.horizon_periods
    }
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            lookback_periods: default_lookback_periods(),
            horizon_periods: default_horizon_periods(),
            default_timeframe: default_timeframe(),
        }
    }
}

// ============================================================================
// Market Data
// ============================================================================

/// Market data provider and cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory for cached series files
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Cache freshness window in hours
    #[serde(default = "default_cache_ttl_hours")]
    pub cache_ttl_hours: u64,

    /// Provider HTTP timeout in seconds
    #[serde(default = "default_provider_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_yahoo_base_url")]
    pub yahoo_base_url: String,

    #[serde(default = "default_coingecko_base_url")]
    pub coingecko_base_url: String,

    /// Quote currency for crypto prices
    #[serde(default = "default_vs_currency")]
    pub vs_currency: String,
}

impl DataConfig {
    /// Resolved cache directory (defaults under the config directory).
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| config_dir().join("cache"))
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            cache_ttl_hours: default_cache_ttl_hours(),
            request_timeout_secs: default_provider_timeout_secs(),
            yahoo_base_url: default_yahoo_base_url(),
            coingecko_base_url: default_coingecko_base_url(),
            vs_currency: default_vs_currency(),
        }
    }
}

// ============================================================================
// Leaderboard
// ============================================================================

/// Leaderboard persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardConfig {
    /// Storage backend: "sqlite" or "memory"
    #[serde(default = "default_leaderboard_backend")]
    pub backend: String,

    /// SQLite database path (sqlite backend only)
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl LeaderboardConfig {
    /// Resolved database path (defaults under the config directory).
    pub fn path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| config_dir().join("leaderboard.db"))
    }
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            backend: default_leaderboard_backend(),
            path: None,
        }
    }
}

// ============================================================================
// Root
// ============================================================================

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub quiz: QuizConfig,

    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub leaderboard: LeaderboardConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::info!("Config file not found, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Load configuration with environment variable overrides.
    pub fn load_with_env() -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(port) = std::env::var("QUIZ_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }

        if let Ok(bind) = std::env::var("QUIZ_BIND_ADDRESS") {
            self.network.bind = bind;
        }

        if let Ok(level) = std::env::var("QUIZ_LOG_LEVEL") {
            self.observability.log_level = level;
        }

        if let Ok(dir) = std::env::var("QUIZ_CACHE_DIR") {
            self.data.cache_dir = Some(PathBuf::from(dir));
        }

        if let Ok(path) = std::env::var("QUIZ_LEADERBOARD_PATH") {
            self.leaderboard.path = Some(PathBuf::from(path));
        }
    }

    /// Socket address string the HTTP server binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.network.bind, self.server.port)
    }
}

// Default value functions
fn default_bind_address() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    3000
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "pretty".into()
}
fn default_lookback_periods() -> usize {
    180
}
fn default_horizon_periods() -> usize {
    30
}
fn default_timeframe() -> String {
    "2Y".into()
}
fn default_cache_ttl_hours() -> u64 {
    24
}
fn default_provider_timeout_secs() -> u64 {
    10
}
fn default_yahoo_base_url() -> String {
    "https://query1.finance.yahoo.com".into()
}
fn default_coingecko_base_url() -> String {
    "https://api.coingecko.com/api/v3".into()
}
fn default_vs_currency() -> String {
    "usd".into()
}
fn default_leaderboard_backend() -> String {
    "sqlite".into()
}
