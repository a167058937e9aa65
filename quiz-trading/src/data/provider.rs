//! Series provider abstraction.
//!
//! Defines the `SeriesProvider` trait implemented by every remote data
//! source. The quiz service never sees provider-specific failures; it maps
//! them onto a generic "data unavailable" condition.

use async_trait::async_trait;
use std::fmt;

use super::{AssetType, Series, Timeframe};

// ============================================================================
// Provider Error
// ============================================================================

/// Errors specific to data providers.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Network error (connection failed, timeout)
    Network(String),
    /// The provider does not know the symbol
    NotFound(String),
    /// Rate limit exceeded
    RateLimited,
    /// Response could not be decoded
    Parse(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::NotFound(symbol) => write!(f, "Symbol not found: {}", symbol),
            Self::RateLimited => write!(f, "Rate limited"),
            Self::Parse(msg) => write!(f, "Failed to parse response: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

impl ProviderError {
    /// Check if the error is transient (worth retrying at a higher layer)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::RateLimited)
    }

    /// Map a reqwest transport error.
    pub(crate) fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Network("Request timeout".into())
        } else if e.is_connect() {
            Self::Network("Connection failed".into())
        } else {
            Self::Network(e.to_string())
        }
    }

    /// Map a non-success HTTP status.
    pub(crate) fn from_status(status: reqwest::StatusCode, symbol: &str) -> Self {
        match status {
            reqwest::StatusCode::NOT_FOUND => Self::NotFound(symbol.to_string()),
            reqwest::StatusCode::TOO_MANY_REQUESTS => Self::RateLimited,
            other => Self::Network(format!("HTTP {}", other)),
        }
    }
}

// ============================================================================
// Series Provider Trait
// ============================================================================

/// Trait for historical price providers.
#[async_trait]
pub trait SeriesProvider: Send + Sync {
    /// Provider name (e.g., "yahoo", "coingecko")
    fn name(&self) -> &'static str;

    /// Asset class this provider serves
    fn asset_type(&self) -> AssetType;

    /// Fetch the daily price history and instrument metadata for a symbol.
    async fn fetch_series(&self, symbol: &str, timeframe: Timeframe)
        -> Result<Series, ProviderError>;
}
