//! Market data module.
//!
//! Holds the price series model consumed by the quiz engine, plus the
//! collaborators that obtain series: remote providers and a local file cache.
//!
//! # Data Sources
//! - **Yahoo Finance** (stocks): v8 chart endpoint, daily bars
//! - **CoinGecko** (crypto): market chart endpoint, daily prices

mod cache;
mod coingecko;
mod provider;
mod yahoo;

pub use cache::{CacheStats, SeriesCache};
pub use coingecko::CoinGeckoProvider;
pub use provider::{ProviderError, SeriesProvider};
pub use yahoo::YahooProvider;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Asset Type / Timeframe
// ============================================================================

/// Kind of traded instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Stock,
    Crypto,
}

impl AssetType {
    /// Parse from string ("stock", "crypto")
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "stock" | "stocks" | "equity" => Some(Self::Stock),
            "crypto" | "coin" => Some(Self::Crypto),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stock => "stock",
            Self::Crypto => "crypto",
        }
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// History range requested from a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "6M")]
    SixMonths,
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "2Y")]
    TwoYears,
    #[serde(rename = "5Y")]
    FiveYears,
}

impl Timeframe {
    /// Parse from string (e.g., "3M", "2Y", "5y")
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "1M" => Some(Self::OneMonth),
            "3M" => Some(Self::ThreeMonths),
            "6M" => Some(Self::SixMonths),
            "1Y" => Some(Self::OneYear),
            "2Y" => Some(Self::TwoYears),
            "5Y" => Some(Self::FiveYears),
            _ => None,
        }
    }

    /// Calendar days covered by the range
    pub fn days(&self) -> u32 {
        match self {
            Self::OneMonth => 30,
            Self::ThreeMonths => 90,
            Self::SixMonths => 180,
            Self::OneYear => 365,
            Self::TwoYears => 730,
            Self::FiveYears => 1825,
        }
    }

    /// Days of crypto history to request.
    ///
    /// Crypto quizzes always pull at least two years so the cutoff window
    /// fits regardless of the requested range.
    pub fn crypto_days(&self) -> u32 {
        self.days().max(730)
    }

    /// Yahoo chart `range` parameter for stock history.
    ///
    /// Floored at two years like [`Timeframe::crypto_days`]; shorter ranges
    /// never hold enough daily bars for a quiz.
    pub fn stock_range(&self) -> &'static str {
        match self {
            Self::FiveYears => "5y",
            _ => "2y",
        }
    }
}

impl Default for Timeframe {
    fn default() -> Self {
        Self::TwoYears
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OneMonth => write!(f, "1M"),
            Self::ThreeMonths => write!(f, "3M"),
            Self::SixMonths => write!(f, "6M"),
            Self::OneYear => write!(f, "1Y"),
            Self::TwoYears => write!(f, "2Y"),
            Self::FiveYears => write!(f, "5Y"),
        }
    }
}

// ============================================================================
// Core Data Types
// ============================================================================

/// A single price bar.
///
/// Only `close` is mandatory; simple feeds that publish a single `price`
/// field deserialize into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    #[serde(alias = "price")]
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl PricePoint {
    /// Create a bar that carries only a closing price
    pub fn close_only(timestamp: DateTime<Utc>, close: f64) -> Self {
        Self {
            timestamp,
            open: None,
            high: None,
            low: None,
            close,
            volume: 0.0,
        }
    }
}

/// Descriptive instrument data shown next to the chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstrumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_52w: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_52w: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_close: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailing_pe: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward_pe: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_24h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_24h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_24h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ath: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atl: Option<f64>,
}

/// Ordered price history for one instrument.
///
/// Points are ascending by timestamp with no duplicate timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Series {
    pub symbol: String,
    pub asset_type: AssetType,
    points: Vec<PricePoint>,
    #[serde(default)]
    pub metadata: InstrumentMetadata,
}

impl Series {
    /// Build a series, sorting by timestamp and dropping repeated timestamps
    /// (the first occurrence wins).
    pub fn new(
        symbol: impl Into<String>,
        asset_type: AssetType,
        mut points: Vec<PricePoint>,
        metadata: InstrumentMetadata,
    ) -> Self {
        points.sort_by_key(|p| p.timestamp);
        points.dedup_by_key(|p| p.timestamp);

        Self {
            symbol: symbol.into(),
            asset_type,
            points,
            metadata,
        }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Latest bar, if any
    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    #[test]
    fn test_timeframe_parsing() {
        assert_eq!(Timeframe::from_str("2Y"), Some(Timeframe::TwoYears));
        assert_eq!(Timeframe::from_str("3m"), Some(Timeframe::ThreeMonths));
        assert_eq!(Timeframe::from_str("10Y"), None);
        assert_eq!(Timeframe::FiveYears.to_string(), "5Y");
    }

    #[test]
    fn test_crypto_days_floor() {
        assert_eq!(Timeframe::OneMonth.crypto_days(), 730);
        assert_eq!(Timeframe::TwoYears.crypto_days(), 730);
        assert_eq!(Timeframe::FiveYears.crypto_days(), 1825);
    }

    #[test]
    fn test_stock_range_floor() {
        for tf in [
            Timeframe::OneMonth,
            Timeframe::ThreeMonths,
            Timeframe::SixMonths,
            Timeframe::OneYear,
            Timeframe::TwoYears,
        ] {
            assert_eq!(tf.stock_range(), "2y", "{tf}");
        }
        assert_eq!(Timeframe::FiveYears.stock_range(), "5y");
    }

    #[test]
    fn test_asset_type_parsing() {
        assert_eq!(AssetType::from_str("Stock"), Some(AssetType::Stock));
        assert_eq!(AssetType::from_str("crypto"), Some(AssetType::Crypto));
        assert_eq!(AssetType::from_str("bond"), None);
    }

    #[test]
    fn test_series_sorted_and_deduplicated() {
        let points = vec![
            PricePoint::close_only(day(2), 12.0),
            PricePoint::close_only(day(0), 10.0),
            PricePoint::close_only(day(1), 11.0),
            PricePoint::close_only(day(1), 99.0),
        ];

        let series = Series::new("AAPL", AssetType::Stock, points, InstrumentMetadata::default());

        assert_eq!(series.len(), 3);
        let closes: Vec<f64> = series.points().iter().map(|p| p.close).collect();
        assert_eq!(closes, vec![10.0, 11.0, 12.0]);
    }

    #[test]
    fn test_price_alias_deserializes_into_close() {
        let point: PricePoint =
            serde_json::from_str(r#"{"timestamp": "2024-01-01T00:00:00Z", "price": 42.5}"#)
                .unwrap();
        assert!((point.close - 42.5).abs() < f64::EPSILON);
        assert!(point.open.is_none());
        assert!((point.volume).abs() < f64::EPSILON);
    }
}
