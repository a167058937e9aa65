//! Yahoo Finance adapter for stock price history.
//!
//! Uses the public v8 chart endpoint:
//! `GET {base}/v8/finance/chart/{symbol}?range=2y&interval=1d`
//!
//! Bars with a null close (halts, holidays reported as gaps) are skipped.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::provider::{ProviderError, SeriesProvider};
use super::{AssetType, InstrumentMetadata, PricePoint, Series, Timeframe};

/// Default Yahoo query host
const YAHOO_API_BASE: &str = "https://query1.finance.yahoo.com";

/// Chart endpoint path
const CHART_ENDPOINT: &str = "/v8/finance/chart";

/// Some Yahoo edges reject requests without a browser-like agent
const USER_AGENT: &str = "Mozilla/5.0 (compatible; chart-quiz/0.1)";

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    symbol: String,
    currency: Option<String>,
    exchange_name: Option<String>,
    long_name: Option<String>,
    short_name: Option<String>,
    regular_market_price: Option<f64>,
    chart_previous_close: Option<f64>,
    regular_market_volume: Option<f64>,
    fifty_two_week_high: Option<f64>,
    fifty_two_week_low: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

// ============================================================================
// Adapter
// ============================================================================

/// Yahoo Finance stock provider.
pub struct YahooProvider {
    client: reqwest::Client,
    base_url: String,
}

impl YahooProvider {
    /// Create a provider against the public Yahoo host
    pub fn new(timeout_secs: u64) -> Self {
        Self::with_base_url(YAHOO_API_BASE, timeout_secs)
    }

    /// Create a provider against a custom host (mirrors, test servers)
    pub fn with_base_url(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Create from config
    pub fn from_config(config: &quiz_common::Config) -> Self {
        Self::with_base_url(&config.data.yahoo_base_url, config.data.request_timeout_secs)
    }
}

#[async_trait]
impl SeriesProvider for YahooProvider {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    fn asset_type(&self) -> AssetType {
        AssetType::Stock
    }

    async fn fetch_series(
        &self,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<Series, ProviderError> {
        let url = format!(
            "{}{}/{}?range={}&interval=1d",
            self.base_url,
            CHART_ENDPOINT,
            symbol,
            timeframe.stock_range()
        );

        debug!(url = %url, symbol, "Fetching chart from Yahoo");

        let response = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(ProviderError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::from_status(status, symbol));
        }

        let body: ChartResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        parse_chart(symbol, body)
    }
}

/// Convert a chart response into a series.
fn parse_chart(symbol: &str, body: ChartResponse) -> Result<Series, ProviderError> {
    if let Some(err) = body.chart.error {
        if err.code.eq_ignore_ascii_case("not found") {
            return Err(ProviderError::NotFound(symbol.to_string()));
        }
        return Err(ProviderError::Parse(format!("{}: {}", err.code, err.description)));
    }

    let result = body
        .chart
        .result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
        .ok_or_else(|| ProviderError::NotFound(symbol.to_string()))?;

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let at = |values: &[Option<f64>], i: usize| values.get(i).copied().flatten();

    let mut points = Vec::with_capacity(result.timestamp.len());
    for (i, ts) in result.timestamp.iter().enumerate() {
        let Some(close) = at(&quote.close, i) else {
            continue;
        };
        let timestamp = Utc
            .timestamp_opt(*ts, 0)
            .single()
            .ok_or_else(|| ProviderError::Parse(format!("Invalid timestamp: {}", ts)))?;

        points.push(PricePoint {
            timestamp,
            open: at(&quote.open, i),
            high: at(&quote.high, i),
            low: at(&quote.low, i),
            close,
            volume: at(&quote.volume, i).unwrap_or(0.0),
        });
    }

    let meta = result.meta;
    let metadata = InstrumentMetadata {
        name: meta.long_name.or(meta.short_name),
        symbol: Some(meta.symbol.clone()),
        currency: meta.currency,
        exchange: meta.exchange_name,
        high_52w: meta.fifty_two_week_high,
        low_52w: meta.fifty_two_week_low,
        volume: meta.regular_market_volume,
        current_price: meta.regular_market_price,
        previous_close: meta.chart_previous_close,
        ..Default::default()
    };

    Ok(Series::new(meta.symbol, AssetType::Stock, points, metadata))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_body() -> ChartResponse {
        serde_json::from_str(
            r#"{
                "chart": {
                    "result": [{
                        "meta": {
                            "symbol": "AAPL",
                            "currency": "USD",
                            "exchangeName": "NMS",
                            "regularMarketPrice": 190.5,
                            "fiftyTwoWeekHigh": 199.6,
                            "fiftyTwoWeekLow": 164.1
                        },
                        "timestamp": [1704153600, 1704240000, 1704326400],
                        "indicators": {
                            "quote": [{
                                "open": [187.1, null, 184.2],
                                "high": [188.4, null, 185.9],
                                "low": [183.9, null, 183.4],
                                "close": [185.6, null, 184.3],
                                "volume": [82488700, null, 58414500]
                            }]
                        }
                    }],
                    "error": null
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_chart_skips_null_closes() {
        let series = parse_chart("AAPL", sample_body()).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.asset_type, AssetType::Stock);
        assert!((series.points()[1].close - 184.3).abs() < 1e-9);
        assert_eq!(series.points()[0].high, Some(188.4));
    }

    #[test]
    fn test_parse_chart_metadata() {
        let series = parse_chart("AAPL", sample_body()).unwrap();

        assert_eq!(series.metadata.currency.as_deref(), Some("USD"));
        assert_eq!(series.metadata.exchange.as_deref(), Some("NMS"));
        assert_eq!(series.metadata.high_52w, Some(199.6));
        assert_eq!(series.metadata.low_52w, Some(164.1));
    }

    #[test]
    fn test_parse_chart_error_not_found() {
        let body: ChartResponse = serde_json::from_str(
            r#"{"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}}"#,
        )
        .unwrap();

        assert_eq!(
            parse_chart("ZZZZ", body).unwrap_err(),
            ProviderError::NotFound("ZZZZ".into())
        );
    }

    #[test]
    fn test_parse_chart_empty_result() {
        let body: ChartResponse =
            serde_json::from_str(r#"{"chart": {"result": [], "error": null}}"#).unwrap();
        assert!(matches!(parse_chart("AAPL", body), Err(ProviderError::NotFound(_))));
    }

    #[test]
    fn test_provider_identity() {
        let provider = YahooProvider::with_base_url("http://localhost:9/", 1);
        assert_eq!(provider.name(), "yahoo");
        assert_eq!(provider.asset_type(), AssetType::Stock);
        assert_eq!(provider.base_url, "http://localhost:9");
    }
}
