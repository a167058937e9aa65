//! CoinGecko adapter for crypto-asset price history.
//!
//! # Endpoints
//! - `GET {base}/coins/{id}/market_chart?vs_currency=usd&days=730` for prices
//! - `GET {base}/coins/{id}` for name, 24h range, ATH/ATL
//!
//! CoinGecko returns daily granularity for ranges above 90 days. The market
//! chart carries only a single price per point, so bars are close-only.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use super::provider::{ProviderError, SeriesProvider};
use super::{AssetType, InstrumentMetadata, PricePoint, Series, Timeframe};

/// Public API host
const COINGECKO_API_BASE: &str = "https://api.coingecko.com/api/v3";

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct MarketChart {
    #[serde(default)]
    prices: Vec<(f64, f64)>,
    #[serde(default)]
    total_volumes: Vec<(f64, f64)>,
}

#[derive(Debug, Deserialize)]
struct CoinInfo {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    market_data: Option<CoinMarketData>,
}

/// Per-currency values are keyed by lowercase currency code.
#[derive(Debug, Default, Deserialize)]
struct CoinMarketData {
    #[serde(default)]
    current_price: HashMap<String, f64>,
    #[serde(default)]
    market_cap: HashMap<String, f64>,
    #[serde(default)]
    total_volume: HashMap<String, f64>,
    #[serde(default)]
    high_24h: HashMap<String, f64>,
    #[serde(default)]
    low_24h: HashMap<String, f64>,
    #[serde(default)]
    ath: HashMap<String, f64>,
    #[serde(default)]
    atl: HashMap<String, f64>,
    #[serde(default)]
    price_change_percentage_24h: Option<f64>,
}

// ============================================================================
// Adapter
// ============================================================================

/// CoinGecko crypto provider.
pub struct CoinGeckoProvider {
    client: reqwest::Client,
    base_url: String,
    vs_currency: String,
}

impl CoinGeckoProvider {
    /// Create a provider against the public CoinGecko host
    pub fn new(vs_currency: impl Into<String>, timeout_secs: u64) -> Self {
        Self::with_base_url(COINGECKO_API_BASE, vs_currency, timeout_secs)
    }

    /// Create a provider against a custom host
    pub fn with_base_url(
        base_url: impl Into<String>,
        vs_currency: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            vs_currency: vs_currency.into().to_lowercase(),
        }
    }

    /// Create from config
    pub fn from_config(config: &quiz_common::Config) -> Self {
        Self::with_base_url(
            &config.data.coingecko_base_url,
            &config.data.vs_currency,
            config.data.request_timeout_secs,
        )
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        coin_id: &str,
    ) -> Result<T, ProviderError> {
        debug!(url = %url, coin_id, "Fetching from CoinGecko");

        let response = self
            .client
            .get(url)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(ProviderError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::from_status(status, coin_id));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))
    }

    async fn fetch_metadata(&self, coin_id: &str) -> Result<InstrumentMetadata, ProviderError> {
        let url = format!(
            "{}/coins/{}?localization=false&tickers=false&community_data=false&developer_data=false",
            self.base_url, coin_id
        );
        let info: CoinInfo = self.get_json(&url, coin_id).await?;
        Ok(to_metadata(info, &self.vs_currency))
    }
}

#[async_trait]
impl SeriesProvider for CoinGeckoProvider {
    fn name(&self) -> &'static str {
        "coingecko"
    }

    fn asset_type(&self) -> AssetType {
        AssetType::Crypto
    }

    async fn fetch_series(
        &self,
        coin_id: &str,
        timeframe: Timeframe,
    ) -> Result<Series, ProviderError> {
        let url = format!(
            "{}/coins/{}/market_chart?vs_currency={}&days={}",
            self.base_url,
            coin_id,
            self.vs_currency,
            timeframe.crypto_days()
        );
        let chart: MarketChart = self.get_json(&url, coin_id).await?;
        let points = parse_market_chart(&chart)?;

        // Metadata is decorative; a failure here must not sink the quiz.
        let metadata = match self.fetch_metadata(coin_id).await {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(coin_id, error = %e, "CoinGecko metadata unavailable");
                InstrumentMetadata {
                    name: Some(coin_id.to_string()),
                    ..Default::default()
                }
            }
        };

        Ok(Series::new(coin_id, AssetType::Crypto, points, metadata))
    }
}

/// Zip the price and volume arrays into bars.
fn parse_market_chart(chart: &MarketChart) -> Result<Vec<PricePoint>, ProviderError> {
    chart
        .prices
        .iter()
        .enumerate()
        .map(|(i, (ts_ms, price))| {
            let timestamp = Utc
                .timestamp_millis_opt(*ts_ms as i64)
                .single()
                .ok_or_else(|| ProviderError::Parse(format!("Invalid timestamp: {}", ts_ms)))?;
            let volume = chart.total_volumes.get(i).map(|(_, v)| *v).unwrap_or(0.0);

            Ok(PricePoint {
                volume,
                ..PricePoint::close_only(timestamp, *price)
            })
        })
        .collect()
}

fn to_metadata(info: CoinInfo, vs_currency: &str) -> InstrumentMetadata {
    let market = info.market_data.unwrap_or_default();
    let pick = |values: &HashMap<String, f64>| values.get(vs_currency).copied();

    InstrumentMetadata {
        name: info.name,
        symbol: info.symbol.map(|s| s.to_uppercase()),
        currency: Some(vs_currency.to_uppercase()),
        market_cap: pick(&market.market_cap),
        volume: pick(&market.total_volume),
        current_price: pick(&market.current_price),
        previous_close: pick(&market.current_price),
        high_24h: pick(&market.high_24h),
        low_24h: pick(&market.low_24h),
        change_24h: market.price_change_percentage_24h,
        ath: pick(&market.ath),
        atl: pick(&market.atl),
        ..Default::default()
    }
}

// ============================================================================
// Tests
// ============================================================================
