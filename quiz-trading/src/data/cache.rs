//! On-disk series cache.
//!
//! Stores fetched series as JSON files so repeated quizzes on the same
//! instrument do not hit the providers. One file per
//! `(asset type, symbol, timeframe)`; freshness is judged from the
//! `cached_at` stamp written into the file.
//!
//! Every failure here is logged and reported as a miss. The cache never
//! fails a quiz request.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::{AssetType, Series, Timeframe};

/// Cache file payload
#[derive(Debug, Serialize, Deserialize)]
struct CachedSeries {
    cached_at: DateTime<Utc>,
    series: Series,
}

/// File-backed series cache with a fixed TTL.
pub struct SeriesCache {
    dir: PathBuf,
    ttl: Duration,
}

impl SeriesCache {
    /// Create a cache rooted at `dir` with a TTL in hours
    pub fn new(dir: impl Into<PathBuf>, ttl_hours: u64) -> Self {
        Self {
            dir: dir.into(),
            ttl: Duration::hours(ttl_hours as i64),
        }
    }

    /// Create from config
    pub fn from_config(config: &quiz_common::Config) -> Self {
        Self::new(config.data.cache_dir(), config.data.cache_ttl_hours)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache file name for a key
    pub fn cache_key(asset_type: AssetType, symbol: &str, timeframe: Timeframe) -> String {
        let safe_symbol: String = symbol
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
            .collect();
        format!("{}_{}_{}.json", asset_type, safe_symbol, timeframe)
    }

    fn path_for(&self, asset_type: AssetType, symbol: &str, timeframe: Timeframe) -> PathBuf {
        self.dir.join(Self::cache_key(asset_type, symbol, timeframe))
    }

    /// Load a fresh cached series, if present
    pub fn load(&self, asset_type: AssetType, symbol: &str, timeframe: Timeframe) -> Option<Series> {
        self.load_at(asset_type, symbol, timeframe, Utc::now())
    }

    /// Load a cached series judged fresh relative to `now`
    pub fn load_at(
        &self,
        asset_type: AssetType,
        symbol: &str,
        timeframe: Timeframe,
        now: DateTime<Utc>,
    ) -> Option<Series> {
        let path = self.path_for(asset_type, symbol, timeframe);
        if !path.exists() {
            return None;
        }

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read cache file");
                return None;
            }
        };

        let cached: CachedSeries = match serde_json::from_str(&content) {
            Ok(cached) => cached,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Corrupt cache file ignored");
                return None;
            }
        };

        let age = now - cached.cached_at;
        if age > self.ttl {
            debug!(symbol, age_minutes = age.num_minutes(), "Cache expired");
            return None;
        }

        debug!(symbol, points = cached.series.len(), age_minutes = age.num_minutes(), "Cache hit");
        Some(cached.series)
    }

    /// Save a series; returns whether the write succeeded
    pub fn save(&self, series: &Series, timeframe: Timeframe) -> bool {
        self.save_at(series, timeframe, Utc::now())
    }

    /// Save a series stamped with `now`
    pub fn save_at(&self, series: &Series, timeframe: Timeframe, now: DateTime<Utc>) -> bool {
        if let Err(e) = fs::create_dir_all(&self.dir) {
            warn!(dir = %self.dir.display(), error = %e, "Failed to create cache directory");
            return false;
        }

        let path = self.path_for(series.asset_type, &series.symbol, timeframe);
        let payload = CachedSeries {
            cached_at: now,
            series: series.clone(),
        };

        let result = serde_json::to_string(&payload)
            .map_err(|e| e.to_string())
            .and_then(|json| fs::write(&path, json).map_err(|e| e.to_string()));

        match result {
            Ok(()) => {
                debug!(symbol = %series.symbol, points = series.len(), "Series cached");
                true
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to write cache file");
                false
            }
        }
    }

    /// Remove one cached series; returns whether a file was removed
    pub fn invalidate(&self, asset_type: AssetType, symbol: &str, timeframe: Timeframe) -> bool {
        fs::remove_file(self.path_for(asset_type, symbol, timeframe)).is_ok()
    }

    /// Remove every cache file; returns the number removed
    pub fn clear_all(&self) -> usize {
        let cleared = self
            .json_files()
            .into_iter()
            .filter(|path| fs::remove_file(path).is_ok())
            .count();

        info!(cleared, "Series cache cleared");
        cleared
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let files = self.json_files();
        let total_bytes = files
            .iter()
            .filter_map(|path| fs::metadata(path).ok())
            .map(|meta| meta.len())
            .sum();

        CacheStats {
            entries: files.len(),
            total_bytes,
        }
    }

    fn json_files(&self) -> Vec<PathBuf> {
        fs::read_dir(&self.dir)
            .map(|entries| {
                entries
                    .filter_map(|entry| entry.ok())
                    .map(|entry| entry.path())
                    .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub total_bytes: u64,
}

// ============================================================================
// Tests
// ============================================================================
