//! Random cutoff selection.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::data::{PricePoint, Series};
use crate::error::{QuizError, QuizResult};

use super::{DEFAULT_HORIZON_PERIODS, DEFAULT_LOOKBACK_PERIODS};

/// Visible/hidden split of one series.
///
/// `visible` ends with the cutoff bar, `hidden` starts at the bar right
/// after it. The two never overlap.
#[derive(Debug, Clone, Copy)]
pub struct QuizWindow<'a> {
    pub visible: &'a [PricePoint],
    pub hidden: &'a [PricePoint],
    /// Index of the cutoff bar in the source series
    pub cutoff_index: usize,
    pub cutoff_timestamp: DateTime<Utc>,
}

impl<'a> QuizWindow<'a> {
    /// Close of the cutoff bar; the trade entry price
    pub fn entry_price(&self) -> f64 {
        self.visible.last().map(|p| p.close).unwrap_or_default()
    }

    /// Copy both windows out of the source series
    pub fn to_snapshot(&self) -> QuizSnapshot {
        QuizSnapshot {
            visible: self.visible.to_vec(),
            hidden: self.hidden.to_vec(),
            cutoff_index: self.cutoff_index,
            cutoff_timestamp: self.cutoff_timestamp,
        }
    }
}

/// Owned copy of a [`QuizWindow`], kept until the strategy is submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSnapshot {
    pub visible: Vec<PricePoint>,
    pub hidden: Vec<PricePoint>,
    pub cutoff_index: usize,
    pub cutoff_timestamp: DateTime<Utc>,
}

impl QuizSnapshot {
    pub fn entry_price(&self) -> f64 {
        self.visible.last().map(|p| p.close).unwrap_or_default()
    }
}

/// Draws a cutoff uniformly from the indices that leave `lookback` bars
/// before it and `horizon` bars after it.
#[derive(Debug, Clone, Copy)]
pub struct CutoffSelector {
    lookback: usize,
    horizon: usize,
}

impl CutoffSelector {
    pub fn new(lookback: usize, horizon: usize) -> Self {
        Self { lookback, horizon }
    }

    /// Create from config
    pub fn from_config(config: &quiz_common::QuizConfig) -> Self {
        Self::new(config.lookback_periods, config.horizon_periods)
    }

    pub fn lookback(&self) -> usize {
        self.lookback
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Split `series` at a random cutoff.
    ///
    /// The cutoff index lies in `[lookback, len - horizon)`. The visible
    /// window holds at most `lookback + 1` bars, the hidden one at most
    /// `horizon`.
    pub fn select_cutoff<'a, R: Rng>(
        &self,
        series: &'a Series,
        rng: &mut R,
    ) -> QuizResult<QuizWindow<'a>> {
        let points = series.points();
        let min_index = self.lookback;
        let max_index = points.len().saturating_sub(self.horizon);

        if max_index <= min_index {
            return Err(QuizError::InsufficientRange {
                min_index,
                max_index,
            });
        }

        let cutoff_index = rng.gen_range(min_index..max_index);
        let start = cutoff_index.saturating_sub(self.lookback);
        let hidden_end = (cutoff_index + 1 + self.horizon).min(points.len());

        Ok(QuizWindow {
            visible: &points[start..=cutoff_index],
            hidden: &points[cutoff_index + 1..hidden_end],
            cutoff_index,
            cutoff_timestamp: points[cutoff_index].timestamp,
        })
    }
}

impl Default for CutoffSelector {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKBACK_PERIODS, DEFAULT_HORIZON_PERIODS)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{AssetType, InstrumentMetadata};
    use chrono::{Duration, TimeZone};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ramp(len: usize) -> Series {
        let start = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
        let points = (0..len)
            .map(|i| PricePoint::close_only(start + Duration::days(i as i64), i as f64))
            .collect();
        Series::new("RAMP", AssetType::Crypto, points, InstrumentMetadata::default())
    }

    #[test]
    fn test_window_shapes() {
        let series = ramp(400);
        let mut rng = StdRng::seed_from_u64(7);
        let window = CutoffSelector::default().select_cutoff(&series, &mut rng).unwrap();

        assert!((180..370).contains(&window.cutoff_index));
        assert_eq!(window.visible.len(), 181);
        assert_eq!(window.hidden.len(), 30);
        assert_eq!(window.visible.last().unwrap().timestamp, window.cutoff_timestamp);
        assert!((window.entry_price() - window.cutoff_index as f64).abs() < f64::EPSILON);
        assert!((window.hidden[0].close - (window.cutoff_index + 1) as f64).abs() < f64::EPSILON);
    }

    #[test]
    fn test_same_seed_same_cutoff() {
        let series = ramp(500);
        let selector = CutoffSelector::default();
        let a = selector
            .select_cutoff(&series, &mut StdRng::seed_from_u64(42))
            .unwrap();
        let b = selector
            .select_cutoff(&series, &mut StdRng::seed_from_u64(42))
            .unwrap();
        assert_eq!(a.cutoff_index, b.cutoff_index);
    }

    #[test]
    fn test_smallest_valid_series_has_one_cutoff() {
        let series = ramp(211);
        let mut rng = StdRng::seed_from_u64(1);
        let window = CutoffSelector::default().select_cutoff(&series, &mut rng).unwrap();
        assert_eq!(window.cutoff_index, 180);
        assert_eq!(window.hidden.len(), 30);
    }

    #[test]
    fn test_insufficient_range() {
        let series = ramp(210);
        let mut rng = StdRng::seed_from_u64(1);
        let err = CutoffSelector::default()
            .select_cutoff(&series, &mut rng)
            .unwrap_err();
        assert_eq!(
            err,
            QuizError::InsufficientRange {
                min_index: 180,
                max_index: 180
            }
        );

        assert!(CutoffSelector::default()
            .select_cutoff(&ramp(10), &mut rng)
            .is_err());
    }

    #[test]
    fn test_snapshot_copies_windows() {
        let series = ramp(300);
        let mut rng = StdRng::seed_from_u64(3);
        let window = CutoffSelector::default().select_cutoff(&series, &mut rng).unwrap();
        let snapshot = window.to_snapshot();

        assert_eq!(snapshot.visible.as_slice(), window.visible);
        assert_eq!(snapshot.hidden.as_slice(), window.hidden);
        assert!((snapshot.entry_price() - window.entry_price()).abs() < f64::EPSILON);
    }
}
