//! Series sufficiency check.

use crate::data::Series;
use crate::error::{QuizError, QuizResult};

use super::{DEFAULT_HORIZON_PERIODS, DEFAULT_LOOKBACK_PERIODS};

/// Reject a series shorter than `min_required` points.
pub fn validate(series: &Series, min_required: usize) -> QuizResult<()> {
    if series.len() < min_required {
        return Err(QuizError::InsufficientData {
            available: series.len(),
            required: min_required,
        });
    }
    Ok(())
}

/// Validator bound to a fixed minimum length.
#[derive(Debug, Clone, Copy)]
pub struct SeriesValidator {
    min_required: usize,
}

impl SeriesValidator {
    pub fn new(min_required: usize) -> Self {
        Self { min_required }
    }

    /// Create from config (lookback + horizon)
    pub fn from_config(config: &quiz_common::QuizConfig) -> Self {
        Self::new(config.min_required_points())
    }

    pub fn min_required(&self) -> usize {
        self.min_required
    }

    pub fn validate(&self, series: &Series) -> QuizResult<()> {
        validate(series, self.min_required)
    }
}

impl Default for SeriesValidator {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKBACK_PERIODS + DEFAULT_HORIZON_PERIODS)
    }
}
