//! Single-trade backtest over the hidden window.
//!
//! The position opens at the cutoff close and is checked bar by bar
//! against the take-profit and stop-loss levels. Only closes are known,
//! so a bar that satisfies both levels exits at take-profit.

use serde::{Deserialize, Serialize};

use crate::data::PricePoint;
use crate::error::{QuizError, QuizResult};
use crate::quiz::DEFAULT_HORIZON_PERIODS;

/// User-supplied exit rules for one long position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyParams {
    /// Exit with a profit once a close reaches this price
    pub take_profit_price: f64,
    /// Exit with a loss once a close falls to this price
    pub stop_loss_price: f64,
    /// Close the position after this many bars regardless of price
    pub max_holding_periods: usize,
}

impl StrategyParams {
    pub fn new(take_profit_price: f64, stop_loss_price: f64, max_holding_periods: usize) -> Self {
        Self {
            take_profit_price,
            stop_loss_price,
            max_holding_periods,
        }
    }

    /// Check `take_profit > entry > stop_loss` and `1 <= max_holding <= max_horizon`.
    pub fn validate(&self, entry_price: f64, max_horizon: usize) -> QuizResult<()> {
        if !(entry_price.is_finite() && entry_price > 0.0) {
            return Err(QuizError::InvalidStrategy(format!(
                "entry price must be positive, got {}",
                entry_price
            )));
        }
        if !self.take_profit_price.is_finite() || self.take_profit_price <= entry_price {
            return Err(QuizError::InvalidStrategy(format!(
                "take-profit {} must be above entry price {}",
                self.take_profit_price, entry_price
            )));
        }
        if !self.stop_loss_price.is_finite() || self.stop_loss_price >= entry_price {
            return Err(QuizError::InvalidStrategy(format!(
                "stop-loss {} must be below entry price {}",
                self.stop_loss_price, entry_price
            )));
        }
        if self.max_holding_periods == 0 || self.max_holding_periods > max_horizon {
            return Err(QuizError::InvalidStrategy(format!(
                "max holding periods must be between 1 and {}, got {}",
                max_horizon, self.max_holding_periods
            )));
        }
        Ok(())
    }
}

/// Why the simulated position closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    TakeProfit,
    StopLoss,
    MaxHoldingReached,
    /// Hidden window ended before the holding limit
    DataExhausted,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TakeProfit => "take_profit",
            Self::StopLoss => "stop_loss",
            Self::MaxHoldingReached => "max_holding_reached",
            Self::DataExhausted => "data_exhausted",
        }
    }
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TakeProfit => write!(f, "Profit target reached"),
            Self::StopLoss => write!(f, "Stop loss triggered"),
            Self::MaxHoldingReached => write!(f, "Max holding period reached"),
            Self::DataExhausted => write!(f, "End of available data"),
        }
    }
}

/// Result of one backtest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeOutcome {
    pub entry_price: f64,
    pub exit_price: f64,
    pub exit_reason: ExitReason,
    /// Hidden bars consumed before exit (1-based)
    pub periods_held: usize,
    pub profit_loss: f64,
    pub profit_loss_percent: f64,
    /// Highest close seen while holding, entry included
    pub highest_price_seen: f64,
    /// Lowest close seen while holding, entry included
    pub lowest_price_seen: f64,
}

impl TradeOutcome {
    /// Strictly positive P/L; a flat trade is a loss
    pub fn is_win(&self) -> bool {
        self.profit_loss > 0.0
    }
}

/// Backtest engine
#[derive(Debug, Clone, Copy)]
pub struct BacktestEngine {
    max_horizon: usize,
}

impl BacktestEngine {
    /// Create an engine accepting holding periods up to `max_horizon`
    pub fn new(max_horizon: usize) -> Self {
        Self { max_horizon }
    }

    /// Create from config
    pub fn from_config(config: &quiz_common::QuizConfig) -> Self {
        Self::new(config.horizon_periods)
    }

    pub fn max_horizon(&self) -> usize {
        self.max_horizon
    }

    /// Simulate a long position opened at `entry_price` against `hidden`.
    pub fn run(
        &self,
        entry_price: f64,
        hidden: &[PricePoint],
        params: &StrategyParams,
    ) -> QuizResult<TradeOutcome> {
        params.validate(entry_price, self.max_horizon)?;

        let last = hidden.last().ok_or(QuizError::EmptyHiddenWindow)?;

        let mut highest = entry_price;
        let mut lowest = entry_price;
        let scan = params.max_holding_periods.min(hidden.len());

        let mut exit: Option<(f64, ExitReason, usize)> = None;
        for (i, point) in hidden[..scan].iter().enumerate() {
            let price = point.close;
            highest = highest.max(price);
            lowest = lowest.min(price);

            if price >= params.take_profit_price {
                exit = Some((params.take_profit_price, ExitReason::TakeProfit, i + 1));
                break;
            }
            if price <= params.stop_loss_price {
                exit = Some((params.stop_loss_price, ExitReason::StopLoss, i + 1));
                break;
            }
        }

        let (exit_price, exit_reason, periods_held) = exit.unwrap_or_else(|| {
            if hidden.len() >= params.max_holding_periods {
                let bar = &hidden[params.max_holding_periods - 1];
                (bar.close, ExitReason::MaxHoldingReached, params.max_holding_periods)
            } else {
                (last.close, ExitReason::DataExhausted, hidden.len())
            }
        });

        let profit_loss = exit_price - entry_price;

        Ok(TradeOutcome {
            entry_price,
            exit_price,
            exit_reason,
            periods_held,
            profit_loss,
            profit_loss_percent: profit_loss / entry_price * 100.0,
            highest_price_seen: highest,
            lowest_price_seen: lowest,
        })
    }
}

impl Default for BacktestEngine {
    fn default() -> Self {
        Self::new(DEFAULT_HORIZON_PERIODS)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn bars(closes: &[f64]) -> Vec<PricePoint> {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, c)| PricePoint::close_only(start + Duration::days(i as i64), *c))
            .collect()
    }

    #[test]
    fn test_stop_loss_scenario() {
        let hidden = bars(&[101.0, 103.0, 94.0]);
        let outcome = BacktestEngine::default()
            .run(100.0, &hidden, &StrategyParams::new(110.0, 95.0, 10))
            .unwrap();

        assert_eq!(outcome.exit_reason, ExitReason::StopLoss);
        assert_eq!(outcome.periods_held, 3);
        assert!((outcome.exit_price - 95.0).abs() < 1e-9);
        assert!((outcome.profit_loss + 5.0).abs() < 1e-9);
        assert!((outcome.profit_loss_percent + 5.0).abs() < 1e-9);
        assert!((outcome.highest_price_seen - 103.0).abs() < 1e-9);
        assert!((outcome.lowest_price_seen - 94.0).abs() < 1e-9);
        assert!(!outcome.is_win());
    }

    #[test]
    fn test_take_profit_exits_at_target() {
        let hidden = bars(&[104.0, 112.0, 80.0]);
        let outcome = BacktestEngine::default()
            .run(100.0, &hidden, &StrategyParams::new(110.0, 95.0, 5))
            .unwrap();

        assert_eq!(outcome.exit_reason, ExitReason::TakeProfit);
        assert_eq!(outcome.periods_held, 2);
        assert!((outcome.exit_price - 110.0).abs() < 1e-9);
        assert!((outcome.highest_price_seen - 112.0).abs() < 1e-9);
        assert!((outcome.lowest_price_seen - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_max_holding_reached() {
        let hidden = bars(&[101.0, 102.0, 99.0, 104.0, 109.0]);
        let outcome = BacktestEngine::default()
            .run(100.0, &hidden, &StrategyParams::new(110.0, 95.0, 3))
            .unwrap();

        assert_eq!(outcome.exit_reason, ExitReason::MaxHoldingReached);
        assert_eq!(outcome.periods_held, 3);
        assert!((outcome.exit_price - 99.0).abs() < 1e-9);
        // bars past the holding limit are never seen
        assert!((outcome.highest_price_seen - 102.0).abs() < 1e-9);
    }

    #[test]
    fn test_data_exhausted() {
        let hidden = bars(&[101.0, 102.0]);
        let outcome = BacktestEngine::default()
            .run(100.0, &hidden, &StrategyParams::new(110.0, 95.0, 10))
            .unwrap();

        assert_eq!(outcome.exit_reason, ExitReason::DataExhausted);
        assert_eq!(outcome.periods_held, 2);
        assert!((outcome.exit_price - 102.0).abs() < 1e-9);
        assert!(outcome.is_win());
    }

    #[test]
    fn test_empty_hidden_window() {
        let err = BacktestEngine::default()
            .run(100.0, &[], &StrategyParams::new(110.0, 95.0, 10))
            .unwrap_err();
        assert_eq!(err, QuizError::EmptyHiddenWindow);
    }

    #[test]
    fn test_invalid_params() {
        let engine = BacktestEngine::default();
        let hidden = bars(&[101.0]);

        for params in [
            StrategyParams::new(100.0, 95.0, 10),
            StrategyParams::new(110.0, 100.0, 10),
            StrategyParams::new(110.0, 95.0, 0),
            StrategyParams::new(110.0, 95.0, 31),
            StrategyParams::new(f64::NAN, 95.0, 10),
        ] {
            assert!(matches!(
                engine.run(100.0, &hidden, &params),
                Err(QuizError::InvalidStrategy(_))
            ));
        }
    }

    #[test]
    fn test_exit_reason_serde() {
        assert_eq!(
            serde_json::to_string(&ExitReason::MaxHoldingReached).unwrap(),
            "\"max_holding_reached\""
        );
        assert_eq!(ExitReason::TakeProfit.as_str(), "take_profit");
        assert_eq!(ExitReason::StopLoss.to_string(), "Stop loss triggered");
    }
}
