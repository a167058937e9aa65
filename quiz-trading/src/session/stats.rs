//! Running statistics over a session's quiz outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::backtest::TradeOutcome;

/// Compact record of one trade, kept for best/worst tracking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSummary {
    pub profit_loss: f64,
    pub profit_loss_percent: f64,
    /// Instrument label (symbol or coin id)
    pub instrument: String,
    pub at: DateTime<Utc>,
}

/// Cumulative counters for one session.
///
/// Every trade is a fixed unit position: sums are plain additions with no
/// compounding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_trades: usize,
    pub wins: usize,
    /// Includes flat trades
    pub losses: usize,
    pub total_profit_loss: f64,
    pub total_profit_loss_percent: f64,
    pub total_holding_periods: usize,
    pub best_trade: Option<TradeSummary>,
    pub worst_trade: Option<TradeSummary>,
    pub first_trade_at: Option<DateTime<Utc>>,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one outcome into the counters.
    pub fn apply(&mut self, outcome: &TradeOutcome, instrument: &str, now: DateTime<Utc>) {
        self.total_trades += 1;
        if self.first_trade_at.is_none() {
            self.first_trade_at = Some(now);
        }

        if outcome.is_win() {
            self.wins += 1;
        } else {
            self.losses += 1;
        }

        self.total_profit_loss += outcome.profit_loss;
        self.total_profit_loss_percent += outcome.profit_loss_percent;
        self.total_holding_periods += outcome.periods_held;

        let summary = TradeSummary {
            profit_loss: outcome.profit_loss,
            profit_loss_percent: outcome.profit_loss_percent,
            instrument: instrument.to_string(),
            at: now,
        };

        // Ties keep the earlier trade
        if self
            .best_trade
            .as_ref()
            .map_or(true, |best| summary.profit_loss > best.profit_loss)
        {
            self.best_trade = Some(summary.clone());
        }
        if self
            .worst_trade
            .as_ref()
            .map_or(true, |worst| summary.profit_loss < worst.profit_loss)
        {
            self.worst_trade = Some(summary);
        }
    }

    /// Win rate in percent
    pub fn win_rate(&self) -> f64 {
        if self.total_trades == 0 {
            return 0.0;
        }
        self.wins as f64 / self.total_trades as f64 * 100.0
    }

    pub fn avg_profit_loss_percent(&self) -> f64 {
        if self.total_trades == 0 {
            return 0.0;
        }
        self.total_profit_loss_percent / self.total_trades as f64
    }

    pub fn avg_holding_periods(&self) -> f64 {
        if self.total_trades == 0 {
            return 0.0;
        }
        self.total_holding_periods as f64 / self.total_trades as f64
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// Tests
// ============================================================================
