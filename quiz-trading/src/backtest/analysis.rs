//! Post-trade analysis shown next to an outcome.

use serde::{Deserialize, Serialize};

use super::engine::{StrategyParams, TradeOutcome};

/// How well the trade used its profit target or risk budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Captured at least 90% of the potential profit
    Excellent,
    /// Captured at least 50% of the potential profit
    Good,
    /// Profitable, below 50% of potential
    Marginal,
    /// Lost at most half of the maximum risk
    StopLossWorked,
    /// Lost more than half but less than the full risk
    PartialLoss,
    /// Lost the full risk or more
    MaxLoss,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Excellent => write!(f, "Excellent"),
            Self::Good => write!(f, "Good"),
            Self::Marginal => write!(f, "Profit made, below potential"),
            Self::StopLossWorked => write!(f, "Stop-loss worked"),
            Self::PartialLoss => write!(f, "Partial loss"),
            Self::MaxLoss => write!(f, "Maximum loss realized"),
        }
    }
}

/// Derived figures comparing an outcome with the strategy that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeAnalysis {
    pub potential_profit: f64,
    pub potential_profit_percent: f64,
    pub potential_loss: f64,
    pub potential_loss_percent: f64,
    /// Reward per unit of risk (`potential_profit / potential_loss`)
    pub risk_reward_ratio: f64,
    /// Highest close reached the take-profit level
    pub high_reached_target: bool,
    /// Lowest close breached the stop-loss level
    pub low_breached_stop: bool,
    /// Share of the potential profit (wins) or risk (losses) realized, in percent
    pub efficiency_percent: f64,
    pub verdict: Verdict,
}

impl TradeAnalysis {
    pub fn of(outcome: &TradeOutcome, params: &StrategyParams) -> Self {
        let entry = outcome.entry_price;
        let potential_profit = params.take_profit_price - entry;
        let potential_loss = entry - params.stop_loss_price;

        let (efficiency_percent, verdict) = if outcome.is_win() {
            let efficiency = ratio(outcome.profit_loss, potential_profit) * 100.0;
            let verdict = if efficiency >= 90.0 {
                Verdict::Excellent
            } else if efficiency >= 50.0 {
                Verdict::Good
            } else {
                Verdict::Marginal
            };
            (efficiency, verdict)
        } else {
            let efficiency = ratio(outcome.profit_loss.abs(), potential_loss) * 100.0;
            let verdict = if efficiency <= 50.0 {
                Verdict::StopLossWorked
            } else if efficiency < 100.0 {
                Verdict::PartialLoss
            } else {
                Verdict::MaxLoss
            };
            (efficiency, verdict)
        };

        Self {
            potential_profit,
            potential_profit_percent: ratio(potential_profit, entry) * 100.0,
            potential_loss,
            potential_loss_percent: ratio(potential_loss, entry) * 100.0,
            risk_reward_ratio: ratio(potential_profit, potential_loss),
            high_reached_target: outcome.highest_price_seen >= params.take_profit_price,
            low_breached_stop: outcome.lowest_price_seen <= params.stop_loss_price,
            efficiency_percent,
            verdict,
        }
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}
