//! Trade backtesting module.
//!
//! Simulates one long position against the hidden window of a quiz and
//! grades the result against the user's strategy.

mod analysis;
mod engine;
pub mod report;

pub use analysis::{TradeAnalysis, Verdict};
pub use engine::{BacktestEngine, ExitReason, StrategyParams, TradeOutcome};
pub use report::{format_session_report, format_trade_report};
