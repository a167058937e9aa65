//! Quiz window construction.
//!
//! A quiz shows the user the history up to a random cutoff bar and keeps
//! the bars after it hidden for backtesting.
//!
//! # Flow
//! 1. [`SeriesValidator`] rejects series without enough history
//! 2. [`CutoffSelector`] draws a cutoff and splits the series into a
//!    visible and a hidden window
//! 3. The hidden window later feeds the backtest engine

mod cutoff;
mod validator;

pub use cutoff::{CutoffSelector, QuizSnapshot, QuizWindow};
pub use validator::{validate, SeriesValidator};

/// Bars of history shown before the cutoff
pub const DEFAULT_LOOKBACK_PERIODS: usize = 180;

/// Bars kept hidden after the cutoff
pub const DEFAULT_HORIZON_PERIODS: usize = 30;
