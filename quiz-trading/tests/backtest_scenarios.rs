//! Backtest engine scenarios
//!
//! Exercises the engine through the public API the way the service does:
//! cut a series, take the entry from the visible window, run the strategy
//! on the hidden one.

use chrono::{Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;

use quiz_trading::backtest::{BacktestEngine, ExitReason, StrategyParams, TradeAnalysis, Verdict};
use quiz_trading::data::{AssetType, InstrumentMetadata, PricePoint, Series};
use quiz_trading::quiz::{CutoffSelector, SeriesValidator};
use quiz_trading::session::SessionStats;
use quiz_trading::QuizError;

fn bars(closes: &[f64]) -> Vec<PricePoint> {
    let start = Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, c)| PricePoint::close_only(start + Duration::days(i as i64), *c))
        .collect()
}

// ============================================================================
// Exit Conditions
// ============================================================================

#[test]
fn test_stop_loss_on_third_period() {
    let hidden = bars(&[101.0, 103.0, 94.0]);
    let params = StrategyParams::new(110.0, 95.0, 10);

    let outcome = BacktestEngine::default().run(100.0, &hidden, &params).unwrap();

    assert_eq!(outcome.exit_reason, ExitReason::StopLoss);
    assert_eq!(outcome.periods_held, 3);
    assert!((outcome.profit_loss - (-5.0)).abs() < 1e-9);
    assert!((outcome.profit_loss_percent - (-5.0)).abs() < 1e-9);
}

#[test]
fn test_take_profit_before_stop_loss() {
    // Target touched on period 4, stop only on period 6
    let hidden = bars(&[100.5, 102.0, 104.0, 111.0, 99.0, 90.0]);
    let params = StrategyParams::new(110.0, 95.0, 30);

    let outcome = BacktestEngine::default().run(100.0, &hidden, &params).unwrap();

    assert_eq!(outcome.exit_reason, ExitReason::TakeProfit);
    assert_eq!(outcome.periods_held, 4);
    assert!((outcome.exit_price - 110.0).abs() < 1e-9);
}

#[test]
fn test_stop_loss_before_take_profit() {
    let hidden = bars(&[97.0, 94.5, 120.0]);
    let params = StrategyParams::new(110.0, 95.0, 30);

    let outcome = BacktestEngine::default().run(100.0, &hidden, &params).unwrap();

    assert_eq!(outcome.exit_reason, ExitReason::StopLoss);
    assert_eq!(outcome.periods_held, 2);
}

#[test]
fn test_exact_levels_trigger() {
    let engine = BacktestEngine::default();
    let params = StrategyParams::new(110.0, 95.0, 30);

    let at_target = engine.run(100.0, &bars(&[110.0]), &params).unwrap();
    assert_eq!(at_target.exit_reason, ExitReason::TakeProfit);

    let at_stop = engine.run(100.0, &bars(&[95.0]), &params).unwrap();
    assert_eq!(at_stop.exit_reason, ExitReason::StopLoss);
}

#[test]
fn test_max_holding_reached_with_full_window() {
    let closes: Vec<f64> = (0..30).map(|i| 100.0 + (i % 3) as f64).collect();
    let hidden = bars(&closes);
    let params = StrategyParams::new(150.0, 50.0, 12);

    let outcome = BacktestEngine::default().run(100.0, &hidden, &params).unwrap();

    assert_eq!(outcome.exit_reason, ExitReason::MaxHoldingReached);
    assert_eq!(outcome.periods_held, 12);
    assert!((outcome.exit_price - closes[11]).abs() < 1e-9);
}

#[test]
fn test_short_window_runs_out() {
    let hidden = bars(&[100.2, 99.8, 100.1]);
    let params = StrategyParams::new(150.0, 50.0, 30);

    let outcome = BacktestEngine::default().run(100.0, &hidden, &params).unwrap();

    assert_eq!(outcome.exit_reason, ExitReason::DataExhausted);
    assert_eq!(outcome.periods_held, 3);
    assert!((outcome.exit_price - 100.1).abs() < 1e-9);
}

#[test]
fn test_empty_window_is_distinct_from_exhausted() {
    let params = StrategyParams::new(110.0, 95.0, 5);
    let err = BacktestEngine::default().run(100.0, &[], &params).unwrap_err();
    assert_eq!(err, QuizError::EmptyHiddenWindow);
}

#[test]
fn test_identical_inputs_identical_outcome() {
    let hidden = bars(&[100.3, 101.7, 99.2, 103.3, 98.1]);
    let params = StrategyParams::new(104.0, 97.0, 4);
    let engine = BacktestEngine::default();

    let a = engine.run(100.0, &hidden, &params).unwrap();
    let b = engine.run(100.0, &hidden, &params).unwrap();

    assert_eq!(a, b);
    assert_eq!(a.profit_loss.to_bits(), b.profit_loss.to_bits());
}

// ============================================================================
// End-to-end over a cut series
// ============================================================================

#[test]
fn test_cut_series_then_backtest() {
    // Slow uptrend: the hidden window eventually crosses a 2% target
    let closes: Vec<f64> = (0..400).map(|i| 50.0 + i as f64 * 0.1).collect();
    let series = Series::new("TREND", AssetType::Stock, bars(&closes), InstrumentMetadata::default());

    SeriesValidator::default().validate(&series).unwrap();
    let window = CutoffSelector::default()
        .select_cutoff(&series, &mut StdRng::seed_from_u64(2024))
        .unwrap();

    let entry = window.entry_price();
    let params = StrategyParams::new(entry * 1.02, entry * 0.9, 30);
    let outcome = BacktestEngine::default().run(entry, window.hidden, &params).unwrap();

    assert_eq!(outcome.exit_reason, ExitReason::TakeProfit);
    assert!(outcome.periods_held <= 30);
    assert_eq!(TradeAnalysis::of(&outcome, &params).verdict, Verdict::Excellent);

    let mut stats = SessionStats::new();
    stats.apply(&outcome, &series.symbol, Utc::now());
    assert_eq!(stats.wins, 1);
    assert_eq!(stats.total_holding_periods, outcome.periods_held);
}
