//! Plain-text trade and session reports.

use crate::session::SessionStats;

use super::analysis::TradeAnalysis;
use super::engine::{StrategyParams, TradeOutcome};

const RULE: &str = "═══════════════════════════════════════════════════════════════\n";
const THIN_RULE: &str = "───────────────────────────────────────────────────────────────\n";

/// Format a single quiz result
pub fn format_trade_report(
    symbol: &str,
    outcome: &TradeOutcome,
    params: &StrategyParams,
    analysis: &TradeAnalysis,
) -> String {
    let mut report = String::new();

    report.push_str(RULE);
    report.push_str(&format!("                    Quiz Result: {}\n", symbol));
    report.push_str(RULE);
    report.push('\n');

    report.push_str("📊 Strategy\n");
    report.push_str(THIN_RULE);
    report.push_str(&format!("  Entry Price:        {:>12.2}\n", outcome.entry_price));
    report.push_str(&format!(
        "  Profit Target:      {:>12.2} ({:+.2}%)\n",
        params.take_profit_price, analysis.potential_profit_percent
    ));
    report.push_str(&format!(
        "  Stop Loss:          {:>12.2} ({:+.2}%)\n",
        params.stop_loss_price, -analysis.potential_loss_percent
    ));
    report.push_str(&format!("  Max Holding:        {:>12} periods\n", params.max_holding_periods));
    report.push('\n');

    let marker = if outcome.is_win() { "📈" } else { "📉" };
    report.push_str(&format!("{} {}\n", marker, outcome.exit_reason));
    report.push_str(THIN_RULE);
    report.push_str(&format!("  Periods Held:       {:>12}\n", outcome.periods_held));
    report.push_str(&format!("  Exit Price:         {:>12.2}\n", outcome.exit_price));
    report.push_str(&format!(
        "  Price Range:        {:>12.2} - {:.2}\n",
        outcome.lowest_price_seen, outcome.highest_price_seen
    ));
    report.push_str(&format!(
        "  P/L:                {:>+12.2} ({:+.2}%)\n",
        outcome.profit_loss, outcome.profit_loss_percent
    ));
    report.push('\n');

    report.push_str("🔍 Analysis\n");
    report.push_str(THIN_RULE);
    report.push_str(&format!("  Risk/Reward:        {:>12}\n", format!("1:{:.2}", analysis.risk_reward_ratio)));
    report.push_str(&format!(
        "  High hit target:    {:>12}\n",
        if analysis.high_reached_target { "yes" } else { "no" }
    ));
    report.push_str(&format!(
        "  Low hit stop:       {:>12}\n",
        if analysis.low_breached_stop { "yes" } else { "no" }
    ));
    report.push_str(&format!(
        "  Verdict:            {} ({:.0}%)\n",
        analysis.verdict, analysis.efficiency_percent
    ));
    report.push('\n');
    report.push_str(RULE);

    report
}

/// Format cumulative session statistics
pub fn format_session_report(stats: &SessionStats) -> String {
    if stats.total_trades == 0 {
        return "No statistics yet. Complete a quiz to start tracking.\n".to_string();
    }

    let mut report = String::new();

    report.push_str(RULE);
    report.push_str("                    Session Statistics\n");
    report.push_str(RULE);
    report.push('\n');

    report.push_str(&format!("  Total Quizzes:      {:>12}\n", stats.total_trades));
    report.push_str(&format!(
        "  Wins / Losses:      {:>12}\n",
        format!("{} / {}", stats.wins, stats.losses)
    ));
    report.push_str(&format!("  Win Rate:           {:>11.1}%\n", stats.win_rate()));
    report.push_str(&format!("  Total P/L:          {:>+12.2}\n", stats.total_profit_loss));
    report.push_str(&format!(
        "  Avg P/L %:          {:>+11.2}%\n",
        stats.avg_profit_loss_percent()
    ));
    report.push_str(&format!(
        "  Avg Holding:        {:>12.1} periods\n",
        stats.avg_holding_periods()
    ));

    if let Some(best) = &stats.best_trade {
        report.push_str(&format!(
            "  Best Trade:         {:>+12.2} ({:+.2}%) {}\n",
            best.profit_loss, best.profit_loss_percent, best.instrument
        ));
    }
    if let Some(worst) = &stats.worst_trade {
        report.push_str(&format!(
            "  Worst Trade:        {:>+12.2} ({:+.2}%) {}\n",
            worst.profit_loss, worst.profit_loss_percent, worst.instrument
        ));
    }

    report.push('\n');
    report.push_str(RULE);

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::ExitReason;
    use chrono::{TimeZone, Utc};

    fn stop_loss_outcome() -> TradeOutcome {
        TradeOutcome {
            entry_price: 100.0,
            exit_price: 95.0,
            exit_reason: ExitReason::StopLoss,
            periods_held: 3,
            profit_loss: -5.0,
            profit_loss_percent: -5.0,
            highest_price_seen: 103.0,
            lowest_price_seen: 94.0,
        }
    }

    #[test]
    fn test_trade_report_contents() {
        let outcome = stop_loss_outcome();
        let params = StrategyParams::new(110.0, 95.0, 10);
        let analysis = TradeAnalysis::of(&outcome, &params);

        let report = format_trade_report("AAPL", &outcome, &params, &analysis);
        assert!(report.contains("Quiz Result: AAPL"));
        assert!(report.contains("Stop loss triggered"));
        assert!(report.contains("-5.00"));
        assert!(report.contains("1:2.00"));
        assert!(report.contains("Maximum loss realized"));
    }

    #[test]
    fn test_session_report() {
        assert!(format_session_report(&SessionStats::default()).starts_with("No statistics yet"));

        let mut stats = SessionStats::default();
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        stats.apply(&stop_loss_outcome(), "AAPL", now);

        let report = format_session_report(&stats);
        assert!(report.contains("Total Quizzes:"));
        assert!(report.contains("0 / 1"));
        assert!(report.contains("Worst Trade:"));
        assert!(report.contains("AAPL"));
    }
}
