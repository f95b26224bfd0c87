//! Console backtest report: a strategy comparison table per instrument,
//! followed by the best strategy's details and its trade log.

use std::fmt::Write;

use crate::domain::backtest::{BacktestConfig, result_span};
use crate::domain::batch::{RunReport, StrategyOutcome};
use crate::domain::position::Trade;

const RULE_WIDTH: usize = 96;

pub fn format_report(report: &RunReport, config: &BacktestConfig) -> String {
    let mut out = String::new();
    for instrument in report.instruments() {
        let outcomes: Vec<&StrategyOutcome> = report.outcomes_for(instrument).collect();
        write_instrument(&mut out, instrument, &outcomes, config);
        if let Some(best) = report.best_for(instrument) {
            write_best(&mut out, best);
        }
    }
    if !report.failures.is_empty() {
        let _ = writeln!(out, "\nSKIPPED INSTRUMENTS");
        for f in &report.failures {
            let _ = writeln!(out, "  {}: {}", f.instrument, f.error);
        }
    }
    out
}

fn write_instrument(
    out: &mut String,
    instrument: &str,
    outcomes: &[&StrategyOutcome],
    config: &BacktestConfig,
) {
    let rule = "=".repeat(RULE_WIDTH);
    let _ = writeln!(out, "\n{rule}");
    let _ = writeln!(out, "BACKTESTING REPORT FOR {instrument}");
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Initial Capital: ${:.2}", config.initial_capital);
    let _ = writeln!(
        out,
        "Commission: {:.3}% per trade",
        config.execution.commission_rate * 100.0
    );
    if let Some(first) = outcomes.first() {
        let _ = write!(out, "Test Period: {} bars", first.result.equity_curve.len());
        if let Some((start, end)) = result_span(&first.result) {
            let _ = write!(out, " ({start} to {end})");
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "\nSTRATEGY PERFORMANCE COMPARISON:");
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
    let _ = writeln!(
        out,
        "{:<14} {:>9} {:>9} {:>9} {:>7} {:>8} {:>8} {:>7} {:>11} {:>8}",
        "Strategy",
        "Return",
        "Win Rate",
        "Accuracy",
        "Sharpe",
        "Max DD",
        "PF",
        "Trades",
        "Net Profit",
        "Avg Days"
    );

    let mut sorted: Vec<&StrategyOutcome> = outcomes.to_vec();
    sorted.sort_by(|a, b| b.metrics.total_return.total_cmp(&a.metrics.total_return));
    for o in sorted {
        let m = &o.metrics;
        let _ = writeln!(
            out,
            "{:<14} {:>8.2}% {:>8.2}% {:>8.2}% {:>7.2} {:>7.2}% {:>8.2} {:>7} {:>11.2} {:>8.1}",
            o.strategy,
            m.total_return * 100.0,
            m.win_rate * 100.0,
            m.signal_accuracy * 100.0,
            m.sharpe_ratio,
            m.max_drawdown * 100.0,
            m.profit_factor,
            m.trade_count,
            m.net_profit,
            m.avg_trade_duration_days
        );
    }
}

fn write_best(out: &mut String, best: &StrategyOutcome) {
    let m = &best.metrics;
    let _ = writeln!(out, "\nBEST PERFORMING STRATEGY: {}", best.strategy);
    let _ = writeln!(out, "{}", "-".repeat(50));
    let _ = writeln!(out, "Total Return:           {:.2}%", m.total_return * 100.0);
    let _ = writeln!(out, "Annualized Return:      {:.2}%", m.annualized_return * 100.0);
    let _ = writeln!(out, "Win Rate:               {:.2}%", m.win_rate * 100.0);
    let _ = writeln!(out, "Signal Accuracy:        {:.2}%", m.signal_accuracy * 100.0);
    let _ = writeln!(out, "Sharpe Ratio:           {:.2}", m.sharpe_ratio);
    let _ = writeln!(out, "Sortino Ratio:          {:.2}", m.sortino_ratio);
    let _ = writeln!(out, "Maximum Drawdown:       {:.2}%", m.max_drawdown * 100.0);
    let _ = writeln!(out, "Profit Factor:          {:.2}", m.profit_factor);
    let _ = writeln!(
        out,
        "Total Trades:           {} ({} won, {} lost)",
        m.trade_count, m.trades_won, m.trades_lost
    );
    let _ = writeln!(out, "Total Fees:             ${:.2}", m.total_fees);
    let _ = writeln!(
        out,
        "Average Trade Duration: {:.1} days",
        m.avg_trade_duration_days
    );
    write_trade_log(out, &best.result.trades);
}

fn write_trade_log(out: &mut String, trades: &[Trade]) {
    if trades.is_empty() {
        return;
    }
    let _ = writeln!(out, "\nTRADE LOG:");
    let _ = writeln!(
        out,
        "{:<20} {:<20} {:>10} {:>10} {:>6} {:>10} {:<13}",
        "Entry", "Exit", "Entry $", "Exit $", "Qty", "Net P&L", "Reason"
    );
    for t in trades {
        let _ = writeln!(
            out,
            "{:<20} {:<20} {:>10.2} {:>10.2} {:>6} {:>10.2} {:<13}",
            t.entry_timestamp.to_string(),
            t.exit_timestamp.to_string(),
            t.entry_price,
            t.exit_price,
            t.quantity,
            t.net_pnl,
            t.exit_reason.to_string()
        );
    }
}
