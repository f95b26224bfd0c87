//! Performance metrics computed from a finished backtest.

use super::account::EquityPoint;
use super::backtest::BacktestResult;
use super::signal::Direction;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Profit factor reported when there are no losing trades.
pub const PROFIT_FACTOR_SENTINEL: f64 = 1e6;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvaluationConfig {
    /// Bars ahead (counted in valid bars) used to judge a signal.
    pub accuracy_horizon: usize,
    pub periods_per_year: f64,
    /// Annual risk-free rate.
    pub risk_free_rate: f64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            accuracy_horizon: 1,
            periods_per_year: TRADING_DAYS_PER_YEAR,
            risk_free_rate: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Metrics {
    pub total_return: f64,
    pub annualized_return: f64,
    pub win_rate: f64,
    pub signal_accuracy: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    pub profit_factor: f64,
    pub trade_count: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub avg_trade_duration_days: f64,
    pub total_fees: f64,
    pub net_profit: f64,
}

impl Metrics {
    pub fn compute(result: &BacktestResult, config: &EvaluationConfig) -> Self {
        let equity_curve = &result.equity_curve;
        let trades = &result.trades;
        let initial_capital = result.initial_capital;

        let final_equity = equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_capital);

        let total_return = if initial_capital > 0.0 {
            (final_equity - initial_capital) / initial_capital
        } else {
            0.0
        };

        let periods = equity_curve.len() as f64;
        let annualized_return = if periods > 0.0 && total_return > -1.0 {
            (1.0 + total_return).powf(config.periods_per_year / periods) - 1.0
        } else {
            0.0
        };

        let max_drawdown = compute_drawdown(equity_curve);
        let periodic_rf = config.risk_free_rate / config.periods_per_year;
        let (sharpe_ratio, sortino_ratio) =
            compute_risk_adjusted(equity_curve, periodic_rf, config.periods_per_year);

        let mut trades_won = 0usize;
        let mut trades_lost = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut total_fees = 0.0_f64;
        let mut net_profit = 0.0_f64;
        let mut total_duration_days = 0.0_f64;

        for trade in trades {
            let pnl = trade.net_pnl;
            if pnl > 0.0 {
                trades_won += 1;
                total_wins += pnl;
            } else if pnl < 0.0 {
                trades_lost += 1;
                total_losses += pnl.abs();
            }
            total_fees += trade.commission;
            net_profit += pnl;
            total_duration_days += trade.duration_days();
        }

        let trade_count = trades.len();
        let win_rate = if trade_count > 0 {
            trades_won as f64 / trade_count as f64
        } else {
            0.0
        };

        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else {
            PROFIT_FACTOR_SENTINEL
        };

        let avg_win = if trades_won > 0 {
            total_wins / trades_won as f64
        } else {
            0.0
        };

        let avg_loss = if trades_lost > 0 {
            total_losses / trades_lost as f64
        } else {
            0.0
        };

        let avg_trade_duration_days = if trade_count > 0 {
            total_duration_days / trade_count as f64
        } else {
            0.0
        };

        Metrics {
            total_return,
            annualized_return,
            win_rate,
            signal_accuracy: signal_accuracy(result, config.accuracy_horizon),
            sharpe_ratio,
            sortino_ratio,
            max_drawdown,
            profit_factor,
            trade_count,
            trades_won,
            trades_lost,
            avg_win,
            avg_loss,
            avg_trade_duration_days,
            total_fees,
            net_profit,
        }
    }
}

/// Fraction of BUY/SELL signals whose close `horizon` valid bars later moved
/// in the signalled direction. HOLD signals and signals too close to the end
/// are not counted.
pub fn signal_accuracy(result: &BacktestResult, horizon: usize) -> f64 {
    let horizon = horizon.max(1);
    let valid_bars: Vec<usize> = result
        .closes
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_finite())
        .map(|(i, _)| i)
        .collect();

    let mut counted = 0usize;
    let mut correct = 0usize;
    for record in &result.signals {
        if record.signal.direction == Direction::Hold {
            continue;
        }
        let Ok(pos) = valid_bars.binary_search(&record.bar_index) else {
            continue;
        };
        let Some(&later) = valid_bars.get(pos + horizon) else {
            continue;
        };
        let future = result.closes[later];
        counted += 1;
        let hit = match record.signal.direction {
            Direction::Buy => future > record.close,
            Direction::Sell => future < record.close,
            Direction::Hold => false,
        };
        if hit {
            correct += 1;
        }
    }

    if counted > 0 {
        correct as f64 / counted as f64
    } else {
        0.0
    }
}

/// Largest peak-to-trough decline as a positive fraction of the peak.
fn compute_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    let Some(first) = equity_curve.first() else {
        return 0.0;
    };

    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;

    for point in equity_curve {
        if point.equity > peak {
            peak = point.equity;
        } else if peak > 0.0 {
            let dd = (peak - point.equity) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd
}

fn compute_risk_adjusted(
    equity_curve: &[EquityPoint],
    periodic_rf: f64,
    periods_per_year: f64,
) -> (f64, f64) {
    if equity_curve.len() < 2 {
        return (0.0, 0.0);
    }

    let returns: Vec<f64> = equity_curve
        .windows(2)
        .map(|w| {
            let prev = w[0].equity;
            let curr = w[1].equity;
            if prev > 0.0 {
                (curr - prev) / prev
            } else {
                0.0
            }
        })
        .collect();

    let n = returns.len() as f64;
    let mean: f64 = returns.iter().sum::<f64>() / n;

    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    let excess_return = mean - periodic_rf;
    let annualizer = periods_per_year.sqrt();

    let sharpe = if stddev > 0.0 {
        (excess_return / stddev) * annualizer
    } else {
        0.0
    };

    let downside_sq: f64 = returns
        .iter()
        .filter(|&&r| r < periodic_rf)
        .map(|&r| (r - periodic_rf).powi(2))
        .sum();
    let downside_stddev = (downside_sq / n).sqrt();

    let sortino = if downside_stddev > 0.0 {
        (excess_return / downside_stddev) * annualizer
    } else {
        0.0
    };

    (sharpe, sortino)
}
