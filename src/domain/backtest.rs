//! Bar-by-bar backtest of one strategy over one instrument.
//!
//! Two stages, both strictly forward in time:
//! 1. [`generate_signals`] asks the strategy for a signal at every bar past
//!    warm-up, showing it only the valid bars up to and including that bar.
//! 2. [`simulate`] replays those signals through an [`Account`]:
//!    `FLAT -> LONG -> FLAT`, long only, one position at a time.

use chrono::NaiveDateTime;

use super::account::{Account, EquityPoint};
use super::execution::{self, EntryResult, ExecutionConfig};
use super::ohlcv::{Bar, Series, SeriesView};
use super::position::{ExitReason, Trade};
use super::signal::{Direction, Signal};
use super::strategy::Strategy;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub execution: ExecutionConfig,
    /// Bars skipped before the first signal is requested.
    pub warmup_bars: usize,
    /// Retrain learned models every this many bars; 0 trains once.
    pub retrain_interval: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 10_000.0,
            execution: ExecutionConfig::default(),
            warmup_bars: 50,
            retrain_interval: 0,
        }
    }
}

/// A strategy signal and the bar it was produced on.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SignalRecord {
    pub bar_index: usize,
    pub close: f64,
    pub signal: Signal,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BacktestResult {
    pub instrument: String,
    pub strategy: String,
    pub initial_capital: f64,
    pub final_equity: f64,
    pub trades: Vec<Trade>,
    /// One point per input bar.
    pub equity_curve: Vec<EquityPoint>,
    pub signals: Vec<SignalRecord>,
    /// Close of every input bar; NaN where the bar was malformed.
    pub closes: Vec<f64>,
}

impl BacktestResult {
    pub fn empty(instrument: &str, strategy: &str, initial_capital: f64) -> Self {
        BacktestResult {
            instrument: instrument.to_string(),
            strategy: strategy.to_string(),
            initial_capital,
            final_equity: initial_capital,
            trades: Vec::new(),
            equity_curve: Vec::new(),
            signals: Vec::new(),
            closes: Vec::new(),
        }
    }
}

/// Produces the signal stream for `series`.
///
/// Malformed bars are dropped from the strategy's window and get no signal.
/// Learned models are trained on bars up to the current bar. Until a fit
/// succeeds (enough usable feature rows) it is retried on every bar; after
/// that the model is retrained every `retrain_interval` bars.
pub fn generate_signals(
    strategy: &Strategy,
    series: &Series,
    config: &BacktestConfig,
) -> Vec<SignalRecord> {
    let valid = series.valid_bars();

    let mut strategy = strategy.clone();
    let trains = strategy.needs_training();
    let mut last_trained: Option<usize> = None;
    let mut seen = 0usize;
    let mut records = Vec::new();

    for (t, bar) in series.bars().iter().enumerate() {
        if !bar.is_valid() {
            continue;
        }
        seen += 1;
        if t < config.warmup_bars {
            continue;
        }

        let window = &valid[..seen];
        if trains {
            let due = match last_trained {
                None => true,
                Some(at) => config.retrain_interval > 0 && t - at >= config.retrain_interval,
            };
            if due && strategy.fit(window) {
                last_trained = Some(t);
            }
        }

        let view = SeriesView::new(series.instrument(), window);
        records.push(SignalRecord {
            bar_index: t,
            close: bar.close,
            signal: strategy.generate_signal(&view),
        });
    }

    if trains && last_trained.is_none() {
        tracing::warn!(
            instrument = series.instrument(),
            strategy = strategy.name(),
            bars = series.len(),
            "learned model never trained; all signals hold"
        );
    }
    records
}

/// Replays `signals` over `series` and returns the resulting account.
///
/// Per bar: a stop-out (low at or below the stop) is checked first and
/// consumes the bar; otherwise BUY opens when flat and SELL closes when long,
/// both at the bar close. Any position still open on the final bar closes at
/// the last known close. Exactly one equity point is recorded per bar.
pub fn simulate(series: &Series, signals: &[SignalRecord], config: &BacktestConfig) -> Account {
    let bars = series.bars();
    let exec = &config.execution;
    let mut account = Account::new(config.initial_capital);

    let mut by_bar: Vec<Option<&Signal>> = vec![None; bars.len()];
    for record in signals {
        if let Some(slot) = by_bar.get_mut(record.bar_index) {
            *slot = Some(&record.signal);
        }
    }

    let last_index = bars.len().saturating_sub(1);
    let mut last_close: Option<f64> = None;

    for (i, bar) in bars.iter().enumerate() {
        let is_last = i == last_index;

        if bar.is_valid() {
            last_close = Some(bar.close);
            let stopped =
                execution::check_stop_loss(&mut account, bar.low, bar.timestamp, exec).is_some();
            if !stopped {
                if let Some(signal) = by_bar[i] {
                    apply_signal(&mut account, series.instrument(), signal, bar, is_last, exec);
                }
            }
        }

        if is_last {
            if let Some(price) = last_close {
                execution::exit_position(
                    &mut account,
                    price,
                    bar.timestamp,
                    ExitReason::EndOfPeriod,
                    exec,
                );
            }
        }

        let equity = account.equity(last_close.unwrap_or(0.0));
        account.record_equity(bar.timestamp, equity);
    }

    account
}

fn apply_signal(
    account: &mut Account,
    instrument: &str,
    signal: &Signal,
    bar: &Bar,
    is_last: bool,
    exec: &ExecutionConfig,
) {
    match signal.direction {
        // A position opened on the final bar would close on the same bar.
        Direction::Buy if account.is_flat() && !is_last => {
            if let EntryResult::InsufficientCapital =
                execution::enter_long(account, instrument, bar.close, bar.timestamp, exec)
            {
                tracing::debug!(instrument, timestamp = %bar.timestamp, "buy skipped: insufficient capital");
            }
        }
        Direction::Sell if !account.is_flat() => {
            execution::exit_position(account, bar.close, bar.timestamp, ExitReason::Signal, exec);
        }
        _ => {}
    }
}

/// Generates signals and simulates them in one pass.
pub fn run_backtest(strategy: &Strategy, series: &Series, config: &BacktestConfig) -> BacktestResult {
    if series.is_empty() {
        return BacktestResult::empty(series.instrument(), strategy.name(), config.initial_capital);
    }

    let signals = generate_signals(strategy, series, config);
    let account = simulate(series, &signals, config);
    let final_equity = account
        .equity_curve
        .last()
        .map_or(config.initial_capital, |p| p.equity);

    tracing::info!(
        instrument = series.instrument(),
        strategy = strategy.name(),
        bars = series.len(),
        trades = account.trades.len(),
        final_equity,
        "backtest complete"
    );

    BacktestResult {
        instrument: series.instrument().to_string(),
        strategy: strategy.name().to_string(),
        initial_capital: config.initial_capital,
        final_equity,
        trades: account.trades,
        equity_curve: account.equity_curve,
        signals,
        closes: series
            .bars()
            .iter()
            .map(|b| if b.is_valid() { b.close } else { f64::NAN })
            .collect(),
    }
}

/// Timestamp of the first and last bar covered by a result, if any.
pub fn result_span(result: &BacktestResult) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let first = result.equity_curve.first()?.timestamp;
    let last = result.equity_curve.last()?.timestamp;
    Some((first, last))
}
