//! Multi-instrument batch runs.
//!
//! Every watchlist instrument is fetched once, then one backtest task runs
//! per (instrument, strategy) pair on the rayon pool. Each task owns its
//! strategy clone and account; results are merged only after all tasks
//! finish, in watchlist order then strategy order. A failed fetch is
//! recorded for that instrument and never stops the others.

use rayon::prelude::*;

use crate::domain::backtest::{BacktestConfig, BacktestResult, run_backtest};
use crate::domain::config::DataConfig;
use crate::domain::error::FinbotError;
use crate::domain::metrics::{EvaluationConfig, Metrics};
use crate::domain::ohlcv::Series;
use crate::domain::strategy::Strategy;
use crate::ports::data_port::DataPort;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StrategyOutcome {
    pub instrument: String,
    pub strategy: String,
    pub metrics: Metrics,
    pub result: BacktestResult,
}

#[derive(Debug)]
pub struct DataFailure {
    pub instrument: String,
    pub error: FinbotError,
}

/// Everything one batch produced.
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<StrategyOutcome>,
    pub failures: Vec<DataFailure>,
}

impl RunReport {
    /// Instruments with at least one outcome, in run order.
    pub fn instruments(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for o in &self.outcomes {
            if !seen.contains(&o.instrument.as_str()) {
                seen.push(&o.instrument);
            }
        }
        seen
    }

    pub fn outcomes_for<'a>(
        &'a self,
        instrument: &'a str,
    ) -> impl Iterator<Item = &'a StrategyOutcome> + 'a {
        self.outcomes.iter().filter(move |o| o.instrument == instrument)
    }

    /// Highest total return for `instrument`; the earliest wins a tie.
    pub fn best_for(&self, instrument: &str) -> Option<&StrategyOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.instrument == instrument)
            .fold(None, |best, o| match best {
            Some(b) if b.metrics.total_return >= o.metrics.total_return => Some(b),
            _ => Some(o),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty() && self.failures.is_empty()
    }
}

/// Fetches each watchlist instrument in parallel. Provider errors are
/// collapsed into [`FinbotError::DataUnavailable`].
pub fn fetch_watchlist(
    data: &dyn DataPort,
    config: &DataConfig,
) -> Vec<(String, Result<Series, FinbotError>)> {
    config
        .watchlist
        .instruments()
        .par_iter()
        .map(|instrument| {
            let fetched = data
                .fetch(instrument, config.start, config.end, config.bar_size)
                .map_err(|e| {
                    tracing::warn!(instrument = %instrument, error = %e, "data unavailable");
                    FinbotError::data_unavailable(instrument, &e)
                });
            (instrument.clone(), fetched)
        })
        .collect()
}

/// Backtests every strategy on every series. Pure computation.
pub fn run_series(
    series: &[Series],
    strategies: &[Strategy],
    backtest: &BacktestConfig,
    evaluation: &EvaluationConfig,
) -> Vec<StrategyOutcome> {
    let tasks: Vec<(&Series, &Strategy)> = series
        .iter()
        .flat_map(|s| strategies.iter().map(move |st| (s, st)))
        .collect();

    tasks
        .into_par_iter()
        .map(|(s, strategy)| {
            let result = run_backtest(strategy, s, backtest);
            let metrics = Metrics::compute(&result, evaluation);
            StrategyOutcome {
                instrument: s.instrument().to_string(),
                strategy: strategy.name().to_string(),
                metrics,
                result,
            }
        })
        .collect()
}

pub fn run_batch(
    data: &dyn DataPort,
    strategies: &[Strategy],
    data_config: &DataConfig,
    backtest: &BacktestConfig,
    evaluation: &EvaluationConfig,
) -> RunReport {
    let mut series = Vec::new();
    let mut failures = Vec::new();
    for (instrument, fetched) in fetch_watchlist(data, data_config) {
        match fetched {
            Ok(s) => series.push(s),
            Err(error) => failures.push(DataFailure { instrument, error }),
        }
    }

    let outcomes = run_series(&series, strategies, backtest, evaluation);
    tracing::info!(
        instruments = series.len(),
        failed = failures.len(),
        backtests = outcomes.len(),
        "batch complete"
    );

    RunReport { outcomes, failures }
}
