//! Live analysis: the ensemble's call on the latest bar of each instrument.

use chrono::NaiveDateTime;
use rayon::prelude::*;

use crate::domain::batch::{DataFailure, fetch_watchlist};
use crate::domain::config::DataConfig;
use crate::domain::error::FinbotError;
use crate::domain::ohlcv::{Series, SeriesView};
use crate::domain::signal::Signal;
use crate::domain::strategy::Composite;
use crate::ports::data_port::DataPort;

/// Per-run signal handed to the notifier.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SignalAlert {
    pub instrument: String,
    pub timestamp: NaiveDateTime,
    /// Close of the latest valid bar.
    pub price: f64,
    /// The composite decision.
    pub signal: Signal,
    /// One signal per ensemble member, in member order.
    pub member_signals: Vec<Signal>,
}

impl SignalAlert {
    pub fn is_actionable(&self) -> bool {
        self.signal.is_actionable()
    }
}

#[derive(Debug, Default)]
pub struct AnalysisReport {
    pub alerts: Vec<SignalAlert>,
    pub failures: Vec<DataFailure>,
}

/// Fits any learned members on all valid history, then evaluates every
/// member on that same history. `None` when the series has no valid bars.
pub fn analyze_series(composite: &Composite, series: &Series) -> Option<SignalAlert> {
    let bars = series.valid_bars();
    let last = bars.last()?.clone();

    let mut composite = composite.clone();
    if !composite.fit(&bars) {
        tracing::warn!(
            instrument = series.instrument(),
            bars = bars.len(),
            "learned model left untrained; it will hold"
        );
    }

    let view = SeriesView::new(series.instrument(), &bars);
    let member_signals = composite.member_signals(&view);
    let signal = composite.combine(&view, &member_signals);

    tracing::info!(
        instrument = series.instrument(),
        direction = %signal.direction,
        strength = signal.strength,
        "analysis complete"
    );

    Some(SignalAlert {
        instrument: series.instrument().to_string(),
        timestamp: last.timestamp,
        price: last.close,
        signal,
        member_signals,
    })
}

pub fn analyze_watchlist(
    data: &dyn DataPort,
    composite: &Composite,
    data_config: &DataConfig,
) -> AnalysisReport {
    let mut series = Vec::new();
    let mut failures = Vec::new();
    for (instrument, fetched) in fetch_watchlist(data, data_config) {
        match fetched {
            Ok(s) => series.push(s),
            Err(error) => failures.push(DataFailure { instrument, error }),
        }
    }

    let analyzed: Vec<(String, Option<SignalAlert>)> = series
        .par_iter()
        .map(|s| (s.instrument().to_string(), analyze_series(composite, s)))
        .collect();

    let mut alerts = Vec::new();
    for (instrument, alert) in analyzed {
        match alert {
            Some(a) => alerts.push(a),
            None => {
                tracing::warn!(instrument = %instrument, "no usable bars");
                let error = FinbotError::DataUnavailable {
                    instrument: instrument.clone(),
                    reason: "no usable bars in range".into(),
                };
                failures.push(DataFailure { instrument, error });
            }
        }
    }

    AnalysisReport { alerts, failures }
}
