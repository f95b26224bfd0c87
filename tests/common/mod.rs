#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use finbot::domain::error::DataError;
pub use finbot::domain::ohlcv::{Bar, BarSize, Series};
use finbot::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, DataError>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, instrument: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(instrument.to_string(), bars);
        self
    }

    pub fn with_error(mut self, instrument: &str, error: DataError) -> Self {
        self.errors.insert(instrument.to_string(), error);
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch(
        &self,
        instrument: &str,
        start: NaiveDate,
        end: NaiveDate,
        _bar_size: BarSize,
    ) -> Result<Series, DataError> {
        if let Some(err) = self.errors.get(instrument) {
            return Err(err.clone());
        }
        let bars = self
            .data
            .get(instrument)
            .ok_or_else(|| DataError::UnknownInstrument(instrument.to_string()))?
            .iter()
            .filter(|b| {
                let day = b.timestamp.date();
                day >= start && day <= end
            })
            .cloned()
            .collect();
        Ok(Series::new(instrument, bars))
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Midnight of the `offset`-th day after 2024-01-01.
pub fn day(offset: usize) -> NaiveDateTime {
    date("2024-01-01").and_hms_opt(0, 0, 0).unwrap() + Duration::days(offset as i64)
}

pub fn make_bar(offset: usize, open: f64, high: f64, low: f64, close: f64) -> Bar {
    Bar {
        timestamp: day(offset),
        open,
        high,
        low,
        close,
        volume: 1_000_000.0,
    }
}

/// Flat bars: open, high and low all equal the close.
pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(i, c, c, c, c))
        .collect()
}

pub fn series_from_closes(instrument: &str, closes: &[f64]) -> Series {
    Series::new(instrument, bars_from_closes(closes))
}

/// Deterministic oscillating series that keeps every strategy busy.
pub fn wave_closes(n: usize, phase: f64) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            100.0 + 15.0 * (t / 7.0 + phase).sin() + 5.0 * (t / 3.0).cos() + t * 0.05
        })
        .collect()
}
