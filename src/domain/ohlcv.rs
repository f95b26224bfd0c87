//! OHLCV bar and series representation.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;

/// Sampling interval of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BarSize {
    Minute,
    Hour,
    #[default]
    Day,
}

impl fmt::Display for BarSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BarSize::Minute => write!(f, "1m"),
            BarSize::Hour => write!(f, "1h"),
            BarSize::Day => write!(f, "1d"),
        }
    }
}

impl FromStr for BarSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1m" | "minute" => Ok(BarSize::Minute),
            "1h" | "hour" => Ok(BarSize::Hour),
            "1d" | "day" | "daily" => Ok(BarSize::Day),
            other => Err(format!("unknown bar size '{other}' (expected 1m, 1h or 1d)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// A bar is usable only when every price and the volume are finite.
    pub fn is_valid(&self) -> bool {
        self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite()
    }
}

/// Ordered bars for one instrument. Timestamps are strictly increasing.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    instrument: String,
    bars: Vec<Bar>,
}

impl Series {
    /// Sorts by timestamp and drops duplicate timestamps, keeping the first.
    pub fn new(instrument: impl Into<String>, mut bars: Vec<Bar>) -> Self {
        let instrument = instrument.into();
        bars.sort_by_key(|b| b.timestamp);
        let before = bars.len();
        bars.dedup_by_key(|b| b.timestamp);
        if bars.len() != before {
            tracing::warn!(
                instrument = %instrument,
                dropped = before - bars.len(),
                "dropped bars with duplicate timestamps"
            );
        }
        Self { instrument, bars }
    }

    pub fn empty(instrument: impl Into<String>) -> Self {
        Self {
            instrument: instrument.into(),
            bars: Vec::new(),
        }
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Bars with every field finite, in order.
    pub fn valid_bars(&self) -> Vec<Bar> {
        self.bars.iter().filter(|b| b.is_valid()).cloned().collect()
    }

    /// Window ending at (and including) `end`.
    pub fn view(&self, end: usize) -> SeriesView<'_> {
        let end = (end + 1).min(self.bars.len());
        SeriesView {
            instrument: &self.instrument,
            bars: &self.bars[..end],
        }
    }

    pub fn full_view(&self) -> SeriesView<'_> {
        SeriesView {
            instrument: &self.instrument,
            bars: &self.bars,
        }
    }
}

/// Borrowed look-back window handed to strategies. The last bar is "now".
#[derive(Debug, Clone, Copy)]
pub struct SeriesView<'a> {
    pub instrument: &'a str,
    pub bars: &'a [Bar],
}

impl<'a> SeriesView<'a> {
    pub fn new(instrument: &'a str, bars: &'a [Bar]) -> Self {
        Self { instrument, bars }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&'a Bar> {
        self.bars.last()
    }

    /// Timestamp of the current bar; the epoch for an empty window.
    pub fn timestamp(&self) -> NaiveDateTime {
        self.bars.last().map(|b| b.timestamp).unwrap_or_default()
    }
}
