//! Standard Deviation indicator.
//!
//! Population standard deviation over n closing prices.
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::Bar;

pub fn calculate_stddev(bars: &[Bar], period: usize) -> IndicatorSeries {
    let values = (0..bars.len())
        .map(|i| {
            let stats = window_mean_stddev(bars, i, period);
            IndicatorPoint {
                timestamp: bars[i].timestamp,
                valid: stats.is_some(),
                value: IndicatorValue::Simple(stats.map_or(0.0, |(_, sd)| sd)),
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Stddev(period),
        values,
    }
}

/// Mean and population standard deviation of the closes in the window of
/// `period` bars ending at `end`, or `None` when the window is not full.
pub(crate) fn window_mean_stddev(bars: &[Bar], end: usize, period: usize) -> Option<(f64, f64)> {
    if period == 0 || end + 1 < period || end >= bars.len() {
        return None;
    }
    let window = &bars[end + 1 - period..=end];
    let mean = window.iter().map(|b| b.close).sum::<f64>() / period as f64;
    let variance = window
        .iter()
        .map(|b| {
            let diff = b.close - mean;
            diff * diff
        })
        .sum::<f64>()
        / period as f64;
    Some((mean, variance.sqrt()))
}
