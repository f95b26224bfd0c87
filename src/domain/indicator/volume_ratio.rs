//! Volume ratio: current volume over its rolling mean.
//!
//! VR(n)[i] = V[i] / mean(V[i-n+1..=i]). Undefined while the window is not
//! full and wherever the rolling mean is zero.

use crate::domain::indicator::{
    IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue, rolling_mean,
};
use crate::domain::ohlcv::Bar;

pub fn calculate_volume_ratio(bars: &[Bar], period: usize) -> IndicatorSeries {
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
    let means = rolling_mean(&volumes, period);

    let values = bars
        .iter()
        .zip(means)
        .map(|(bar, mean)| {
            let ratio = mean.filter(|m| *m != 0.0).map(|m| bar.volume / m);
            IndicatorPoint {
                timestamp: bar.timestamp,
                valid: ratio.is_some(),
                value: IndicatorValue::Simple(ratio.unwrap_or(0.0)),
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::VolumeRatio(period),
        values,
    }
}
