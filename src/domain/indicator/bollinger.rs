//! Bollinger Bands indicator.
//!
//! - Middle: SMA over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! StdDev is the population standard deviation (divides by N, not N-1).
//! Warmup: first (period-1) bars are invalid.

use crate::domain::indicator::stddev::window_mean_stddev;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::Bar;

pub fn calculate_bollinger(bars: &[Bar], period: usize, stddev_mult_x100: u32) -> IndicatorSeries {
    let mult = stddev_mult_x100 as f64 / 100.0;

    let values = (0..bars.len())
        .map(|i| {
            let timestamp = bars[i].timestamp;
            match window_mean_stddev(bars, i, period) {
                Some((middle, stddev)) => IndicatorPoint {
                    timestamp,
                    valid: true,
                    value: IndicatorValue::Bollinger {
                        upper: middle + mult * stddev,
                        middle,
                        lower: middle - mult * stddev,
                    },
                },
                None => IndicatorPoint {
                    timestamp,
                    valid: false,
                    value: IndicatorValue::Bollinger {
                        upper: 0.0,
                        middle: 0.0,
                        lower: 0.0,
                    },
                },
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Bollinger {
            period,
            stddev_mult_x100,
        },
        values,
    }
}

/// Converts a floating multiplier into the hundredths used by [`IndicatorType`].
pub fn mult_to_x100(mult: f64) -> u32 {
    (mult * 100.0).round().max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::make_bars;
    use approx::assert_relative_eq;

    #[test]
    fn bollinger_bands() {
        let bars = make_bars(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        let series = calculate_bollinger(&bars, 8, 200);
        assert_eq!(series.valid_count(), 1);
        match series.values[7].value {
            IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            } => {
                assert_relative_eq!(middle, 5.0);
                assert_relative_eq!(upper, 9.0);
                assert_relative_eq!(lower, 1.0);
            }
            _ => panic!("expected Bollinger value"),
        }
    }

    #[test]
    fn bollinger_constant_prices_collapse() {
        let bars = make_bars(&[50.0; 5]);
        let series = calculate_bollinger(&bars, 3, 200);
        match series.values[4].value {
            IndicatorValue::Bollinger { upper, lower, .. } => {
                assert_relative_eq!(upper, 50.0);
                assert_relative_eq!(lower, 50.0);
            }
            _ => panic!("expected Bollinger value"),
        }
    }

    #[test]
    fn bollinger_short_input() {
        let bars = make_bars(&[1.0, 2.0]);
        let series = calculate_bollinger(&bars, 20, 200);
        assert_eq!(series.len(), 2);
        assert_eq!(series.valid_count(), 0);
    }

    #[test]
    fn multiplier_conversion() {
        assert_eq!(mult_to_x100(2.0), 200);
        assert_eq!(mult_to_x100(1.5), 150);
    }
}
