//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seed with first SMA, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::Bar;

pub fn calculate_ema(bars: &[Bar], period: usize) -> IndicatorSeries {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let emas = ema_values(&closes, 0, period);

    let values = bars
        .iter()
        .zip(emas)
        .map(|(bar, ema)| IndicatorPoint {
            timestamp: bar.timestamp,
            valid: ema.is_some(),
            value: IndicatorValue::Simple(ema.unwrap_or(0.0)),
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(period),
        values,
    }
}

/// EMA over `values[start..]`, seeded by the SMA of its first `period`
/// entries. Entries before the seed are `None`; output length equals input.
pub(crate) fn ema_values(values: &[f64], start: usize, period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || start + period > values.len() {
        return out;
    }

    let k = 2.0 / (period as f64 + 1.0);
    let seed_idx = start + period - 1;
    let mut ema = values[start..=seed_idx].iter().sum::<f64>() / period as f64;
    out[seed_idx] = Some(ema);

    for i in (seed_idx + 1)..values.len() {
        ema = values[i] * k + ema * (1.0 - k);
        out[i] = Some(ema);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::make_bars;

    #[test]
    fn ema_warmup() {
        let bars = make_bars(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let series = calculate_ema(&bars, 3);

        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
        assert!(series.values[3].valid);
        assert!(series.values[4].valid);
    }

    #[test]
    fn ema_period_1() {
        let bars = make_bars(&[10.0, 20.0, 30.0]);
        let series = calculate_ema(&bars, 1);

        assert_eq!(series.valid_count(), 3);
        assert!((series.simple_at(0).unwrap() - 10.0).abs() < f64::EPSILON);
        assert!((series.simple_at(1).unwrap() - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_seed_is_sma() {
        let bars = make_bars(&[10.0, 20.0, 30.0]);
        let series = calculate_ema(&bars, 3);
        let expected_sma = (10.0 + 20.0 + 30.0) / 3.0;
        assert!((series.simple_at(2).unwrap() - expected_sma).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_recursive_calculation() {
        let bars = make_bars(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let series = calculate_ema(&bars, 3);

        let k = 2.0 / 4.0;
        let sma = (10.0 + 20.0 + 30.0) / 3.0;
        let ema_3 = 40.0 * k + sma * (1.0 - k);
        let ema_4 = 50.0 * k + ema_3 * (1.0 - k);

        assert!((series.simple_at(3).unwrap() - ema_3).abs() < f64::EPSILON);
        assert!((series.simple_at(4).unwrap() - ema_4).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_short_input_keeps_length() {
        let bars = make_bars(&[10.0, 20.0]);
        let series = calculate_ema(&bars, 5);
        assert_eq!(series.len(), 2);
        assert_eq!(series.valid_count(), 0);
    }

    #[test]
    fn ema_values_with_offset() {
        let out = ema_values(&[0.0, 0.0, 2.0, 4.0, 6.0], 2, 2);
        assert_eq!(out[..3], [None, None, None]);
        assert_eq!(out[3], Some(3.0));
        let k = 2.0 / 3.0;
        assert!((out[4].unwrap() - (6.0 * k + 3.0 * (1.0 - k))).abs() < 1e-12);
    }
}
