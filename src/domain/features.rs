//! Feature engineering for the learned-model strategy.
//!
//! Each row `i` describes bar `i` using only bars `0..=i`:
//! - raw `close, volume, open, high, low`
//! - `close_ratio_h = close[i] / mean(close[i-h+1..=i])` per horizon
//! - `trend_h = Σ target[j] for j in i-h..i` (up-moves over the h bars before i)
//! - `rsi` over `rsi_period`
//!
//! `target[i] = 1` when `close[i+1] > close[i]`. It is the only column that
//! looks forward, and is only ever used as a training label.

use crate::domain::indicator::{calculate_rsi, rolling_mean};
use crate::domain::ohlcv::Bar;

pub const DEFAULT_HORIZONS: [usize; 5] = [2, 5, 60, 250, 1000];
pub const DEFAULT_RSI_PERIOD: usize = 14;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureConfig {
    pub horizons: Vec<usize>,
    pub rsi_period: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            horizons: DEFAULT_HORIZONS.to_vec(),
            rsi_period: DEFAULT_RSI_PERIOD,
        }
    }
}

impl FeatureConfig {
    pub fn feature_names(&self) -> Vec<String> {
        let mut names: Vec<String> = ["close", "volume", "open", "high", "low"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        for h in &self.horizons {
            names.push(format!("close_ratio_{h}"));
            names.push(format!("trend_{h}"));
        }
        names.push("rsi".to_string());
        names
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub names: Vec<String>,
    /// One entry per bar; `None` while any feature is undefined.
    pub rows: Vec<Option<Vec<f64>>>,
    /// Next-bar direction per bar; `None` for the final bar.
    pub targets: Vec<Option<u8>>,
    rsi: Vec<Option<f64>>,
}

impl FeatureMatrix {
    pub fn build(bars: &[Bar], config: &FeatureConfig) -> Self {
        let n = bars.len();
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

        let targets: Vec<Option<u8>> = (0..n)
            .map(|i| {
                let next = closes.get(i + 1)?;
                Some(u8::from(*next > closes[i]))
            })
            .collect();

        // up_moves[k] = Σ target[j] for j < k
        let mut up_moves = vec![0u32; n + 1];
        for i in 0..n {
            up_moves[i + 1] = up_moves[i] + u32::from(targets[i].unwrap_or(0));
        }

        let means: Vec<Vec<Option<f64>>> = config
            .horizons
            .iter()
            .map(|&h| rolling_mean(&closes, h))
            .collect();
        let rsi_series = calculate_rsi(bars, config.rsi_period);
        let rsi: Vec<Option<f64>> = (0..n).map(|i| rsi_series.simple_at(i)).collect();

        let rows = (0..n)
            .map(|i| {
                let bar = &bars[i];
                let mut row = vec![bar.close, bar.volume, bar.open, bar.high, bar.low];
                for (k, &h) in config.horizons.iter().enumerate() {
                    let mean = means[k][i].filter(|m| *m != 0.0)?;
                    if h == 0 || i < h {
                        return None;
                    }
                    row.push(bar.close / mean);
                    row.push(f64::from(up_moves[i] - up_moves[i - h]));
                }
                row.push(rsi[i]?);
                row.iter().all(|v| v.is_finite()).then_some(row)
            })
            .collect();

        Self {
            names: config.feature_names(),
            rows,
            targets,
            rsi,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows with defined features and a known target.
    pub fn training_set(&self) -> (Vec<Vec<f64>>, Vec<u8>) {
        self.rows
            .iter()
            .zip(&self.targets)
            .filter_map(|(row, target)| Some((row.clone()?, (*target)?)))
            .unzip()
    }

    /// Feature row of the final bar, if defined.
    pub fn latest(&self) -> Option<&[f64]> {
        self.rows.last()?.as_deref()
    }

    pub fn latest_rsi(&self) -> Option<f64> {
        *self.rsi.last()?
    }
}
