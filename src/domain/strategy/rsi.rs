//! RSI threshold strategy.

use crate::domain::indicator::calculate_rsi;
use crate::domain::ohlcv::SeriesView;
use crate::domain::signal::{Direction, Signal};
use crate::domain::strategy::RSI;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RsiConfig {
    pub period: usize,
    pub oversold_threshold: f64,
    pub overbought_threshold: f64,
}

impl Default for RsiConfig {
    fn default() -> Self {
        Self {
            period: 14,
            oversold_threshold: 30.0,
            overbought_threshold: 70.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RsiStrategy {
    pub config: RsiConfig,
}

impl RsiStrategy {
    pub fn new(config: RsiConfig) -> Self {
        Self { config }
    }

    pub fn generate_signal(&self, view: &SeriesView<'_>) -> Signal {
        let series = calculate_rsi(view.bars, self.config.period);
        let Some(rsi) = series.last_simple() else {
            return Signal::hold(view.timestamp(), view.instrument, RSI);
        };
        let (direction, strength) = self.classify(rsi);
        Signal::new(view.timestamp(), view.instrument, RSI, direction, strength)
    }

    /// Maps an RSI reading to a direction and strength.
    pub fn classify(&self, rsi: f64) -> (Direction, f64) {
        let RsiConfig {
            oversold_threshold: oversold,
            overbought_threshold: overbought,
            ..
        } = self.config;

        if rsi < oversold {
            (Direction::Buy, (oversold - rsi) / oversold)
        } else if rsi > overbought {
            (Direction::Sell, (rsi - overbought) / (100.0 - overbought))
        } else {
            (Direction::Hold, 0.0)
        }
    }
}
