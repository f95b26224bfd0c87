//! MACD / signal-line crossover strategy.

use crate::domain::indicator::{IndicatorValue, calculate_macd};
use crate::domain::ohlcv::SeriesView;
use crate::domain::signal::{Direction, Signal};
use crate::domain::strategy::{MACD, crossing_direction, technical_signal};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MacdConfig {
    pub fast_period: usize,
    pub slow_period: usize,
    pub signal_period: usize,
}

impl Default for MacdConfig {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MacdStrategy {
    pub config: MacdConfig,
}

impl MacdStrategy {
    pub fn new(config: MacdConfig) -> Self {
        Self { config }
    }

    pub fn generate_signal(&self, view: &SeriesView<'_>) -> Signal {
        let series = calculate_macd(
            view.bars,
            self.config.fast_period,
            self.config.slow_period,
            self.config.signal_period,
        );
        let direction = match series.last_two() {
            Some((prev, curr)) => match (&prev.value, &curr.value) {
                (
                    IndicatorValue::Macd { histogram: p, .. },
                    IndicatorValue::Macd { histogram: c, .. },
                ) => crossing_direction(*p, *c),
                _ => Direction::Hold,
            },
            None => Direction::Hold,
        };
        technical_signal(view, MACD, direction)
    }
}
