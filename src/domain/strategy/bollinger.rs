//! Bollinger band touch strategy.

use crate::domain::indicator::IndicatorValue;
use crate::domain::indicator::bollinger::{calculate_bollinger, mult_to_x100};
use crate::domain::ohlcv::SeriesView;
use crate::domain::signal::{Direction, Signal};
use crate::domain::strategy::{BOLLINGER, technical_signal};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BollingerConfig {
    pub period: usize,
    pub std_dev: f64,
}

impl Default for BollingerConfig {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev: 2.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BollingerStrategy {
    pub config: BollingerConfig,
}

impl BollingerStrategy {
    pub fn new(config: BollingerConfig) -> Self {
        Self { config }
    }

    pub fn generate_signal(&self, view: &SeriesView<'_>) -> Signal {
        let period = self.config.period;
        let tail = &view.bars[view.len().saturating_sub(period)..];
        let bands = calculate_bollinger(tail, period, mult_to_x100(self.config.std_dev));

        let direction = match (bands.last_point(), view.last()) {
            (Some(point), Some(bar)) => match point.value {
                IndicatorValue::Bollinger { upper, lower, .. } => {
                    if bar.close <= lower {
                        Direction::Buy
                    } else if bar.close >= upper {
                        Direction::Sell
                    } else {
                        Direction::Hold
                    }
                }
                _ => Direction::Hold,
            },
            _ => Direction::Hold,
        };
        technical_signal(view, BOLLINGER, direction)
    }
}
