//! Volume spike strategy: trade in the direction of the bar on unusual volume.

use crate::domain::indicator::calculate_volume_ratio;
use crate::domain::ohlcv::SeriesView;
use crate::domain::signal::{Direction, Signal};
use crate::domain::strategy::{VOLUME, technical_signal};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VolumeConfig {
    pub period: usize,
    pub threshold: f64,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            period: 20,
            threshold: 1.5,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VolumeStrategy {
    pub config: VolumeConfig,
}

impl VolumeStrategy {
    pub fn new(config: VolumeConfig) -> Self {
        Self { config }
    }

    pub fn generate_signal(&self, view: &SeriesView<'_>) -> Signal {
        let tail = &view.bars[view.len().saturating_sub(self.config.period.max(2))..];
        let ratio = calculate_volume_ratio(tail, self.config.period).last_simple();

        let direction = match (ratio, tail) {
            (Some(ratio), [.., prev, curr]) if ratio > self.config.threshold => {
                if curr.close > prev.close {
                    Direction::Buy
                } else if curr.close < prev.close {
                    Direction::Sell
                } else {
                    Direction::Hold
                }
            }
            _ => Direction::Hold,
        };
        technical_signal(view, VOLUME, direction)
    }
}
