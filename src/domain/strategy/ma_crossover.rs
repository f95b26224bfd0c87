//! Short/long simple moving average crossover strategy.

use crate::domain::indicator::calculate_sma;
use crate::domain::ohlcv::SeriesView;
use crate::domain::signal::{Direction, Signal};
use crate::domain::strategy::{MA_CROSSOVER, crossing_direction, technical_signal};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MaCrossoverConfig {
    pub short_period: usize,
    pub long_period: usize,
}

impl Default for MaCrossoverConfig {
    fn default() -> Self {
        Self {
            short_period: 10,
            long_period: 30,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MaCrossoverStrategy {
    pub config: MaCrossoverConfig,
}

impl MaCrossoverStrategy {
    pub fn new(config: MaCrossoverConfig) -> Self {
        Self { config }
    }

    pub fn generate_signal(&self, view: &SeriesView<'_>) -> Signal {
        let lookback = self.config.short_period.max(self.config.long_period) + 1;
        let tail = &view.bars[view.len().saturating_sub(lookback)..];
        let short = calculate_sma(tail, self.config.short_period);
        let long = calculate_sma(tail, self.config.long_period);

        let n = tail.len();
        let direction = if n < 2 {
            Direction::Hold
        } else {
            let spread = |i: usize| Some(short.simple_at(i)? - long.simple_at(i)?);
            match (spread(n - 2), spread(n - 1)) {
                (Some(prev), Some(curr)) => crossing_direction(prev, curr),
                _ => Direction::Hold,
            }
        };
        technical_signal(view, MA_CROSSOVER, direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::strategy::test_support::series_from_closes;

    fn strategy() -> MaCrossoverStrategy {
        MaCrossoverStrategy::new(MaCrossoverConfig {
            short_period: 2,
            long_period: 4,
        })
    }

    #[test]
    fn golden_cross_buys() {
        // SMA2 - SMA4 goes from -1.0 to +0.25
        let series = series_from_closes(&[13.0, 12.0, 11.0, 10.0, 14.0]);
        let signal = strategy().generate_signal(&series.full_view());
        assert_eq!(signal.direction, Direction::Buy);
        assert_eq!(signal.strength, 0.5);
    }

    #[test]
    fn death_cross_sells() {
        let series = series_from_closes(&[10.0, 11.0, 12.0, 13.0, 9.0]);
        let signal = strategy().generate_signal(&series.full_view());
        assert_eq!(signal.direction, Direction::Sell);
    }

    #[test]
    fn touching_is_not_a_cross() {
        // spread goes from 0 to positive
        let series = series_from_closes(&[10.0, 10.0, 10.0, 10.0, 10.0, 14.0]);
        let signal = strategy().generate_signal(&series.full_view());
        assert_eq!(signal.direction, Direction::Hold);
    }

    #[test]
    fn short_history_holds() {
        let series = series_from_closes(&[10.0, 11.0, 12.0]);
        let signal = MaCrossoverStrategy::default().generate_signal(&series.full_view());
        assert_eq!(signal.direction, Direction::Hold);
    }
}
