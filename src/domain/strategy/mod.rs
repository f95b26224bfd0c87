//! Signal-generating strategies.
//!
//! A [`Strategy`] looks at a [`SeriesView`] ending at the current bar and
//! emits exactly one [`Signal`]. Strategies never see bars past the end of
//! the view, and insufficient history always degrades to HOLD.

pub mod bollinger;
pub mod composite;
pub mod learned;
pub mod ma_crossover;
pub mod macd;
pub mod rsi;
pub mod volume;

pub use bollinger::{BollingerConfig, BollingerStrategy};
pub use composite::{Composite, CompositeConfig};
pub use learned::{LearnedModelConfig, LearnedModelStrategy};
pub use ma_crossover::{MaCrossoverConfig, MaCrossoverStrategy};
pub use macd::{MacdConfig, MacdStrategy};
pub use rsi::{RsiConfig, RsiStrategy};
pub use volume::{VolumeConfig, VolumeStrategy};

use crate::domain::ohlcv::{Bar, SeriesView};
use crate::domain::signal::{Direction, Signal};

pub const RSI: &str = "rsi";
pub const MACD: &str = "macd";
pub const BOLLINGER: &str = "bollinger";
pub const MA_CROSSOVER: &str = "ma_crossover";
pub const VOLUME: &str = "volume";
pub const LEARNED_MODEL: &str = "learned_model";
pub const COMPOSITE: &str = "composite";

/// Every single (non-composite) strategy name, in report order.
pub const MEMBER_NAMES: [&str; 6] = [RSI, MACD, BOLLINGER, MA_CROSSOVER, VOLUME, LEARNED_MODEL];

/// Strength of a directional signal from a rule-based technical strategy.
pub const DIRECTIONAL_STRENGTH: f64 = 0.5;

#[derive(Debug, Clone)]
pub enum Strategy {
    Rsi(RsiStrategy),
    Macd(MacdStrategy),
    Bollinger(BollingerStrategy),
    MaCrossover(MaCrossoverStrategy),
    Volume(VolumeStrategy),
    LearnedModel(Box<LearnedModelStrategy>),
    Composite(Composite),
}

impl Strategy {
    /// Stable key used for weights and supporting-strategy sets.
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Rsi(_) => RSI,
            Strategy::Macd(_) => MACD,
            Strategy::Bollinger(_) => BOLLINGER,
            Strategy::MaCrossover(_) => MA_CROSSOVER,
            Strategy::Volume(_) => VOLUME,
            Strategy::LearnedModel(_) => LEARNED_MODEL,
            Strategy::Composite(_) => COMPOSITE,
        }
    }

    pub fn generate_signal(&self, view: &SeriesView<'_>) -> Signal {
        match self {
            Strategy::Rsi(s) => s.generate_signal(view),
            Strategy::Macd(s) => s.generate_signal(view),
            Strategy::Bollinger(s) => s.generate_signal(view),
            Strategy::MaCrossover(s) => s.generate_signal(view),
            Strategy::Volume(s) => s.generate_signal(view),
            Strategy::LearnedModel(s) => s.generate_signal(view),
            Strategy::Composite(s) => s.generate_signal(view),
        }
    }

    /// True when this strategy (or any composite member) has a trainable model.
    pub fn needs_training(&self) -> bool {
        match self {
            Strategy::LearnedModel(_) => true,
            Strategy::Composite(c) => c.members().iter().any(|(s, _)| s.needs_training()),
            _ => false,
        }
    }

    /// Trains every learned model reachable from this strategy on `bars`.
    /// Returns false when any of them was left untrained. Rule-based
    /// strategies ignore it and report true.
    pub fn fit(&mut self, bars: &[Bar]) -> bool {
        match self {
            Strategy::LearnedModel(s) => s.fit(bars).is_some(),
            Strategy::Composite(c) => c.fit(bars),
            _ => true,
        }
    }
}

/// Technical signal: fixed strength when directional, zero for HOLD.
pub(crate) fn technical_signal(view: &SeriesView<'_>, name: &str, direction: Direction) -> Signal {
    let strength = match direction {
        Direction::Hold => 0.0,
        _ => DIRECTIONAL_STRENGTH,
    };
    Signal::new(view.timestamp(), view.instrument, name, direction, strength)
}

/// Direction implied by a strict crossing of `a` over `b` between the previous
/// and the current sample.
pub(crate) fn crossing_direction(prev_spread: f64, curr_spread: f64) -> Direction {
    use crate::domain::indicator::{Crossing, detect_crossing};
    match detect_crossing(prev_spread, curr_spread) {
        Crossing::Above => Direction::Buy,
        Crossing::Below => Direction::Sell,
        Crossing::None => Direction::Hold,
    }
}
