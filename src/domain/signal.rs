//! Directional signals emitted by strategies.

use chrono::NaiveDateTime;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Buy => write!(f, "BUY"),
            Direction::Sell => write!(f, "SELL"),
            Direction::Hold => write!(f, "HOLD"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Signal {
    pub timestamp: NaiveDateTime,
    pub instrument: String,
    pub direction: Direction,
    /// Always within [0, 1].
    pub strength: f64,
    pub source_strategy: String,
    pub supporting_strategies: BTreeSet<String>,
}

impl Signal {
    pub fn new(
        timestamp: NaiveDateTime,
        instrument: &str,
        source_strategy: &str,
        direction: Direction,
        strength: f64,
    ) -> Self {
        let strength = if strength.is_finite() {
            strength.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Signal {
            timestamp,
            instrument: instrument.to_string(),
            direction,
            strength,
            source_strategy: source_strategy.to_string(),
            supporting_strategies: BTreeSet::new(),
        }
    }

    pub fn hold(timestamp: NaiveDateTime, instrument: &str, source_strategy: &str) -> Self {
        Signal::new(timestamp, instrument, source_strategy, Direction::Hold, 0.0)
    }

    pub fn with_supporting(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.supporting_strategies = names.into_iter().collect();
        self
    }

    pub fn is_actionable(&self) -> bool {
        self.direction != Direction::Hold
    }
}
