//! Weighted-vote ensemble over member strategies.
//!
//! With `W` the total member weight and `B`/`S` the weights voting BUY/SELL:
//! a tie (`B == S`) holds; otherwise the larger side wins when its share of
//! `W` reaches the consensus threshold, and holds when it does not.

use std::collections::BTreeMap;

use crate::domain::ohlcv::{Bar, SeriesView};
use crate::domain::signal::{Direction, Signal};
use crate::domain::strategy::{
    BOLLINGER, COMPOSITE, LEARNED_MODEL, MA_CROSSOVER, MACD, RSI, Strategy, VOLUME,
};

pub const DEFAULT_CONSENSUS_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompositeConfig {
    pub consensus_threshold: f64,
    /// Weight per member strategy name.
    pub weights: BTreeMap<String, f64>,
}

impl Default for CompositeConfig {
    fn default() -> Self {
        let weights = [
            (RSI, 1.0),
            (MACD, 1.2),
            (BOLLINGER, 0.8),
            (MA_CROSSOVER, 1.0),
            (LEARNED_MODEL, 1.5),
            (VOLUME, 0.7),
        ]
        .into_iter()
        .map(|(name, w)| (name.to_string(), w))
        .collect();
        Self {
            consensus_threshold: DEFAULT_CONSENSUS_THRESHOLD,
            weights,
        }
    }
}

impl CompositeConfig {
    /// Configured weight for `name`, 1.0 when unlisted.
    pub fn weight_for(&self, name: &str) -> f64 {
        self.weights.get(name).copied().unwrap_or(1.0)
    }
}

#[derive(Debug, Clone)]
pub struct Composite {
    members: Vec<(Strategy, f64)>,
    consensus_threshold: f64,
}

/// Outcome of a weighted vote, before it is stamped into a [`Signal`].
#[derive(Debug, Clone, PartialEq)]
pub struct Vote {
    pub direction: Direction,
    pub strength: f64,
    pub supporters: Vec<String>,
}

impl Composite {
    pub fn new(members: Vec<(Strategy, f64)>, consensus_threshold: f64) -> Self {
        Self {
            members,
            consensus_threshold,
        }
    }

    /// Builds the ensemble, weighting each member from `config`.
    pub fn from_members(members: Vec<Strategy>, config: &CompositeConfig) -> Self {
        let members = members
            .into_iter()
            .map(|s| {
                let w = config.weight_for(s.name());
                (s, w)
            })
            .collect();
        Self::new(members, config.consensus_threshold)
    }

    pub fn members(&self) -> &[(Strategy, f64)] {
        &self.members
    }

    pub fn consensus_threshold(&self) -> f64 {
        self.consensus_threshold
    }

    /// True when every learned member ended up trained.
    pub fn fit(&mut self, bars: &[Bar]) -> bool {
        let mut trained = true;
        for (member, _) in &mut self.members {
            trained &= member.fit(bars);
        }
        trained
    }

    /// Runs every member on `view`, in member order.
    pub fn member_signals(&self, view: &SeriesView<'_>) -> Vec<Signal> {
        self.members
            .iter()
            .map(|(s, _)| s.generate_signal(view))
            .collect()
    }

    pub fn generate_signal(&self, view: &SeriesView<'_>) -> Signal {
        let signals = self.member_signals(view);
        self.combine(view, &signals)
    }

    /// Folds already-computed member signals into the composite signal.
    pub fn combine(&self, view: &SeriesView<'_>, signals: &[Signal]) -> Signal {
        let ballots: Vec<(&str, Direction, f64)> = signals
            .iter()
            .zip(&self.members)
            .map(|(sig, (_, w))| (sig.source_strategy.as_str(), sig.direction, *w))
            .collect();
        let vote = tally(&ballots, self.consensus_threshold);
        Signal::new(
            view.timestamp(),
            view.instrument,
            COMPOSITE,
            vote.direction,
            vote.strength,
        )
        .with_supporting(vote.supporters)
    }
}

/// Weighted vote over `(name, direction, weight)` ballots.
pub fn tally(ballots: &[(&str, Direction, f64)], consensus_threshold: f64) -> Vote {
    let weight_of = |d: Direction| -> f64 {
        ballots
            .iter()
            .filter(|(_, dir, _)| *dir == d)
            .map(|(_, _, w)| w)
            .sum()
    };
    let total: f64 = ballots.iter().map(|(_, _, w)| w).sum();
    let buy = weight_of(Direction::Buy);
    let sell = weight_of(Direction::Sell);

    let direction = if total <= 0.0 || buy == sell {
        Direction::Hold
    } else if buy > sell && buy / total >= consensus_threshold {
        Direction::Buy
    } else if sell > buy && sell / total >= consensus_threshold {
        Direction::Sell
    } else {
        Direction::Hold
    };

    let strength = if total > 0.0 {
        weight_of(direction) / total
    } else {
        0.0
    };
    let supporters = ballots
        .iter()
        .filter(|(_, dir, _)| *dir == direction)
        .map(|(name, _, _)| name.to_string())
        .collect();

    Vote {
        direction,
        strength,
        supporters,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::strategy::test_support::series_from_closes;
    use crate::domain::strategy::{RsiStrategy, VolumeStrategy};
    use approx::assert_relative_eq;

    #[test]
    fn weighted_tie_holds() {
        let vote = tally(
            &[
                ("rsi", Direction::Buy, 1.0),
                ("macd", Direction::Sell, 1.0),
            ],
            0.5,
        );
        assert_eq!(vote.direction, Direction::Hold);
    }

    #[test]
    fn all_hold_is_hold() {
        let vote = tally(
            &[("rsi", Direction::Hold, 1.0), ("macd", Direction::Hold, 1.2)],
            0.6,
        );
        assert_eq!(vote.direction, Direction::Hold);
        assert_relative_eq!(vote.strength, 1.0);
        assert_eq!(vote.supporters, vec!["rsi", "macd"]);
    }

    #[test]
    fn consensus_reached_buys() {
        let vote = tally(
            &[
                ("rsi", Direction::Buy, 1.0),
                ("macd", Direction::Buy, 1.2),
                ("volume", Direction::Hold, 0.7),
                ("bollinger", Direction::Sell, 0.3),
            ],
            0.6,
        );
        assert_eq!(vote.direction, Direction::Buy);
        assert_relative_eq!(vote.strength, 2.2 / 3.2, epsilon = 1e-12);
        assert_eq!(vote.supporters, vec!["rsi", "macd"]);
    }

    #[test]
    fn majority_without_consensus_holds() {
        let vote = tally(
            &[
                ("rsi", Direction::Sell, 1.0),
                ("macd", Direction::Hold, 1.0),
                ("volume", Direction::Hold, 1.0),
            ],
            0.6,
        );
        assert_eq!(vote.direction, Direction::Hold);
        assert_relative_eq!(vote.strength, 2.0 / 3.0);
    }

    #[test]
    fn sell_consensus() {
        let vote = tally(
            &[
                ("learned_model", Direction::Sell, 1.5),
                ("macd", Direction::Hold, 1.0),
            ],
            0.6,
        );
        assert_eq!(vote.direction, Direction::Sell);
        assert_eq!(vote.supporters, vec!["learned_model"]);
    }

    #[test]
    fn zero_weight_holds() {
        let vote = tally(&[("rsi", Direction::Buy, 0.0)], 0.6);
        assert_eq!(vote.direction, Direction::Hold);
        assert_eq!(vote.strength, 0.0);
    }

    #[test]
    fn default_weights_favour_learned_model() {
        let config = CompositeConfig::default();
        let max = config
            .weights
            .iter()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .unwrap();
        assert_eq!(max.0, "learned_model");
        assert_eq!(config.weight_for("unknown"), 1.0);
    }

    #[test]
    fn composite_is_deterministic() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let series = series_from_closes(&closes);
        let composite = Composite::from_members(
            vec![
                Strategy::Rsi(RsiStrategy::default()),
                Strategy::Volume(VolumeStrategy::default()),
            ],
            &CompositeConfig::default(),
        );
        let a = composite.generate_signal(&series.full_view());
        let b = composite.generate_signal(&series.full_view());
        assert_eq!(a, b);
        assert_eq!(a.source_strategy, "composite");
        // RSI sells with weight 1.0 of 1.7; below the 0.6 consensus.
        assert_eq!(a.direction, Direction::Hold);
        assert_eq!(
            a.supporting_strategies.iter().collect::<Vec<_>>(),
            vec!["volume"]
        );
    }

    #[test]
    fn fit_reports_untrained_learned_member() {
        use crate::domain::strategy::{LearnedModelConfig, LearnedModelStrategy};

        let learned = LearnedModelStrategy::new(LearnedModelConfig {
            min_training_samples: 30,
            ..LearnedModelConfig::default()
        });
        let mut composite = Composite::new(
            vec![
                (Strategy::Rsi(RsiStrategy::default()), 1.0),
                (Strategy::LearnedModel(Box::new(learned)), 1.5),
            ],
            0.6,
        );
        let short = series_from_closes(&[100.0; 20]);
        assert!(!composite.fit(short.bars()));

        let mut technical = Composite::new(vec![(Strategy::Rsi(RsiStrategy::default()), 1.0)], 0.6);
        assert!(technical.fit(short.bars()));
    }
}
