//! Random-forest next-bar direction strategy.
//!
//! `fit` trains on every usable feature row whose next-bar target is known;
//! `generate_signal` scores the feature row of the current bar. An untrained
//! model always holds.

use crate::domain::features::{FeatureConfig, FeatureMatrix};
use crate::domain::model::{ForestConfig, RandomForest};
use crate::domain::ohlcv::{Bar, SeriesView};
use crate::domain::signal::{Direction, Signal};
use crate::domain::strategy::LEARNED_MODEL;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LearnedModelConfig {
    pub forest: ForestConfig,
    pub features: FeatureConfig,
    pub buy_threshold: f64,
    pub sell_threshold: f64,
    /// RSI below this boosts the buy probability.
    pub rsi_boost_below: f64,
    pub rsi_boost_factor: f64,
    pub min_training_samples: usize,
}

impl Default for LearnedModelConfig {
    fn default() -> Self {
        Self {
            forest: ForestConfig::default(),
            features: FeatureConfig::default(),
            buy_threshold: 0.6,
            sell_threshold: 0.4,
            rsi_boost_below: 30.0,
            rsi_boost_factor: 1.5,
            min_training_samples: 100,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LearnedModelStrategy {
    pub config: LearnedModelConfig,
    forest: RandomForest,
}

impl Default for LearnedModelStrategy {
    fn default() -> Self {
        Self::new(LearnedModelConfig::default())
    }
}

impl LearnedModelStrategy {
    pub fn new(config: LearnedModelConfig) -> Self {
        let forest = RandomForest::new(config.forest.clone());
        Self { config, forest }
    }

    pub fn is_trained(&self) -> bool {
        self.forest.is_trained()
    }

    /// Trains on `bars`. Returns the number of training rows, or `None` when
    /// there were too few and the model was left untrained.
    pub fn fit(&mut self, bars: &[Bar]) -> Option<usize> {
        let matrix = FeatureMatrix::build(bars, &self.config.features);
        let (x, y) = matrix.training_set();

        if x.len() < self.config.min_training_samples {
            tracing::debug!(
                samples = x.len(),
                required = self.config.min_training_samples,
                "not enough data to train learned model"
            );
            self.forest = RandomForest::new(self.config.forest.clone());
            return None;
        }

        self.forest.fit(&x, &y);
        tracing::info!(
            samples = x.len(),
            trees = self.forest.n_trees(),
            "learned model trained"
        );
        Some(x.len())
    }

    /// Up-class probability for the current bar, after the oversold boost.
    pub fn buy_probability(&self, bars: &[Bar]) -> Option<f64> {
        if !self.is_trained() {
            return None;
        }
        let matrix = FeatureMatrix::build(bars, &self.config.features);
        let row = matrix.latest()?;
        let mut p = self.forest.predict_proba(row)?;
        if matrix
            .latest_rsi()
            .is_some_and(|rsi| rsi < self.config.rsi_boost_below)
        {
            p = (p * self.config.rsi_boost_factor).min(1.0);
        }
        Some(p)
    }

    pub fn generate_signal(&self, view: &SeriesView<'_>) -> Signal {
        let Some(p) = self.buy_probability(view.bars) else {
            return Signal::hold(view.timestamp(), view.instrument, LEARNED_MODEL);
        };
        let (direction, strength) = self.classify(p);
        Signal::new(
            view.timestamp(),
            view.instrument,
            LEARNED_MODEL,
            direction,
            strength,
        )
    }

    /// Direction and the probability of the predicted class.
    pub fn classify(&self, buy_probability: f64) -> (Direction, f64) {
        if buy_probability >= self.config.buy_threshold {
            (Direction::Buy, buy_probability)
        } else if buy_probability <= self.config.sell_threshold {
            (Direction::Sell, 1.0 - buy_probability)
        } else {
            (Direction::Hold, buy_probability.max(1.0 - buy_probability))
        }
    }
}
