//! Random forest: bootstrap-sampled trees with √features per split.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;

use crate::domain::model::tree::{DecisionTree, TreeConfig, bootstrap_indices};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ForestConfig {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            max_depth: 12,
            min_samples_split: 50,
            min_samples_leaf: 1,
            seed: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RandomForest {
    config: ForestConfig,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
        }
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn is_trained(&self) -> bool {
        !self.trees.is_empty()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Replaces any previous fit. Empty input leaves the forest untrained.
    pub fn fit(&mut self, x: &[Vec<f64>], y: &[u8]) {
        let n = x.len().min(y.len());
        if n == 0 {
            self.trees.clear();
            return;
        }
        let n_features = x[0].len();
        let tree_config = TreeConfig {
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split,
            min_samples_leaf: self.config.min_samples_leaf,
            max_features: Some(((n_features as f64).sqrt().round() as usize).max(1)),
        };
        let seed = self.config.seed;

        self.trees = (0..self.config.n_estimators)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
                let indices = bootstrap_indices(n, &mut rng);
                DecisionTree::fit(x, y, &indices, &tree_config, &mut rng)
            })
            .collect();
    }

    /// Mean up-class probability across trees; `None` when untrained.
    pub fn predict_proba(&self, row: &[f64]) -> Option<f64> {
        if self.trees.is_empty() {
            return None;
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict_proba(row)).sum();
        Some(sum / self.trees.len() as f64)
    }
}
