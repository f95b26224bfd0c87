//! Binary CART classification tree with Gini impurity.
//!
//! Labels are 0 (down) or 1 (up). Leaves store the fraction of up labels, so
//! a tree predicts the probability of the up class directly.

use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::index::sample;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features considered per split; `None` means all of them.
    pub max_features: Option<usize>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 12,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
enum Node {
    Leaf {
        up_probability: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecisionTree {
    root: Node,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

impl DecisionTree {
    /// Fits a tree on the rows selected by `indices` (duplicates allowed).
    pub fn fit(
        x: &[Vec<f64>],
        y: &[u8],
        indices: &[usize],
        config: &TreeConfig,
        rng: &mut StdRng,
    ) -> Self {
        let root = build_node(x, y, indices.to_vec(), 0, config, rng);
        Self { root }
    }

    /// Probability of the up class for one feature row.
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { up_probability } => return *up_probability,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = row.get(*feature).copied().unwrap_or(0.0);
                    node = if value <= *threshold { left } else { right };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn depth_of(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 1,
                Node::Split { left, right, .. } => 1 + depth_of(left).max(depth_of(right)),
            }
        }
        depth_of(&self.root)
    }
}

fn gini(ups: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let p = ups as f64 / total as f64;
    2.0 * p * (1.0 - p)
}

fn build_node(
    x: &[Vec<f64>],
    y: &[u8],
    indices: Vec<usize>,
    depth: usize,
    config: &TreeConfig,
    rng: &mut StdRng,
) -> Node {
    let n = indices.len();
    let ups = indices.iter().filter(|&&i| y[i] == 1).count();
    let leaf = Node::Leaf {
        up_probability: if n == 0 { 0.5 } else { ups as f64 / n as f64 },
    };

    let impurity = gini(ups, n);
    if depth + 1 >= config.max_depth || n < config.min_samples_split || impurity == 0.0 {
        return leaf;
    }

    let Some(best) = find_best_split(x, y, &indices, ups, config, rng) else {
        return leaf;
    };
    if best.impurity >= impurity {
        return leaf;
    }

    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
        .into_iter()
        .partition(|&i| x[i][best.feature] <= best.threshold);

    Node::Split {
        feature: best.feature,
        threshold: best.threshold,
        left: Box::new(build_node(x, y, left_idx, depth + 1, config, rng)),
        right: Box::new(build_node(x, y, right_idx, depth + 1, config, rng)),
    }
}

/// Sort-and-sweep search over a random feature subset.
fn find_best_split(
    x: &[Vec<f64>],
    y: &[u8],
    indices: &[usize],
    total_ups: usize,
    config: &TreeConfig,
    rng: &mut StdRng,
) -> Option<BestSplit> {
    let n_features = x.get(indices[0]).map_or(0, |row| row.len());
    if n_features == 0 {
        return None;
    }
    let k = config
        .max_features
        .unwrap_or(n_features)
        .clamp(1, n_features);
    let candidates = sample(rng, n_features, k);

    let n = indices.len();
    let min_leaf = config.min_samples_leaf.max(1);
    let mut best: Option<BestSplit> = None;
    let mut sorted = indices.to_vec();

    for feature in candidates.iter() {
        sorted.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

        let mut left_ups = 0;
        for pos in 0..n - 1 {
            left_ups += usize::from(y[sorted[pos]] == 1);
            let left_n = pos + 1;
            let right_n = n - left_n;
            let here = x[sorted[pos]][feature];
            let next = x[sorted[pos + 1]][feature];
            if here == next || left_n < min_leaf || right_n < min_leaf {
                continue;
            }

            let weighted = (left_n as f64 * gini(left_ups, left_n)
                + right_n as f64 * gini(total_ups - left_ups, right_n))
                / n as f64;
            if best.as_ref().is_none_or(|b| weighted < b.impurity) {
                best = Some(BestSplit {
                    feature,
                    threshold: here + (next - here) / 2.0,
                    impurity: weighted,
                });
            }
        }
    }
    best
}

/// Draws `n` row indices with replacement.
pub fn bootstrap_indices(n: usize, rng: &mut StdRng) -> Vec<usize> {
    (0..n).map(|_| rng.gen_range(0..n)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn separable() -> (Vec<Vec<f64>>, Vec<u8>) {
        let x: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64, 5.0]).collect();
        let y: Vec<u8> = (0..20).map(|i| u8::from(i >= 10)).collect();
        (x, y)
    }

    #[test]
    fn learns_threshold_split() {
        let (x, y) = separable();
        let idx: Vec<usize> = (0..x.len()).collect();
        let mut rng = StdRng::seed_from_u64(1);
        let tree = DecisionTree::fit(&x, &y, &idx, &TreeConfig::default(), &mut rng);
        assert_eq!(tree.predict_proba(&[2.0, 5.0]), 0.0);
        assert_eq!(tree.predict_proba(&[15.0, 5.0]), 1.0);
        assert_eq!(tree.depth(), 2);
    }

    #[test]
    fn min_samples_split_forces_leaf() {
        let (x, y) = separable();
        let idx: Vec<usize> = (0..x.len()).collect();
        let config = TreeConfig {
            min_samples_split: 50,
            ..TreeConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let tree = DecisionTree::fit(&x, &y, &idx, &config, &mut rng);
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.predict_proba(&[0.0, 5.0]), 0.5);
    }

    #[test]
    fn constant_features_give_leaf() {
        let x = vec![vec![1.0]; 6];
        let y = vec![0, 1, 0, 1, 1, 0];
        let idx: Vec<usize> = (0..6).collect();
        let mut rng = StdRng::seed_from_u64(3);
        let tree = DecisionTree::fit(&x, &y, &idx, &TreeConfig::default(), &mut rng);
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn gini_bounds() {
        assert_eq!(gini(0, 10), 0.0);
        assert_eq!(gini(10, 10), 0.0);
        assert_eq!(gini(5, 10), 0.5);
    }

    #[test]
    fn bootstrap_is_seeded() {
        let a = bootstrap_indices(50, &mut StdRng::seed_from_u64(9));
        let b = bootstrap_indices(50, &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
        assert!(a.iter().all(|&i| i < 50));
    }
}
