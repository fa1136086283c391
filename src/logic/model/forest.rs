//! Isolation Forest
//!
//! Random axis-aligned partitioning trees. Outliers are isolated in fewer
//! splits, so their average path length is short and their score is low.
//!
//! `score_samples` follows the usual convention: `-2^(-E[h(x)] / c(ψ))`,
//! in `[-1, 0)`, where ψ is the per-tree subsample size.

use ndarray::{Array2, ArrayView1};
use rand::seq::{index, SliceRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MAX_SAMPLES, DEFAULT_N_ESTIMATORS};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

// ============================================================================
// PARAMETERS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestParams {
    /// Number of trees
    pub n_estimators: usize,
    /// Rows drawn (without replacement) per tree, capped at the batch size
    pub max_samples: usize,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: DEFAULT_N_ESTIMATORS,
            max_samples: DEFAULT_MAX_SAMPLES,
        }
    }
}

/// Average path length of an unsuccessful BST search over `n` points, c(n)
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

// ============================================================================
// TREE
// ============================================================================

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

#[derive(Debug, Clone)]
struct IsolationTree {
    root: Node,
}

impl IsolationTree {
    fn build<R: Rng>(data: &Array2<f64>, rows: Vec<usize>, max_depth: usize, rng: &mut R) -> Self {
        Self {
            root: grow(data, rows, 0, max_depth, rng),
        }
    }

    /// Depth at which `sample` lands, corrected by c(leaf size)
    fn path_length(&self, sample: ArrayView1<f64>) -> f64 {
        let mut node = &self.root;
        let mut depth = 0.0;

        loop {
            match node {
                Node::Leaf { size } => return depth + average_path_length(*size),
                Node::Split { feature, threshold, left, right } => {
                    node = if sample[*feature] <= *threshold { left } else { right };
                    depth += 1.0;
                }
            }
        }
    }
}

fn grow<R: Rng>(
    data: &Array2<f64>,
    rows: Vec<usize>,
    depth: usize,
    max_depth: usize,
    rng: &mut R,
) -> Node {
    if depth >= max_depth || rows.len() <= 1 {
        return Node::Leaf { size: rows.len() };
    }

    // Random feature order; skip features that are constant in this node
    let mut features: Vec<usize> = (0..data.ncols()).collect();
    features.shuffle(rng);

    for feature in features {
        let (min, max) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
            let v = data[[r, feature]];
            (lo.min(v), hi.max(v))
        });

        if max <= min {
            continue;
        }

        // Interpolate instead of sampling `min..max`: the span can overflow
        // to infinity even when both ends are finite.
        let t: f64 = rng.gen();
        let mut threshold = min * (1.0 - t) + max * t;
        if !(min..max).contains(&threshold) {
            threshold = min;
        }

        let (left, right): (Vec<usize>, Vec<usize>) =
            rows.iter().partition(|&&r| data[[r, feature]] <= threshold);

        return Node::Split {
            feature,
            threshold,
            left: Box::new(grow(data, left, depth + 1, max_depth, rng)),
            right: Box::new(grow(data, right, depth + 1, max_depth, rng)),
        };
    }

    // Every feature is constant: nothing left to isolate
    Node::Leaf { size: rows.len() }
}

// ============================================================================
// FOREST
// ============================================================================

/// A fitted forest. Built fresh for every batch; never updated in place.
#[derive(Debug, Clone)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    subsample_size: usize,
}

impl IsolationForest {
    /// Fit on every row of `data`
    pub fn fit<R: Rng>(data: &Array2<f64>, params: ForestParams, rng: &mut R) -> Self {
        let n = data.nrows();
        let subsample_size = params.max_samples.min(n);
        let max_depth = (subsample_size.max(2) as f64).log2().ceil() as usize;
        let n_trees = if n == 0 { 0 } else { params.n_estimators.max(1) };

        let trees = (0..n_trees)
            .map(|_| {
                let rows = index::sample(rng, n, subsample_size).into_vec();
                IsolationTree::build(data, rows, max_depth, rng)
            })
            .collect();

        Self { trees, subsample_size }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn subsample_size(&self) -> usize {
        self.subsample_size
    }

    /// Mean path length of one sample across all trees
    pub fn mean_path_length(&self, sample: ArrayView1<f64>) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let total: f64 = self.trees.iter().map(|t| t.path_length(sample)).sum();
        total / self.trees.len() as f64
    }

    /// Raw scores in `[-1, 0)`; lower is more anomalous
    pub fn score_samples(&self, data: &Array2<f64>) -> Vec<f64> {
        let norm = average_path_length(self.subsample_size).max(f64::MIN_POSITIVE);

        data.rows()
            .into_iter()
            .map(|row| -(2f64.powf(-self.mean_path_length(row) / norm)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_average_path_length() {
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        assert!(average_path_length(256) > average_path_length(16));
    }

    #[test]
    fn test_outlier_has_shorter_path() {
        let data = array![
            [4.0, 80.0],
            [4.1, 80.5],
            [3.9, 79.5],
            [4.2, 80.2],
            [4.0, 80.1],
            [18.5, 60.0]
        ];
        let mut rng = StdRng::seed_from_u64(7);
        let forest = IsolationForest::fit(&data, ForestParams::default(), &mut rng);

        let scores = forest.score_samples(&data);
        let outlier = scores[5];
        assert!(scores[..5].iter().all(|s| *s > outlier));
        assert!(scores.iter().all(|s| (-1.0..0.0).contains(s)));
    }

    #[test]
    fn test_subsample_capped_by_rows() {
        let data = Array2::<f64>::zeros((10, 3));
        let mut rng = StdRng::seed_from_u64(1);
        let params = ForestParams { n_estimators: 5, max_samples: 256 };
        let forest = IsolationForest::fit(&data, params, &mut rng);

        assert_eq!(forest.subsample_size(), 10);
        assert_eq!(forest.n_trees(), 5);
    }

    #[test]
    fn test_split_across_full_f64_range() {
        let data = array![[-1.0e308], [0.0], [1.0e308], [4.0]];
        let mut rng = StdRng::seed_from_u64(5);
        let forest = IsolationForest::fit(&data, ForestParams::default(), &mut rng);

        let scores = forest.score_samples(&data);
        assert_eq!(scores.len(), 4);
        assert!(scores.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_constant_data_scores_equal() {
        let data = Array2::<f64>::from_elem((8, 2), 1.5);
        let mut rng = StdRng::seed_from_u64(3);
        let forest = IsolationForest::fit(&data, ForestParams::default(), &mut rng);

        let scores = forest.score_samples(&data);
        assert!(scores.windows(2).all(|w| w[0] == w[1]));
    }
}
