//! Weighted-Gini decision tree on a flat node arena.

use ndarray::Array2;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::forest::ForestConfig;

const MIN_IMPURITY_DECREASE: f64 = 1e-12;

/// One tree node. Children are arena indices.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        /// Weighted class distribution: [negative, positive].
        prob: [f64; 2],
    },
}

/// A fitted decision tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

struct TreeBuilder<'a> {
    x: &'a Array2<f64>,
    y: &'a [bool],
    weights: &'a [f64],
    config: &'a ForestConfig,
    n_split_features: usize,
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Fit a tree on the rows named by `indices` (bootstrap sample, indices
    /// may repeat). `weights` are per-row sample weights; `n_split_features`
    /// is the size of the random feature subset examined at each node.
    pub fn fit(
        x: &Array2<f64>,
        y: &[bool],
        weights: &[f64],
        indices: Vec<usize>,
        config: &ForestConfig,
        n_split_features: usize,
        rng: &mut StdRng,
    ) -> Self {
        let mut builder = TreeBuilder {
            x,
            y,
            weights,
            config,
            n_split_features,
            nodes: Vec::new(),
        };
        builder.build(indices, 0, rng);
        Self {
            nodes: builder.nodes,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Class distribution at the leaf reached by the feature accessor.
    pub(crate) fn proba_by(&self, feature_at: impl Fn(usize) -> f64) -> [f64; 2] {
        let mut at = 0;
        loop {
            match &self.nodes[at] {
                Node::Leaf { prob } => return *prob,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    at = if feature_at(*feature) <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Class distribution for one feature vector.
    pub fn predict_proba(&self, row: &[f64]) -> [f64; 2] {
        self.proba_by(|i| row[i])
    }
}

impl TreeBuilder<'_> {
    /// Grow the subtree for `indices`, returning its arena index.
    fn build(&mut self, indices: Vec<usize>, depth: usize, rng: &mut StdRng) -> usize {
        let (w_neg, w_pos) = self.weighted_counts(&indices);

        let depth_exhausted = self
            .config
            .max_depth
            .is_some_and(|max| depth >= max);
        let pure = w_neg == 0.0 || w_pos == 0.0;
        if depth_exhausted || pure || indices.len() < self.config.min_samples_split {
            return self.push_leaf(w_neg, w_pos);
        }

        let n_features = self.x.ncols();
        let k = self.n_split_features.min(n_features).max(1);
        let candidates: Vec<usize> = rand::seq::index::sample(rng, n_features, k).into_vec();

        match self.best_split(&indices, &candidates, w_neg, w_pos) {
            None => self.push_leaf(w_neg, w_pos),
            Some((feature, threshold)) => {
                let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
                    .into_iter()
                    .partition(|&i| self.x[[i, feature]] <= threshold);
                let at = self.nodes.len();
                self.nodes.push(Node::Split {
                    feature,
                    threshold,
                    left: 0,
                    right: 0,
                });
                let left = self.build(left_idx, depth + 1, rng);
                let right = self.build(right_idx, depth + 1, rng);
                self.nodes[at] = Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                };
                at
            }
        }
    }

    fn push_leaf(&mut self, w_neg: f64, w_pos: f64) -> usize {
        let total = w_neg + w_pos;
        let prob = if total > 0.0 {
            [w_neg / total, w_pos / total]
        } else {
            [0.5, 0.5]
        };
        self.nodes.push(Node::Leaf { prob });
        self.nodes.len() - 1
    }

    fn weighted_counts(&self, indices: &[usize]) -> (f64, f64) {
        let mut w_neg = 0.0;
        let mut w_pos = 0.0;
        for &i in indices {
            if self.y[i] {
                w_pos += self.weights[i];
            } else {
                w_neg += self.weights[i];
            }
        }
        (w_neg, w_pos)
    }

    /// Best (feature, threshold) over the candidate features, by weighted
    /// Gini impurity decrease. Ties keep the first candidate examined, so
    /// the choice is deterministic for a given RNG state.
    fn best_split(
        &self,
        indices: &[usize],
        candidates: &[usize],
        w_neg: f64,
        w_pos: f64,
    ) -> Option<(usize, f64)> {
        let parent_impurity = gini(w_neg, w_pos);
        let total_weight = w_neg + w_pos;
        let min_leaf = self.config.min_samples_leaf;
        let mut best: Option<(f64, usize, f64)> = None;

        for &feature in candidates {
            let mut order: Vec<usize> = indices.to_vec();
            order.sort_by(|&a, &b| self.x[[a, feature]].total_cmp(&self.x[[b, feature]]));

            let mut left_neg = 0.0;
            let mut left_pos = 0.0;
            for i in 0..order.len() - 1 {
                let idx = order[i];
                if self.y[idx] {
                    left_pos += self.weights[idx];
                } else {
                    left_neg += self.weights[idx];
                }

                let here = self.x[[idx, feature]];
                let next = self.x[[order[i + 1], feature]];
                if next <= here {
                    continue;
                }
                let left_n = i + 1;
                if left_n < min_leaf || order.len() - left_n < min_leaf {
                    continue;
                }

                let right_neg = w_neg - left_neg;
                let right_pos = w_pos - left_pos;
                let left_weight = left_neg + left_pos;
                let right_weight = right_neg + right_pos;
                let children = (left_weight * gini(left_neg, left_pos)
                    + right_weight * gini(right_neg, right_pos))
                    / total_weight;
                let decrease = parent_impurity - children;

                if best.is_none_or(|(d, _, _)| decrease > d) {
                    best = Some((decrease, feature, (here + next) / 2.0));
                }
            }
        }

        best.and_then(|(decrease, feature, threshold)| {
            (decrease > MIN_IMPURITY_DECREASE).then_some((feature, threshold))
        })
    }
}

fn gini(w_neg: f64, w_pos: f64) -> f64 {
    let total = w_neg + w_pos;
    if total <= 0.0 {
        return 0.0;
    }
    let p_neg = w_neg / total;
    let p_pos = w_pos / total;
    1.0 - p_neg * p_neg - p_pos * p_pos
}
