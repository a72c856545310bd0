//! Bootstrap random forest with mandatory balanced class weighting.

use crate::error::PipelineError;
use ndarray::Array2;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::tree::DecisionTree;

/// Per-node feature subset policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    Sqrt,
    Log2,
    All,
}

impl MaxFeatures {
    pub fn resolve(&self, n_features: usize) -> usize {
        let k = match self {
            Self::Sqrt => (n_features as f64).sqrt().floor() as usize,
            Self::Log2 => (n_features as f64).log2().floor() as usize,
            Self::All => n_features,
        };
        k.clamp(1, n_features.max(1))
    }
}

/// Forest hyperparameters — exactly the searched dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
        }
    }
}

/// Sample weights inversely proportional to class frequency:
/// `w_c = n / (2 * count_c)`. This is a fixed policy, not a hyperparameter;
/// a single-class training partition cannot be weighted and is an error.
pub fn balanced_sample_weights(labels: &[bool]) -> Result<Vec<f64>, PipelineError> {
    let n = labels.len();
    let positives = labels.iter().filter(|&&l| l).count();
    let negatives = n - positives;
    if positives == 0 || negatives == 0 {
        return Err(PipelineError::training(
            "training partition contains a single class; balanced weighting is undefined",
        ));
    }
    let w_pos = n as f64 / (2.0 * positives as f64);
    let w_neg = n as f64 / (2.0 * negatives as f64);
    Ok(labels
        .iter()
        .map(|&l| if l { w_pos } else { w_neg })
        .collect())
}

/// A fitted random forest for binary classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    pub config: ForestConfig,
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Fit the forest. Each tree draws a bootstrap sample and receives an
    /// RNG seeded from the master seed and its own index, so results do not
    /// depend on the parallel fitting order.
    pub fn fit(
        config: &ForestConfig,
        x: &Array2<f64>,
        labels: &[bool],
        seed: u64,
    ) -> Result<Self, PipelineError> {
        let n_rows = x.nrows();
        if n_rows == 0 {
            return Err(PipelineError::training("cannot fit on an empty matrix"));
        }
        if labels.len() != n_rows {
            return Err(PipelineError::training(format!(
                "label count {} does not match row count {n_rows}",
                labels.len()
            )));
        }
        if config.n_estimators == 0 {
            return Err(PipelineError::training("n_estimators must be positive"));
        }

        let weights = balanced_sample_weights(labels)?;
        let n_split_features = config.max_features.resolve(x.ncols());

        let trees: Vec<DecisionTree> = (0..config.n_estimators)
            .into_par_iter()
            .map(|tree_index| {
                let mut rng = StdRng::seed_from_u64(derive_seed(seed, tree_index as u64));
                let bootstrap: Vec<usize> =
                    (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect();
                DecisionTree::fit(
                    x,
                    labels,
                    &weights,
                    bootstrap,
                    config,
                    n_split_features,
                    &mut rng,
                )
            })
            .collect();

        Ok(Self {
            config: config.clone(),
            n_features: x.ncols(),
            trees,
        })
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Average of per-tree leaf class distributions for one feature vector.
    pub fn predict_proba_one(&self, row: &[f64]) -> [f64; 2] {
        let mut acc = [0.0, 0.0];
        for tree in &self.trees {
            let p = tree.predict_proba(row);
            acc[0] += p[0];
            acc[1] += p[1];
        }
        let n = self.trees.len() as f64;
        [acc[0] / n, acc[1] / n]
    }

    /// Class probabilities per matrix row.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Vec<[f64; 2]> {
        (0..x.nrows())
            .map(|r| {
                let row = x.row(r);
                let mut acc = [0.0, 0.0];
                for tree in &self.trees {
                    let p = tree.proba_by(|i| row[i]);
                    acc[0] += p[0];
                    acc[1] += p[1];
                }
                let n = self.trees.len() as f64;
                [acc[0] / n, acc[1] / n]
            })
            .collect()
    }

    /// Hard labels per matrix row; a tie resolves to the negative class.
    pub fn predict(&self, x: &Array2<f64>) -> Vec<bool> {
        self.predict_proba(x).iter().map(|p| p[1] > p[0]).collect()
    }
}

/// Mix the master seed with a stream index (splitmix64-style constant).
pub(crate) fn derive_seed(seed: u64, stream: u64) -> u64 {
    seed.wrapping_add(stream.wrapping_mul(0x9E37_79B9_7F4A_7C15))
}
