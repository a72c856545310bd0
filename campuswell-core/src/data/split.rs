//! Stratified partitioning: train/held-out split and cross-validation folds.

use crate::data::dataset::Dataset;
use crate::error::PipelineError;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Row indices of one cross-validation fold.
#[derive(Debug, Clone)]
pub struct FoldIndices {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
}

/// Stratified train/held-out index split.
///
/// Per class: shuffle the class's indices with the seeded RNG, reserve
/// `round(count * test_size)` of them for the held-out partition. Every
/// index lands in exactly one partition; both outputs are sorted so the
/// result is independent of per-class iteration order.
pub fn stratified_split_indices(
    labels: &[bool],
    test_size: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>), PipelineError> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(PipelineError::config(format!(
            "test_size must be in (0, 1), got {test_size}"
        )));
    }
    if labels.is_empty() {
        return Err(PipelineError::dataset("cannot split an empty dataset"));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for class in [false, true] {
        let mut indices: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|&(_, &l)| l == class)
            .map(|(i, _)| i)
            .collect();
        if indices.is_empty() {
            continue;
        }
        indices.shuffle(&mut rng);
        let n_test = ((indices.len() as f64) * test_size).round() as usize;
        let n_test = n_test.min(indices.len());
        test.extend_from_slice(&indices[..n_test]);
        train.extend_from_slice(&indices[n_test..]);
    }

    if train.is_empty() || test.is_empty() {
        return Err(PipelineError::config(format!(
            "test_size {test_size} leaves an empty partition for {} records",
            labels.len()
        )));
    }

    train.sort_unstable();
    test.sort_unstable();
    Ok((train, test))
}

/// Stratified train/held-out split of a dataset.
pub fn train_test_split(
    data: &Dataset,
    test_size: f64,
    seed: u64,
) -> Result<(Dataset, Dataset), PipelineError> {
    let (train_idx, test_idx) = stratified_split_indices(data.labels(), test_size, seed)?;
    Ok((data.subset(&train_idx), data.subset(&test_idx)))
}

/// Stratified K-fold splitter.
///
/// Each class's indices are shuffled once and dealt round-robin across the
/// folds, so per-fold class proportions stay within one record of the whole
/// partition's proportion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StratifiedKFold {
    pub n_folds: usize,
    pub seed: u64,
}

impl StratifiedKFold {
    pub fn new(n_folds: usize, seed: u64) -> Self {
        Self { n_folds, seed }
    }

    /// Produce the fold index sets, or a configuration error when the fold
    /// count cannot be honored (fewer than 2 folds, or a class rarer than
    /// the fold count — every fold must see both classes).
    pub fn split(&self, labels: &[bool]) -> Result<Vec<FoldIndices>, PipelineError> {
        if self.n_folds < 2 {
            return Err(PipelineError::config(format!(
                "cross-validation requires at least 2 folds, got {}",
                self.n_folds
            )));
        }
        let positives = labels.iter().filter(|&&l| l).count();
        let min_class = positives.min(labels.len() - positives);
        if min_class < self.n_folds {
            return Err(PipelineError::config(format!(
                "cannot build {} stratified folds: rarest class has only {min_class} records",
                self.n_folds
            )));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut validation: Vec<Vec<usize>> = vec![Vec::new(); self.n_folds];

        for class in [false, true] {
            let mut indices: Vec<usize> = labels
                .iter()
                .enumerate()
                .filter(|&(_, &l)| l == class)
                .map(|(i, _)| i)
                .collect();
            indices.shuffle(&mut rng);
            for (i, idx) in indices.into_iter().enumerate() {
                validation[i % self.n_folds].push(idx);
            }
        }

        let folds = validation
            .into_iter()
            .map(|mut val| {
                val.sort_unstable();
                let train: Vec<usize> = (0..labels.len())
                    .filter(|i| val.binary_search(i).is_err())
                    .collect();
                FoldIndices {
                    train,
                    validation: val,
                }
            })
            .collect();
        Ok(folds)
    }
}
