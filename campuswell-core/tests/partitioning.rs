//! Partition-membership properties: the held-out split and the
//! cross-validation folds never overlap, and stratification holds.

use campuswell_core::data::{StratifiedKFold, stratified_split_indices};
use std::collections::HashSet;

fn skewed_labels(n: usize, every: usize) -> Vec<bool> {
    (0..n).map(|i| i % every == 0).collect()
}

#[test]
fn test_held_out_rows_never_appear_in_any_fold() {
    let labels = skewed_labels(1000, 10);
    let (train_idx, test_idx) = stratified_split_indices(&labels, 0.2, 42).unwrap();

    let train_labels: Vec<bool> = train_idx.iter().map(|&i| labels[i]).collect();
    let folds = StratifiedKFold::new(3, 42).split(&train_labels).unwrap();

    // Fold indices address rows of the training partition; map them back to
    // original row ids before checking disjointness against the held-out set.
    let held_out: HashSet<usize> = test_idx.iter().copied().collect();
    for fold in &folds {
        for &local in fold.validation.iter().chain(fold.train.iter()) {
            let original = train_idx[local];
            assert!(
                !held_out.contains(&original),
                "row {original} leaked from the held-out partition into a fold"
            );
        }
    }
}

#[test]
fn test_partitions_are_disjoint_and_exhaustive() {
    let labels = skewed_labels(997, 9);
    let (train_idx, test_idx) = stratified_split_indices(&labels, 0.25, 3).unwrap();
    let train: HashSet<usize> = train_idx.iter().copied().collect();
    let test: HashSet<usize> = test_idx.iter().copied().collect();
    assert!(train.is_disjoint(&test));
    assert_eq!(train.len() + test.len(), labels.len());
}

#[test]
fn test_fold_proportions_track_partition_proportion() {
    let labels = skewed_labels(1000, 10);
    let folds = StratifiedKFold::new(5, 0).split(&labels).unwrap();
    let overall = 0.1;
    for (fold_no, fold) in folds.iter().enumerate() {
        let positives = fold.validation.iter().filter(|&&i| labels[i]).count() as f64;
        let expected = overall * fold.validation.len() as f64;
        assert!(
            (positives - expected).abs() <= 1.0,
            "fold {fold_no}: {positives} positives, expected about {expected}"
        );
    }
}
