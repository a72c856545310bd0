//! Classification metrics and the exported metrics summary.

use crate::error::PipelineError;
use crate::model::ForestConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metric used to score search trials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scoring {
    RocAuc,
    F1,
    Accuracy,
    Precision,
    Recall,
}

impl Scoring {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RocAuc => "roc_auc",
            Self::F1 => "f1",
            Self::Accuracy => "accuracy",
            Self::Precision => "precision",
            Self::Recall => "recall",
        }
    }

    /// Score predictions against truth. Threshold metrics use `y_pred`;
    /// ROC-AUC ranks `y_prob`.
    pub fn score(
        &self,
        y_true: &[bool],
        y_pred: &[bool],
        y_prob: &[f64],
    ) -> Result<f64, PipelineError> {
        Ok(match self {
            Self::RocAuc => roc_auc(y_true, y_prob)?,
            Self::F1 => f1(y_true, y_pred),
            Self::Accuracy => accuracy(y_true, y_pred),
            Self::Precision => precision(y_true, y_pred),
            Self::Recall => recall(y_true, y_pred),
        })
    }
}

/// Confusion-matrix counts for the positive class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
}

impl ConfusionMatrix {
    pub fn from_predictions(y_true: &[bool], y_pred: &[bool]) -> Self {
        let mut cm = Self {
            true_positive: 0,
            false_positive: 0,
            true_negative: 0,
            false_negative: 0,
        };
        for (&truth, &pred) in y_true.iter().zip(y_pred) {
            match (truth, pred) {
                (true, true) => cm.true_positive += 1,
                (false, true) => cm.false_positive += 1,
                (false, false) => cm.true_negative += 1,
                (true, false) => cm.false_negative += 1,
            }
        }
        cm
    }

    pub fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }
}

pub fn accuracy(y_true: &[bool], y_pred: &[bool]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    correct as f64 / y_true.len() as f64
}

/// Precision for the positive class; 0.0 when nothing was predicted positive.
pub fn precision(y_true: &[bool], y_pred: &[bool]) -> f64 {
    let cm = ConfusionMatrix::from_predictions(y_true, y_pred);
    let denom = cm.true_positive + cm.false_positive;
    if denom == 0 {
        0.0
    } else {
        cm.true_positive as f64 / denom as f64
    }
}

/// Recall for the positive class; 0.0 when there are no positives.
pub fn recall(y_true: &[bool], y_pred: &[bool]) -> f64 {
    let cm = ConfusionMatrix::from_predictions(y_true, y_pred);
    let denom = cm.true_positive + cm.false_negative;
    if denom == 0 {
        0.0
    } else {
        cm.true_positive as f64 / denom as f64
    }
}

pub fn f1(y_true: &[bool], y_pred: &[bool]) -> f64 {
    let p = precision(y_true, y_pred);
    let r = recall(y_true, y_pred);
    if p + r == 0.0 { 0.0 } else { 2.0 * p * r / (p + r) }
}

/// Rank-based ROC-AUC with average ranks for tied scores.
///
/// Undefined when the partition holds a single class; that is a reported
/// error, never a silently substituted default.
pub fn roc_auc(y_true: &[bool], y_prob: &[f64]) -> Result<f64, PipelineError> {
    if y_true.len() != y_prob.len() {
        return Err(PipelineError::evaluation(format!(
            "label count {} does not match score count {}",
            y_true.len(),
            y_prob.len()
        )));
    }
    let n_pos = y_true.iter().filter(|&&l| l).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(PipelineError::evaluation(
            "ROC-AUC is undefined on a partition with a single class",
        ));
    }

    let mut order: Vec<usize> = (0..y_true.len()).collect();
    order.sort_by(|&a, &b| y_prob[a].total_cmp(&y_prob[b]));

    // Assign average ranks to tied score groups, summing ranks of positives.
    let mut rank_sum_pos = 0.0;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j < order.len() && y_prob[order[j]] == y_prob[order[i]] {
            j += 1;
        }
        // 1-based ranks i+1..=j share the average rank.
        let avg_rank = (i + 1 + j) as f64 / 2.0;
        for &idx in &order[i..j] {
            if y_true[idx] {
                rank_sum_pos += avg_rank;
            }
        }
        i = j;
    }

    let n_pos = n_pos as f64;
    let n_neg = n_neg as f64;
    Ok((rank_sum_pos - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg))
}

/// Final quality report for the held-out partition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub accuracy: f64,
    pub f1_score: f64,
    pub roc_auc: f64,
    pub precision: f64,
    pub recall: f64,
    pub confusion: ConfusionMatrix,
    pub best_params: ForestConfig,
    pub best_cv_score: f64,
    pub scoring: Scoring,
    pub evaluated_at: DateTime<Utc>,
}

impl MetricsSummary {
    pub fn compute(
        y_true: &[bool],
        y_pred: &[bool],
        y_prob: &[f64],
        best_params: ForestConfig,
        best_cv_score: f64,
        scoring: Scoring,
    ) -> Result<Self, PipelineError> {
        Ok(Self {
            accuracy: accuracy(y_true, y_pred),
            f1_score: f1(y_true, y_pred),
            roc_auc: roc_auc(y_true, y_prob)?,
            precision: precision(y_true, y_pred),
            recall: recall(y_true, y_pred),
            confusion: ConfusionMatrix::from_predictions(y_true, y_pred),
            best_params,
            best_cv_score,
            scoring,
            evaluated_at: Utc::now(),
        })
    }

    /// Flat key-value rendering for the exported metrics file.
    pub fn flat_map(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut map = serde_json::Map::new();
        map.insert("accuracy".into(), json_f64(self.accuracy));
        map.insert("f1_score".into(), json_f64(self.f1_score));
        map.insert("roc_auc".into(), json_f64(self.roc_auc));
        map.insert("precision".into(), json_f64(self.precision));
        map.insert("recall".into(), json_f64(self.recall));
        map.insert(
            "true_positive".into(),
            serde_json::json!(self.confusion.true_positive),
        );
        map.insert(
            "false_positive".into(),
            serde_json::json!(self.confusion.false_positive),
        );
        map.insert(
            "true_negative".into(),
            serde_json::json!(self.confusion.true_negative),
        );
        map.insert(
            "false_negative".into(),
            serde_json::json!(self.confusion.false_negative),
        );
        map.insert(
            "best_cv_score".into(),
            json_f64(self.best_cv_score),
        );
        map.insert("scoring".into(), serde_json::json!(self.scoring.name()));
        map.insert(
            "best_params.n_estimators".into(),
            serde_json::json!(self.best_params.n_estimators),
        );
        map.insert(
            "best_params.max_depth".into(),
            match self.best_params.max_depth {
                Some(d) => serde_json::json!(d),
                None => serde_json::json!("none"),
            },
        );
        map.insert(
            "best_params.min_samples_split".into(),
            serde_json::json!(self.best_params.min_samples_split),
        );
        map.insert(
            "best_params.min_samples_leaf".into(),
            serde_json::json!(self.best_params.min_samples_leaf),
        );
        map.insert(
            "best_params.max_features".into(),
            serde_json::json!(match self.best_params.max_features {
                crate::model::MaxFeatures::Sqrt => "sqrt",
                crate::model::MaxFeatures::Log2 => "log2",
                crate::model::MaxFeatures::All => "all",
            }),
        );
        map.insert(
            "evaluated_at".into(),
            serde_json::json!(self.evaluated_at.to_rfc3339()),
        );
        map
    }
}

fn json_f64(v: f64) -> serde_json::Value {
    serde_json::Number::from_f64(v)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confusion_matrix_counts() {
        let y_true = [true, true, false, false, true];
        let y_pred = [true, false, true, false, true];
        let cm = ConfusionMatrix::from_predictions(&y_true, &y_pred);
        assert_eq!(cm.true_positive, 2);
        assert_eq!(cm.false_negative, 1);
        assert_eq!(cm.false_positive, 1);
        assert_eq!(cm.true_negative, 1);
        assert_eq!(cm.total(), 5);
    }

    #[test]
    fn test_threshold_metrics() {
        let y_true = [true, true, false, false, true];
        let y_pred = [true, false, true, false, true];
        assert!((accuracy(&y_true, &y_pred) - 0.6).abs() < 1e-12);
        assert!((precision(&y_true, &y_pred) - 2.0 / 3.0).abs() < 1e-12);
        assert!((recall(&y_true, &y_pred) - 2.0 / 3.0).abs() < 1e-12);
        assert!((f1(&y_true, &y_pred) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_division_yields_zero() {
        let y_true = [true, false];
        let y_pred = [false, false];
        assert_eq!(precision(&y_true, &y_pred), 0.0);
        assert_eq!(f1(&y_true, &y_pred), 0.0);
        assert_eq!(recall(&[false, false], &[false, false]), 0.0);
    }

    #[test]
    fn test_roc_auc_perfect_ranking() {
        let y_true = [false, false, true, true];
        let y_prob = [0.1, 0.2, 0.8, 0.9];
        assert!((roc_auc(&y_true, &y_prob).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_roc_auc_inverted_ranking() {
        let y_true = [true, true, false, false];
        let y_prob = [0.1, 0.2, 0.8, 0.9];
        assert!(roc_auc(&y_true, &y_prob).unwrap().abs() < 1e-12);
    }

    #[test]
    fn test_roc_auc_ties_average() {
        let y_true = [false, true];
        let y_prob = [0.5, 0.5];
        assert!((roc_auc(&y_true, &y_prob).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_roc_auc_single_class_is_error() {
        let err = roc_auc(&[true, true], &[0.5, 0.7]).unwrap_err();
        assert!(matches!(err, PipelineError::Evaluation(_)));
    }

    #[test]
    fn test_scoring_dispatch() {
        let y_true = [false, true];
        let y_pred = [false, true];
        let y_prob = [0.2, 0.9];
        assert_eq!(Scoring::Accuracy.score(&y_true, &y_pred, &y_prob).unwrap(), 1.0);
        assert_eq!(Scoring::RocAuc.score(&y_true, &y_pred, &y_prob).unwrap(), 1.0);
        assert_eq!(Scoring::RocAuc.name(), "roc_auc");
    }

    #[test]
    fn test_flat_map_is_flat_and_complete() {
        let summary = MetricsSummary::compute(
            &[true, false, true, false],
            &[true, false, false, false],
            &[0.9, 0.2, 0.4, 0.1],
            ForestConfig::default(),
            0.87,
            Scoring::RocAuc,
        )
        .unwrap();
        let map = summary.flat_map();
        assert!(map.contains_key("accuracy"));
        assert!(map.contains_key("true_positive"));
        assert!(map.contains_key("best_params.n_estimators"));
        // Flat: no nested objects.
        assert!(map.values().all(|v| !v.is_object() && !v.is_array()));
        let total = map["true_positive"].as_u64().unwrap()
            + map["false_positive"].as_u64().unwrap()
            + map["true_negative"].as_u64().unwrap()
            + map["false_negative"].as_u64().unwrap();
        assert_eq!(total, 4);
    }
}
