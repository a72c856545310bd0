//! End-to-end training orchestration.

use crate::artifact::{TrainedPipeline, export_metrics};
use crate::config::AppConfig;
use crate::data::{Dataset, FeatureSchema, resolve_dataset, train_test_split};
use crate::error::PipelineError;
use crate::eval::MetricsSummary;
use crate::model::{ForestConfig, RandomForest};
use crate::pipeline::FittedColumnTransform;
use crate::search::RandomizedSearch;
use crate::tracking::ExperimentTracker;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of a completed training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub run_id: String,
    pub rows: usize,
    pub positive_fraction: f64,
    pub best_config: ForestConfig,
    pub best_cv_score: f64,
    pub failed_trials: usize,
    pub metrics: MetricsSummary,
    pub artifact_path: PathBuf,
    pub metrics_path: PathBuf,
}

/// Run the full pipeline: resolve data, validate the schema, split, search,
/// refit, evaluate on the held-out partition, export, and report to the
/// tracker.
///
/// Nothing is written to disk until search and evaluation have succeeded;
/// an interrupted or failed run leaves no partial artifact. Tracker
/// failures are logged and do not fail the run.
pub async fn run_training(
    config: &AppConfig,
    tracker: &dyn ExperimentTracker,
) -> Result<TrainingReport, PipelineError> {
    let run_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(run_id = %run_id, "starting training run");

    // 1. Resolve and validate the dataset.
    let schema = FeatureSchema::student_lifestyle();
    let (batch, source_info) = resolve_dataset(&config.data).await?;
    let dataset = Dataset::from_batch(&schema, &batch)?;
    tracing::info!(
        rows = dataset.len(),
        positive_fraction = dataset.positive_fraction(),
        source = %source_info.location,
        "dataset validated"
    );

    // 2. Stratified train/held-out split. The held-out partition is used
    //    exactly once, at step 5.
    let (train, held_out) =
        train_test_split(&dataset, config.training.test_size, config.training.seed)?;
    tracing::info!(train = train.len(), held_out = held_out.len(), "dataset split");

    // 3. Randomized search with stratified cross-validation.
    let search = RandomizedSearch {
        space: config.training.search.clone(),
        n_trials: config.training.n_trials,
        n_folds: config.training.n_folds,
        scoring: config.training.scoring,
        seed: config.training.seed,
    };
    let outcome = search.run(&train)?;
    let failed_trials = outcome
        .trials
        .iter()
        .filter(|t| t.mean_score.is_none())
        .count();
    tracing::info!(
        best_trial = outcome.best_trial,
        best_score = outcome.best_score,
        failed_trials,
        "search complete"
    );

    // 4. Refit the winning configuration on the full training partition.
    let transform = FittedColumnTransform::fit(&train);
    let x_train = transform.transform(&train)?;
    let forest = RandomForest::fit(
        &outcome.best_config,
        &x_train,
        train.labels(),
        config.training.seed,
    )?;

    // 5. Score the held-out partition.
    let x_held_out = transform.transform(&held_out)?;
    let proba = forest.predict_proba(&x_held_out);
    let y_prob: Vec<f64> = proba.iter().map(|p| p[1]).collect();
    let y_pred: Vec<bool> = proba.iter().map(|p| p[1] > p[0]).collect();
    let metrics = MetricsSummary::compute(
        held_out.labels(),
        &y_pred,
        &y_prob,
        outcome.best_config.clone(),
        outcome.best_score,
        config.training.scoring,
    )?;
    tracing::info!(
        accuracy = metrics.accuracy,
        f1 = metrics.f1_score,
        roc_auc = metrics.roc_auc,
        recall = metrics.recall,
        "held-out evaluation complete"
    );

    // 6. Export the artifact and the metrics summary.
    let pipeline = TrainedPipeline::new(transform, forest);
    let artifact_path = config.training.artifact_path();
    let metrics_path = config.training.metrics_path();
    pipeline.save(&artifact_path)?;
    export_metrics(&metrics, &metrics_path)?;

    // 7. Report to the tracking collaborator, best-effort.
    for trial in &outcome.trials {
        if let Err(e) = tracker.log_trial(trial).await {
            tracing::warn!(trial = trial.number, error = %e, "failed to track trial");
        }
    }
    if let Err(e) = tracker.log_summary(&metrics).await {
        tracing::warn!(error = %e, "failed to track summary");
    }
    if let Err(e) = tracker.log_artifact(&artifact_path).await {
        tracing::warn!(error = %e, "failed to track artifact");
    }

    tracing::info!(run_id = %run_id, "training run complete");
    Ok(TrainingReport {
        run_id,
        rows: dataset.len(),
        positive_fraction: dataset.positive_fraction(),
        best_config: outcome.best_config,
        best_cv_score: outcome.best_score,
        failed_trials,
        metrics,
        artifact_path,
        metrics_path,
    })
}
