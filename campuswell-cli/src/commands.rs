//! Subcommand implementations.

use campuswell_core::config::{AppConfig, load_config};
use campuswell_core::data::{
    Dataset, FeatureSchema, StudentRecord, import_csv_to_sqlite, resolve_dataset,
};
use campuswell_core::tracking::{ExperimentTracker, HttpTracker, LocalTracker, NoopTracker};
use campuswell_core::train::run_training;
use campuswell_core::TrainedPipeline;
use std::path::{Path, PathBuf};

/// CLI overrides for the training configuration.
pub struct TrainArgs {
    pub trials: Option<usize>,
    pub folds: Option<usize>,
    pub seed: Option<u64>,
    pub test_size: Option<f64>,
    pub model_dir: Option<PathBuf>,
    pub no_tracking: bool,
}

fn load_workspace_config(workspace: &Path) -> anyhow::Result<AppConfig> {
    load_config(Some(workspace), None)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))
}

pub async fn train(workspace: &Path, args: TrainArgs) -> anyhow::Result<()> {
    let mut config = load_workspace_config(workspace)?;
    if let Some(trials) = args.trials {
        config.training.n_trials = trials;
    }
    if let Some(folds) = args.folds {
        config.training.n_folds = folds;
    }
    if let Some(seed) = args.seed {
        config.training.seed = seed;
    }
    if let Some(test_size) = args.test_size {
        config.training.test_size = test_size;
    }
    if let Some(model_dir) = args.model_dir {
        config.training.model_dir = model_dir;
    }

    let run_label = chrono::Utc::now().format("%Y%m%d-%H%M%S").to_string();
    let tracker: Box<dyn ExperimentTracker> = if args.no_tracking || !config.tracking.enabled {
        Box::new(NoopTracker)
    } else if let Some(url) = &config.tracking.remote_url {
        Box::new(HttpTracker::new(url.clone(), run_label.clone()))
    } else {
        Box::new(LocalTracker::create(
            &workspace.join(&config.tracking.runs_dir),
            &run_label,
        )?)
    };

    let report = run_training(&config, tracker.as_ref()).await?;

    println!("Training complete.");
    println!(
        "  dataset:        {} records ({:.1}% positive)",
        report.rows,
        report.positive_fraction * 100.0
    );
    println!(
        "  best CV {}: {:.4} ({} failed trial(s))",
        report.metrics.scoring.name(),
        report.best_cv_score,
        report.failed_trials
    );
    println!(
        "  best params: n_estimators={} max_depth={} min_samples_split={} min_samples_leaf={}",
        report.best_config.n_estimators,
        report
            .best_config
            .max_depth
            .map_or_else(|| "none".to_string(), |d| d.to_string()),
        report.best_config.min_samples_split,
        report.best_config.min_samples_leaf
    );
    println!("  held-out accuracy:  {:.4}", report.metrics.accuracy);
    println!("  held-out f1:        {:.4}", report.metrics.f1_score);
    println!("  held-out roc_auc:   {:.4}", report.metrics.roc_auc);
    println!("  held-out precision: {:.4}", report.metrics.precision);
    println!("  held-out recall:    {:.4}", report.metrics.recall);
    println!("  artifact: {}", report.artifact_path.display());
    println!("  metrics:  {}", report.metrics_path.display());
    Ok(())
}

pub async fn predict(
    workspace: &Path,
    input: &Path,
    model: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = load_workspace_config(workspace)?;
    let model_path = model.unwrap_or_else(|| config.training.artifact_path());

    let pipeline = TrainedPipeline::load(&model_path)?;
    let content = std::fs::read_to_string(input)
        .map_err(|e| anyhow::anyhow!("cannot read input {}: {}", input.display(), e))?;
    let record: StudentRecord = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("invalid student record: {}", e))?;

    let prediction = pipeline.predict(&record)?;
    println!("{}", serde_json::to_string_pretty(&prediction)?);
    Ok(())
}

pub async fn load_data(workspace: &Path) -> anyhow::Result<()> {
    let config = load_workspace_config(workspace)?;
    let schema = FeatureSchema::student_lifestyle();
    let rows = import_csv_to_sqlite(&config.data, &schema).await?;
    println!(
        "Imported {rows} records from {} into {} (table {}).",
        config.data.csv_path.display(),
        config.data.db_path.display(),
        config.data.table
    );
    Ok(())
}

pub async fn validate_data(workspace: &Path) -> anyhow::Result<()> {
    let config = load_workspace_config(workspace)?;
    let (batch, info) = resolve_dataset(&config.data).await?;
    let schema = FeatureSchema::student_lifestyle();
    let dataset = Dataset::from_batch(&schema, &batch)?;

    let (negatives, positives) = dataset.class_counts();
    println!("Dataset OK.");
    println!("  source:   {} ({})", info.location, info.source_type);
    println!("  records:  {}", dataset.len());
    println!("  columns:  {}", batch.column_count());
    println!(
        "  classes:  {} negative / {} positive ({:.1}% positive)",
        negatives,
        positives,
        dataset.positive_fraction() * 100.0
    );
    Ok(())
}
