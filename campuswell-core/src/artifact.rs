//! The exported pipeline artifact and metrics summary files.

use crate::data::StudentRecord;
use crate::error::PipelineError;
use crate::eval::MetricsSummary;
use crate::model::RandomForest;
use crate::pipeline::FittedColumnTransform;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Version stamp written into artifacts and served from the API.
pub const MODEL_VERSION: &str = "1.0.0";

/// The deployable artifact: preprocessing statistics plus the fitted
/// classifier, self-contained in a single JSON file. Loading consumers
/// treat it as read-only; every prediction is a pure transform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedPipeline {
    pub version: String,
    pub transform: FittedColumnTransform,
    pub forest: RandomForest,
    pub trained_at: DateTime<Utc>,
}

/// One prediction result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub depression: bool,
    pub label: String,
    pub probability_no_depression: f64,
    pub probability_depression: f64,
}

impl TrainedPipeline {
    pub fn new(transform: FittedColumnTransform, forest: RandomForest) -> Self {
        Self {
            version: MODEL_VERSION.to_string(),
            transform,
            forest,
            trained_at: Utc::now(),
        }
    }

    /// Transform a raw record and classify it.
    pub fn predict(&self, record: &StudentRecord) -> Result<Prediction, PipelineError> {
        let features = self.transform.transform_record(record)?;
        let proba = self.forest.predict_proba_one(&features);
        let depression = proba[1] > proba[0];
        Ok(Prediction {
            depression,
            label: if depression {
                "Depression".to_string()
            } else {
                "No Depression".to_string()
            },
            probability_no_depression: proba[0],
            probability_depression: proba[1],
        })
    }

    /// Serialize to a single artifact file, atomically (tmp + rename).
    pub fn save(&self, path: &Path) -> Result<(), PipelineError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, &content)?;
        std::fs::rename(&tmp, path)?;
        tracing::info!(path = %path.display(), "pipeline artifact exported");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::artifact(format!("cannot read artifact {}: {e}", path.display()))
        })?;
        let pipeline: Self = serde_json::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            version = %pipeline.version,
            "pipeline artifact loaded"
        );
        Ok(pipeline)
    }
}

/// Write the metrics summary as a flat key-value JSON file, atomically.
pub fn export_metrics(summary: &MetricsSummary, path: &Path) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(&summary.flat_map())?;
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, &content)?;
    std::fs::rename(&tmp, path)?;
    tracing::info!(path = %path.display(), "metrics summary exported");
    Ok(())
}
