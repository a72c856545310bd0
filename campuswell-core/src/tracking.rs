//! Experiment tracking: per-trial records, the final summary, and a copy of
//! the exported artifact.
//!
//! Tracking is best-effort. The pipeline only consumes success/failure;
//! callers log failures and keep going.

use crate::error::PipelineError;
use crate::eval::MetricsSummary;
use crate::search::Trial;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Receiver for search trials and the final run summary.
#[async_trait]
pub trait ExperimentTracker: Send + Sync {
    async fn log_trial(&self, trial: &Trial) -> Result<(), PipelineError>;
    async fn log_summary(&self, summary: &MetricsSummary) -> Result<(), PipelineError>;
    async fn log_artifact(&self, path: &Path) -> Result<(), PipelineError>;
}

/// Tracker that drops everything (tracking disabled).
pub struct NoopTracker;

#[async_trait]
impl ExperimentTracker for NoopTracker {
    async fn log_trial(&self, _trial: &Trial) -> Result<(), PipelineError> {
        Ok(())
    }

    async fn log_summary(&self, _summary: &MetricsSummary) -> Result<(), PipelineError> {
        Ok(())
    }

    async fn log_artifact(&self, _path: &Path) -> Result<(), PipelineError> {
        Ok(())
    }
}

/// File-based tracker: one directory per run holding `trials.jsonl`,
/// `summary.json`, and a copy of the artifact.
pub struct LocalTracker {
    run_dir: PathBuf,
}

impl LocalTracker {
    /// Create the run directory under `runs_dir`.
    pub fn create(runs_dir: &Path, run_id: &str) -> Result<Self, PipelineError> {
        let run_dir = runs_dir.join(run_id);
        std::fs::create_dir_all(&run_dir)?;
        Ok(Self { run_dir })
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }
}

#[async_trait]
impl ExperimentTracker for LocalTracker {
    async fn log_trial(&self, trial: &Trial) -> Result<(), PipelineError> {
        let mut line = serde_json::to_string(trial)?;
        line.push('\n');
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.run_dir.join("trials.jsonl"))
            .await?;
        file.write_all(line.as_bytes()).await?;
        Ok(())
    }

    async fn log_summary(&self, summary: &MetricsSummary) -> Result<(), PipelineError> {
        let content = serde_json::to_string_pretty(summary)?;
        tokio::fs::write(self.run_dir.join("summary.json"), content).await?;
        Ok(())
    }

    async fn log_artifact(&self, path: &Path) -> Result<(), PipelineError> {
        let name = path
            .file_name()
            .ok_or_else(|| PipelineError::tracking("artifact path has no file name"))?;
        tokio::fs::copy(path, self.run_dir.join(name)).await?;
        Ok(())
    }
}

/// Tracker that POSTs records to a remote experiment-tracking service.
pub struct HttpTracker {
    client: reqwest::Client,
    base_url: String,
    run_id: String,
}

impl HttpTracker {
    pub fn new(base_url: impl Into<String>, run_id: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            run_id: run_id.into(),
        }
    }

    fn url(&self, suffix: &str) -> String {
        format!(
            "{}/runs/{}/{suffix}",
            self.base_url.trim_end_matches('/'),
            self.run_id
        )
    }

    async fn post_json<T: serde::Serialize + Sync>(
        &self,
        suffix: &str,
        body: &T,
    ) -> Result<(), PipelineError> {
        let response = self.client.post(self.url(suffix)).json(body).send().await?;
        if !response.status().is_success() {
            return Err(PipelineError::tracking(format!(
                "tracking endpoint returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ExperimentTracker for HttpTracker {
    async fn log_trial(&self, trial: &Trial) -> Result<(), PipelineError> {
        self.post_json("trials", trial).await
    }

    async fn log_summary(&self, summary: &MetricsSummary) -> Result<(), PipelineError> {
        self.post_json("summary", summary).await
    }

    async fn log_artifact(&self, path: &Path) -> Result<(), PipelineError> {
        let bytes = tokio::fs::read(path).await?;
        let response = self
            .client
            .post(self.url("artifact"))
            .header("content-type", "application/json")
            .body(bytes)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(PipelineError::tracking(format!(
                "tracking endpoint returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}
