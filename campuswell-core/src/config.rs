//! Configuration for the campuswell pipeline.
//!
//! Uses `figment` for layered configuration: defaults -> user config ->
//! workspace config -> environment -> explicit overrides. The resulting
//! [`AppConfig`] is threaded as a parameter into data access, search, and
//! export; there is no process-wide mutable state.

use crate::eval::Scoring;
use crate::search::SearchSpace;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Dataset source configuration.
    #[serde(default)]
    pub data: DataConfig,
    /// Training pipeline configuration.
    #[serde(default)]
    pub training: TrainingConfig,
    /// Experiment tracking configuration.
    #[serde(default)]
    pub tracking: TrackingConfig,
    /// Prediction server configuration.
    #[serde(default)]
    pub server: ServerConfig,
}

/// Dataset source configuration.
///
/// The relational store is attempted first; on failure the flat CSV file is
/// used as a fallback. Both failing is a fatal configuration error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path to the SQLite database holding the student lifestyle table.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    /// Table to read the dataset from.
    #[serde(default = "default_table")]
    pub table: String,
    /// Flat-file fallback path.
    #[serde(default = "default_csv_path")]
    pub csv_path: PathBuf,
    /// CSV field delimiter.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            table: default_table(),
            csv_path: default_csv_path(),
            delimiter: default_delimiter(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/student_lifestyle.db")
}

fn default_table() -> String {
    "student_lifestyle".to_string()
}

fn default_csv_path() -> PathBuf {
    PathBuf::from("data/student_lifestyle.csv")
}

fn default_delimiter() -> char {
    ','
}

/// Training pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Master random seed for splitting, sampling, and model fitting.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Fraction of the dataset reserved for the held-out partition.
    #[serde(default = "default_test_size")]
    pub test_size: f64,
    /// Number of randomized search trials.
    #[serde(default = "default_n_trials")]
    pub n_trials: usize,
    /// Number of stratified cross-validation folds.
    #[serde(default = "default_n_folds")]
    pub n_folds: usize,
    /// Metric used to score search trials.
    #[serde(default = "default_scoring")]
    pub scoring: Scoring,
    /// Hyperparameter candidate lists for the randomized search.
    #[serde(default)]
    pub search: SearchSpace,
    /// Directory the artifact and metrics summary are exported to.
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            test_size: default_test_size(),
            n_trials: default_n_trials(),
            n_folds: default_n_folds(),
            scoring: default_scoring(),
            search: SearchSpace::default(),
            model_dir: default_model_dir(),
        }
    }
}

impl TrainingConfig {
    /// Path of the exported pipeline artifact.
    pub fn artifact_path(&self) -> PathBuf {
        self.model_dir.join("pipeline.json")
    }

    /// Path of the exported metrics summary.
    pub fn metrics_path(&self) -> PathBuf {
        self.model_dir.join("metrics.json")
    }
}

fn default_seed() -> u64 {
    42
}

fn default_test_size() -> f64 {
    0.2
}

fn default_n_trials() -> usize {
    50
}

fn default_n_folds() -> usize {
    3
}

fn default_scoring() -> Scoring {
    Scoring::RocAuc
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("models")
}

/// Experiment tracking configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Whether trial and summary records are reported at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Directory local run records are written to.
    #[serde(default = "default_runs_dir")]
    pub runs_dir: PathBuf,
    /// Remote tracking endpoint; when set, records are POSTed there instead
    /// of being written locally.
    #[serde(default)]
    pub remote_url: Option<String>,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            runs_dir: default_runs_dir(),
            remote_url: None,
        }
    }
}

fn default_runs_dir() -> PathBuf {
    PathBuf::from(".campuswell/runs")
}

/// Prediction server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_true() -> bool {
    true
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `CAMPUSWELL_`)
/// 3. Workspace-local config (`.campuswell/config.toml`)
/// 4. User config (`~/.config/campuswell/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&AppConfig>,
) -> Result<AppConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

    // User-level config
    if let Some(config_dir) = directories::ProjectDirs::from("dev", "campuswell", "campuswell") {
        let user_config = config_dir.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    // Workspace-level config
    if let Some(ws) = workspace {
        let ws_config = ws.join(".campuswell").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // Environment variables (CAMPUSWELL_TRAINING__SEED, CAMPUSWELL_DATA__TABLE, ...)
    figment = figment.merge(Env::prefixed("CAMPUSWELL_").split("__"));

    // Explicit overrides
    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    figment.extract().map_err(Box::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.training.seed, 42);
        assert_eq!(config.training.test_size, 0.2);
        assert_eq!(config.training.n_trials, 50);
        assert_eq!(config.training.n_folds, 3);
        assert_eq!(config.training.scoring, Scoring::RocAuc);
        assert_eq!(config.data.table, "student_lifestyle");
        assert!(config.tracking.enabled);
        assert!(config.tracking.remote_url.is_none());
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.training.seed, config.training.seed);
        assert_eq!(parsed.data.db_path, config.data.db_path);
        assert_eq!(parsed.training.search.n_estimators, config.training.search.n_estimators);
    }

    #[test]
    fn test_artifact_paths() {
        let config = TrainingConfig::default();
        assert_eq!(config.artifact_path(), PathBuf::from("models/pipeline.json"));
        assert_eq!(config.metrics_path(), PathBuf::from("models/metrics.json"));
    }

    #[test]
    fn test_load_config_defaults() {
        let config = load_config(None, None).unwrap();
        assert_eq!(config.training.n_folds, 3);
    }

    #[test]
    fn test_load_config_overrides() {
        let mut overrides = AppConfig::default();
        overrides.training.n_trials = 5;
        let config = load_config(None, Some(&overrides)).unwrap();
        assert_eq!(config.training.n_trials, 5);
    }
}
