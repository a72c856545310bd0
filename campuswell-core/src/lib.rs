//! # campuswell-core — training and evaluation for student depression risk
//!
//! The offline batch pipeline behind campuswell: load the student lifestyle
//! dataset from a relational store (CSV fallback), learn a preprocessing +
//! random-forest pipeline via randomized cross-validated hyperparameter
//! search, evaluate on a held-out partition, and export a self-contained
//! artifact plus a metrics summary. The `campuswell-cli` and
//! `campuswell-server` crates drive training and serve predictions.

pub mod artifact;
pub mod config;
pub mod data;
pub mod error;
pub mod eval;
pub mod model;
pub mod pipeline;
pub mod search;
pub mod tracking;
pub mod train;

pub use artifact::{MODEL_VERSION, Prediction, TrainedPipeline};
pub use config::AppConfig;
pub use error::PipelineError;
pub use train::{TrainingReport, run_training};
