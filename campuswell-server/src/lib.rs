//! # campuswell-server — prediction API
//!
//! Serves the exported training artifact over HTTP: a prediction endpoint,
//! a liveness check, and Prometheus-format operational metrics.

pub mod metrics;
pub mod routes;
pub mod schemas;

pub use routes::{AppState, SharedState, router, run};
