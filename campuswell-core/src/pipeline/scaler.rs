//! Per-column standardization.

use serde::{Deserialize, Serialize};

/// Standardizes one numeric column with statistics learned from the
/// training partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: f64,
    pub std_dev: f64,
}

impl StandardScaler {
    /// Learn mean and (population) standard deviation. A zero-variance
    /// column gets a divisor of 1.0 so transforming it centers the values
    /// without producing NaN.
    pub fn fit(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                mean: 0.0,
                std_dev: 1.0,
            };
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();
        Self {
            mean,
            std_dev: if std_dev > 0.0 { std_dev } else { 1.0 },
        }
    }

    pub fn transform(&self, value: f64) -> f64 {
        (value - self.mean) / self.std_dev
    }
}
