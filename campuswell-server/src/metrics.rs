//! Operational counters with Prometheus text exposition.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Latency histogram bucket upper bounds, in seconds.
const LATENCY_BUCKETS: [f64; 9] = [0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0];

/// Request counters, prediction outcomes, and a latency histogram.
///
/// All counters are atomics; recording is lock-free and the exposition is a
/// point-in-time read.
#[derive(Debug, Default)]
pub struct ServerMetrics {
    requests_success: AtomicU64,
    requests_error: AtomicU64,
    results_depression: AtomicU64,
    results_no_depression: AtomicU64,
    latency_buckets: [AtomicU64; 9],
    latency_sum_micros: AtomicU64,
    latency_count: AtomicU64,
}

impl ServerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, depression: bool) {
        self.requests_success.fetch_add(1, Ordering::Relaxed);
        if depression {
            self.results_depression.fetch_add(1, Ordering::Relaxed);
        } else {
            self.results_no_depression.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_error(&self) {
        self.requests_error.fetch_add(1, Ordering::Relaxed);
    }

    pub fn observe_latency(&self, latency: Duration) {
        let seconds = latency.as_secs_f64();
        for (i, bound) in LATENCY_BUCKETS.iter().enumerate() {
            if seconds <= *bound {
                self.latency_buckets[i].fetch_add(1, Ordering::Relaxed);
            }
        }
        self.latency_sum_micros
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);
        self.latency_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Render the Prometheus text exposition format.
    pub fn render(&self, model_loaded: bool) -> String {
        let mut out = String::new();

        out.push_str("# HELP prediction_requests_total Total number of prediction requests\n");
        out.push_str("# TYPE prediction_requests_total counter\n");
        out.push_str(&format!(
            "prediction_requests_total{{status=\"success\"}} {}\n",
            self.requests_success.load(Ordering::Relaxed)
        ));
        out.push_str(&format!(
            "prediction_requests_total{{status=\"error\"}} {}\n",
            self.requests_error.load(Ordering::Relaxed)
        ));

        out.push_str("# HELP prediction_results_total Prediction results by outcome\n");
        out.push_str("# TYPE prediction_results_total counter\n");
        out.push_str(&format!(
            "prediction_results_total{{outcome=\"Depression\"}} {}\n",
            self.results_depression.load(Ordering::Relaxed)
        ));
        out.push_str(&format!(
            "prediction_results_total{{outcome=\"No Depression\"}} {}\n",
            self.results_no_depression.load(Ordering::Relaxed)
        ));

        out.push_str("# HELP prediction_latency_seconds Prediction request latency in seconds\n");
        out.push_str("# TYPE prediction_latency_seconds histogram\n");
        for (i, bound) in LATENCY_BUCKETS.iter().enumerate() {
            out.push_str(&format!(
                "prediction_latency_seconds_bucket{{le=\"{bound}\"}} {}\n",
                self.latency_buckets[i].load(Ordering::Relaxed)
            ));
        }
        let count = self.latency_count.load(Ordering::Relaxed);
        out.push_str(&format!(
            "prediction_latency_seconds_bucket{{le=\"+Inf\"}} {count}\n"
        ));
        out.push_str(&format!(
            "prediction_latency_seconds_sum {}\n",
            self.latency_sum_micros.load(Ordering::Relaxed) as f64 / 1e6
        ));
        out.push_str(&format!("prediction_latency_seconds_count {count}\n"));

        out.push_str("# HELP model_loaded Whether the ML model is currently loaded (1=yes, 0=no)\n");
        out.push_str("# TYPE model_loaded gauge\n");
        out.push_str(&format!("model_loaded {}\n", u8::from(model_loaded)));

        out
    }
}
