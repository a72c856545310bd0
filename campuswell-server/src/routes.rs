//! The prediction API router: `/predict`, `/health`, `/metrics`.

use crate::metrics::ServerMetrics;
use crate::schemas::{ErrorResponse, HealthResponse, PredictionResponse, StudentInput};
use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use campuswell_core::TrainedPipeline;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared server state. The pipeline is loaded once at startup and only
/// ever read afterwards; each request is a pure transform over it.
pub struct AppState {
    pub pipeline: Option<TrainedPipeline>,
    pub metrics: ServerMetrics,
}

impl AppState {
    pub fn new(pipeline: Option<TrainedPipeline>) -> Self {
        Self {
            pipeline,
            metrics: ServerMetrics::new(),
        }
    }

    fn model_version(&self) -> &str {
        self.pipeline
            .as_ref()
            .map(|p| p.version.as_str())
            .unwrap_or(campuswell_core::MODEL_VERSION)
    }
}

pub type SharedState = Arc<AppState>;

/// Build the API router.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/predict", post(predict_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness check.
async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        model_loaded: state.pipeline.is_some(),
        version: state.model_version().to_string(),
    })
}

/// Predict depression risk for one student record.
async fn predict_handler(
    State(state): State<SharedState>,
    Json(input): Json<StudentInput>,
) -> Response {
    let Some(pipeline) = &state.pipeline else {
        state.metrics.record_error();
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "model not loaded".to_string(),
                detail: Some("run `campuswell train` to export an artifact first".to_string()),
            }),
        )
            .into_response();
    };

    if let Err(detail) = input.validate() {
        state.metrics.record_error();
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                error: "invalid input".to_string(),
                detail: Some(detail),
            }),
        )
            .into_response();
    }

    let start = Instant::now();
    match pipeline.predict(&input.into_record()) {
        Ok(prediction) => {
            state.metrics.observe_latency(start.elapsed());
            state.metrics.record_success(prediction.depression);
            Json(PredictionResponse::from_prediction(
                prediction,
                state.model_version(),
            ))
            .into_response()
        }
        Err(e) => {
            state.metrics.record_error();
            tracing::error!(error = %e, "prediction failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "prediction failed".to_string(),
                    detail: Some(e.to_string()),
                }),
            )
                .into_response()
        }
    }
}

/// Prometheus text exposition.
async fn metrics_handler(State(state): State<SharedState>) -> Response {
    (
        [(
            header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        state.metrics.render(state.pipeline.is_some()),
    )
        .into_response()
}

/// Start the server on the configured address. Runs until cancelled.
pub async fn run(state: SharedState, host: &str, port: u16) -> Result<(), std::io::Error> {
    let app = router(state);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "prediction server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
