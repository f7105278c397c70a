//! HTTP API for health checks, stats and Prometheus metrics

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use sentinel_lib::{
    health::ComponentStatus, HealthRegistry, NodeExporter, Prediction, Predictor,
};
use std::sync::{Arc, RwLock};
use tracing::info;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub health: HealthRegistry,
    pub exporter: Arc<NodeExporter>,
    pub predictor: Arc<Predictor>,
    pub last_prediction: Arc<RwLock<Option<Prediction>>>,
}

impl AppState {
    pub fn new(
        health: HealthRegistry,
        exporter: Arc<NodeExporter>,
        predictor: Arc<Predictor>,
    ) -> Self {
        Self {
            health,
            exporter,
            predictor,
            last_prediction: Arc::new(RwLock::new(None)),
        }
    }

    /// Publish the latest prediction for the /prediction endpoint.
    pub fn set_last_prediction(&self, prediction: Prediction) {
        *self
            .last_prediction
            .write()
            .unwrap_or_else(|e| e.into_inner()) = Some(prediction);
    }
}

/// Health check: 200 while operational (healthy or degraded), 503 otherwise.
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health.health();
    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status_code, Json(health))
}

/// Readiness check: 200 once initialized and no component is unhealthy.
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health.readiness();
    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint.
async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.exporter.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// Latest prediction as JSON; 404 until the first prediction lands.
async fn prediction(State(state): State<Arc<AppState>>) -> Response {
    let last = state
        .last_prediction
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .clone();
    match last {
        Some(p) => Json(p).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "no prediction available yet" })),
        )
            .into_response(),
    }
}

/// Predictor history summaries and active configuration.
async fn stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.predictor.stats())
}

/// Create the API router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/prediction", get(prediction))
        .route("/stats", get(stats))
        .with_state(state)
}

/// Start the API server.
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{port}");
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
