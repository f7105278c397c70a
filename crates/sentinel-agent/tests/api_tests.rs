//! Integration tests for the agent API endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use sentinel_agent::api::{create_router, AppState};
use sentinel_lib::{
    health::components, HealthRegistry, MetricSnapshot, NodeExporter, PredictContext, Predictor,
};
use std::sync::Arc;
use tower::ServiceExt;

fn sample(ts: i64) -> MetricSnapshot {
    MetricSnapshot {
        timestamp: ts,
        cpu_temperature_celsius: 50.0,
        cpu_usage_percent: 30.0,
        memory_total_bytes: 16 << 30,
        memory_usage_percent: 40.0,
        disk_total_bytes: 100 << 30,
        disk_usage_percent: 50.0,
        load_average_1min: 1.0,
        network_latency_ms: 10.0,
        network_rx_bytes: 1 << 20,
        network_tx_bytes: 512 << 10,
        ..MetricSnapshot::default()
    }
}

fn setup_test_app() -> (Router, Arc<AppState>) {
    let health = HealthRegistry::new();
    health.register(components::COLLECTOR);
    health.register(components::PREDICTOR);

    let exporter = Arc::new(NodeExporter::new("test-node").unwrap());
    let predictor = Arc::new(Predictor::new("test-node"));
    let state = Arc::new(AppState::new(health, exporter, predictor));
    (create_router(state.clone()), state)
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn healthz_returns_ok_when_healthy() {
    let (app, _state) = setup_test_app();

    let (status, health) = get_json(app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");
    assert!(health["components"]["collector"].is_object());
    assert!(health["components"]["predictor"].is_object());
}

#[tokio::test]
async fn healthz_returns_ok_when_degraded() {
    let (app, state) = setup_test_app();
    state
        .health
        .set_degraded(components::PREDICTOR, "insufficient history");

    let (status, health) = get_json(app, "/healthz").await;
    // Degraded is still operational.
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "degraded");
}

#[tokio::test]
async fn healthz_returns_503_when_unhealthy() {
    let (app, state) = setup_test_app();
    state
        .health
        .set_unhealthy(components::COLLECTOR, "procfs unreadable");

    let (status, health) = get_json(app, "/healthz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(health["status"], "unhealthy");
}

#[tokio::test]
async fn readyz_reflects_initialization() {
    let (app, state) = setup_test_app();

    let (status, readiness) = get_json(app.clone(), "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(readiness["ready"], false);

    state.health.set_ready(true);
    let (status, readiness) = get_json(app, "/readyz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(readiness["ready"], true);
}

#[tokio::test]
async fn readyz_returns_503_when_ready_but_unhealthy() {
    let (app, state) = setup_test_app();
    state.health.set_ready(true);
    state.health.set_unhealthy(components::COLLECTOR, "gone");

    let (status, _) = get_json(app, "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn metrics_endpoint_returns_prometheus_format() {
    let (app, state) = setup_test_app();
    state.exporter.update_snapshot(&sample(0));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("sentinel_cpu_temperature_celsius"));
    assert!(text.contains("sentinel_collection_latency_seconds_bucket"));
}

#[tokio::test]
async fn prediction_endpoint_404_until_first_prediction() {
    let (app, state) = setup_test_app();

    let (status, body) = get_json(app.clone(), "/prediction").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    // Produce a real prediction and publish it.
    for i in 0..50 {
        state.predictor.add_sample(sample(i));
    }
    let prediction = state
        .predictor
        .predict(&PredictContext::new(), &sample(50))
        .unwrap();
    state.set_last_prediction(prediction);

    let (status, body) = get_json(app, "/prediction").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["node_name"], "test-node");
    assert!(body["failure_probability"].is_number());
    assert!(body["confidence"].is_number());
    assert!(body["time_to_failure_seconds"].is_i64());
    assert!(body["reasons"].is_array());
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn stats_endpoint_reports_history_and_config() {
    let (app, state) = setup_test_app();
    for i in 0..20 {
        state.predictor.add_sample(sample(i));
    }

    let (status, stats) = get_json(app, "/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["history_length"], 20);
    assert_eq!(stats["node_name"], "test-node");
    assert!(stats["cpu_temperature"]["mean"].is_number());
    assert_eq!(stats["thresholds"]["failure_probability_critical"], 0.7);
}
