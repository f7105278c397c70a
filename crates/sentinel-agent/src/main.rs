//! Sentinel node agent
//!
//! Runs on each node, collecting telemetry, scoring failure risk, and
//! exposing health, stats and Prometheus endpoints. The migration verdict
//! is published for an external orchestrator; the agent never drains the
//! node itself.

use anyhow::Result;
use sentinel_agent::{api, config::AgentConfig};
use sentinel_lib::{
    health::components, predictor::MIN_HISTORY, Collector, HealthRegistry, MetricSnapshot,
    NodeExporter, PredictContext, Predictor,
};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

type SharedSnapshot = Arc<RwLock<Option<MetricSnapshot>>>;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    let config = AgentConfig::load()?;
    let thresholds = config.thresholds()?;
    info!(
        node_name = %config.node_name,
        version = AGENT_VERSION,
        "Starting sentinel agent"
    );

    let collector = Arc::new(config.collector());
    let predictor = Arc::new(Predictor::with_thresholds(&config.node_name, thresholds));
    let exporter = Arc::new(NodeExporter::new(&config.node_name)?);

    let health = HealthRegistry::new();
    health.register(components::COLLECTOR);
    health.register(components::PREDICTOR);
    health.set_degraded(components::PREDICTOR, "insufficient history");

    let state = Arc::new(api::AppState::new(
        health.clone(),
        Arc::clone(&exporter),
        Arc::clone(&predictor),
    ));

    let latest: SharedSnapshot = Arc::new(RwLock::new(None));
    let (shutdown_tx, _) = broadcast::channel(1);

    tokio::spawn(collection_loop(
        collector,
        Arc::clone(&predictor),
        Arc::clone(&exporter),
        health.clone(),
        Arc::clone(&latest),
        Duration::from_secs(config.collection_interval_secs),
        shutdown_tx.subscribe(),
    ));
    tokio::spawn(prediction_loop(
        predictor,
        exporter,
        Arc::clone(&state),
        latest,
        Duration::from_secs(config.prediction_interval_secs),
        shutdown_tx.subscribe(),
    ));

    health.set_ready(true);
    let api_handle = tokio::spawn(api::serve(config.api_port, state));

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    let _ = shutdown_tx.send(());
    api_handle.abort();

    Ok(())
}

/// Periodically collect a snapshot, export it, and feed the predictor.
async fn collection_loop(
    collector: Arc<Collector>,
    predictor: Arc<Predictor>,
    exporter: Arc<NodeExporter>,
    health: HealthRegistry,
    latest: SharedSnapshot,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    info!(interval_secs = interval.as_secs(), "Starting collection loop");
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let snapshot = collector.collect().await;

                if snapshot.errors.is_empty() {
                    health.set_healthy(components::COLLECTOR);
                } else {
                    debug!(errors = ?snapshot.errors, "Partial collection");
                    health.set_degraded(
                        components::COLLECTOR,
                        format!("{} sources failed", snapshot.errors.len()),
                    );
                }

                exporter.update_snapshot(&snapshot);
                predictor.add_sample(snapshot.clone());
                if predictor.history_len() < MIN_HISTORY {
                    health.set_degraded(
                        components::PREDICTOR,
                        "insufficient history for accurate predictions",
                    );
                } else {
                    health.set_healthy(components::PREDICTOR);
                }

                *latest.write().unwrap_or_else(|e| e.into_inner()) = Some(snapshot);
            }
            _ = shutdown.recv() => {
                info!("Stopping collection loop");
                break;
            }
        }
    }
}

/// Periodically score the latest snapshot and publish the verdict.
async fn prediction_loop(
    predictor: Arc<Predictor>,
    exporter: Arc<NodeExporter>,
    state: Arc<api::AppState>,
    latest: SharedSnapshot,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    info!(interval_secs = interval.as_secs(), "Starting prediction loop");
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(current) = latest
                    .read()
                    .unwrap_or_else(|e| e.into_inner())
                    .clone()
                else {
                    continue;
                };

                let started = Instant::now();
                match predictor.predict(&PredictContext::new(), &current) {
                    Ok(prediction) => {
                        exporter.observe_prediction_latency(started.elapsed().as_secs_f64());
                        let migrate = predictor.should_migrate(&prediction);
                        exporter.update_prediction(&prediction, migrate);

                        if migrate {
                            warn!(
                                failure_probability = prediction.failure_probability,
                                confidence = prediction.confidence,
                                time_to_failure_seconds = prediction.time_to_failure_seconds,
                                reasons = ?prediction.reasons,
                                "Migration recommended"
                            );
                        } else {
                            debug!(
                                failure_probability = prediction.failure_probability,
                                confidence = prediction.confidence,
                                "Prediction updated"
                            );
                        }
                        state.set_last_prediction(prediction);
                    }
                    Err(e) => {
                        exporter.inc_prediction_errors();
                        warn!(error = %e, "Prediction failed");
                    }
                }
            }
            _ = shutdown.recv() => {
                info!("Stopping prediction loop");
                break;
            }
        }
    }
}
