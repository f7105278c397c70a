//! Node agent library for predictive health scoring
//!
//! This crate provides the core functionality for:
//! - Node metrics collection from procfs and sysfs
//! - Rule-based failure prediction over a rolling history
//! - Migration verdicts for an external orchestrator
//! - Health checks and Prometheus observability

pub mod collector;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;

pub use collector::{Collector, MetricsSource};
pub use health::{ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse};
pub use models::MetricSnapshot;
pub use observability::NodeExporter;
pub use predictor::{
    PredictContext, PredictError, Prediction, Predictor, PredictorStats, RiskWeights, Thresholds,
};
