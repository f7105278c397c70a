//! Prediction and statistics output types

use super::thresholds::Thresholds;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel value for "no failure predicted".
pub const NO_FAILURE: i64 = -1;

/// A health verdict for one node at one instant.
///
/// Value type: it holds no references back to the predictor that produced
/// it. Serializes to the wire contract consumed by the exporter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub node_name: String,
    /// When the prediction was computed (RFC3339 in JSON).
    pub timestamp: DateTime<Utc>,
    pub failure_probability: f64,
    pub confidence: f64,
    /// Seconds until the dominant rising signal crosses its critical band,
    /// or [`NO_FAILURE`].
    pub time_to_failure_seconds: i64,
    pub reasons: Vec<String>,
}

/// Mean/min/max summary of one metric over the history window.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MetricSummary {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

impl MetricSummary {
    /// Summarize an iterator of values; all-zero for an empty iterator.
    pub(crate) fn from_values(values: impl Iterator<Item = f64>) -> Self {
        let mut sum = 0.0;
        let mut n = 0usize;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in values {
            if !v.is_finite() {
                continue;
            }
            sum += v;
            n += 1;
            min = min.min(v);
            max = max.max(v);
        }
        if n == 0 {
            return Self::default();
        }
        Self {
            mean: sum / n as f64,
            min,
            max,
        }
    }
}

/// Read-only view of the predictor state for the stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct PredictorStats {
    pub node_name: String,
    pub history_length: usize,
    pub cpu_temperature: MetricSummary,
    pub cpu_usage: MetricSummary,
    pub memory_usage: MetricSummary,
    pub load_1m: MetricSummary,
    pub thresholds: Thresholds,
}
