//! Predictive health scoring
//!
//! Combines six risk signals (thermal, memory, CPU, disk, network, trend)
//! over a rolling history of node snapshots into a calibrated failure
//! probability, a confidence, an estimated time to failure, and a
//! migrate/do-not-migrate verdict.

pub mod history;
mod output;
pub mod reason;
mod signals;
mod thresholds;

pub use history::{History, HISTORY_CAPACITY};
pub use output::{MetricSummary, Prediction, PredictorStats, NO_FAILURE};
pub use thresholds::{ConfigError, RiskWeights, Thresholds};

use crate::models::MetricSnapshot;
use chrono::Utc;
use signals::MetricTrend;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Minimum history depth before a real prediction is attempted.
pub const MIN_HISTORY: usize = 10;

/// The only error `predict` surfaces. Missing metrics are folded into the
/// prediction as lowered confidence, never reported as errors.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("prediction cancelled")]
    Cancelled,
}

/// Cancellation handle for a prediction call.
///
/// Cloneable; all clones share the cancellation flag. A context without a
/// deadline gets one derived from `prediction_timeout` at predict time; an
/// explicit deadline is respected and never extended.
#[derive(Debug, Clone, Default)]
pub struct PredictContext {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl PredictContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Some(deadline),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Trigger cancellation; observed by all clones.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancelled, or the caller-supplied deadline has already passed.
    fn expired(&self) -> bool {
        self.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Thread-safe predictive health scorer for a single node.
///
/// One ingestion task calls [`add_sample`](Self::add_sample); any number of
/// readers may call [`predict`](Self::predict),
/// [`should_migrate`](Self::should_migrate) and [`stats`](Self::stats)
/// concurrently. The history is the only shared mutable state and sits
/// behind a single reader-writer lock; a `predict` in flight sees either
/// the pre-append or post-append history, never a torn view.
pub struct Predictor {
    node_name: String,
    thresholds: Thresholds,
    history: RwLock<History>,
}

impl Predictor {
    /// Predictor with the default thresholds and weights.
    pub fn new(node_name: impl Into<String>) -> Self {
        Self::with_thresholds(node_name, Thresholds::default())
    }

    pub fn with_thresholds(node_name: impl Into<String>, thresholds: Thresholds) -> Self {
        Self {
            node_name: node_name.into(),
            thresholds,
            history: RwLock::new(History::new()),
        }
    }

    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Append one snapshot to the rolling history.
    pub fn add_sample(&self, snapshot: MetricSnapshot) {
        self.history
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(snapshot);
    }

    pub fn history_len(&self) -> usize {
        self.read_history().len()
    }

    /// Score the current snapshot against the rolling history.
    ///
    /// Returns [`PredictError::Cancelled`] if the context is already
    /// cancelled or its deadline expired; cancellation is re-checked after
    /// each risk calculator. All other degradation (missing metrics,
    /// degenerate arithmetic) is absorbed into the prediction.
    pub fn predict(
        &self,
        ctx: &PredictContext,
        current: &MetricSnapshot,
    ) -> Result<Prediction, PredictError> {
        if ctx.expired() {
            return Err(PredictError::Cancelled);
        }

        let history = self.read_history();
        if history.len() < MIN_HISTORY {
            return Ok(Prediction {
                node_name: self.node_name.clone(),
                timestamp: Utc::now(),
                failure_probability: 0.0,
                confidence: 0.1,
                time_to_failure_seconds: NO_FAILURE,
                reasons: vec![reason::INSUFFICIENT_HISTORY.to_string()],
            });
        }

        let deadline = ctx
            .deadline()
            .unwrap_or_else(|| Instant::now() + self.thresholds.prediction_timeout);
        let checkpoint = || -> Result<(), PredictError> {
            if ctx.is_cancelled() || Instant::now() >= deadline {
                Err(PredictError::Cancelled)
            } else {
                Ok(())
            }
        };

        let thermal = signals::thermal_risk(current, &history);
        checkpoint()?;
        let memory = signals::memory_risk(current, &history);
        checkpoint()?;
        let cpu = signals::cpu_risk(current, &history);
        checkpoint()?;
        let disk = signals::disk_risk(current);
        checkpoint()?;
        let network = signals::network_risk(current, &history);
        checkpoint()?;
        let trends = signals::metric_trends(&history, current);
        let trend = signals::trend_risk(
            &trends,
            history.len(),
            self.thresholds.time_to_failure_threshold,
        );
        checkpoint()?;

        let weights = &self.thresholds.risk_weights;
        let weighted = [
            (weights.thermal, &thermal),
            (weights.memory, &memory),
            (weights.cpu, &cpu),
            (weights.disk, &disk),
            (weights.network, &network),
            (weights.trend, &trend),
        ];

        // Weights are absolute contributions: a missing signal lowers the
        // score, and the confidence term carries the measurement coverage.
        let mut score = 0.0;
        let mut available_weight = 0.0;
        let mut any_missing = false;
        let mut reasons: Vec<String> = Vec::new();
        for (weight, signal) in weighted {
            if signal.available {
                score += weight * signal.risk;
                available_weight += weight;
                reasons.extend(signal.reasons.iter().map(|r| (*r).to_string()));
            } else {
                any_missing = true;
            }
        }
        let failure_probability = signals::clamp01(score);

        let total_weight = weights.total();
        let available_fraction = if total_weight > 0.0 {
            available_weight / total_weight
        } else {
            0.0
        };
        let history_fraction = (history.len() as f64 / history.capacity() as f64).min(1.0);
        let mut confidence = signals::clamp01(available_fraction * history_fraction);
        if any_missing {
            reasons.push(reason::PARTIAL_METRICS_AVAILABLE.to_string());
            confidence = confidence.min(0.75);
        }

        let time_to_failure_seconds = self.time_to_failure(failure_probability, &trends);

        Ok(Prediction {
            node_name: self.node_name.clone(),
            timestamp: Utc::now(),
            failure_probability,
            confidence,
            time_to_failure_seconds,
            reasons,
        })
    }

    /// Seconds until the dominant rising signal crosses its critical band,
    /// bounded to `[30, 4 * time_to_failure_threshold]`. A high probability
    /// with no rising slope (a sudden spike) reports half the threshold.
    fn time_to_failure(&self, probability: f64, trends: &[MetricTrend; 3]) -> i64 {
        if probability < self.thresholds.failure_probability_warn {
            return NO_FAILURE;
        }
        let horizon = self.thresholds.time_to_failure_threshold.as_secs() as i64;
        let dominant = trends
            .iter()
            .filter(|t| t.slope_per_sec.is_finite() && t.slope_per_sec > 0.0)
            .max_by(|a, b| {
                a.slope_per_sec
                    .partial_cmp(&b.slope_per_sec)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        match dominant.and_then(|t| t.seconds_to_critical()) {
            Some(secs) => (secs as i64).clamp(30, horizon.saturating_mul(4)),
            None => (horizon / 2).max(30),
        }
    }

    /// Migration verdict: act on a prediction only when its confidence
    /// clears `min_confidence` and either the probability is critical or a
    /// warning-level probability comes with an imminent time to failure.
    pub fn should_migrate(&self, prediction: &Prediction) -> bool {
        let t = &self.thresholds;
        if prediction.confidence < t.min_confidence {
            return false;
        }
        if prediction.failure_probability >= t.failure_probability_critical {
            return true;
        }
        prediction.failure_probability >= t.failure_probability_warn
            && prediction.time_to_failure_seconds > 0
            && prediction.time_to_failure_seconds <= t.time_to_failure_threshold.as_secs() as i64
    }

    /// Read-only summary of the history window and active configuration.
    /// Pure read; never computes a prediction.
    pub fn stats(&self) -> PredictorStats {
        let history = self.read_history();
        PredictorStats {
            node_name: self.node_name.clone(),
            history_length: history.len(),
            cpu_temperature: MetricSummary::from_values(
                history.iter().map(|s| s.cpu_temperature_celsius),
            ),
            cpu_usage: MetricSummary::from_values(history.iter().map(|s| s.cpu_usage_percent)),
            memory_usage: MetricSummary::from_values(
                history.iter().map(|s| s.memory_usage_percent),
            ),
            load_1m: MetricSummary::from_values(history.iter().map(|s| s.load_average_1min)),
            thresholds: self.thresholds.clone(),
        }
    }

    fn read_history(&self) -> RwLockReadGuard<'_, History> {
        self.history.read().unwrap_or_else(|e| e.into_inner())
    }
}
