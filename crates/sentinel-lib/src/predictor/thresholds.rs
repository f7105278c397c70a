//! Prediction thresholds and risk weights

use serde::{Serialize, Serializer};
use std::time::Duration;
use thiserror::Error;

/// Configuration validation failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid threshold: {0}")]
    InvalidThreshold(String),
    #[error("invalid risk weight: {0}")]
    InvalidWeight(String),
}

/// Relative contribution of each risk signal to the failure probability.
///
/// Weights should sum to roughly 1.0 but are taken as-is: the aggregate is
/// clamped to [0, 1] rather than renormalized, so a non-unit sum scales the
/// score accordingly.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RiskWeights {
    pub thermal: f64,
    pub memory: f64,
    pub cpu: f64,
    pub disk: f64,
    pub network: f64,
    pub trend: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            thermal: 0.30,
            memory: 0.20,
            cpu: 0.15,
            disk: 0.10,
            network: 0.10,
            trend: 0.15,
        }
    }
}

impl RiskWeights {
    /// Sum over all six weights.
    pub fn total(&self) -> f64 {
        self.thermal + self.memory + self.cpu + self.disk + self.network + self.trend
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, w) in [
            ("thermal", self.thermal),
            ("memory", self.memory),
            ("cpu", self.cpu),
            ("disk", self.disk),
            ("network", self.network),
            ("trend", self.trend),
        ] {
            if !w.is_finite() || w < 0.0 {
                return Err(ConfigError::InvalidWeight(format!(
                    "{name} must be a non-negative finite number, got {w}"
                )));
            }
        }
        Ok(())
    }
}

/// Thresholds governing prediction, confidence and the migration verdict.
#[derive(Debug, Clone, Serialize)]
pub struct Thresholds {
    pub failure_probability_warn: f64,
    pub failure_probability_critical: f64,
    pub min_confidence: f64,
    #[serde(
        rename = "time_to_failure_threshold_seconds",
        serialize_with = "ser_secs"
    )]
    pub time_to_failure_threshold: Duration,
    #[serde(rename = "prediction_timeout_ms", serialize_with = "ser_millis")]
    pub prediction_timeout: Duration,
    pub risk_weights: RiskWeights,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            failure_probability_warn: 0.3,
            failure_probability_critical: 0.7,
            min_confidence: 0.6,
            time_to_failure_threshold: Duration::from_secs(15 * 60),
            prediction_timeout: Duration::from_millis(100),
            risk_weights: RiskWeights::default(),
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit = |name: &str, v: f64| -> Result<(), ConfigError> {
            if !v.is_finite() || !(0.0..=1.0).contains(&v) {
                return Err(ConfigError::InvalidThreshold(format!(
                    "{name} must be within [0, 1], got {v}"
                )));
            }
            Ok(())
        };
        unit("failure_probability_warn", self.failure_probability_warn)?;
        unit(
            "failure_probability_critical",
            self.failure_probability_critical,
        )?;
        unit("min_confidence", self.min_confidence)?;

        if self.failure_probability_warn > self.failure_probability_critical {
            return Err(ConfigError::InvalidThreshold(format!(
                "failure_probability_warn ({}) exceeds failure_probability_critical ({})",
                self.failure_probability_warn, self.failure_probability_critical
            )));
        }
        if self.time_to_failure_threshold.is_zero() {
            return Err(ConfigError::InvalidThreshold(
                "time_to_failure_threshold must be positive".to_string(),
            ));
        }
        if self.prediction_timeout.is_zero() {
            return Err(ConfigError::InvalidThreshold(
                "prediction_timeout must be positive".to_string(),
            ));
        }
        self.risk_weights.validate()
    }
}

fn ser_secs<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_secs())
}

fn ser_millis<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one() {
        let w = RiskWeights::default();
        assert!((w.total() - 1.0).abs() < 1e-9);
        assert_eq!(w.thermal, 0.30);
        assert_eq!(w.memory, 0.20);
    }

    #[test]
    fn defaults_validate() {
        Thresholds::default().validate().unwrap();
    }

    #[test]
    fn negative_weight_rejected() {
        let mut t = Thresholds::default();
        t.risk_weights.disk = -0.1;
        assert!(matches!(t.validate(), Err(ConfigError::InvalidWeight(_))));
    }

    #[test]
    fn nan_weight_rejected() {
        let mut w = RiskWeights::default();
        w.trend = f64::NAN;
        assert!(w.validate().is_err());
    }

    #[test]
    fn warn_above_critical_rejected() {
        let t = Thresholds {
            failure_probability_warn: 0.9,
            failure_probability_critical: 0.5,
            ..Thresholds::default()
        };
        assert!(matches!(
            t.validate(),
            Err(ConfigError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn zero_timeout_rejected() {
        let t = Thresholds {
            prediction_timeout: Duration::ZERO,
            ..Thresholds::default()
        };
        assert!(t.validate().is_err());
    }

    #[test]
    fn serializes_durations_as_integers() {
        let json = serde_json::to_value(Thresholds::default()).unwrap();
        assert_eq!(json["time_to_failure_threshold_seconds"], 900);
        assert_eq!(json["prediction_timeout_ms"], 100);
        assert_eq!(json["risk_weights"]["thermal"], 0.30);
    }
}
