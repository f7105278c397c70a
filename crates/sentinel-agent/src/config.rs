//! Agent configuration
//!
//! Loaded from the environment with the `SENTINEL_` prefix (for example
//! `SENTINEL_API_PORT=9200`). Every prediction threshold and risk weight
//! can be overridden; unset values fall back to the library defaults.

use anyhow::Result;
use sentinel_lib::{Collector, Thresholds};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Node name, usually injected via the downward API.
    #[serde(default = "default_node_name")]
    pub node_name: String,

    /// Port for health, stats and Prometheus endpoints.
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Metrics collection interval in seconds.
    #[serde(default = "default_collection_interval")]
    pub collection_interval_secs: u64,

    /// Prediction interval in seconds.
    #[serde(default = "default_prediction_interval")]
    pub prediction_interval_secs: u64,

    /// Primary block device to monitor (auto-detected if unset).
    #[serde(default)]
    pub disk_device: Option<String>,

    /// Mount point for disk capacity figures (default `/`).
    #[serde(default)]
    pub disk_mount: Option<String>,

    /// Network interface to monitor (auto-detected if unset).
    #[serde(default)]
    pub network_interface: Option<String>,

    /// TCP endpoint for the network latency probe (disabled if unset).
    #[serde(default)]
    pub latency_probe: Option<String>,

    // Threshold overrides
    #[serde(default)]
    pub failure_probability_warn: Option<f64>,
    #[serde(default)]
    pub failure_probability_critical: Option<f64>,
    #[serde(default)]
    pub min_confidence: Option<f64>,
    #[serde(default)]
    pub time_to_failure_threshold_secs: Option<u64>,
    #[serde(default)]
    pub prediction_timeout_ms: Option<u64>,

    // Risk weight overrides
    #[serde(default)]
    pub weight_thermal: Option<f64>,
    #[serde(default)]
    pub weight_memory: Option<f64>,
    #[serde(default)]
    pub weight_cpu: Option<f64>,
    #[serde(default)]
    pub weight_disk: Option<f64>,
    #[serde(default)]
    pub weight_network: Option<f64>,
    #[serde(default)]
    pub weight_trend: Option<f64>,
}

fn default_node_name() -> String {
    std::env::var("NODE_NAME").unwrap_or_else(|_| "unknown".to_string())
}

fn default_api_port() -> u16 {
    9100
}

fn default_collection_interval() -> u64 {
    10
}

fn default_prediction_interval() -> u64 {
    60
}

impl AgentConfig {
    /// Load configuration from `SENTINEL_`-prefixed environment variables.
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("SENTINEL"))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Build and validate the predictor thresholds with any overrides
    /// applied.
    pub fn thresholds(&self) -> Result<Thresholds> {
        let mut t = Thresholds::default();
        if let Some(v) = self.failure_probability_warn {
            t.failure_probability_warn = v;
        }
        if let Some(v) = self.failure_probability_critical {
            t.failure_probability_critical = v;
        }
        if let Some(v) = self.min_confidence {
            t.min_confidence = v;
        }
        if let Some(secs) = self.time_to_failure_threshold_secs {
            t.time_to_failure_threshold = Duration::from_secs(secs);
        }
        if let Some(ms) = self.prediction_timeout_ms {
            t.prediction_timeout = Duration::from_millis(ms);
        }

        let w = &mut t.risk_weights;
        if let Some(v) = self.weight_thermal {
            w.thermal = v;
        }
        if let Some(v) = self.weight_memory {
            w.memory = v;
        }
        if let Some(v) = self.weight_cpu {
            w.cpu = v;
        }
        if let Some(v) = self.weight_disk {
            w.disk = v;
        }
        if let Some(v) = self.weight_network {
            w.network = v;
        }
        if let Some(v) = self.weight_trend {
            w.trend = v;
        }

        t.validate()?;
        Ok(t)
    }

    /// Build the collector with the configured source overrides.
    pub fn collector(&self) -> Collector {
        let mut collector = Collector::new(&self.node_name);
        if let Some(device) = &self.disk_device {
            collector = collector.with_disk_device(device);
        }
        if let Some(mount) = &self.disk_mount {
            collector = collector.with_disk_mount(mount);
        }
        if let Some(interface) = &self.network_interface {
            collector = collector.with_network_interface(interface);
        }
        if let Some(probe) = &self.latency_probe {
            collector = collector.with_latency_probe(probe);
        }
        collector
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_config() -> AgentConfig {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }

    #[test]
    fn defaults_apply_for_empty_environment() {
        let cfg = empty_config();
        assert_eq!(cfg.api_port, 9100);
        assert_eq!(cfg.collection_interval_secs, 10);
        assert_eq!(cfg.prediction_interval_secs, 60);
        assert!(cfg.disk_device.is_none());
    }

    #[test]
    fn default_thresholds_validate() {
        let t = empty_config().thresholds().unwrap();
        assert_eq!(t.failure_probability_warn, 0.3);
        assert_eq!(t.prediction_timeout, Duration::from_millis(100));
    }

    #[test]
    fn threshold_overrides_apply() {
        let mut cfg = empty_config();
        cfg.failure_probability_warn = Some(0.5);
        cfg.time_to_failure_threshold_secs = Some(600);
        cfg.weight_memory = Some(0.4);

        let t = cfg.thresholds().unwrap();
        assert_eq!(t.failure_probability_warn, 0.5);
        assert_eq!(t.time_to_failure_threshold, Duration::from_secs(600));
        assert_eq!(t.risk_weights.memory, 0.4);
    }

    #[test]
    fn invalid_overrides_are_rejected() {
        let mut cfg = empty_config();
        cfg.failure_probability_warn = Some(1.5);
        assert!(cfg.thresholds().is_err());

        let mut cfg = empty_config();
        cfg.weight_disk = Some(-0.2);
        assert!(cfg.thresholds().is_err());
    }
}
