//! Core data models for the node agent

use serde::{Deserialize, Serialize};

/// One reading of all node metrics at a single instant.
///
/// A zero value in any field means the metric was absent for that
/// collection; the predictor treats zeroes as "not measured" and lowers
/// its confidence instead of failing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricSnapshot {
    /// Unix timestamp (seconds) of the collection.
    pub timestamp: i64,
    pub node_name: String,

    // CPU
    pub cpu_temperature_celsius: f64,
    pub cpu_usage_percent: f64,
    pub cpu_throttled: bool,
    pub cpu_frequency_mhz: f64,
    pub load_average_1min: f64,
    pub load_average_5min: f64,
    pub load_average_15min: f64,

    // Memory
    pub memory_total_bytes: u64,
    pub memory_available_bytes: u64,
    pub memory_usage_percent: f64,
    pub swap_total_bytes: u64,
    pub swap_used_bytes: u64,
    pub oom_kill_count: u64,

    // Disk
    pub disk_total_bytes: u64,
    pub disk_used_bytes: u64,
    pub disk_usage_percent: f64,
    pub disk_io_read_bytes: u64,
    pub disk_io_write_bytes: u64,
    pub disk_io_latency_ms: f64,

    // Network
    pub network_rx_bytes: u64,
    pub network_tx_bytes: u64,
    pub network_rx_errors: u64,
    pub network_tx_errors: u64,
    pub network_latency_ms: f64,

    // Collection metadata
    pub collection_duration_ms: f64,
    /// Non-fatal errors hit while reading individual sources. Consumed by
    /// the health check; the predictor accepts the snapshot regardless.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl MetricSnapshot {
    /// Snapshot with only the timestamp and node name filled in.
    pub fn empty(timestamp: i64, node_name: impl Into<String>) -> Self {
        Self {
            timestamp,
            node_name: node_name.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_all_absent() {
        let s = MetricSnapshot::default();
        assert_eq!(s.cpu_temperature_celsius, 0.0);
        assert_eq!(s.memory_total_bytes, 0);
        assert!(!s.cpu_throttled);
        assert!(s.errors.is_empty());
    }

    #[test]
    fn errors_omitted_from_json_when_empty() {
        let s = MetricSnapshot::empty(1_700_000_000, "node-a");
        let json = serde_json::to_value(&s).unwrap();
        assert!(json.get("errors").is_none());
        assert_eq!(json["node_name"], "node-a");
        assert_eq!(json["timestamp"], 1_700_000_000_i64);
    }

    #[test]
    fn errors_roundtrip_when_present() {
        let mut s = MetricSnapshot::default();
        s.errors.push("thermal: no such file".to_string());
        let json = serde_json::to_string(&s).unwrap();
        let back: MetricSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.errors.len(), 1);
    }
}
