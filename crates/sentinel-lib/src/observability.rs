//! Prometheus exposition for snapshots and predictions
//!
//! The exporter owns its own `Registry`; nothing is registered globally.
//! Every prediction field becomes a gauge and reason codes are published as
//! a `sentinel_failure_reason{code="…"} 1` label set that is reset and
//! re-populated on each prediction.

use crate::models::MetricSnapshot;
use crate::predictor::Prediction;
use anyhow::Result;
use prometheus::{
    Encoder, Gauge, GaugeVec, Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry,
    TextEncoder,
};

/// Histogram buckets for latency measurements (seconds).
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Prometheus metrics for one node agent.
pub struct NodeExporter {
    registry: Registry,

    // Snapshot gauges
    cpu_temperature: Gauge,
    cpu_usage: Gauge,
    cpu_frequency: Gauge,
    load_1m: Gauge,
    memory_usage: Gauge,
    memory_total: IntGauge,
    memory_available: IntGauge,
    swap_used: IntGauge,
    oom_kills: IntGauge,
    disk_usage: Gauge,
    disk_io_latency: Gauge,
    network_rx_bytes: IntGauge,
    network_tx_bytes: IntGauge,
    network_rx_errors: IntGauge,
    network_tx_errors: IntGauge,
    network_latency: Gauge,
    collection_latency_seconds: Histogram,
    collection_errors: IntCounter,

    // Prediction gauges
    failure_probability: Gauge,
    confidence: Gauge,
    time_to_failure_seconds: IntGauge,
    should_migrate: IntGauge,
    failure_reason: GaugeVec,
    prediction_latency_seconds: Histogram,
    predictions_total: IntCounter,
    prediction_errors: IntCounter,
}

impl NodeExporter {
    pub fn new(node_name: &str) -> Result<Self> {
        let registry = Registry::new();
        let r = &registry;
        let n = node_name;

        let exporter = Self {
            cpu_temperature: gauge(r, n, "sentinel_cpu_temperature_celsius", "CPU temperature")?,
            cpu_usage: gauge(r, n, "sentinel_cpu_usage_percent", "CPU usage percentage")?,
            cpu_frequency: gauge(r, n, "sentinel_cpu_frequency_mhz", "CPU frequency")?,
            load_1m: gauge(r, n, "sentinel_load_average_1min", "1-minute load average")?,
            memory_usage: gauge(r, n, "sentinel_memory_usage_percent", "Memory usage percentage")?,
            memory_total: int_gauge(r, n, "sentinel_memory_total_bytes", "Total memory")?,
            memory_available: int_gauge(
                r,
                n,
                "sentinel_memory_available_bytes",
                "Available memory",
            )?,
            swap_used: int_gauge(r, n, "sentinel_swap_used_bytes", "Swap in use")?,
            oom_kills: int_gauge(r, n, "sentinel_oom_kill_count", "Cumulative OOM kills")?,
            disk_usage: gauge(r, n, "sentinel_disk_usage_percent", "Disk usage percentage")?,
            disk_io_latency: gauge(r, n, "sentinel_disk_io_latency_ms", "Average disk I/O latency")?,
            network_rx_bytes: int_gauge(r, n, "sentinel_network_rx_bytes", "Bytes received")?,
            network_tx_bytes: int_gauge(r, n, "sentinel_network_tx_bytes", "Bytes transmitted")?,
            network_rx_errors: int_gauge(r, n, "sentinel_network_rx_errors", "Receive errors")?,
            network_tx_errors: int_gauge(r, n, "sentinel_network_tx_errors", "Transmit errors")?,
            network_latency: gauge(r, n, "sentinel_network_latency_ms", "Network probe latency")?,
            collection_latency_seconds: histogram(
                r,
                n,
                "sentinel_collection_latency_seconds",
                "Time spent collecting node metrics",
            )?,
            collection_errors: int_counter(
                r,
                n,
                "sentinel_collection_errors_total",
                "Metric sources that failed to collect",
            )?,

            failure_probability: gauge(
                r,
                n,
                "sentinel_failure_probability",
                "Predicted probability of node failure",
            )?,
            confidence: gauge(r, n, "sentinel_confidence", "Confidence in the prediction")?,
            time_to_failure_seconds: int_gauge(
                r,
                n,
                "sentinel_time_to_failure_seconds",
                "Estimated seconds until failure, -1 when none predicted",
            )?,
            should_migrate: int_gauge(
                r,
                n,
                "sentinel_should_migrate",
                "1 when the migration gate recommends draining the node",
            )?,
            failure_reason: gauge_vec(
                r,
                n,
                "sentinel_failure_reason",
                "Active prediction reason codes",
                &["code"],
            )?,
            prediction_latency_seconds: histogram(
                r,
                n,
                "sentinel_prediction_latency_seconds",
                "Time spent computing a prediction",
            )?,
            predictions_total: int_counter(
                r,
                n,
                "sentinel_predictions_total",
                "Predictions computed",
            )?,
            prediction_errors: int_counter(
                r,
                n,
                "sentinel_prediction_errors_total",
                "Predictions that failed or were cancelled",
            )?,
            registry,
        };
        Ok(exporter)
    }

    /// Republish the fields of one snapshot.
    pub fn update_snapshot(&self, m: &MetricSnapshot) {
        self.cpu_temperature.set(m.cpu_temperature_celsius);
        self.cpu_usage.set(m.cpu_usage_percent);
        self.cpu_frequency.set(m.cpu_frequency_mhz);
        self.load_1m.set(m.load_average_1min);
        self.memory_usage.set(m.memory_usage_percent);
        self.memory_total.set(m.memory_total_bytes as i64);
        self.memory_available.set(m.memory_available_bytes as i64);
        self.swap_used.set(m.swap_used_bytes as i64);
        self.oom_kills.set(m.oom_kill_count as i64);
        self.disk_usage.set(m.disk_usage_percent);
        self.disk_io_latency.set(m.disk_io_latency_ms);
        self.network_rx_bytes.set(m.network_rx_bytes as i64);
        self.network_tx_bytes.set(m.network_tx_bytes as i64);
        self.network_rx_errors.set(m.network_rx_errors as i64);
        self.network_tx_errors.set(m.network_tx_errors as i64);
        self.network_latency.set(m.network_latency_ms);
        self.collection_latency_seconds
            .observe(m.collection_duration_ms / 1000.0);
        self.collection_errors.inc_by(m.errors.len() as u64);
    }

    /// Republish a prediction and the migration verdict.
    pub fn update_prediction(&self, prediction: &Prediction, should_migrate: bool) {
        self.failure_probability.set(prediction.failure_probability);
        self.confidence.set(prediction.confidence);
        self.time_to_failure_seconds
            .set(prediction.time_to_failure_seconds);
        self.should_migrate.set(i64::from(should_migrate));

        self.failure_reason.reset();
        for code in &prediction.reasons {
            self.failure_reason.with_label_values(&[code]).set(1.0);
        }
        self.predictions_total.inc();
    }

    pub fn observe_prediction_latency(&self, seconds: f64) {
        self.prediction_latency_seconds.observe(seconds);
    }

    pub fn inc_prediction_errors(&self) {
        self.prediction_errors.inc();
    }

    /// Render the text exposition format.
    pub fn encode(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

fn opts(node: &str, name: &str, help: &str) -> Opts {
    Opts::new(name, help).const_label("node", node)
}

fn gauge(registry: &Registry, node: &str, name: &str, help: &str) -> Result<Gauge> {
    let g = Gauge::with_opts(opts(node, name, help))?;
    registry.register(Box::new(g.clone()))?;
    Ok(g)
}

fn gauge_vec(
    registry: &Registry,
    node: &str,
    name: &str,
    help: &str,
    labels: &[&str],
) -> Result<GaugeVec> {
    let g = GaugeVec::new(opts(node, name, help), labels)?;
    registry.register(Box::new(g.clone()))?;
    Ok(g)
}

fn int_gauge(registry: &Registry, node: &str, name: &str, help: &str) -> Result<IntGauge> {
    let g = IntGauge::with_opts(opts(node, name, help))?;
    registry.register(Box::new(g.clone()))?;
    Ok(g)
}

fn int_counter(registry: &Registry, node: &str, name: &str, help: &str) -> Result<IntCounter> {
    let c = IntCounter::with_opts(opts(node, name, help))?;
    registry.register(Box::new(c.clone()))?;
    Ok(c)
}

fn histogram(registry: &Registry, node: &str, name: &str, help: &str) -> Result<Histogram> {
    let h = Histogram::with_opts(
        HistogramOpts::new(name, help)
            .const_label("node", node)
            .buckets(LATENCY_BUCKETS.to_vec()),
    )?;
    registry.register(Box::new(h.clone()))?;
    Ok(h)
}
