//! Per-signal risk calculators
//!
//! Each calculator is a pure function over the current snapshot (and, where
//! needed, the history window) returning a risk in [0, 1], reason codes, and
//! an availability flag. Missing or malformed inputs yield
//! `available = false`; degenerate arithmetic (NaN, infinite values, zero
//! denominators) is absorbed here and never escapes to the aggregator.

use super::history::History;
use super::reason;
use crate::models::MetricSnapshot;
use std::time::Duration;

/// Samples considered for trend slope fitting.
const TREND_WINDOW: usize = 50;
/// Window size for the rapid-temperature-rise comparison.
const RISING_WINDOW: usize = 10;
/// Packet size assumed when deriving a packet count from byte deltas.
const MTU_BYTES: f64 = 1500.0;

pub(crate) const TEMP_CRITICAL_C: f64 = 85.0;
pub(crate) const MEMORY_CRITICAL_PERCENT: f64 = 95.0;
pub(crate) const CPU_CRITICAL_PERCENT: f64 = 95.0;

/// Outcome of a single risk calculator.
#[derive(Debug, Clone)]
pub(crate) struct SignalRisk {
    pub risk: f64,
    pub reasons: Vec<&'static str>,
    pub available: bool,
}

impl SignalRisk {
    fn unavailable() -> Self {
        Self {
            risk: 0.0,
            reasons: Vec::new(),
            available: false,
        }
    }

    fn available(risk: f64, reasons: Vec<&'static str>) -> Self {
        Self {
            risk: clamp01(risk),
            reasons,
            available: true,
        }
    }
}

/// Clamp to [0, 1], mapping NaN to 0.
pub(crate) fn clamp01(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

fn finite_pos(x: f64) -> bool {
    x.is_finite() && x > 0.0
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut n = 0usize;
    for v in values {
        sum += v;
        n += 1;
    }
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// Thermal risk from current temperature, throttle state, and the rate of
/// temperature rise across the history.
pub(crate) fn thermal_risk(current: &MetricSnapshot, history: &History) -> SignalRisk {
    let temp = current.cpu_temperature_celsius;
    if !finite_pos(temp) {
        return SignalRisk::unavailable();
    }

    let mut reasons = Vec::new();
    let mut risk = if temp >= 85.0 {
        reasons.push(reason::TEMP_CRITICAL);
        1.0
    } else if temp >= 75.0 {
        reasons.push(reason::TEMP_HIGH);
        0.5 + (temp - 75.0) / 10.0 * 0.5
    } else if temp >= 65.0 {
        reasons.push(reason::TEMP_ELEVATED);
        0.2 + (temp - 65.0) / 10.0 * 0.3
    } else {
        0.0
    };

    if current.cpu_throttled {
        risk += 0.2;
        reasons.push(reason::THROTTLED);
    }
    if temperature_rising(history) {
        risk += 0.15;
        reasons.push(reason::TEMP_RISING);
    }

    SignalRisk::available(risk, reasons)
}

/// True when the mean of the last up-to-10 history temperatures exceeds the
/// mean of the preceding up-to-10 by at least 5°C.
fn temperature_rising(history: &History) -> bool {
    let temps: Vec<f64> = history
        .iter()
        .map(|s| s.cpu_temperature_celsius)
        .filter(|t| finite_pos(*t))
        .collect();
    let recent_start = temps.len().saturating_sub(RISING_WINDOW);
    let prev_start = recent_start.saturating_sub(RISING_WINDOW);
    if recent_start == 0 {
        return false;
    }
    let recent = mean(temps[recent_start..].iter().copied());
    let previous = mean(temps[prev_start..recent_start].iter().copied());
    recent - previous >= 5.0
}

/// Memory risk from usage bands plus OOM and swap-pressure modifiers.
pub(crate) fn memory_risk(current: &MetricSnapshot, history: &History) -> SignalRisk {
    if current.memory_total_bytes == 0 {
        return SignalRisk::unavailable();
    }
    let usage = current.memory_usage_percent;
    if !usage.is_finite() {
        return SignalRisk::unavailable();
    }

    let mut reasons = Vec::new();
    let mut risk = if usage >= 95.0 {
        reasons.push(reason::MEMORY_CRITICAL);
        1.0
    } else if usage >= 85.0 {
        reasons.push(reason::MEMORY_HIGH);
        0.5 + (usage - 85.0) / 10.0 * 0.5
    } else if usage >= 70.0 {
        reasons.push(reason::MEMORY_ELEVATED);
        0.2 + (usage - 70.0) / 15.0 * 0.3
    } else {
        0.0
    };

    if let Some(last) = history.latest() {
        if current.oom_kill_count > last.oom_kill_count {
            risk += 0.5;
            reasons.push(reason::OOM_EVENT);
        }
    }
    if current.swap_total_bytes > 0 {
        let swap_ratio = current.swap_used_bytes as f64 / current.swap_total_bytes as f64;
        if swap_ratio > 0.5 {
            risk += 0.1;
            reasons.push(reason::SWAP_PRESSURE);
        }
    }

    SignalRisk::available(risk, reasons)
}

/// CPU risk: the maximum of a usage-band sub-risk and a load-per-core
/// sub-risk. Core count is inferred from the historical load average when
/// not otherwise known.
pub(crate) fn cpu_risk(current: &MetricSnapshot, history: &History) -> SignalRisk {
    let usage = current.cpu_usage_percent;
    let load = current.load_average_1min;
    if !finite_pos(usage) && !finite_pos(load) {
        return SignalRisk::unavailable();
    }

    let mut reasons = Vec::new();
    let mut usage_risk = 0.0;
    if finite_pos(usage) {
        if usage >= 95.0 {
            usage_risk = 1.0;
            reasons.push(reason::CPU_SATURATED);
        } else if usage >= 80.0 {
            usage_risk = 0.3 + (usage - 80.0) / 15.0 * 0.7;
            reasons.push(reason::CPU_HIGH);
        }
    }

    let mut load_risk = 0.0;
    if finite_pos(load) {
        let ratio = load / estimated_cores(history) as f64;
        if ratio >= 2.0 {
            load_risk = 0.8;
            reasons.push(reason::LOAD_CRITICAL);
        } else if ratio >= 1.0 {
            load_risk = 0.2 + (ratio - 1.0) * 0.6;
            reasons.push(reason::LOAD_HIGH);
        }
    }

    SignalRisk::available(usage_risk.max(load_risk), reasons)
}

fn estimated_cores(history: &History) -> u32 {
    let avg = mean(
        history
            .iter()
            .map(|s| s.load_average_1min)
            .filter(|l| l.is_finite()),
    );
    ((avg * 2.0).round() as i64).max(1) as u32
}

/// Disk risk combining fill level and I/O latency; capped at 1.0.
pub(crate) fn disk_risk(current: &MetricSnapshot) -> SignalRisk {
    if current.disk_total_bytes == 0 {
        return SignalRisk::unavailable();
    }

    let mut reasons = Vec::new();
    let usage = current.disk_usage_percent;
    let mut usage_risk = 0.0;
    if usage.is_finite() {
        if usage >= 95.0 {
            usage_risk = 1.0;
            reasons.push(reason::DISK_FULL);
        } else if usage >= 85.0 {
            usage_risk = 0.4 + (usage - 85.0) / 10.0 * 0.6;
            reasons.push(reason::DISK_HIGH);
        }
    }

    let latency = current.disk_io_latency_ms;
    let mut latency_risk = 0.0;
    if latency.is_finite() {
        if latency >= 100.0 {
            latency_risk = 0.5;
            reasons.push(reason::DISK_IO_CRITICAL);
        } else if latency >= 50.0 {
            latency_risk = 0.2;
            reasons.push(reason::DISK_IO_ELEVATED);
        }
    }

    SignalRisk::available(usage_risk + latency_risk, reasons)
}

/// Network risk from latency bands and the interface error rate over the
/// last collection interval. Counter wraps count as a zero delta.
pub(crate) fn network_risk(current: &MetricSnapshot, history: &History) -> SignalRisk {
    let latency = current.network_latency_ms;
    let has_latency = finite_pos(latency);
    let has_traffic = current.network_rx_bytes > 0 && current.network_tx_bytes > 0;
    if !has_latency && !has_traffic {
        return SignalRisk::unavailable();
    }

    let mut reasons = Vec::new();
    let mut risk = 0.0;
    if has_latency {
        if latency >= 500.0 {
            risk = 0.8;
            reasons.push(reason::NETWORK_LATENCY_CRITICAL);
        } else if latency >= 100.0 {
            risk = 0.2 + (latency - 100.0) / 400.0 * 0.6;
            reasons.push(reason::NETWORK_LATENCY_ELEVATED);
        }
    }

    if let Some(prev) = history.latest() {
        let error_delta = current
            .network_rx_errors
            .saturating_sub(prev.network_rx_errors)
            + current
                .network_tx_errors
                .saturating_sub(prev.network_tx_errors);
        let byte_delta = current.network_rx_bytes.saturating_sub(prev.network_rx_bytes)
            + current.network_tx_bytes.saturating_sub(prev.network_tx_bytes);
        let packets = (byte_delta as f64 / MTU_BYTES).max(1.0);
        let error_rate = error_delta as f64 / packets;
        if error_rate > 0.01 {
            risk += 0.4;
            reasons.push(reason::NETWORK_ERRORS);
        } else if error_rate > 0.001 {
            risk += 0.1;
            reasons.push(reason::NETWORK_ERRORS_LOW);
        }
    }

    SignalRisk::available(risk, reasons)
}

/// Slope and projection target for one trended metric.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MetricTrend {
    pub slope_per_sec: f64,
    pub latest: f64,
    pub critical: f64,
    pub reason: &'static str,
}

impl MetricTrend {
    /// Seconds until the metric crosses its critical threshold at the
    /// current slope; `None` when the metric is flat or falling.
    pub(crate) fn seconds_to_critical(&self) -> Option<f64> {
        if !self.slope_per_sec.is_finite() || self.slope_per_sec <= 0.0 {
            return None;
        }
        if self.latest >= self.critical {
            return Some(0.0);
        }
        let secs = (self.critical - self.latest) / self.slope_per_sec;
        secs.is_finite().then_some(secs)
    }
}

/// Least-squares slopes for temperature, memory usage and CPU usage over
/// the last up-to-50 samples plus the current snapshot.
pub(crate) fn metric_trends(history: &History, current: &MetricSnapshot) -> [MetricTrend; 3] {
    [
        series_trend(
            history,
            current,
            |s| s.cpu_temperature_celsius,
            TEMP_CRITICAL_C,
            reason::TREND_RISING_TEMP,
        ),
        series_trend(
            history,
            current,
            |s| s.memory_usage_percent,
            MEMORY_CRITICAL_PERCENT,
            reason::TREND_RISING_MEMORY,
        ),
        series_trend(
            history,
            current,
            |s| s.cpu_usage_percent,
            CPU_CRITICAL_PERCENT,
            reason::TREND_RISING_CPU,
        ),
    ]
}

fn series_trend(
    history: &History,
    current: &MetricSnapshot,
    value: impl Fn(&MetricSnapshot) -> f64,
    critical: f64,
    code: &'static str,
) -> MetricTrend {
    let points: Vec<(f64, f64)> = history
        .recent(TREND_WINDOW)
        .chain(std::iter::once(current))
        .filter_map(|s| {
            let v = value(s);
            finite_pos(v).then_some((s.timestamp as f64, v))
        })
        .collect();

    MetricTrend {
        slope_per_sec: least_squares_slope(&points),
        latest: points.last().map(|&(_, v)| v).unwrap_or(0.0),
        critical,
        reason: code,
    }
}

/// Least-squares slope over `(timestamp_secs, value)` points. Timestamps
/// are normalized to the first point to keep the sums well-conditioned. A
/// degenerate time span yields 0.
pub(crate) fn least_squares_slope(points: &[(f64, f64)]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let t0 = points[0].0;
    let n = points.len() as f64;
    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_xx) = (0.0, 0.0, 0.0, 0.0);
    for &(t, v) in points {
        let x = t - t0;
        sum_x += x;
        sum_y += v;
        sum_xy += x * v;
        sum_xx += x * x;
    }
    let denom = n * sum_xx - sum_x * sum_x;
    if !denom.is_finite() || denom.abs() < f64::EPSILON {
        return 0.0;
    }
    let slope = (n * sum_xy - sum_x * sum_y) / denom;
    if slope.is_finite() {
        slope
    } else {
        0.0
    }
}

/// Temporal trend risk: 0.8 when any trended metric projects to cross its
/// critical threshold within the horizon, 0.4 within twice the horizon.
/// Requires a minimum history depth to be meaningful.
pub(crate) fn trend_risk(
    trends: &[MetricTrend; 3],
    history_len: usize,
    horizon: Duration,
) -> SignalRisk {
    if history_len < super::MIN_HISTORY {
        return SignalRisk::unavailable();
    }

    let horizon_secs = horizon.as_secs_f64();
    let mut reasons = Vec::new();
    let mut risk: f64 = 0.0;
    for trend in trends {
        let Some(secs) = trend.seconds_to_critical() else {
            continue;
        };
        if secs <= horizon_secs {
            risk = risk.max(0.8);
            reasons.push(trend.reason);
        } else if secs <= horizon_secs * 2.0 {
            risk = risk.max(0.4);
            reasons.push(trend.reason);
        }
    }

    SignalRisk::available(risk, reasons)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(ts: i64) -> MetricSnapshot {
        MetricSnapshot {
            timestamp: ts,
            ..MetricSnapshot::default()
        }
    }

    fn history_of(snaps: Vec<MetricSnapshot>) -> History {
        let mut h = History::new();
        for s in snaps {
            h.push(s);
        }
        h
    }

    #[test]
    fn thermal_unavailable_without_temperature() {
        let h = History::new();
        let s = snap(0);
        assert!(!thermal_risk(&s, &h).available);
    }

    #[test]
    fn thermal_bands() {
        let h = History::new();
        let mut s = snap(0);

        s.cpu_temperature_celsius = 45.0;
        assert_eq!(thermal_risk(&s, &h).risk, 0.0);

        s.cpu_temperature_celsius = 70.0;
        let r = thermal_risk(&s, &h);
        assert!((r.risk - 0.35).abs() < 1e-9);
        assert_eq!(r.reasons, vec![reason::TEMP_ELEVATED]);

        s.cpu_temperature_celsius = 80.0;
        let r = thermal_risk(&s, &h);
        assert!((r.risk - 0.75).abs() < 1e-9);
        assert_eq!(r.reasons, vec![reason::TEMP_HIGH]);

        s.cpu_temperature_celsius = 90.0;
        let r = thermal_risk(&s, &h);
        assert_eq!(r.risk, 1.0);
        assert_eq!(r.reasons, vec![reason::TEMP_CRITICAL]);
    }

    #[test]
    fn thermal_throttle_modifier() {
        let h = History::new();
        let s = MetricSnapshot {
            cpu_temperature_celsius: 70.0,
            cpu_throttled: true,
            ..snap(0)
        };
        let r = thermal_risk(&s, &h);
        assert!((r.risk - 0.55).abs() < 1e-9);
        assert!(r.reasons.contains(&reason::THROTTLED));
    }

    #[test]
    fn thermal_rising_modifier() {
        // 10 samples near 50°C followed by 10 near 58°C.
        let mut snaps = Vec::new();
        for i in 0..10 {
            let mut s = snap(i);
            s.cpu_temperature_celsius = 50.0;
            snaps.push(s);
        }
        for i in 10..20 {
            let mut s = snap(i);
            s.cpu_temperature_celsius = 58.0;
            snaps.push(s);
        }
        let h = history_of(snaps);
        let s = MetricSnapshot {
            cpu_temperature_celsius: 58.0,
            ..snap(20)
        };
        let r = thermal_risk(&s, &h);
        assert!((r.risk - 0.15).abs() < 1e-9);
        assert_eq!(r.reasons, vec![reason::TEMP_RISING]);
    }

    #[test]
    fn thermal_clamped_at_one() {
        let mut snaps = Vec::new();
        for i in 0..20 {
            let mut s = snap(i);
            s.cpu_temperature_celsius = if i < 10 { 50.0 } else { 80.0 };
            snaps.push(s);
        }
        let h = history_of(snaps);
        let s = MetricSnapshot {
            cpu_temperature_celsius: 95.0,
            cpu_throttled: true,
            ..snap(20)
        };
        let r = thermal_risk(&s, &h);
        assert_eq!(r.risk, 1.0);
        assert_eq!(
            r.reasons,
            vec![reason::TEMP_CRITICAL, reason::THROTTLED, reason::TEMP_RISING]
        );
    }

    #[test]
    fn memory_unavailable_without_total() {
        let h = History::new();
        assert!(!memory_risk(&snap(0), &h).available);
    }

    #[test]
    fn memory_bands_and_modifiers() {
        let h = History::new();
        let mut s = snap(0);
        s.memory_total_bytes = 16 << 30;

        s.memory_usage_percent = 50.0;
        assert_eq!(memory_risk(&s, &h).risk, 0.0);

        s.memory_usage_percent = 77.5;
        let r = memory_risk(&s, &h);
        assert!((r.risk - 0.35).abs() < 1e-9);
        assert_eq!(r.reasons, vec![reason::MEMORY_ELEVATED]);

        s.memory_usage_percent = 90.0;
        let r = memory_risk(&s, &h);
        assert!((r.risk - 0.75).abs() < 1e-9);
        assert_eq!(r.reasons, vec![reason::MEMORY_HIGH]);

        s.memory_usage_percent = 96.0;
        let r = memory_risk(&s, &h);
        assert_eq!(r.risk, 1.0);
        assert_eq!(r.reasons, vec![reason::MEMORY_CRITICAL]);
    }

    #[test]
    fn memory_oom_modifier_fires_on_counter_increase() {
        let mut prev = snap(0);
        prev.memory_total_bytes = 16 << 30;
        prev.oom_kill_count = 2;
        let h = history_of(vec![prev]);

        let mut s = snap(1);
        s.memory_total_bytes = 16 << 30;
        s.memory_usage_percent = 85.0;
        s.oom_kill_count = 3;
        let r = memory_risk(&s, &h);
        assert!(r.reasons.contains(&reason::OOM_EVENT));
        assert_eq!(r.risk, 1.0); // 0.5 band + 0.5 OOM

        // Counter reset (wrap) must not fire.
        s.oom_kill_count = 0;
        let r = memory_risk(&s, &h);
        assert!(!r.reasons.contains(&reason::OOM_EVENT));
    }

    #[test]
    fn memory_swap_pressure() {
        let h = History::new();
        let mut s = snap(0);
        s.memory_total_bytes = 16 << 30;
        s.memory_usage_percent = 40.0;
        s.swap_total_bytes = 4 << 30;
        s.swap_used_bytes = 3 << 30;
        let r = memory_risk(&s, &h);
        assert!((r.risk - 0.1).abs() < 1e-9);
        assert_eq!(r.reasons, vec![reason::SWAP_PRESSURE]);
    }

    #[test]
    fn cpu_unavailable_without_usage_or_load() {
        let h = History::new();
        assert!(!cpu_risk(&snap(0), &h).available);
    }

    #[test]
    fn cpu_usage_bands() {
        let h = History::new();
        let mut s = snap(0);

        s.cpu_usage_percent = 50.0;
        assert_eq!(cpu_risk(&s, &h).risk, 0.0);

        s.cpu_usage_percent = 87.5;
        let r = cpu_risk(&s, &h);
        assert!((r.risk - 0.65).abs() < 1e-9);
        assert_eq!(r.reasons, vec![reason::CPU_HIGH]);

        s.cpu_usage_percent = 97.0;
        let r = cpu_risk(&s, &h);
        assert_eq!(r.risk, 1.0);
        assert_eq!(r.reasons, vec![reason::CPU_SATURATED]);
    }

    #[test]
    fn cpu_load_ratio_uses_inferred_cores() {
        // History mean load 2.0 -> 4 estimated cores.
        let mut snaps = Vec::new();
        for i in 0..20 {
            let mut s = snap(i);
            s.load_average_1min = 2.0;
            snaps.push(s);
        }
        let h = history_of(snaps);

        let mut s = snap(20);
        s.load_average_1min = 6.0; // ratio 1.5
        let r = cpu_risk(&s, &h);
        assert!((r.risk - 0.5).abs() < 1e-9);
        assert_eq!(r.reasons, vec![reason::LOAD_HIGH]);

        s.load_average_1min = 9.0; // ratio 2.25
        let r = cpu_risk(&s, &h);
        assert!((r.risk - 0.8).abs() < 1e-9);
        assert_eq!(r.reasons, vec![reason::LOAD_CRITICAL]);
    }

    #[test]
    fn cpu_takes_max_of_sub_risks() {
        let h = History::new(); // empty history -> 1 estimated core
        let mut s = snap(0);
        s.cpu_usage_percent = 97.0; // 1.0
        s.load_average_1min = 1.5; // ratio 1.5 -> 0.5
        let r = cpu_risk(&s, &h);
        assert_eq!(r.risk, 1.0);
        assert_eq!(r.reasons, vec![reason::CPU_SATURATED, reason::LOAD_HIGH]);
    }

    #[test]
    fn disk_risk_table() {
        let base = |usage: f64, latency: f64| MetricSnapshot {
            disk_total_bytes: 100 << 30,
            disk_usage_percent: usage,
            disk_io_latency_ms: latency,
            ..snap(0)
        };

        let r = disk_risk(&base(50.0, 5.0));
        assert!(r.available);
        assert_eq!(r.risk, 0.0);
        assert!(r.reasons.is_empty());

        let r = disk_risk(&base(96.0, 5.0));
        assert_eq!(r.risk, 1.0);
        assert_eq!(r.reasons, vec![reason::DISK_FULL]);

        let r = disk_risk(&base(90.0, 5.0));
        assert!((r.risk - 0.7).abs() < 1e-9);
        assert_eq!(r.reasons, vec![reason::DISK_HIGH]);

        let r = disk_risk(&base(50.0, 120.0));
        assert!((r.risk - 0.5).abs() < 1e-9);
        assert_eq!(r.reasons, vec![reason::DISK_IO_CRITICAL]);

        let r = disk_risk(&base(50.0, 70.0));
        assert!((r.risk - 0.2).abs() < 1e-9);
        assert_eq!(r.reasons, vec![reason::DISK_IO_ELEVATED]);

        // Both contribute, capped at 1.0, disk_full listed first.
        let r = disk_risk(&base(96.0, 120.0));
        assert_eq!(r.risk, 1.0);
        assert_eq!(r.reasons, vec![reason::DISK_FULL, reason::DISK_IO_CRITICAL]);
    }

    #[test]
    fn disk_unavailable_without_total() {
        assert!(!disk_risk(&snap(0)).available);
    }

    #[test]
    fn network_latency_bands() {
        let h = History::new();
        let base = |latency: f64| MetricSnapshot {
            network_latency_ms: latency,
            network_rx_bytes: 10 << 20,
            network_tx_bytes: 5 << 20,
            ..snap(0)
        };

        let r = network_risk(&base(20.0), &h);
        assert!(r.available);
        assert_eq!(r.risk, 0.0);

        let r = network_risk(&base(150.0), &h);
        assert!((r.risk - 0.275).abs() < 1e-9);
        assert_eq!(r.reasons, vec![reason::NETWORK_LATENCY_ELEVATED]);

        let r = network_risk(&base(600.0), &h);
        assert!((r.risk - 0.8).abs() < 1e-9);
        assert_eq!(r.reasons, vec![reason::NETWORK_LATENCY_CRITICAL]);
    }

    #[test]
    fn network_error_rate() {
        let mut prev = snap(0);
        prev.network_rx_bytes = 49 << 20;
        prev.network_tx_bytes = 24 << 20;
        let h = history_of(vec![prev]);

        let mut s = snap(1);
        s.network_rx_bytes = 50 << 20;
        s.network_tx_bytes = 25 << 20;
        s.network_rx_errors = 100;
        s.network_tx_errors = 50;
        let r = network_risk(&s, &h);
        assert!(r.reasons.contains(&reason::NETWORK_ERRORS));
        assert!((r.risk - 0.4).abs() < 1e-9);

        // Low error rate band: ~4 errors over ~1398 packets.
        let mut s = snap(1);
        s.network_rx_bytes = 50 << 20;
        s.network_tx_bytes = 25 << 20;
        s.network_rx_errors = 4;
        let r = network_risk(&s, &h);
        assert_eq!(r.reasons, vec![reason::NETWORK_ERRORS_LOW]);
    }

    #[test]
    fn network_counter_wrap_is_zero_delta() {
        let mut prev = snap(0);
        prev.network_rx_bytes = 50 << 20;
        prev.network_tx_bytes = 25 << 20;
        prev.network_rx_errors = 1000;
        let h = history_of(vec![prev]);

        // Counters went backwards: treat all deltas as zero.
        let mut s = snap(1);
        s.network_rx_bytes = 1 << 20;
        s.network_tx_bytes = 1 << 20;
        s.network_rx_errors = 0;
        let r = network_risk(&s, &h);
        assert_eq!(r.risk, 0.0);
        assert!(r.reasons.is_empty());
    }

    #[test]
    fn network_unavailable_without_signal() {
        let h = History::new();
        assert!(!network_risk(&snap(0), &h).available);
    }

    #[test]
    fn slope_of_linear_series() {
        let points: Vec<(f64, f64)> = (0..10).map(|i| (i as f64, 3.0 * i as f64)).collect();
        assert!((least_squares_slope(&points) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn slope_degenerate_inputs() {
        assert_eq!(least_squares_slope(&[]), 0.0);
        assert_eq!(least_squares_slope(&[(0.0, 1.0)]), 0.0);
        // Identical timestamps: zero denominator.
        assert_eq!(least_squares_slope(&[(5.0, 1.0), (5.0, 9.0)]), 0.0);
    }

    #[test]
    fn trend_unavailable_below_min_history() {
        let h = History::new();
        let trends = metric_trends(&h, &snap(0));
        let r = trend_risk(&trends, 5, Duration::from_secs(900));
        assert!(!r.available);
    }

    #[test]
    fn trend_detects_rising_temperature() {
        // 0.5°C/s from 50°C: crosses 85°C in 20s, well inside the horizon.
        let mut snaps = Vec::new();
        for i in 0..50 {
            let mut s = snap(i);
            s.cpu_temperature_celsius = 50.0 + i as f64 * 0.5;
            snaps.push(s);
        }
        let h = history_of(snaps);
        let current = MetricSnapshot {
            cpu_temperature_celsius: 75.0,
            ..snap(50)
        };
        let trends = metric_trends(&h, &current);
        let r = trend_risk(&trends, h.len(), Duration::from_secs(900));
        assert!(r.available);
        assert_eq!(r.risk, 0.8);
        assert_eq!(r.reasons, vec![reason::TREND_RISING_TEMP]);
    }

    #[test]
    fn trend_flat_series_is_zero() {
        let mut snaps = Vec::new();
        for i in 0..50 {
            let mut s = snap(i);
            s.cpu_temperature_celsius = 50.0;
            s.memory_usage_percent = 40.0;
            s.cpu_usage_percent = 30.0;
            snaps.push(s);
        }
        let h = history_of(snaps);
        let current = h.latest().unwrap().clone();
        let trends = metric_trends(&h, &current);
        let r = trend_risk(&trends, h.len(), Duration::from_secs(900));
        assert!(r.available);
        assert_eq!(r.risk, 0.0);
    }

    #[test]
    fn trend_half_risk_within_double_horizon() {
        // Slope chosen so crossing lands between 1x and 2x the horizon:
        // 60°C + 0.02°C/s -> 85°C in 1250s with a 900s horizon.
        let mut snaps = Vec::new();
        for i in 0..50 {
            let mut s = snap(i * 10);
            s.cpu_temperature_celsius = 50.0 + i as f64 * 0.2;
            snaps.push(s);
        }
        let h = history_of(snaps);
        let current = MetricSnapshot {
            cpu_temperature_celsius: 60.0,
            ..snap(500)
        };
        let trends = metric_trends(&h, &current);
        let r = trend_risk(&trends, h.len(), Duration::from_secs(900));
        assert_eq!(r.risk, 0.4);
        assert_eq!(r.reasons, vec![reason::TREND_RISING_TEMP]);
    }

    #[test]
    fn clamp01_maps_nan_to_zero() {
        assert_eq!(clamp01(f64::NAN), 0.0);
        assert_eq!(clamp01(-3.0), 0.0);
        assert_eq!(clamp01(7.0), 1.0);
        assert_eq!(clamp01(0.4), 0.4);
    }
}
