//! Node metrics collection from procfs and sysfs
//!
//! Reads CPU, memory, disk and network health figures for the whole node.
//! Every source is optional: a failed read leaves its fields at zero (the
//! "absent" sentinel the predictor understands) and appends a note to the
//! snapshot's error list, which the health check consumes.

mod proc;
mod sys;


use crate::models::MetricSnapshot;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use proc::{CpuTimes, DiskCounters};
use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::fs;

/// Source of node metric snapshots.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Collect a snapshot. Always yields one; partial failures are recorded
    /// in the snapshot's `errors` list.
    async fn collect(&self) -> MetricSnapshot;
}

/// Counters remembered between collections for delta-based figures.
#[derive(Debug, Default)]
struct DeltaState {
    cpu: Option<CpuTimes>,
    disk: Option<DiskCounters>,
    throttle_events: Option<u64>,
}

/// Procfs/sysfs collector for a Linux node.
pub struct Collector {
    node_name: String,
    proc_path: PathBuf,
    sys_path: PathBuf,
    disk_device: Option<String>,
    disk_mount: PathBuf,
    network_interface: Option<String>,
    latency_probe: Option<String>,
    state: Mutex<DeltaState>,
}

impl Collector {
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
            proc_path: PathBuf::from("/proc"),
            sys_path: PathBuf::from("/sys"),
            disk_device: None,
            disk_mount: PathBuf::from("/"),
            network_interface: None,
            latency_probe: None,
            state: Mutex::new(DeltaState::default()),
        }
    }

    /// Custom /proc root (fixture trees in tests).
    pub fn with_proc_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.proc_path = path.into();
        self
    }

    /// Custom /sys root (fixture trees in tests).
    pub fn with_sys_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.sys_path = path.into();
        self
    }

    /// Primary block device to monitor; auto-detected when unset.
    pub fn with_disk_device(mut self, device: impl Into<String>) -> Self {
        self.disk_device = Some(device.into());
        self
    }

    /// Mount point used for disk capacity figures (default `/`).
    pub fn with_disk_mount(mut self, path: impl Into<PathBuf>) -> Self {
        self.disk_mount = path.into();
        self
    }

    /// Network interface to monitor; auto-detected when unset.
    pub fn with_network_interface(mut self, interface: impl Into<String>) -> Self {
        self.network_interface = Some(interface.into());
        self
    }

    /// TCP endpoint whose connect time is reported as network latency.
    /// Latency stays absent when unset.
    pub fn with_latency_probe(mut self, addr: impl Into<String>) -> Self {
        self.latency_probe = Some(addr.into());
        self
    }

    /// Gather all node metrics. Never fails outright; see [`MetricsSource`].
    pub async fn collect(&self) -> MetricSnapshot {
        let started = Instant::now();
        let mut m = MetricSnapshot::empty(Utc::now().timestamp(), self.node_name.clone());

        self.collect_load(&mut m).await;
        self.collect_memory(&mut m).await;
        self.collect_cpu(&mut m).await;
        self.collect_thermal(&mut m).await;
        self.collect_disk(&mut m).await;
        self.collect_network(&mut m).await;

        m.collection_duration_ms = started.elapsed().as_secs_f64() * 1000.0;
        m
    }

    async fn collect_load(&self, m: &mut MetricSnapshot) {
        match fs::read_to_string(self.proc_path.join("loadavg")).await {
            Ok(content) => match proc::parse_loadavg(&content) {
                Some((l1, l5, l15)) => {
                    m.load_average_1min = l1;
                    m.load_average_5min = l5;
                    m.load_average_15min = l15;
                }
                None => m.errors.push("loadavg: unparseable".to_string()),
            },
            Err(e) => m.errors.push(format!("loadavg: {e}")),
        }
    }

    async fn collect_memory(&self, m: &mut MetricSnapshot) {
        match fs::read_to_string(self.proc_path.join("meminfo")).await {
            Ok(content) => {
                let info = proc::parse_meminfo(&content);
                m.memory_total_bytes = info.total_bytes;
                m.memory_available_bytes = info.available_bytes;
                m.memory_usage_percent = info.usage_percent();
                m.swap_total_bytes = info.swap_total_bytes;
                m.swap_used_bytes = info.swap_used_bytes();
            }
            Err(e) => m.errors.push(format!("meminfo: {e}")),
        }

        match fs::read_to_string(self.proc_path.join("vmstat")).await {
            Ok(content) => {
                if let Some(count) = proc::parse_vmstat_oom(&content) {
                    m.oom_kill_count = count;
                }
                // Older kernels have no oom_kill line; not an error.
            }
            Err(e) => m.errors.push(format!("vmstat: {e}")),
        }
    }

    async fn collect_cpu(&self, m: &mut MetricSnapshot) {
        match fs::read_to_string(self.proc_path.join("stat")).await {
            Ok(content) => match proc::parse_stat_cpu(&content) {
                Some(current) => {
                    let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
                    if let Some(prev) = state.cpu {
                        m.cpu_usage_percent = proc::cpu_usage_percent(prev, current);
                    }
                    state.cpu = Some(current);
                }
                None => m.errors.push("stat: no cpu line".to_string()),
            },
            Err(e) => m.errors.push(format!("stat: {e}")),
        }
    }

    async fn collect_thermal(&self, m: &mut MetricSnapshot) {
        match sys::read_temperature(&self.sys_path).await {
            Ok(temp) => m.cpu_temperature_celsius = temp,
            Err(e) => m.errors.push(format!("thermal: {e}")),
        }

        match sys::read_frequency_mhz(&self.sys_path).await {
            Ok(mhz) => m.cpu_frequency_mhz = mhz,
            Err(e) => m.errors.push(format!("cpufreq: {e}")),
        }

        // Throttling is flagged when the cumulative throttle-event counter
        // advanced since the previous collection.
        if let Ok(events) = sys::read_throttle_count(&self.sys_path).await {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(prev) = state.throttle_events {
                m.cpu_throttled = events > prev;
            }
            state.throttle_events = Some(events);
        }
    }

    async fn collect_disk(&self, m: &mut MetricSnapshot) {
        match statvfs(&self.disk_mount) {
            Ok((total, used)) => {
                m.disk_total_bytes = total;
                m.disk_used_bytes = used;
                if total > 0 {
                    m.disk_usage_percent = used as f64 / total as f64 * 100.0;
                }
            }
            Err(e) => m.errors.push(format!("statvfs {}: {e}", self.disk_mount.display())),
        }

        let content = match fs::read_to_string(self.proc_path.join("diskstats")).await {
            Ok(c) => c,
            Err(e) => {
                m.errors.push(format!("diskstats: {e}"));
                return;
            }
        };
        let device = match &self.disk_device {
            Some(d) => d.clone(),
            None => match proc::detect_disk(&content) {
                Some(d) => d,
                None => {
                    m.errors.push("diskstats: no disk device found".to_string());
                    return;
                }
            },
        };
        match proc::parse_diskstats(&content, &device) {
            Some(counters) => {
                m.disk_io_read_bytes = counters.read_bytes();
                m.disk_io_write_bytes = counters.write_bytes();
                let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
                if let Some(prev) = state.disk {
                    m.disk_io_latency_ms = proc::io_latency_ms(prev, counters);
                }
                state.disk = Some(counters);
            }
            None => m.errors.push(format!("diskstats: device {device} not found")),
        }
    }

    async fn collect_network(&self, m: &mut MetricSnapshot) {
        match fs::read_to_string(self.proc_path.join("net/dev")).await {
            Ok(content) => {
                let interface = match &self.network_interface {
                    Some(i) => Some(i.clone()),
                    None => proc::detect_interface(&content),
                };
                match interface {
                    Some(iface) => match proc::parse_net_dev(&content, &iface) {
                        Some(stats) => {
                            m.network_rx_bytes = stats.rx_bytes;
                            m.network_rx_errors = stats.rx_errors;
                            m.network_tx_bytes = stats.tx_bytes;
                            m.network_tx_errors = stats.tx_errors;
                        }
                        None => m
                            .errors
                            .push(format!("net/dev: interface {iface} not found")),
                    },
                    None => m.errors.push("net/dev: no active interface".to_string()),
                }
            }
            Err(e) => m.errors.push(format!("net/dev: {e}")),
        }

        if let Some(addr) = &self.latency_probe {
            match probe_latency(addr).await {
                Ok(ms) => m.network_latency_ms = ms,
                Err(e) => m.errors.push(format!("latency probe {addr}: {e}")),
            }
        }
    }
}

#[async_trait]
impl MetricsSource for Collector {
    async fn collect(&self) -> MetricSnapshot {
        Collector::collect(self).await
    }
}

/// Filesystem capacity for a mount point: `(total_bytes, used_bytes)`.
fn statvfs(path: &Path) -> Result<(u64, u64)> {
    let c_path = CString::new(path.as_os_str().as_bytes()).context("mount path contains NUL")?;
    let mut vfs: libc::statvfs = unsafe { std::mem::zeroed() };
    // SAFETY: c_path outlives the call and vfs is a plain output struct.
    let rc = unsafe { libc::statvfs(c_path.as_ptr(), &mut vfs) };
    if rc != 0 {
        return Err(anyhow::Error::from(std::io::Error::last_os_error()))
            .with_context(|| format!("statvfs {}", path.display()));
    }
    let frsize = if vfs.f_frsize > 0 {
        vfs.f_frsize as u64
    } else {
        vfs.f_bsize as u64
    };
    let total = (vfs.f_blocks as u64).saturating_mul(frsize);
    let free = (vfs.f_bfree as u64).saturating_mul(frsize);
    Ok((total, total.saturating_sub(free)))
}

/// TCP connect time to the probe endpoint, in milliseconds.
async fn probe_latency(addr: &str) -> Result<f64> {
    let started = Instant::now();
    let stream = tokio::time::timeout(
        Duration::from_secs(1),
        tokio::net::TcpStream::connect(addr),
    )
    .await
    .context("connect timed out")??;
    drop(stream);
    Ok(started.elapsed().as_secs_f64() * 1000.0)
}
