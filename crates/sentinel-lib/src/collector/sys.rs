//! Readers for the sysfs thermal and cpufreq hierarchies

use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

/// Thermal zone types treated as CPU temperature sources, in preference
/// order over a plain maximum across all zones.
const CPU_ZONE_HINTS: &[&str] = &["cpu", "x86_pkg_temp", "soc", "core"];

/// CPU temperature in °C from /sys/class/thermal.
///
/// Prefers zones whose type looks CPU-related; otherwise takes the hottest
/// zone. Values in sysfs are milli-degrees.
pub(crate) async fn read_temperature(sys_path: &Path) -> Result<f64> {
    let thermal_dir = sys_path.join("class/thermal");
    let mut entries = fs::read_dir(&thermal_dir)
        .await
        .with_context(|| format!("read {}", thermal_dir.display()))?;

    let mut cpu_temp: Option<f64> = None;
    let mut max_temp: Option<f64> = None;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with("thermal_zone") {
            continue;
        }
        let zone = entry.path();
        let Ok(raw) = fs::read_to_string(zone.join("temp")).await else {
            continue;
        };
        let Ok(milli) = raw.trim().parse::<i64>() else {
            continue;
        };
        let celsius = milli as f64 / 1000.0;

        let zone_type = fs::read_to_string(zone.join("type"))
            .await
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        if CPU_ZONE_HINTS.iter().any(|h| zone_type.contains(h)) {
            cpu_temp = Some(cpu_temp.map_or(celsius, |t: f64| t.max(celsius)));
        }
        max_temp = Some(max_temp.map_or(celsius, |t: f64| t.max(celsius)));
    }

    cpu_temp
        .or(max_temp)
        .context("no readable thermal zones")
}

/// Current CPU frequency in MHz from cpufreq (sysfs reports kHz).
pub(crate) async fn read_frequency_mhz(sys_path: &Path) -> Result<f64> {
    let path = sys_path.join("devices/system/cpu/cpu0/cpufreq/scaling_cur_freq");
    let raw = fs::read_to_string(&path)
        .await
        .with_context(|| format!("read {}", path.display()))?;
    let khz: u64 = raw.trim().parse().context("parse scaling_cur_freq")?;
    Ok(khz as f64 / 1000.0)
}

/// Cumulative core thermal-throttle events for cpu0. The collector compares
/// successive readings to flag active throttling.
pub(crate) async fn read_throttle_count(sys_path: &Path) -> Result<u64> {
    let path = sys_path.join("devices/system/cpu/cpu0/thermal_throttle/core_throttle_count");
    let raw = fs::read_to_string(&path)
        .await
        .with_context(|| format!("read {}", path.display()))?;
    raw.trim().parse().context("parse core_throttle_count")
}
