//! Parsers for the procfs text formats
//!
//! Pure functions over file contents so they can be tested against fixture
//! strings without a real /proc.

/// Bytes per sector in /proc/diskstats counters.
pub(crate) const SECTOR_SIZE: u64 = 512;

/// Load averages from /proc/loadavg: `0.52 0.58 0.59 1/467 12345`.
pub(crate) fn parse_loadavg(content: &str) -> Option<(f64, f64, f64)> {
    let mut fields = content.split_whitespace();
    let l1 = fields.next()?.parse().ok()?;
    let l5 = fields.next()?.parse().ok()?;
    let l15 = fields.next()?.parse().ok()?;
    Some((l1, l5, l15))
}

/// Memory figures from /proc/meminfo (values are in kB).
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct MemInfo {
    pub total_bytes: u64,
    pub available_bytes: u64,
    pub swap_total_bytes: u64,
    pub swap_free_bytes: u64,
}

impl MemInfo {
    pub(crate) fn usage_percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        let used = self.total_bytes.saturating_sub(self.available_bytes);
        used as f64 / self.total_bytes as f64 * 100.0
    }

    pub(crate) fn swap_used_bytes(&self) -> u64 {
        self.swap_total_bytes.saturating_sub(self.swap_free_bytes)
    }
}

pub(crate) fn parse_meminfo(content: &str) -> MemInfo {
    let mut info = MemInfo::default();
    for line in content.lines() {
        let mut parts = line.split_whitespace();
        let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };
        let Ok(kb) = value.parse::<u64>() else {
            continue;
        };
        let bytes = kb.saturating_mul(1024);
        match key {
            "MemTotal:" => info.total_bytes = bytes,
            "MemAvailable:" => info.available_bytes = bytes,
            "SwapTotal:" => info.swap_total_bytes = bytes,
            "SwapFree:" => info.swap_free_bytes = bytes,
            _ => {}
        }
    }
    info
}

/// Aggregate CPU jiffies from the `cpu ` line of /proc/stat.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct CpuTimes {
    pub idle: u64,
    pub total: u64,
}

pub(crate) fn parse_stat_cpu(content: &str) -> Option<CpuTimes> {
    let line = content
        .lines()
        .find(|l| l.starts_with("cpu ") || l.starts_with("cpu\t"))?;
    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .filter_map(|f| f.parse().ok())
        .collect();
    if fields.len() < 4 {
        return None;
    }
    // user nice system idle iowait irq softirq steal ...
    let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
    let total: u64 = fields.iter().sum();
    Some(CpuTimes { idle, total })
}

/// Busy percentage between two /proc/stat readings. A non-advancing or
/// wrapped counter yields 0.
pub(crate) fn cpu_usage_percent(prev: CpuTimes, current: CpuTimes) -> f64 {
    let total_delta = current.total.saturating_sub(prev.total);
    if total_delta == 0 {
        return 0.0;
    }
    let idle_delta = current.idle.saturating_sub(prev.idle);
    let busy = total_delta.saturating_sub(idle_delta);
    (busy as f64 / total_delta as f64 * 100.0).clamp(0.0, 100.0)
}

/// Per-interface counters from /proc/net/dev.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct NetDevStats {
    pub rx_bytes: u64,
    pub rx_errors: u64,
    pub tx_bytes: u64,
    pub tx_errors: u64,
}

pub(crate) fn parse_net_dev(content: &str, interface: &str) -> Option<NetDevStats> {
    for line in content.lines().skip(2) {
        let Some((name, rest)) = line.split_once(':') else {
            continue;
        };
        if name.trim() != interface {
            continue;
        }
        let fields: Vec<u64> = rest
            .split_whitespace()
            .filter_map(|f| f.parse().ok())
            .collect();
        if fields.len() < 12 {
            return None;
        }
        // rx: bytes packets errs drop fifo frame compressed multicast
        // tx: bytes packets errs ...
        return Some(NetDevStats {
            rx_bytes: fields[0],
            rx_errors: fields[2],
            tx_bytes: fields[8],
            tx_errors: fields[10],
        });
    }
    None
}

/// First interface in /proc/net/dev that is not loopback and has seen
/// traffic.
pub(crate) fn detect_interface(content: &str) -> Option<String> {
    for line in content.lines().skip(2) {
        let Some((name, rest)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        if name == "lo" {
            continue;
        }
        let rx_bytes: u64 = rest
            .split_whitespace()
            .next()
            .and_then(|f| f.parse().ok())
            .unwrap_or(0);
        if rx_bytes > 0 {
            return Some(name.to_string());
        }
    }
    None
}

/// I/O counters for one block device from /proc/diskstats.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct DiskCounters {
    pub reads_completed: u64,
    pub sectors_read: u64,
    pub read_time_ms: u64,
    pub writes_completed: u64,
    pub sectors_written: u64,
    pub write_time_ms: u64,
}

impl DiskCounters {
    pub(crate) fn read_bytes(&self) -> u64 {
        self.sectors_read.saturating_mul(SECTOR_SIZE)
    }

    pub(crate) fn write_bytes(&self) -> u64 {
        self.sectors_written.saturating_mul(SECTOR_SIZE)
    }
}

pub(crate) fn parse_diskstats(content: &str, device: &str) -> Option<DiskCounters> {
    for line in content.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 14 || fields[2] != device {
            continue;
        }
        let num = |i: usize| fields[i].parse::<u64>().unwrap_or(0);
        return Some(DiskCounters {
            reads_completed: num(3),
            sectors_read: num(5),
            read_time_ms: num(6),
            writes_completed: num(7),
            sectors_written: num(9),
            write_time_ms: num(10),
        });
    }
    None
}

/// Average ms per I/O between two diskstats readings; wrapped counters
/// count as zero and a zero op count yields 0.
pub(crate) fn io_latency_ms(prev: DiskCounters, current: DiskCounters) -> f64 {
    let ops = current
        .reads_completed
        .saturating_sub(prev.reads_completed)
        + current
            .writes_completed
            .saturating_sub(prev.writes_completed);
    if ops == 0 {
        return 0.0;
    }
    let time_ms = current.read_time_ms.saturating_sub(prev.read_time_ms)
        + current.write_time_ms.saturating_sub(prev.write_time_ms);
    time_ms as f64 / ops as f64
}

/// First whole-disk device in /proc/diskstats (skips partitions, loop and
/// ram devices).
pub(crate) fn detect_disk(content: &str) -> Option<String> {
    for line in content.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 14 {
            continue;
        }
        let name = fields[2];
        if is_whole_disk(name) {
            return Some(name.to_string());
        }
    }
    None
}

fn is_whole_disk(name: &str) -> bool {
    if name.starts_with("loop") || name.starts_with("ram") || name.starts_with("dm-") {
        return false;
    }
    // sdX / vdX / xvdX without a partition digit
    for prefix in ["sd", "vd", "xvd"] {
        if let Some(rest) = name.strip_prefix(prefix) {
            return rest.len() == 1 && rest.chars().all(|c| c.is_ascii_lowercase());
        }
    }
    // nvme0n1 but not nvme0n1p1, mmcblk0 but not mmcblk0p1
    if name.starts_with("nvme") || name.starts_with("mmcblk") {
        return !name.contains('p');
    }
    false
}

/// Cumulative OOM kill count from /proc/vmstat.
pub(crate) fn parse_vmstat_oom(content: &str) -> Option<u64> {
    for line in content.lines() {
        let mut parts = line.split_whitespace();
        if parts.next() == Some("oom_kill") {
            return parts.next()?.parse().ok();
        }
    }
    None
}
