//! Closed vocabulary of prediction reason codes
//!
//! These strings are a stable external contract: the exporter publishes
//! them as label values and operators alert on them. Add codes here, never
//! inline.

pub const INSUFFICIENT_HISTORY: &str = "insufficient_history";
pub const PARTIAL_METRICS_AVAILABLE: &str = "partial_metrics_available";

// Thermal
pub const TEMP_ELEVATED: &str = "temp_elevated";
pub const TEMP_HIGH: &str = "temp_high";
pub const TEMP_CRITICAL: &str = "temp_critical";
pub const THROTTLED: &str = "throttled";
pub const TEMP_RISING: &str = "temp_rising";

// Memory
pub const MEMORY_ELEVATED: &str = "memory_elevated";
pub const MEMORY_HIGH: &str = "memory_high";
pub const MEMORY_CRITICAL: &str = "memory_critical";
pub const OOM_EVENT: &str = "oom_event";
pub const SWAP_PRESSURE: &str = "swap_pressure";

// CPU
pub const CPU_HIGH: &str = "cpu_high";
pub const CPU_SATURATED: &str = "cpu_saturated";
pub const LOAD_HIGH: &str = "load_high";
pub const LOAD_CRITICAL: &str = "load_critical";

// Disk
pub const DISK_HIGH: &str = "disk_high";
pub const DISK_FULL: &str = "disk_full";
pub const DISK_IO_ELEVATED: &str = "disk_io_elevated";
pub const DISK_IO_CRITICAL: &str = "disk_io_critical";

// Network
pub const NETWORK_LATENCY_ELEVATED: &str = "network_latency_elevated";
pub const NETWORK_LATENCY_CRITICAL: &str = "network_latency_critical";
pub const NETWORK_ERRORS_LOW: &str = "network_errors_low";
pub const NETWORK_ERRORS: &str = "network_errors";

// Trend
pub const TREND_RISING_TEMP: &str = "trend_rising_temp";
pub const TREND_RISING_MEMORY: &str = "trend_rising_memory";
pub const TREND_RISING_CPU: &str = "trend_rising_cpu";

/// Every reason code the predictor can emit.
pub const ALL: &[&str] = &[
    INSUFFICIENT_HISTORY,
    PARTIAL_METRICS_AVAILABLE,
    TEMP_ELEVATED,
    TEMP_HIGH,
    TEMP_CRITICAL,
    THROTTLED,
    TEMP_RISING,
    MEMORY_ELEVATED,
    MEMORY_HIGH,
    MEMORY_CRITICAL,
    OOM_EVENT,
    SWAP_PRESSURE,
    CPU_HIGH,
    CPU_SATURATED,
    LOAD_HIGH,
    LOAD_CRITICAL,
    DISK_HIGH,
    DISK_FULL,
    DISK_IO_ELEVATED,
    DISK_IO_CRITICAL,
    NETWORK_LATENCY_ELEVATED,
    NETWORK_LATENCY_CRITICAL,
    NETWORK_ERRORS_LOW,
    NETWORK_ERRORS,
    TREND_RISING_TEMP,
    TREND_RISING_MEMORY,
    TREND_RISING_CPU,
];
