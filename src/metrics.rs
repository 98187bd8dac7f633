// Derive normalized metrics from a raw stats snapshot.

use crate::models::{MetricsDatapoint, StatsSnapshot};

/// CPU usage as a percentage of the host, normalized across online CPUs.
///
/// Both deltas must be positive; a first sample or a counter reset yields
/// exactly 0. The result is bounded by `online_cpus * 100` and is not
/// clamped further.
pub fn cpu_percentage(s: &StatsSnapshot) -> f64 {
    let cpu_delta = s.cpu_total_usage as i64 - s.precpu_total_usage as i64;
    let system_delta = s.cpu_system_usage as i64 - s.precpu_system_usage as i64;
    if cpu_delta > 0 && system_delta > 0 {
        (cpu_delta as f64 / system_delta as f64) * s.online_cpus as f64 * 100.0
    } else {
        0.0
    }
}

/// Turn one snapshot into the datapoint persisted at `timestamp_ms`.
pub fn derive(s: &StatsSnapshot, timestamp_ms: i64) -> MetricsDatapoint {
    MetricsDatapoint {
        timestamp_ms,
        memory_usage_bytes: s.memory_usage_bytes,
        memory_limit_bytes: s.memory_limit_bytes,
        cpu_online_count: s.online_cpus,
        cpu_usage_ns: s.cpu_total_usage,
        cpu_percentage: cpu_percentage(s),
    }
}
