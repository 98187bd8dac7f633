// Domain models: owned stats snapshot and the reconstructed datapoint.

use crate::format;
use serde::Serialize;

/// One stats reading for a container, reduced to the fields this crate
/// consumes. The Docker stats API embeds the previous sample's counters in
/// every frame (`precpu_stats`), so CPU deltas need no local history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsSnapshot {
    /// Container CPU time consumed, nanoseconds (monotonic counter).
    pub cpu_total_usage: u64,
    /// Host-wide CPU time, nanoseconds (monotonic counter).
    pub cpu_system_usage: u64,
    pub precpu_total_usage: u64,
    pub precpu_system_usage: u64,
    pub online_cpus: u64,
    pub memory_usage_bytes: u64,
    pub memory_limit_bytes: u64,
}

/// A running container as reported by the runtime (name has the leading `/`
/// already stripped).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInfo {
    pub id: String,
    pub name: String,
}

/// Per-timestamp union of the five tracked metrics, reconstructed from the
/// stored series for display and reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsDatapoint {
    pub timestamp_ms: i64,
    pub memory_usage_bytes: u64,
    pub memory_limit_bytes: u64,
    pub cpu_online_count: u64,
    pub cpu_usage_ns: u64,
    pub cpu_percentage: f64,
}

impl MetricsDatapoint {
    pub fn memory_usage_str(&self) -> String {
        format::format_memory(self.memory_usage_bytes)
    }

    pub fn memory_limit_str(&self) -> String {
        format::format_memory(self.memory_limit_bytes)
    }
}
