// Reduce a raw Docker stats frame to the owned snapshot shape.

use crate::models::StatsSnapshot;
use bollard::models::ContainerStatsResponse;

/// Convert a raw stats frame. `None` when the CPU samples are absent (the
/// first frame of a cgroup v1 stream carries none). Exposed for unit tests.
pub(crate) fn to_snapshot(s: &ContainerStatsResponse) -> Option<StatsSnapshot> {
    let cpu_stats = s.cpu_stats.as_ref()?;
    let precpu_stats = s.precpu_stats.as_ref()?;

    let cpu_usage = cpu_stats.cpu_usage.as_ref()?;
    let precpu_usage = precpu_stats.cpu_usage.as_ref()?;

    let memory_usage = s.memory_stats.as_ref().and_then(|m| m.usage).unwrap_or(0);
    let memory_limit = s.memory_stats.as_ref().and_then(|m| m.limit).unwrap_or(0);

    Some(StatsSnapshot {
        cpu_total_usage: cpu_usage.total_usage.unwrap_or(0),
        cpu_system_usage: cpu_stats.system_cpu_usage.unwrap_or(0),
        precpu_total_usage: precpu_usage.total_usage.unwrap_or(0),
        precpu_system_usage: precpu_stats.system_cpu_usage.unwrap_or(0),
        online_cpus: cpu_stats.online_cpus.unwrap_or(1) as u64,
        memory_usage_bytes: memory_usage,
        memory_limit_bytes: memory_limit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bollard::models::{
        ContainerCpuStats, ContainerCpuUsage, ContainerMemoryStats, ContainerStatsResponse,
    };

    fn minimal_cpu_stats(total_usage: u64, system_cpu_usage: u64) -> ContainerCpuStats {
        ContainerCpuStats {
            cpu_usage: Some(ContainerCpuUsage {
                total_usage: Some(total_usage),
                ..Default::default()
            }),
            system_cpu_usage: Some(system_cpu_usage),
            online_cpus: Some(2),
            throttling_data: None,
        }
    }

    #[test]
    fn to_snapshot_none_when_cpu_stats_missing() {
        let s = ContainerStatsResponse {
            cpu_stats: None,
            precpu_stats: Some(minimal_cpu_stats(0, 0)),
            ..Default::default()
        };
        assert!(to_snapshot(&s).is_none());
    }

    #[test]
    fn to_snapshot_none_when_precpu_stats_missing() {
        let s = ContainerStatsResponse {
            cpu_stats: Some(minimal_cpu_stats(100, 1000)),
            precpu_stats: None,
            ..Default::default()
        };
        assert!(to_snapshot(&s).is_none());
    }

    #[test]
    fn to_snapshot_maps_counters_and_memory() {
        let s = ContainerStatsResponse {
            cpu_stats: Some(minimal_cpu_stats(100_000_000, 1_000_000_000)),
            precpu_stats: Some(minimal_cpu_stats(50_000_000, 500_000_000)),
            memory_stats: Some(ContainerMemoryStats {
                usage: Some(256 * 1024 * 1024),
                limit: Some(512 * 1024 * 1024),
                ..Default::default()
            }),
            ..Default::default()
        };
        let snap = to_snapshot(&s).unwrap();
        assert_eq!(snap.cpu_total_usage, 100_000_000);
        assert_eq!(snap.cpu_system_usage, 1_000_000_000);
        assert_eq!(snap.precpu_total_usage, 50_000_000);
        assert_eq!(snap.precpu_system_usage, 500_000_000);
        assert_eq!(snap.online_cpus, 2);
        assert_eq!(snap.memory_usage_bytes, 256 * 1024 * 1024);
        assert_eq!(snap.memory_limit_bytes, 512 * 1024 * 1024);
    }

    #[test]
    fn to_snapshot_defaults_missing_memory_to_zero() {
        let s = ContainerStatsResponse {
            cpu_stats: Some(minimal_cpu_stats(100, 1000)),
            precpu_stats: Some(minimal_cpu_stats(50, 500)),
            memory_stats: None,
            ..Default::default()
        };
        let snap = to_snapshot(&s).unwrap();
        assert_eq!(snap.memory_usage_bytes, 0);
        assert_eq!(snap.memory_limit_bytes, 0);
    }
}
