// Shared test helpers

use docker_profiler::models::StatsSnapshot;

/// Snapshot `seq` of a synthetic stream: counters advance by a fixed step
/// each frame (so CPU percentage is 20% on 2 CPUs) and memory usage grows
/// one MiB per frame.
pub fn snapshot(seq: u64) -> StatsSnapshot {
    StatsSnapshot {
        cpu_total_usage: 100_000_000 * (seq + 1),
        cpu_system_usage: 1_000_000_000 * (seq + 1),
        precpu_total_usage: 100_000_000 * seq,
        precpu_system_usage: 1_000_000_000 * seq,
        online_cpus: 2,
        memory_usage_bytes: (64 + seq) * 1024 * 1024,
        memory_limit_bytes: 512 * 1024 * 1024,
    }
}
