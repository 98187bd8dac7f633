// Positional join of the five metric series back into composite datapoints.

use super::{CPU_ONLINE, CPU_PERCENTAGE, CPU_USAGE, MEMORY_LIMIT, SeriesPoint};
use crate::error::StoreError;
use crate::models::MetricsDatapoint;

/// Join by index. Valid only because `insert_record` appends one row to each
/// series per datapoint; lengths are checked against the memory-usage
/// reference series and a mismatch is a hard failure, never a truncated or
/// zero-filled result.
pub(crate) fn join_series(
    memory_usage: Vec<SeriesPoint>,
    memory_limit: Vec<SeriesPoint>,
    cpu_online: Vec<SeriesPoint>,
    cpu_usage: Vec<SeriesPoint>,
    cpu_percentage: Vec<SeriesPoint>,
) -> Result<Vec<MetricsDatapoint>, StoreError> {
    let expected = memory_usage.len();
    for (metric, found) in [
        (MEMORY_LIMIT, memory_limit.len()),
        (CPU_ONLINE, cpu_online.len()),
        (CPU_USAGE, cpu_usage.len()),
        (CPU_PERCENTAGE, cpu_percentage.len()),
    ] {
        if found != expected {
            return Err(StoreError::SeriesMisaligned {
                metric,
                expected,
                found,
            });
        }
    }

    let mut out = Vec::with_capacity(expected);
    for i in 0..expected {
        out.push(MetricsDatapoint {
            timestamp_ms: memory_usage[i].timestamp_ms,
            memory_usage_bytes: memory_usage[i].value as u64,
            memory_limit_bytes: memory_limit[i].value as u64,
            cpu_online_count: cpu_online[i].value as u64,
            cpu_usage_ns: cpu_usage[i].value as u64,
            cpu_percentage: cpu_percentage[i].value,
        });
    }
    Ok(out)
}
