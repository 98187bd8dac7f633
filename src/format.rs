// Numeric formatting helpers for memory sizes and percentages.

const UNITS: [&str; 4] = ["", "k", "m", "g"];

/// Scale a byte count in 1024 steps and render with two decimals and a
/// unit suffix, e.g. `134217728` -> `"128.00m"`. Values past the gigabyte
/// step stay in `g`.
pub fn format_memory(value: u64) -> String {
    scale(value as f64, 0)
}

fn scale(value: f64, unit: usize) -> String {
    if value > 1024.0 && unit + 1 < UNITS.len() {
        return scale(value / 1024.0, unit + 1);
    }
    format!("{value:.2}{}", UNITS[unit])
}

/// Render a byte count as a plain MiB figure, e.g. `1073741824` -> `"1024.00"`.
pub fn format_mib(value: u64) -> String {
    format!("{:.2}", value as f64 / (1024.0 * 1024.0))
}

/// Percentage of `value` against `limit`; 0 when the limit is unset.
pub fn percentage(value: u64, limit: u64) -> f64 {
    if limit == 0 {
        return 0.0;
    }
    (value as f64 / limit as f64) * 100.0
}
