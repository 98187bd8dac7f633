// SQLite-backed metric series store. One namespace per profiled target:
// <data_dir>/<target>/metrics.db holds the five parallel series.

mod reconstruct;

use crate::error::StoreError;
use crate::models::MetricsDatapoint;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;

pub const MEMORY_USAGE: &str = "memory_usage";
pub const MEMORY_LIMIT: &str = "memory_limit";
pub const CPU_ONLINE: &str = "cpu_online";
pub const CPU_USAGE: &str = "cpu_usage";
pub const CPU_PERCENTAGE: &str = "cpu_percentage";

pub const METRIC_NAMES: [&str; 5] = [MEMORY_USAGE, MEMORY_LIMIT, CPU_ONLINE, CPU_USAGE, CPU_PERCENTAGE];

/// One stored (timestamp, value) pair of a metric series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub timestamp_ms: i64,
    pub value: f64,
}

pub struct MetricsRepo {
    pool: SqlitePool,
}

impl MetricsRepo {
    /// Open (creating if needed) the metrics store for `target`.
    pub async fn open(data_dir: &Path, target: &str) -> Result<Self, StoreError> {
        let dir = data_dir.join(target);
        std::fs::create_dir_all(&dir).map_err(|e| StoreError::CreateDir {
            path: dir.clone(),
            source: e,
        })?;
        let db_path = dir.join("metrics.db");
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))
            .map_err(|e| StoreError::Backend {
                operation: "open",
                source: e,
            })?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new()
            .connect_with(opts)
            .await
            .map_err(|e| StoreError::Backend {
                operation: "open",
                source: e,
            })?;
        let repo = Self { pool };
        repo.init().await?;
        Ok(repo)
    }

    async fn init(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS metric_points (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                metric TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                value REAL NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Backend {
            operation: "init",
            source: e,
        })?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_metric_points_metric_ts ON metric_points(metric, timestamp)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Backend {
            operation: "init",
            source: e,
        })?;

        Ok(())
    }

    /// Append one row per metric at the datapoint's timestamp, in a single
    /// transaction. All five series grow together or not at all; positional
    /// reconstruction depends on this.
    #[instrument(skip(self, dp), fields(repo = "metrics", operation = "insert_record"))]
    pub async fn insert_record(&self, dp: &MetricsDatapoint) -> Result<(), StoreError> {
        if self.pool.is_closed() {
            return Err(StoreError::Closed {
                operation: "insert_record",
            });
        }
        let mut tx = self.pool.begin().await.map_err(|e| StoreError::Backend {
            operation: "insert_record",
            source: e,
        })?;
        for (metric, value) in rows(dp) {
            sqlx::query("INSERT INTO metric_points (metric, timestamp, value) VALUES ($1, $2, $3)")
                .bind(metric)
                .bind(dp.timestamp_ms)
                .bind(value)
                .execute(&mut *tx)
                .await
                .map_err(|e| StoreError::Backend {
                    operation: "insert_record",
                    source: e,
                })?;
        }
        tx.commit().await.map_err(|e| StoreError::Backend {
            operation: "insert_record",
            source: e,
        })?;
        Ok(())
    }

    /// Points of one series with timestamp in `[from_ms, to_ms]`, ascending.
    /// Equal timestamps keep insertion order, so every series sees the same
    /// permutation. An empty range is an empty Vec, not an error.
    pub async fn read_series(
        &self,
        metric: &str,
        from_ms: i64,
        to_ms: i64,
    ) -> Result<Vec<SeriesPoint>, StoreError> {
        if self.pool.is_closed() {
            return Err(StoreError::Closed {
                operation: "read_series",
            });
        }
        let rows = sqlx::query(
            "SELECT timestamp, value FROM metric_points
             WHERE metric = $1 AND timestamp >= $2 AND timestamp <= $3
             ORDER BY timestamp ASC, id ASC",
        )
        .bind(metric)
        .bind(from_ms)
        .bind(to_ms)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Backend {
            operation: "read_series",
            source: e,
        })?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let timestamp_ms: i64 = row.try_get("timestamp").map_err(|e| StoreError::Backend {
                operation: "read_series",
                source: e,
            })?;
            let value: f64 = row.try_get("value").map_err(|e| StoreError::Backend {
                operation: "read_series",
                source: e,
            })?;
            out.push(SeriesPoint {
                timestamp_ms,
                value,
            });
        }
        Ok(out)
    }

    /// Reconstruct the full history as composite datapoints, joining the
    /// five series by position. Fails with `SeriesMisaligned` if any series
    /// length disagrees with the memory-usage reference series.
    #[instrument(skip(self), fields(repo = "metrics", operation = "list"))]
    pub async fn list(&self) -> Result<Vec<MetricsDatapoint>, StoreError> {
        let memory_usage = self.read_series(MEMORY_USAGE, 0, i64::MAX).await?;
        let memory_limit = self.read_series(MEMORY_LIMIT, 0, i64::MAX).await?;
        let cpu_online = self.read_series(CPU_ONLINE, 0, i64::MAX).await?;
        let cpu_usage = self.read_series(CPU_USAGE, 0, i64::MAX).await?;
        let cpu_percentage = self.read_series(CPU_PERCENTAGE, 0, i64::MAX).await?;
        reconstruct::join_series(memory_usage, memory_limit, cpu_online, cpu_usage, cpu_percentage)
    }

    /// Flush and release the pool. Closing twice is harmless; later reads
    /// and writes fail with `StoreError::Closed`.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Reconstruct the stored history for `target`: open the repository, join
/// the series, close.
pub async fn list_target(
    data_dir: &Path,
    target: &str,
) -> Result<Vec<MetricsDatapoint>, StoreError> {
    let repo = MetricsRepo::open(data_dir, target).await?;
    let result = repo.list().await;
    repo.close().await;
    result
}

fn rows(dp: &MetricsDatapoint) -> [(&'static str, f64); 5] {
    [
        (MEMORY_USAGE, dp.memory_usage_bytes as f64),
        (MEMORY_LIMIT, dp.memory_limit_bytes as f64),
        (CPU_ONLINE, dp.cpu_online_count as f64),
        (CPU_USAGE, dp.cpu_usage_ns as f64),
        (CPU_PERCENTAGE, dp.cpu_percentage),
    ]
}
