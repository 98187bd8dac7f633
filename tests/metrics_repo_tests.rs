// MetricsRepo tests: open, insert, range reads, reconstruction, misalignment

use docker_profiler::error::StoreError;
use docker_profiler::metrics_repo::{CPU_PERCENTAGE, MEMORY_USAGE, METRIC_NAMES, MetricsRepo};
use docker_profiler::models::MetricsDatapoint;
use std::sync::Arc;
use tempfile::TempDir;

fn datapoint(timestamp_ms: i64) -> MetricsDatapoint {
    MetricsDatapoint {
        timestamp_ms,
        memory_usage_bytes: 134_217_728 + timestamp_ms as u64,
        memory_limit_bytes: 1_073_741_824,
        cpu_online_count: 4,
        cpu_usage_ns: 5_000_000 + timestamp_ms as u64,
        cpu_percentage: timestamp_ms as f64 / 100.0,
    }
}

#[tokio::test]
async fn insert_and_list_round_trip() {
    let dir = TempDir::new().unwrap();
    let repo = MetricsRepo::open(dir.path(), "web").await.unwrap();

    let inputs = vec![datapoint(1000), datapoint(2000), datapoint(3000)];
    for dp in &inputs {
        repo.insert_record(dp).await.unwrap();
    }

    let out = repo.list().await.unwrap();
    assert_eq!(out, inputs);
}

#[tokio::test]
async fn list_empty_store_is_empty() {
    let dir = TempDir::new().unwrap();
    let repo = MetricsRepo::open(dir.path(), "web").await.unwrap();
    assert!(repo.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn read_series_range_is_inclusive_and_idempotent() {
    let dir = TempDir::new().unwrap();
    let repo = MetricsRepo::open(dir.path(), "web").await.unwrap();
    for ts in [1000, 2000, 3000] {
        repo.insert_record(&datapoint(ts)).await.unwrap();
    }

    let first = repo.read_series(MEMORY_USAGE, 1500, 3000).await.unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].timestamp_ms, 2000);
    assert_eq!(first[1].timestamp_ms, 3000);

    let second = repo.read_series(MEMORY_USAGE, 1500, 3000).await.unwrap();
    assert_eq!(first, second);

    let empty = repo.read_series(MEMORY_USAGE, 5000, 6000).await.unwrap();
    assert!(empty.is_empty());
}

#[tokio::test]
async fn concurrent_inserts_keep_series_cardinality_equal() {
    let dir = TempDir::new().unwrap();
    let repo = Arc::new(MetricsRepo::open(dir.path(), "web").await.unwrap());

    let mut handles = Vec::new();
    for task in 0..4i64 {
        let repo = repo.clone();
        handles.push(tokio::spawn(async move {
            for i in 0..10i64 {
                repo.insert_record(&datapoint(task * 1000 + i)).await.unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    for metric in METRIC_NAMES {
        let points = repo.read_series(metric, 0, i64::MAX).await.unwrap();
        assert_eq!(points.len(), 40, "series {metric}");
    }
    assert_eq!(repo.list().await.unwrap().len(), 40);
}

#[tokio::test]
async fn closed_store_rejects_reads_and_writes() {
    let dir = TempDir::new().unwrap();
    let repo = MetricsRepo::open(dir.path(), "web").await.unwrap();
    repo.insert_record(&datapoint(1000)).await.unwrap();

    repo.close().await;
    assert!(matches!(
        repo.insert_record(&datapoint(2000)).await.unwrap_err(),
        StoreError::Closed {
            operation: "insert_record"
        }
    ));
    assert!(matches!(
        repo.read_series(MEMORY_USAGE, 0, i64::MAX).await.unwrap_err(),
        StoreError::Closed {
            operation: "read_series"
        }
    ));

    // Double close must not corrupt the stored data.
    repo.close().await;
    let reopened = MetricsRepo::open(dir.path(), "web").await.unwrap();
    assert_eq!(reopened.list().await.unwrap(), vec![datapoint(1000)]);
}

#[tokio::test]
async fn misaligned_series_is_a_hard_failure() {
    let dir = TempDir::new().unwrap();
    let repo = MetricsRepo::open(dir.path(), "web").await.unwrap();
    for ts in [1000, 2000, 3000] {
        repo.insert_record(&datapoint(ts)).await.unwrap();
    }

    // Drop one row of one series behind the repo's back.
    let db_path = dir.path().join("web").join("metrics.db");
    let opts = sqlx::sqlite::SqliteConnectOptions::new()
        .filename(&db_path)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);
    let raw = sqlx::sqlite::SqlitePoolOptions::new()
        .connect_with(opts)
        .await
        .unwrap();
    sqlx::query(
        "DELETE FROM metric_points WHERE id =
         (SELECT id FROM metric_points WHERE metric = $1 ORDER BY id DESC LIMIT 1)",
    )
    .bind(CPU_PERCENTAGE)
    .execute(&raw)
    .await
    .unwrap();
    raw.close().await;

    match repo.list().await.unwrap_err() {
        StoreError::SeriesMisaligned {
            metric,
            expected,
            found,
        } => {
            assert_eq!(metric, CPU_PERCENTAGE);
            assert_eq!(expected, 3);
            assert_eq!(found, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
}
