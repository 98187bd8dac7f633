// Collection session: one worker task per matched container stream, joined
// before the call returns. Faults stay local to their stream and are
// aggregated into the summary.

use crate::error::{CollectError, SourceError, StreamFault};
use crate::metrics;
use crate::metrics_repo::MetricsRepo;
use crate::models::{ContainerInfo, StatsSnapshot};
use crate::source::StatsSource;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

/// Outcome of one collection session. Per-stream faults are collected here
/// rather than aborting the session.
#[derive(Debug, Default)]
pub struct CollectSummary {
    pub streams: usize,
    pub records: u64,
    pub decode_failures: u64,
    pub cancelled: bool,
    pub faults: Vec<StreamFault>,
}

pub struct Collector<S> {
    source: S,
    data_dir: PathBuf,
    cancel_on_first_error: bool,
}

impl<S: StatsSource> Collector<S> {
    pub fn new(source: S, data_dir: impl Into<PathBuf>, cancel_on_first_error: bool) -> Self {
        Self {
            source,
            data_dir: data_dir.into(),
            cancel_on_first_error,
        }
    }

    /// Profile every running container whose name matches `target` (exact,
    /// ASCII-case-insensitive, leading `/` stripped). Returns once every
    /// stream has terminated or `shutdown` fires.
    ///
    /// Each matched container writes to the repository of its own normalized
    /// name; records are persisted in the order their frames arrive.
    pub async fn collect(
        &self,
        target: &str,
        shutdown: watch::Receiver<bool>,
    ) -> Result<CollectSummary, CollectError> {
        let target_name = normalize_name(target);
        let containers = self
            .source
            .list_containers()
            .await
            .map_err(CollectError::ListContainers)?;

        let matches: Vec<ContainerInfo> = containers
            .into_iter()
            .filter(|c| normalize_name(&c.name).eq_ignore_ascii_case(target_name))
            .collect();
        if matches.is_empty() {
            return Err(CollectError::NoMatch(target_name.to_string()));
        }

        // Open every repository before the first worker starts, so a failed
        // open aborts the session with nothing half-running. Two containers
        // with the same normalized name share one repository.
        let mut repos: HashMap<String, Arc<MetricsRepo>> = HashMap::new();
        let mut workers: Vec<(ContainerInfo, Arc<MetricsRepo>)> = Vec::with_capacity(matches.len());
        for c in matches {
            let name = normalize_name(&c.name).to_string();
            let repo = match repos.get(&name) {
                Some(repo) => repo.clone(),
                None => {
                    let repo = Arc::new(MetricsRepo::open(&self.data_dir, &name).await.map_err(
                        |e| CollectError::OpenRepository {
                            name: name.clone(),
                            source: e,
                        },
                    )?);
                    repos.insert(name, repo.clone());
                    repo
                }
            };
            workers.push((c, repo));
        }

        // Session-wide cancel signal: fed by external shutdown, and by the
        // first stream fault when cancel_on_first_error is set.
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let forward = {
            let cancel_tx = cancel_tx.clone();
            let mut shutdown = shutdown;
            tokio::spawn(async move {
                while shutdown.changed().await.is_ok() {
                    if *shutdown.borrow() {
                        let _ = cancel_tx.send(true);
                        break;
                    }
                }
            })
        };

        let mut handles = Vec::with_capacity(workers.len());
        for (c, repo) in workers {
            let name = normalize_name(&c.name).to_string();
            tracing::info!(container = %name, id = %c.id, "profiling container");
            let stream = self.source.stats_stream(&c.id);
            handles.push(tokio::spawn(run_stream(StreamWorker {
                container: name,
                stream,
                repo,
                cancel_rx: cancel_rx.clone(),
                cancel_tx: cancel_tx.clone(),
                cancel_on_fault: self.cancel_on_first_error,
            })));
        }

        let mut summary = CollectSummary {
            streams: handles.len(),
            ..Default::default()
        };
        for handle in handles {
            match handle.await {
                Ok(report) => {
                    summary.records += report.records;
                    summary.decode_failures += report.decode_failures;
                    summary.cancelled |= report.cancelled;
                    if let Some(fault) = report.fault {
                        summary.faults.push(fault);
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "stream worker task failed to join");
                }
            }
        }
        forward.abort();

        for repo in repos.values() {
            repo.close().await;
        }

        tracing::info!(
            streams = summary.streams,
            records = summary.records,
            decode_failures = summary.decode_failures,
            faults = summary.faults.len(),
            cancelled = summary.cancelled,
            "collection session ended"
        );
        Ok(summary)
    }
}

pub fn normalize_name(name: &str) -> &str {
    name.trim_start_matches('/')
}

#[derive(Debug, Default)]
struct StreamReport {
    records: u64,
    decode_failures: u64,
    cancelled: bool,
    fault: Option<StreamFault>,
}

struct StreamWorker {
    container: String,
    stream: BoxStream<'static, Result<StatsSnapshot, SourceError>>,
    repo: Arc<MetricsRepo>,
    cancel_rx: watch::Receiver<bool>,
    cancel_tx: watch::Sender<bool>,
    cancel_on_fault: bool,
}

/// Drive one stream to termination. Every frame is derived and persisted
/// before the next frame is read, so write order equals receive order.
/// Dropping the stream on return releases the underlying connection.
async fn run_stream(worker: StreamWorker) -> StreamReport {
    let StreamWorker {
        container,
        mut stream,
        repo,
        mut cancel_rx,
        cancel_tx,
        cancel_on_fault,
    } = worker;
    let mut report = StreamReport::default();

    loop {
        tokio::select! {
            changed = cancel_rx.changed() => {
                if changed.is_err() || *cancel_rx.borrow() {
                    report.cancelled = true;
                    break;
                }
            }
            item = stream.next() => {
                match item {
                    None => break,
                    Some(Ok(snapshot)) => {
                        let dp = metrics::derive(&snapshot, now_ms());
                        tracing::debug!(
                            container = %container,
                            cpu_percentage = dp.cpu_percentage,
                            cpu_online = dp.cpu_online_count,
                            memory_usage = %dp.memory_usage_str(),
                            memory_limit = %dp.memory_limit_str(),
                            "stats frame"
                        );
                        if let Err(e) = repo.insert_record(&dp).await {
                            tracing::warn!(container = %container, error = %e, "persisting datapoint failed");
                            report.fault = Some(StreamFault::Persist {
                                container: container.clone(),
                                source: e,
                            });
                            if cancel_on_fault {
                                let _ = cancel_tx.send(true);
                            }
                            break;
                        }
                        report.records += 1;
                    }
                    Some(Err(SourceError::Decode(msg))) => {
                        report.decode_failures += 1;
                        tracing::warn!(container = %container, error = %msg, "malformed stats frame, skipping");
                    }
                    Some(Err(e)) => {
                        tracing::warn!(container = %container, error = %e, "stats stream failed");
                        report.fault = Some(StreamFault::Transport {
                            container: container.clone(),
                            source: e,
                        });
                        if cancel_on_fault {
                            let _ = cancel_tx.send(true);
                        }
                        break;
                    }
                }
            }
        }
    }
    tracing::info!(container = %container, records = report.records, "stats stream ended");
    report
}

fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, operation = "get_timestamp", "system time error");
            0
        })
}
