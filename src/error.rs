// Typed errors for the collector and the metrics store.

use std::path::PathBuf;

/// Failure from a stats source (the runtime collaborator seam).
///
/// `Decode` is a local, per-frame condition: the owning stream logs it and
/// keeps reading. `Transport` terminates the owning stream only.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("decoding stats frame: {0}")]
    Decode(String),
    #[error("stats transport: {0}")]
    Transport(String),
}

/// Fatal collection-session errors. Per-stream faults are not here; they are
/// aggregated into `CollectSummary::faults`.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("failed to create Docker client: {0}")]
    ClientConstruction(#[source] bollard::errors::Error),
    #[error("no running container matched name '{0}'")]
    NoMatch(String),
    #[error("listing containers: {0}")]
    ListContainers(#[source] SourceError),
    #[error("opening metrics repository for '{name}': {source}")]
    OpenRepository {
        name: String,
        #[source]
        source: StoreError,
    },
}

/// Terminal condition of one stream's worker, reported at the session join.
#[derive(Debug, thiserror::Error)]
pub enum StreamFault {
    #[error("stats stream for '{container}': {source}")]
    Transport {
        container: String,
        #[source]
        source: SourceError,
    },
    #[error("persisting stats for '{container}': {source}")]
    Persist {
        container: String,
        #[source]
        source: StoreError,
    },
}

/// Metric-series store errors, annotated with the failing operation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("metrics store is closed ({operation})")]
    Closed { operation: &'static str },
    #[error("creating data directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{operation}: {source}")]
    Backend {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },
    #[error("series '{metric}' is misaligned: expected {expected} points, found {found}")]
    SeriesMisaligned {
        metric: &'static str,
        expected: usize,
        found: usize,
    },
}
