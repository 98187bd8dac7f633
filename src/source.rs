// Stats source seam: enumeration plus one snapshot stream per container.

use crate::error::SourceError;
use crate::models::{ContainerInfo, StatsSnapshot};
use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;

/// A runtime that can enumerate running containers and stream decoded stats
/// snapshots for one of them.
///
/// Each returned stream owns its underlying connection; dropping the stream
/// releases it. A `Decode` item is a per-frame failure and the stream stays
/// readable past it.
pub trait StatsSource {
    fn list_containers(&self) -> BoxFuture<'_, Result<Vec<ContainerInfo>, SourceError>>;

    fn stats_stream(&self, id: &str) -> BoxStream<'static, Result<StatsSnapshot, SourceError>>;
}
