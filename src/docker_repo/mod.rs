// Docker runtime source via bollard.

mod stats;

use crate::error::{CollectError, SourceError};
use crate::models::{ContainerInfo, StatsSnapshot};
use crate::source::StatsSource;
use bollard::Docker;
use bollard::query_parameters::{ListContainersOptions, StatsOptions};
use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use std::collections::HashMap;

pub struct DockerRepo {
    docker: Docker,
}

impl DockerRepo {
    pub fn connect() -> Result<Self, CollectError> {
        let docker = Docker::connect_with_unix_defaults().map_err(CollectError::ClientConstruction)?;
        Ok(Self { docker })
    }
}

impl StatsSource for DockerRepo {
    fn list_containers(&self) -> BoxFuture<'_, Result<Vec<ContainerInfo>, SourceError>> {
        Box::pin(async move {
            let mut filters = HashMap::new();
            filters.insert("status".to_string(), vec!["running".to_string()]);

            let filter = ListContainersOptions {
                all: false,
                filters: Some(filters),
                ..Default::default()
            };

            let containers = self
                .docker
                .list_containers(Some(filter))
                .await
                .map_err(classify)?;

            let mut out = Vec::with_capacity(containers.len());
            for c in &containers {
                let id = c.id.as_ref().cloned().unwrap_or_default();
                let name = c
                    .names
                    .as_ref()
                    .and_then(|n| n.first())
                    .cloned()
                    .unwrap_or_else(|| id.clone());
                let name = name.trim_start_matches('/').to_string();
                out.push(ContainerInfo { id, name });
            }
            Ok(out)
        })
    }

    fn stats_stream(&self, id: &str) -> BoxStream<'static, Result<StatsSnapshot, SourceError>> {
        let options = StatsOptions {
            stream: true,
            ..Default::default()
        };
        self.docker
            .stats(id, Some(options))
            .map(|result| match result {
                Ok(frame) => stats::to_snapshot(&frame)
                    .ok_or_else(|| SourceError::Decode("stats frame missing CPU samples".into())),
                Err(e) => Err(classify(e)),
            })
            .boxed()
    }
}

/// A frame that fails to decode is a local condition; everything else takes
/// the stream down.
fn classify(e: bollard::errors::Error) -> SourceError {
    match &e {
        bollard::errors::Error::JsonDataError { .. }
        | bollard::errors::Error::JsonSerdeError { .. } => SourceError::Decode(e.to_string()),
        _ => SourceError::Transport(e.to_string()),
    }
}
