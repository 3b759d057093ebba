use wsmount_core::{ClassId, PathSpecError};

use crate::traits::RouterError;

/// A handler type matched neither accepted form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "unable to identify {class} as a websocket endpoint: it neither carries the server \
     endpoint marker nor implements the Endpoint contract"
)]
pub struct ClassificationError {
    pub class: ClassId,
}

/// Errors from deploying an endpoint. A failed deployment leaves no trace in
/// the metadata cache and does not affect other endpoints.
#[derive(Debug, thiserror::Error)]
pub enum DeploymentError {
    #[error(transparent)]
    Classification(#[from] ClassificationError),
    #[error("invalid endpoint path for {class}: {source}")]
    InvalidPath {
        class: ClassId,
        #[source]
        source: PathSpecError,
    },
    #[error("scanning {class} failed: {source}")]
    Scan {
        class: ClassId,
        #[source]
        source: anyhow::Error,
    },
    #[error("{class} is already resolved at {cached}; its marker now names {requested}")]
    MarkerConflict {
        class: ClassId,
        cached: String,
        requested: String,
    },
    #[error("endpoint {class} has no path; deploy it with an endpoint config")]
    MissingPath { class: ClassId },
    #[error(transparent)]
    Router(#[from] RouterError),
    #[error("container is stopped")]
    ContainerStopped,
}
