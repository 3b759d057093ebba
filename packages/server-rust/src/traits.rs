use std::sync::Arc;

use wsmount_core::{PathSpec, UpgradeRequest};

use crate::service::creator::EndpointInstance;

/// Builds a handler instance for each connection accepted on a mapped path.
pub trait ConnectionFactory: Send + Sync {
    /// Creates a new handler instance for one accepted connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the handler cannot be instantiated.
    fn create(&self, request: &UpgradeRequest) -> anyhow::Result<EndpointInstance>;
}

/// Errors reported by a router when a mapping cannot be added.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("a websocket endpoint is already mapped at {path}")]
    DuplicatePath { path: String },
    #[error("router rejected mapping for {path}: {reason}")]
    Rejected { path: String, reason: String },
}

/// External path router: stores path -> factory mappings and performs
/// request-time matching. The container only ever adds mappings.
pub trait EndpointRouter: Send + Sync {
    /// Publishes `factory` under `path`.
    ///
    /// # Errors
    ///
    /// Returns `RouterError` if the router refuses the mapping, e.g. because
    /// `path` is already mapped.
    fn add_mapping(
        &self,
        path: PathSpec,
        factory: Arc<dyn ConnectionFactory>,
    ) -> Result<(), RouterError>;
}
