//! Publishes resolved endpoints to the router.

use std::sync::Arc;

use tracing::info;
use wsmount_core::EndpointMetadata;

use super::creator::EndpointCreator;
use super::error::DeploymentError;
use crate::traits::{ConnectionFactory, EndpointRouter};

/// Wraps descriptors in connection factories and hands them to the router.
///
/// Keeps no state of its own. Duplicate paths are detected by the router,
/// not here.
#[derive(Clone)]
pub struct Registrar {
    router: Arc<dyn EndpointRouter>,
}

impl Registrar {
    #[must_use]
    pub fn new(router: Arc<dyn EndpointRouter>) -> Self {
        Self { router }
    }

    /// Publishes `(metadata.path, factory)` to the router.
    ///
    /// # Errors
    ///
    /// Returns `DeploymentError::MissingPath` if the descriptor has no path,
    /// or `DeploymentError::Router` with the router's error unchanged.
    pub fn register(&self, metadata: Arc<EndpointMetadata>) -> Result<(), DeploymentError> {
        let creator = EndpointCreator::new(metadata)?;
        let path = creator.path().clone();
        let class = creator.metadata().class().id();

        self.router
            .add_mapping(path.clone(), Arc::new(creator) as Arc<dyn ConnectionFactory>)?;

        info!(class = %class, path = %path, "registered websocket endpoint");
        Ok(())
    }
}
