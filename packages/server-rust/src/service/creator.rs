//! Connection factory that turns a resolved descriptor into per-connection
//! handler instances.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use anyhow::anyhow;
use tracing::trace;
use uuid::Uuid;
use wsmount_core::{Endpoint, EndpointConfig, EndpointMetadata, PathSpec, UpgradeRequest};

use super::error::DeploymentError;
use crate::traits::ConnectionFactory;

/// A freshly created handler, typed by how its type was classified.
pub enum HandlerInstance {
    /// Instance of an annotation-described type; callbacks are reached
    /// through the descriptor's bindings.
    Annotated(Box<dyn Any + Send>),
    /// Instance of a type implementing the `Endpoint` contract.
    Programmatic(Box<dyn Endpoint>),
}

/// One handler instance bound to the configuration and descriptor of its
/// endpoint.
pub struct EndpointInstance {
    /// Unique per created instance.
    pub id: Uuid,
    pub handler: HandlerInstance,
    pub config: EndpointConfig,
    pub metadata: Arc<EndpointMetadata>,
}

impl EndpointInstance {
    #[must_use]
    pub fn new(
        handler: HandlerInstance,
        config: EndpointConfig,
        metadata: Arc<EndpointMetadata>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            handler,
            config,
            metadata,
        }
    }

    /// Borrows an annotation-described handler as its concrete type.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        match &self.handler {
            HandlerInstance::Annotated(handler) => handler.downcast_ref::<T>(),
            HandlerInstance::Programmatic(_) => None,
        }
    }

    /// Mutably borrows a programmatic handler.
    pub fn endpoint_mut(&mut self) -> Option<&mut (dyn Endpoint + 'static)> {
        match &mut self.handler {
            HandlerInstance::Programmatic(endpoint) => Some(endpoint.as_mut()),
            HandlerInstance::Annotated(_) => None,
        }
    }
}

impl fmt::Debug for EndpointInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.handler {
            HandlerInstance::Annotated(_) => "annotated",
            HandlerInstance::Programmatic(_) => "programmatic",
        };
        f.debug_struct("EndpointInstance")
            .field("id", &self.id)
            .field("handler", &kind)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// EndpointCreator
// ---------------------------------------------------------------------------

/// `ConnectionFactory` published to the router for one endpoint.
#[derive(Debug, Clone)]
pub struct EndpointCreator {
    metadata: Arc<EndpointMetadata>,
    path: PathSpec,
}

impl EndpointCreator {
    /// Wraps a descriptor. The descriptor must carry a path.
    ///
    /// # Errors
    ///
    /// Returns `DeploymentError::MissingPath` for a programmatic descriptor
    /// resolved without a configuration.
    pub fn new(metadata: Arc<EndpointMetadata>) -> Result<Self, DeploymentError> {
        let path = metadata
            .path()
            .cloned()
            .ok_or_else(|| DeploymentError::MissingPath {
                class: metadata.class().id(),
            })?;
        Ok(Self { metadata, path })
    }

    #[must_use]
    pub fn metadata(&self) -> &Arc<EndpointMetadata> {
        &self.metadata
    }

    #[must_use]
    pub fn path(&self) -> &PathSpec {
        &self.path
    }
}

impl ConnectionFactory for EndpointCreator {
    fn create(&self, request: &UpgradeRequest) -> anyhow::Result<EndpointInstance> {
        let class = self.metadata.class();
        let handler = if self.metadata.bindings().is_some() {
            HandlerInstance::Annotated(class.new_instance())
        } else {
            let endpoint = class
                .new_endpoint()
                .ok_or_else(|| anyhow!("{} does not implement the Endpoint contract", class.id()))?;
            HandlerInstance::Programmatic(endpoint)
        };
        let config = self
            .metadata
            .config()
            .cloned()
            .unwrap_or_else(|| EndpointConfig::new(Arc::clone(class), self.path.as_str()));

        let instance = EndpointInstance::new(handler, config, Arc::clone(&self.metadata));
        trace!(
            class = %class.id(),
            path = %self.path,
            request_path = %request.path,
            instance = %instance.id,
            "created endpoint instance"
        );
        Ok(instance)
    }
}
