//! The server container: endpoint deployment entry points, lifecycle, and
//! the default-policy configuration surface.

pub mod lifecycle;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use wsmount_core::{DescriptorScanner, EndpointConfig, EndpointMetadata, HandlerClass};

pub use lifecycle::{ContainerState, DeploymentGuard, Lifecycle};

use crate::network::{ContainerConfig, PolicyError, SharedPolicy, WebSocketPolicy};
use crate::service::{
    DeploymentError, EndpointInstance, HandlerInstance, MethodScanner, MetadataResolver,
    Registrar,
};
use crate::traits::EndpointRouter;

/// Deploys websocket endpoints into a router and exposes the container-wide
/// transport defaults.
///
/// Deployment happens at configuration time from whichever thread sets the
/// container up; nothing here runs per connection.
pub struct ServerContainer {
    resolver: MetadataResolver,
    registrar: Registrar,
    policy: SharedPolicy,
    lifecycle: Lifecycle,
}

impl ServerContainer {
    /// Creates a container with the default scanner and default policy.
    #[must_use]
    pub fn new(router: Arc<dyn EndpointRouter>) -> Self {
        Self::with_parts(
            router,
            Arc::new(MethodScanner::new()),
            WebSocketPolicy::default().shared(),
        )
    }

    /// Creates a container whose policy starts from `config`.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError` if `config` holds an out-of-range value.
    pub fn with_config(
        router: Arc<dyn EndpointRouter>,
        config: &ContainerConfig,
    ) -> Result<Self, PolicyError> {
        let policy = WebSocketPolicy::from_config(config)?;
        Ok(Self::with_parts(
            router,
            Arc::new(MethodScanner::new()),
            policy.shared(),
        ))
    }

    /// Creates a container from explicit collaborators.
    #[must_use]
    pub fn with_parts(
        router: Arc<dyn EndpointRouter>,
        scanner: Arc<dyn DescriptorScanner>,
        policy: SharedPolicy,
    ) -> Self {
        Self {
            resolver: MetadataResolver::new(scanner),
            registrar: Registrar::new(router),
            policy,
            lifecycle: Lifecycle::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn state(&self) -> ContainerState {
        self.lifecycle.state()
    }

    #[must_use]
    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Starts (or restarts) the container.
    pub fn start(&self) {
        let previous = self.lifecycle.set_running();
        info!(?previous, "websocket container started");
    }

    /// Stops the container and drops every cached descriptor.
    ///
    /// Deployments must have quiesced before calling this.
    pub fn stop(&self) {
        self.lifecycle.set_stopped();
        let in_flight = self.lifecycle.in_flight_count();
        if in_flight > 0 {
            warn!(in_flight, "stopping container with deployments in progress");
        }
        let dropped = self.resolver.clear();
        info!(dropped, "websocket container stopped");
    }

    // -----------------------------------------------------------------------
    // Deployment
    // -----------------------------------------------------------------------

    /// Deploys a handler type, classified by inspection alone.
    ///
    /// # Errors
    ///
    /// Returns `DeploymentError` if the container is stopped, the type cannot
    /// be resolved, or the router refuses the mapping.
    pub fn add_endpoint_class(&self, class: &Arc<HandlerClass>) -> Result<(), DeploymentError> {
        let _guard = self.deployable()?;
        let metadata = self.resolver.resolve(class, None)?;
        self.registrar.register(metadata)
    }

    /// Deploys the handler type named by `config`, using `config` on first
    /// resolution.
    ///
    /// # Errors
    ///
    /// Returns `DeploymentError` if the container is stopped, the type cannot
    /// be resolved, or the router refuses the mapping.
    pub fn add_endpoint_config(&self, config: EndpointConfig) -> Result<(), DeploymentError> {
        let _guard = self.deployable()?;
        debug!(path = %config.path, class = %config.endpoint_class.id(), "add endpoint config");
        let class = Arc::clone(&config.endpoint_class);
        let metadata = self.resolver.resolve(&class, Some(config))?;
        self.registrar.register(metadata)
    }

    /// Registers a pre-built descriptor without classification.
    ///
    /// # Errors
    ///
    /// Returns `DeploymentError` if the container is stopped, the descriptor
    /// has no path, or the router refuses the mapping.
    pub fn add_endpoint_metadata(
        &self,
        metadata: Arc<EndpointMetadata>,
    ) -> Result<(), DeploymentError> {
        let _guard = self.deployable()?;
        self.registrar.register(metadata)
    }

    /// Counts the deployment as in flight before checking the state, so a
    /// concurrent `stop()` either rejects it here or sees it in flight.
    fn deployable(&self) -> Result<DeploymentGuard, DeploymentError> {
        let guard = self.lifecycle.deployment_guard();
        if !self.lifecycle.state().accepts_deployments() {
            drop(guard);
            return Err(DeploymentError::ContainerStopped);
        }
        Ok(guard)
    }

    /// Resolves (and caches) the descriptor of a handler type.
    ///
    /// # Errors
    ///
    /// See `MetadataResolver::resolve`.
    pub fn endpoint_metadata(
        &self,
        class: &Arc<HandlerClass>,
        config: Option<EndpointConfig>,
    ) -> Result<Arc<EndpointMetadata>, DeploymentError> {
        self.resolver.resolve(class, config)
    }

    /// Binds an already created handler to its descriptor and a configuration.
    ///
    /// Without `config`, an annotated handler gets its descriptor's config and
    /// any other handler gets a basic config for `(class, path)`.
    ///
    /// # Errors
    ///
    /// See `MetadataResolver::resolve`.
    pub fn new_client_endpoint_instance(
        &self,
        handler: HandlerInstance,
        class: &Arc<HandlerClass>,
        config: Option<EndpointConfig>,
        path: &str,
    ) -> Result<EndpointInstance, DeploymentError> {
        let metadata = self.resolver.resolve(class, None)?;
        let config = match config {
            Some(config) => config,
            None => match (metadata.bindings(), metadata.config()) {
                (Some(_), Some(annotated)) => annotated.clone(),
                _ => EndpointConfig::new(Arc::clone(class), path),
            },
        };
        Ok(EndpointInstance::new(handler, config, metadata))
    }

    #[must_use]
    pub fn resolver(&self) -> &MetadataResolver {
        &self.resolver
    }

    /// Shared handle to the transport policy.
    #[must_use]
    pub fn policy(&self) -> SharedPolicy {
        Arc::clone(&self.policy)
    }

    // -----------------------------------------------------------------------
    // Default policy configuration
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn default_async_send_timeout(&self) -> Duration {
        self.policy.read().async_write_timeout()
    }

    pub fn set_async_send_timeout(&self, timeout: Duration) {
        self.policy.write().set_async_write_timeout(timeout);
    }

    #[must_use]
    pub fn default_max_session_idle_timeout(&self) -> Duration {
        self.policy.read().idle_timeout()
    }

    /// # Errors
    ///
    /// Returns `PolicyError::ZeroTimeout` for a zero duration.
    pub fn set_default_max_session_idle_timeout(
        &self,
        timeout: Duration,
    ) -> Result<(), PolicyError> {
        self.policy.write().set_idle_timeout(timeout)
    }

    /// Overall limit for whole binary messages.
    #[must_use]
    pub fn default_max_binary_message_buffer_size(&self) -> usize {
        self.policy.read().max_binary_message_size()
    }

    /// Sets both the overall binary message limit and the incoming binary
    /// streaming buffer size to `max`.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::SizeTooSmall` below the minimum; neither limit
    /// changes then.
    pub fn set_default_max_binary_message_buffer_size(
        &self,
        max: usize,
    ) -> Result<(), PolicyError> {
        let mut policy = self.policy.write();
        // overall message limit (non-streaming)
        policy.set_max_binary_message_size(max)?;
        // incoming streaming buffer size
        policy.set_max_binary_message_buffer_size(max)
    }

    /// Overall limit for whole text messages.
    #[must_use]
    pub fn default_max_text_message_buffer_size(&self) -> usize {
        self.policy.read().max_text_message_size()
    }

    /// Sets both the overall text message limit and the incoming text
    /// streaming buffer size to `max`.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::SizeTooSmall` below the minimum; neither limit
    /// changes then.
    pub fn set_default_max_text_message_buffer_size(&self, max: usize) -> Result<(), PolicyError> {
        let mut policy = self.policy.write();
        policy.set_max_text_message_size(max)?;
        policy.set_max_text_message_buffer_size(max)
    }
}
