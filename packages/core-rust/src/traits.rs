use crate::config::EndpointConfig;
use crate::context::{CloseReason, Session};
use crate::marker::{MethodDecl, ServerEndpoint};
use crate::metadata::AnnotatedMetadataBuilder;

/// The programmatic handler contract.
/// Types implementing it are instantiated directly, without callback scanning.
pub trait Endpoint: Send + 'static {
    /// Called once the handshake has completed.
    fn on_open(&mut self, session: &Session, config: &EndpointConfig);

    /// Called after the connection has closed.
    fn on_close(&mut self, _session: &Session, _reason: &CloseReason) {}

    /// Called when the connection reports an error.
    fn on_error(&mut self, _session: &Session, _error: &anyhow::Error) {}
}

/// Declarative description of a handler: its endpoint marker and callback declarations.
/// Read once, when the type is first deployed.
pub trait AnnotatedEndpoint {
    /// The endpoint marker, carrying at least the mount path.
    fn server_endpoint() -> ServerEndpoint;

    /// Declared callbacks, marked or not, in declaration order.
    fn methods() -> Vec<MethodDecl>;
}

/// Populates a descriptor under construction with the callback bindings it
/// discovers on the handler type.
pub trait DescriptorScanner: Send + Sync {
    /// Scan `builder.class()` and bind its callbacks into `builder`.
    ///
    /// # Errors
    ///
    /// Returns an error if the declarations are invalid (e.g. duplicate or
    /// malformed callbacks). The descriptor is then discarded.
    fn scan(&self, builder: &mut AnnotatedMetadataBuilder) -> anyhow::Result<()>;
}
