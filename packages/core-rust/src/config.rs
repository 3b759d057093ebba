use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::class::HandlerClass;
use crate::marker::ServerEndpoint;

/// Server-side configuration for one endpoint: the handler type it
/// instantiates, where it is mounted, and its negotiation settings.
#[derive(Clone)]
pub struct EndpointConfig {
    /// Handler type instantiated for every accepted connection.
    pub endpoint_class: Arc<HandlerClass>,
    /// Path template the endpoint is mounted at.
    pub path: String,
    /// Subprotocols the endpoint supports, in preference order.
    pub subprotocols: Vec<String>,
    /// Extensions the endpoint supports.
    pub extensions: Vec<String>,
    /// Names of the message encoders.
    pub encoders: Vec<String>,
    /// Names of the message decoders.
    pub decoders: Vec<String>,
    /// Free-form properties shared with every instance of the endpoint.
    pub user_properties: BTreeMap<String, serde_json::Value>,
}

impl EndpointConfig {
    /// Basic configuration: handler type and path, nothing else.
    pub fn new(endpoint_class: Arc<HandlerClass>, path: impl Into<String>) -> Self {
        Self {
            endpoint_class,
            path: path.into(),
            subprotocols: Vec::new(),
            extensions: Vec::new(),
            encoders: Vec::new(),
            decoders: Vec::new(),
            user_properties: BTreeMap::new(),
        }
    }

    /// Configuration synthesized from an endpoint marker.
    #[must_use]
    pub fn from_marker(endpoint_class: Arc<HandlerClass>, marker: &ServerEndpoint) -> Self {
        Self {
            subprotocols: marker.subprotocols.clone(),
            encoders: marker.encoders.clone(),
            decoders: marker.decoders.clone(),
            ..Self::new(endpoint_class, marker.path.clone())
        }
    }

    #[must_use]
    pub fn with_subprotocols<I, S>(mut self, subprotocols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subprotocols = subprotocols.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extensions.push(extension.into());
        self
    }

    #[must_use]
    pub fn with_user_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.user_properties.insert(key.into(), value);
        self
    }
}

impl fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("endpoint_class", &self.endpoint_class.id())
            .field("path", &self.path)
            .field("subprotocols", &self.subprotocols)
            .field("extensions", &self.extensions)
            .field("encoders", &self.encoders)
            .field("decoders", &self.decoders)
            .field("user_properties", &self.user_properties)
            .finish()
    }
}
