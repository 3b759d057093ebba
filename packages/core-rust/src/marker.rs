//! Declarative endpoint descriptions: the endpoint marker and the callback
//! declarations a handler type exposes for inspection.

use serde::{Deserialize, Serialize};

use crate::config::EndpointConfig;

/// Protocol events a handler callback can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Open,
    Message,
    Error,
    Close,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Open => "open",
            Self::Message => "message",
            Self::Error => "error",
            Self::Close => "close",
        };
        f.write_str(name)
    }
}

/// Kind of a declared callback parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamKind {
    /// The connection's session.
    Session,
    /// The endpoint configuration the session was opened with.
    Config,
    /// A whole or partial text message.
    Text,
    /// A whole or partial binary message.
    Binary,
    /// A pong frame payload.
    Pong,
    /// The error delivered to an error callback.
    Throwable,
    /// The close code and phrase delivered to a close callback.
    CloseReason,
    /// Value of a `{name}` variable in the endpoint path.
    PathParam(String),
    /// Flag marking the final fragment of a partial message.
    Last,
}

impl ParamKind {
    /// Returns `true` for the parameters that carry a message payload.
    #[must_use]
    pub fn is_payload(&self) -> bool {
        matches!(self, Self::Text | Self::Binary | Self::Pong)
    }
}

/// One method a handler type declares, as seen by a descriptor scanner.
///
/// Methods without an event marker are ordinary methods and never bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    pub event: Option<EventKind>,
    pub params: Vec<ParamKind>,
}

impl MethodDecl {
    /// Declares an unmarked method.
    pub fn plain(name: impl Into<String>, params: impl IntoIterator<Item = ParamKind>) -> Self {
        Self {
            name: name.into(),
            event: None,
            params: params.into_iter().collect(),
        }
    }

    /// Declares a method marked as the handler for `event`.
    pub fn on(
        event: EventKind,
        name: impl Into<String>,
        params: impl IntoIterator<Item = ParamKind>,
    ) -> Self {
        Self {
            event: Some(event),
            ..Self::plain(name, params)
        }
    }

    pub fn on_open(name: impl Into<String>, params: impl IntoIterator<Item = ParamKind>) -> Self {
        Self::on(EventKind::Open, name, params)
    }

    pub fn on_message(
        name: impl Into<String>,
        params: impl IntoIterator<Item = ParamKind>,
    ) -> Self {
        Self::on(EventKind::Message, name, params)
    }

    pub fn on_error(name: impl Into<String>, params: impl IntoIterator<Item = ParamKind>) -> Self {
        Self::on(EventKind::Error, name, params)
    }

    pub fn on_close(name: impl Into<String>, params: impl IntoIterator<Item = ParamKind>) -> Self {
        Self::on(EventKind::Close, name, params)
    }
}

/// The "server endpoint" marker carried by declaratively described handlers.
///
/// `config` holds a previously synthesized configuration; when present it is
/// used as-is instead of deriving a fresh one from `path`.
#[derive(Debug, Clone)]
pub struct ServerEndpoint {
    /// Path template the endpoint is mounted at (e.g. `/rooms/{room}`).
    pub path: String,
    /// Subprotocols offered during the handshake, in preference order.
    pub subprotocols: Vec<String>,
    /// Names of the message encoders the endpoint uses.
    pub encoders: Vec<String>,
    /// Names of the message decoders the endpoint uses.
    pub decoders: Vec<String>,
    /// Preset configuration carried by the marker itself.
    pub config: Option<EndpointConfig>,
}

impl ServerEndpoint {
    /// Creates a marker for `path` with no subprotocols, coders, or preset config.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            subprotocols: Vec::new(),
            encoders: Vec::new(),
            decoders: Vec::new(),
            config: None,
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
    pub fn with_encoder(mut self, encoder: impl Into<String>) -> Self {
        self.encoders.push(encoder.into());
        self
    }

    #[must_use]
    pub fn with_decoder(mut self, decoder: impl Into<String>) -> Self {
        self.decoders.push(decoder.into());
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: EndpointConfig) -> Self {
        self.config = Some(config);
        self
    }
}
