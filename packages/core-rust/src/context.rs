use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Upgrade request that a router hands to a connection factory once a path
/// mapping has matched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpgradeRequest {
    /// Request path as received.
    pub path: String,
    /// Values of the `{name}` variables matched by the router.
    pub path_params: BTreeMap<String, String>,
    /// Subprotocols requested by the client, in preference order.
    pub subprotocols: Vec<String>,
}

impl UpgradeRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

/// Read-only view of an open connection, passed to handler callbacks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub path: String,
    pub path_params: BTreeMap<String, String>,
    /// Subprotocol agreed during the handshake, if any.
    pub subprotocol: Option<String>,
}

/// Close code and phrase delivered to close callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseReason {
    pub code: u16,
    pub phrase: String,
}

impl CloseReason {
    /// Normal closure (1000).
    pub const NORMAL: u16 = 1000;
    /// Endpoint going away (1001).
    pub const GOING_AWAY: u16 = 1001;

    pub fn new(code: u16, phrase: impl Into<String>) -> Self {
        Self {
            code,
            phrase: phrase.into(),
        }
    }
}
