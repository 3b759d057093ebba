//! `wsmount` Server: websocket endpoint deployment, covering metadata resolution and
//! caching, router registration, and container-wide transport defaults.

pub mod container;
pub mod network;
pub mod service;
pub mod traits;

pub use container::{ContainerState, ServerContainer};
pub use network::{ContainerConfig, PolicyError, SharedPolicy, WebSocketPolicy};
pub use service::{DeploymentError, MappedRouter, MetadataResolver, Registrar};
pub use traits::{ConnectionFactory, EndpointRouter, RouterError};
