//! Endpoint deployment pipeline.
//!
//! 1. **Classification** (`classify`): `HandlerClass` -> annotated or programmatic
//! 2. **Scanning** (`scanner`): binds an annotated handler's callbacks
//! 3. **Resolution** (`resolver`): classify + scan once per handler type, cached
//! 4. **Registration** (`registrar`, `creator`): descriptor -> connection factory -> router
//! 5. **Routing** (`router`): in-memory path -> factory mappings

pub mod classify;
pub mod creator;
pub mod error;
pub mod registrar;
pub mod resolver;
pub mod router;
pub mod scanner;

// Re-export key types for convenient access.
pub use classify::{classify, Recognized};
pub use creator::{EndpointCreator, EndpointInstance, HandlerInstance};
pub use error::{ClassificationError, DeploymentError};
pub use registrar::Registrar;
pub use resolver::MetadataResolver;
pub use router::{MappedRouter, Mapping};
pub use scanner::{MethodScanner, ScanError};
