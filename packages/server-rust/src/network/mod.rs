//! Container configuration and the transport policy it feeds.

pub mod config;
pub mod policy;

pub use config::*;
pub use policy::*;
