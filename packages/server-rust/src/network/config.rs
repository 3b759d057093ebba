//! Container configuration: the initial transport policy values.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Container-level configuration.
///
/// Every field has a default, so a partial JSON document only overrides the
/// values it names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Default timeout for asynchronous sends in milliseconds. 0 disables it.
    pub async_send_timeout_ms: u64,
    /// Default session idle timeout in milliseconds.
    pub idle_timeout_ms: u64,
    /// Overall limit for whole text messages, in bytes.
    pub max_text_message_size: usize,
    /// Incoming streaming buffer size for text messages, in bytes.
    pub max_text_message_buffer_size: usize,
    /// Overall limit for whole binary messages, in bytes.
    pub max_binary_message_size: usize,
    /// Incoming streaming buffer size for binary messages, in bytes.
    pub max_binary_message_buffer_size: usize,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            async_send_timeout_ms: 60_000,
            idle_timeout_ms: 300_000,
            max_text_message_size: 65_536,         // 64 KB
            max_text_message_buffer_size: 32_768,  // 32 KB
            max_binary_message_size: 65_536,       // 64 KB
            max_binary_message_buffer_size: 32_768, // 32 KB
        }
    }
}

impl ContainerConfig {
    /// Parses a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid JSON for this type.
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("invalid container config")
    }

    /// Reads and parses a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json_str(&json)
    }
}
