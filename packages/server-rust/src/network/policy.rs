//! Transport policy: the timeout and message-size limits the websocket layer
//! enforces. The container only reads and writes these values.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use super::config::ContainerConfig;

/// Policy shared between the container and the transport.
pub type SharedPolicy = Arc<RwLock<WebSocketPolicy>>;

/// Smallest accepted message size or buffer size, in bytes.
pub const MIN_MESSAGE_SIZE: usize = 1;

/// Errors from applying an out-of-range policy value. The policy is left
/// unchanged when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("{setting} must be at least {min} bytes, got {value}")]
    SizeTooSmall {
        setting: &'static str,
        min: usize,
        value: usize,
    },
    #[error("{setting} must be greater than zero")]
    ZeroTimeout { setting: &'static str },
}

/// Timeout and message-size limits for websocket connections.
///
/// The `*_message_size` limits cap whole (non-streaming) messages; the
/// `*_message_buffer_size` limits size the incoming streaming buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebSocketPolicy {
    async_write_timeout: Duration,
    idle_timeout: Duration,
    max_text_message_size: usize,
    max_text_message_buffer_size: usize,
    max_binary_message_size: usize,
    max_binary_message_buffer_size: usize,
}

impl Default for WebSocketPolicy {
    fn default() -> Self {
        Self {
            async_write_timeout: Duration::from_secs(60),
            idle_timeout: Duration::from_secs(300),
            max_text_message_size: 65_536,         // 64 KB
            max_text_message_buffer_size: 32_768,  // 32 KB
            max_binary_message_size: 65_536,       // 64 KB
            max_binary_message_buffer_size: 32_768, // 32 KB
        }
    }
}

fn check_size(setting: &'static str, value: usize) -> Result<(), PolicyError> {
    if value < MIN_MESSAGE_SIZE {
        return Err(PolicyError::SizeTooSmall {
            setting,
            min: MIN_MESSAGE_SIZE,
            value,
        });
    }
    Ok(())
}

impl WebSocketPolicy {
    /// Builds a policy from the configured defaults.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError` if any configured value is out of range.
    pub fn from_config(config: &ContainerConfig) -> Result<Self, PolicyError> {
        let mut policy = Self::default();
        policy.set_async_write_timeout(Duration::from_millis(config.async_send_timeout_ms));
        policy.set_idle_timeout(Duration::from_millis(config.idle_timeout_ms))?;
        policy.set_max_text_message_size(config.max_text_message_size)?;
        policy.set_max_text_message_buffer_size(config.max_text_message_buffer_size)?;
        policy.set_max_binary_message_size(config.max_binary_message_size)?;
        policy.set_max_binary_message_buffer_size(config.max_binary_message_buffer_size)?;
        Ok(policy)
    }

    /// Wraps the policy for sharing with the transport.
    #[must_use]
    pub fn shared(self) -> SharedPolicy {
        Arc::new(RwLock::new(self))
    }

    #[must_use]
    pub fn async_write_timeout(&self) -> Duration {
        self.async_write_timeout
    }

    /// Zero disables the async write timeout.
    pub fn set_async_write_timeout(&mut self, timeout: Duration) {
        self.async_write_timeout = timeout;
    }

    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// # Errors
    ///
    /// Returns `PolicyError::ZeroTimeout` for a zero duration.
    pub fn set_idle_timeout(&mut self, timeout: Duration) -> Result<(), PolicyError> {
        if timeout.is_zero() {
            return Err(PolicyError::ZeroTimeout {
                setting: "idle_timeout",
            });
        }
        self.idle_timeout = timeout;
        Ok(())
    }

    #[must_use]
    pub fn max_text_message_size(&self) -> usize {
        self.max_text_message_size
    }

    /// # Errors
    ///
    /// Returns `PolicyError::SizeTooSmall` below `MIN_MESSAGE_SIZE`.
    pub fn set_max_text_message_size(&mut self, size: usize) -> Result<(), PolicyError> {
        check_size("max_text_message_size", size)?;
        self.max_text_message_size = size;
        Ok(())
    }

    #[must_use]
    pub fn max_text_message_buffer_size(&self) -> usize {
        self.max_text_message_buffer_size
    }

    /// # Errors
    ///
    /// Returns `PolicyError::SizeTooSmall` below `MIN_MESSAGE_SIZE`.
    pub fn set_max_text_message_buffer_size(&mut self, size: usize) -> Result<(), PolicyError> {
        check_size("max_text_message_buffer_size", size)?;
        self.max_text_message_buffer_size = size;
        Ok(())
    }

    #[must_use]
    pub fn max_binary_message_size(&self) -> usize {
        self.max_binary_message_size
    }

    /// # Errors
    ///
    /// Returns `PolicyError::SizeTooSmall` below `MIN_MESSAGE_SIZE`.
    pub fn set_max_binary_message_size(&mut self, size: usize) -> Result<(), PolicyError> {
        check_size("max_binary_message_size", size)?;
        self.max_binary_message_size = size;
        Ok(())
    }

    #[must_use]
    pub fn max_binary_message_buffer_size(&self) -> usize {
        self.max_binary_message_buffer_size
    }

    /// # Errors
    ///
    /// Returns `PolicyError::SizeTooSmall` below `MIN_MESSAGE_SIZE`.
    pub fn set_max_binary_message_buffer_size(&mut self, size: usize) -> Result<(), PolicyError> {
        check_size("max_binary_message_buffer_size", size)?;
        self.max_binary_message_buffer_size = size;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_defaults() {
        let policy = WebSocketPolicy::default();
        assert_eq!(policy.async_write_timeout(), Duration::from_secs(60));
        assert_eq!(policy.idle_timeout(), Duration::from_secs(300));
        assert_eq!(policy.max_text_message_size(), 65_536);
        assert_eq!(policy.max_text_message_buffer_size(), 32_768);
        assert_eq!(policy.max_binary_message_size(), 65_536);
        assert_eq!(policy.max_binary_message_buffer_size(), 32_768);
    }

    #[test]
    fn default_config_yields_default_policy() {
        let policy = WebSocketPolicy::from_config(&ContainerConfig::default()).unwrap();
        assert_eq!(policy, WebSocketPolicy::default());
    }

    #[test]
    fn zero_sizes_are_rejected() {
        let mut policy = WebSocketPolicy::default();
        let err = policy.set_max_binary_message_size(0).unwrap_err();
        assert_eq!(
            err,
            PolicyError::SizeTooSmall {
                setting: "max_binary_message_size",
                min: MIN_MESSAGE_SIZE,
                value: 0
            }
        );
        assert_eq!(policy.max_binary_message_size(), 65_536);
    }

    #[test]
    fn zero_idle_timeout_is_rejected() {
        let mut policy = WebSocketPolicy::default();
        assert!(policy.set_idle_timeout(Duration::ZERO).is_err());
        assert_eq!(policy.idle_timeout(), Duration::from_secs(300));
    }

    #[test]
    fn zero_async_write_timeout_is_allowed() {
        let mut policy = WebSocketPolicy::default();
        policy.set_async_write_timeout(Duration::ZERO);
        assert_eq!(policy.async_write_timeout(), Duration::ZERO);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = ContainerConfig {
            max_text_message_buffer_size: 0,
            ..ContainerConfig::default()
        };
        assert!(matches!(
            WebSocketPolicy::from_config(&config),
            Err(PolicyError::SizeTooSmall {
                setting: "max_text_message_buffer_size",
                ..
            })
        ));
    }

    #[test]
    fn shared_policy_is_writable() {
        let shared = WebSocketPolicy::default().shared();
        shared.write().set_max_text_message_size(1024).unwrap();
        assert_eq!(shared.read().max_text_message_size(), 1024);
    }
}
