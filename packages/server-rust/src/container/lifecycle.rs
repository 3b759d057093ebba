//! Container lifecycle state with in-flight deployment tracking.
//!
//! Uses `ArcSwap` for lock-free state transitions and an atomic counter
//! with RAII guards for in-flight deployments.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;

/// Container lifecycle state.
///
/// State machine: Starting -> Running -> Stopped -> Running -> ...
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    /// Created; endpoints may be deployed before `start()`.
    Starting,
    /// Started and accepting deployments.
    Running,
    /// Stopped; deployments are rejected until the next `start()`.
    Stopped,
}

impl ContainerState {
    /// Whether endpoints may be deployed in this state.
    #[must_use]
    pub fn accepts_deployments(self) -> bool {
        matches!(self, Self::Starting | Self::Running)
    }
}

/// Tracks the container state and the deployments currently in progress.
#[derive(Debug)]
pub struct Lifecycle {
    state: ArcSwap<ContainerState>,
    in_flight: Arc<AtomicU64>,
}

impl Lifecycle {
    /// Creates a lifecycle in the `Starting` state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: ArcSwap::from_pointee(ContainerState::Starting),
            in_flight: Arc::new(AtomicU64::new(0)),
        }
    }

    #[must_use]
    pub fn state(&self) -> ContainerState {
        **self.state.load()
    }

    /// Moves to `Running`. Returns the previous state.
    pub fn set_running(&self) -> ContainerState {
        *self.state.swap(Arc::new(ContainerState::Running))
    }

    /// Moves to `Stopped`. Returns the previous state.
    pub fn set_stopped(&self) -> ContainerState {
        *self.state.swap(Arc::new(ContainerState::Stopped))
    }

    /// Creates an RAII guard that counts one in-flight deployment until dropped.
    #[must_use]
    pub fn deployment_guard(&self) -> DeploymentGuard {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        DeploymentGuard {
            in_flight: Arc::clone(&self.in_flight),
        }
    }

    /// Number of deployments currently in progress.
    #[must_use]
    pub fn in_flight_count(&self) -> u64 {
        self.in_flight.load(Ordering::SeqCst)
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard that decrements the in-flight deployment counter when dropped.
#[derive(Debug)]
pub struct DeploymentGuard {
    in_flight: Arc<AtomicU64>,
}

impl Drop for DeploymentGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
