//! In-memory path router: stores path template -> connection factory mappings.
//!
//! Lookups are by exact template text. Matching concrete request paths
//! against templates belongs to the transport that embeds the container.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;
use wsmount_core::PathSpec;

use crate::traits::{ConnectionFactory, EndpointRouter, RouterError};

// ---------------------------------------------------------------------------
// MappedRouter
// ---------------------------------------------------------------------------

/// One published mapping.
#[derive(Clone)]
pub struct Mapping {
    pub path: PathSpec,
    pub factory: Arc<dyn ConnectionFactory>,
}

/// Router keeping one factory per path template. A second mapping for an
/// already mapped template is rejected with `RouterError::DuplicatePath`.
#[derive(Default)]
pub struct MappedRouter {
    mappings: DashMap<String, Mapping>,
}

impl MappedRouter {
    /// Create a new empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mappings: DashMap::new(),
        }
    }

    /// Returns the factory mapped at exactly `template`.
    #[must_use]
    pub fn factory(&self, template: &str) -> Option<Arc<dyn ConnectionFactory>> {
        self.mappings
            .get(template)
            .map(|entry| Arc::clone(&entry.value().factory))
    }

    #[must_use]
    pub fn contains(&self, template: &str) -> bool {
        self.mappings.contains_key(template)
    }

    /// Mapped templates, sorted.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.mappings.iter().map(|e| e.key().clone()).collect();
        paths.sort();
        paths
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

impl EndpointRouter for MappedRouter {
    fn add_mapping(
        &self,
        path: PathSpec,
        factory: Arc<dyn ConnectionFactory>,
    ) -> Result<(), RouterError> {
        match self.mappings.entry(path.as_str().to_string()) {
            Entry::Occupied(_) => Err(RouterError::DuplicatePath {
                path: path.to_string(),
            }),
            Entry::Vacant(slot) => {
                debug!(path = %path, "added websocket mapping");
                slot.insert(Mapping { path, factory });
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
