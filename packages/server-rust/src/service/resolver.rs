//! Endpoint metadata resolution with a per-container memo cache.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};
use wsmount_core::{
    AnnotatedMetadataBuilder, ClassId, DescriptorScanner, EndpointConfig, EndpointMetadata,
    HandlerClass, PathSpec, ServerEndpoint,
};

use super::classify::{classify, Recognized};
use super::error::DeploymentError;

// ---------------------------------------------------------------------------
// MetadataResolver
// ---------------------------------------------------------------------------

/// Classifies handler types and memoizes their descriptors.
///
/// Lookup, classification, scanning, and the cache insert all run under one
/// mutex, so each handler type is scanned at most once no matter how many
/// callers race to resolve it. Resolution of unrelated types is serialized
/// too; it only happens at deployment time.
pub struct MetadataResolver {
    scanner: Arc<dyn DescriptorScanner>,
    cache: Mutex<HashMap<ClassId, Arc<EndpointMetadata>>>,
}

impl MetadataResolver {
    #[must_use]
    pub fn new(scanner: Arc<dyn DescriptorScanner>) -> Self {
        Self {
            scanner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the descriptor for `class`, building and caching it on first use.
    ///
    /// `config` is only consulted when the type is resolved for the first
    /// time; later calls return the cached descriptor unchanged.
    ///
    /// # Errors
    ///
    /// - `DeploymentError::Classification` if the type matches neither form
    /// - `DeploymentError::InvalidPath` if the endpoint path is malformed
    /// - `DeploymentError::Scan` if the descriptor scanner fails
    /// - `DeploymentError::MarkerConflict` if the type is already cached under
    ///   a different marker path
    ///
    /// Nothing is cached when an error is returned.
    pub fn resolve(
        &self,
        class: &Arc<HandlerClass>,
        config: Option<EndpointConfig>,
    ) -> Result<Arc<EndpointMetadata>, DeploymentError> {
        let mut cache = self.cache.lock();
        if let Some(metadata) = cache.get(&class.id()) {
            check_marker(class, metadata)?;
            debug!(
                class = %class.id(),
                config_ignored = config.is_some(),
                "endpoint metadata cache hit"
            );
            return Ok(Arc::clone(metadata));
        }

        let metadata = Arc::new(self.build(class, config)?);
        cache.insert(class.id(), Arc::clone(&metadata));
        info!(
            class = %class.id(),
            variant = ?metadata.variant(),
            path = metadata.path().map(PathSpec::as_str),
            "resolved endpoint metadata"
        );
        Ok(metadata)
    }

    fn build(
        &self,
        class: &Arc<HandlerClass>,
        config: Option<EndpointConfig>,
    ) -> Result<EndpointMetadata, DeploymentError> {
        let invalid_path = |source| DeploymentError::InvalidPath {
            class: class.id(),
            source,
        };

        match classify(class)? {
            Recognized::Annotated(marker) => {
                let path = PathSpec::parse(&marker.path).map_err(invalid_path)?;
                let config = annotated_config(class, marker, config);

                let mut builder = AnnotatedMetadataBuilder::new(Arc::clone(class), path, config);
                self.scanner
                    .scan(&mut builder)
                    .map_err(|source| DeploymentError::Scan {
                        class: class.id(),
                        source,
                    })?;
                Ok(builder.build())
            }
            Recognized::Programmatic => {
                EndpointMetadata::programmatic(Arc::clone(class), config).map_err(invalid_path)
            }
        }
    }

    /// Returns the cached descriptor for `id` without resolving.
    #[must_use]
    pub fn cached(&self, id: ClassId) -> Option<Arc<EndpointMetadata>> {
        self.cache.lock().get(&id).cloned()
    }

    /// Number of cached descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }

    /// Drops every cached descriptor. Returns how many were dropped.
    ///
    /// Callers sequence this after deployment has quiesced (container stop).
    pub fn clear(&self) -> usize {
        let mut cache = self.cache.lock();
        let dropped = cache.len();
        cache.clear();
        debug!(dropped, "cleared endpoint metadata cache");
        dropped
    }
}

/// A cached descriptor only answers for the marker it was built from.
fn check_marker(class: &HandlerClass, cached: &EndpointMetadata) -> Result<(), DeploymentError> {
    let Some(marker) = class.marker() else {
        return Ok(());
    };
    let cached_path = cached.path().map(PathSpec::as_str);
    if cached_path == Some(marker.path.as_str()) {
        return Ok(());
    }
    warn!(
        class = %class.id(),
        cached = cached_path,
        requested = %marker.path,
        "handler type redeclared with a different marker"
    );
    Err(DeploymentError::MarkerConflict {
        class: class.id(),
        cached: cached_path.unwrap_or("no path").to_string(),
        requested: marker.path.clone(),
    })
}

/// Config of an annotated endpoint: the marker's preset or one synthesized
/// from the marker, overlaid with the extras of an explicit config. The path
/// and handler class always come from the marker's type.
fn annotated_config(
    class: &Arc<HandlerClass>,
    marker: &ServerEndpoint,
    explicit: Option<EndpointConfig>,
) -> EndpointConfig {
    let mut config = marker
        .config
        .clone()
        .unwrap_or_else(|| EndpointConfig::from_marker(Arc::clone(class), marker));
    config.endpoint_class = Arc::clone(class);
    config.path.clone_from(&marker.path);

    if let Some(explicit) = explicit {
        if explicit.path != marker.path {
            debug!(
                class = %class.id(),
                configured = %explicit.path,
                marker = %marker.path,
                "annotated endpoint path comes from its marker"
            );
        }
        if !explicit.subprotocols.is_empty() {
            config.subprotocols = explicit.subprotocols;
        }
        for extension in explicit.extensions {
            if !config.extensions.contains(&extension) {
                config.extensions.push(extension);
            }
        }
        config.user_properties.extend(explicit.user_properties);
    }
    config
}

impl std::fmt::Debug for MetadataResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataResolver")
            .field("cached", &self.len())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
