//! Resolved endpoint descriptors.
//!
//! An `EndpointMetadata` is built once per handler type and then shared,
//! read-only, by every connection accepted for that type. The only way to
//! obtain one is through `EndpointMetadata::programmatic` or by finishing an
//! `AnnotatedMetadataBuilder`, so a descriptor never changes after it is built.

use std::sync::Arc;

use crate::class::HandlerClass;
use crate::config::EndpointConfig;
use crate::marker::{EventKind, ParamKind};
use crate::path::{PathSpec, PathSpecError};

/// How a handler type was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Carries the endpoint marker; callbacks are discovered by scanning.
    AnnotationDescribed,
    /// Implements the `Endpoint` contract directly.
    Programmatic,
}

/// Which kind of message a message callback receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Text,
    Binary,
    Pong,
}

impl MessageKind {
    /// Derives the message kind from a callback's payload parameter.
    #[must_use]
    pub fn from_params(params: &[ParamKind]) -> Option<Self> {
        params.iter().find_map(|param| match param {
            ParamKind::Text => Some(Self::Text),
            ParamKind::Binary => Some(Self::Binary),
            ParamKind::Pong => Some(Self::Pong),
            _ => None,
        })
    }
}

/// Association between a protocol event and a handler callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub event: EventKind,
    /// Set for message callbacks only.
    pub message_kind: Option<MessageKind>,
    /// Name of the bound method.
    pub method: String,
    pub params: Vec<ParamKind>,
}

/// Ordered set of bindings, at most one per `(event, message_kind)` slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingSet {
    bindings: Vec<Binding>,
}

impl BindingSet {
    /// Adds `binding` unless its slot is already taken.
    ///
    /// Returns the existing binding occupying the slot on conflict.
    ///
    /// # Errors
    ///
    /// Returns the already-bound `Binding` when the slot is occupied.
    pub fn insert(&mut self, binding: Binding) -> Result<(), Binding> {
        if let Some(existing) = self.slot(binding.event, binding.message_kind) {
            return Err(existing.clone());
        }
        self.bindings.push(binding);
        Ok(())
    }

    fn slot(&self, event: EventKind, message_kind: Option<MessageKind>) -> Option<&Binding> {
        self.bindings
            .iter()
            .find(|b| b.event == event && b.message_kind == message_kind)
    }

    /// The binding for a non-message event.
    #[must_use]
    pub fn get(&self, event: EventKind) -> Option<&Binding> {
        self.bindings.iter().find(|b| b.event == event)
    }

    /// The message binding for `kind`.
    #[must_use]
    pub fn message(&self, kind: MessageKind) -> Option<&Binding> {
        self.slot(EventKind::Message, Some(kind))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Binding> {
        self.bindings.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl<'a> IntoIterator for &'a BindingSet {
    type Item = &'a Binding;
    type IntoIter = std::slice::Iter<'a, Binding>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Variant-specific part of a descriptor.
#[derive(Debug, Clone)]
pub enum EndpointShape {
    Annotated(BindingSet),
    Programmatic,
}

/// Immutable description of one handler type.
#[derive(Debug, Clone)]
pub struct EndpointMetadata {
    class: Arc<HandlerClass>,
    path: Option<PathSpec>,
    config: Option<EndpointConfig>,
    shape: EndpointShape,
}

impl EndpointMetadata {
    /// Builds the descriptor of a programmatic endpoint. The path is taken
    /// from `config` when one is given.
    ///
    /// # Errors
    ///
    /// Returns `PathSpecError` if the configured path is not a valid template.
    pub fn programmatic(
        class: Arc<HandlerClass>,
        config: Option<EndpointConfig>,
    ) -> Result<Self, PathSpecError> {
        let path = config
            .as_ref()
            .map(|c| PathSpec::parse(&c.path))
            .transpose()?;
        Ok(Self {
            class,
            path,
            config,
            shape: EndpointShape::Programmatic,
        })
    }

    #[must_use]
    pub fn class(&self) -> &Arc<HandlerClass> {
        &self.class
    }

    /// Mount path; absent only for programmatic endpoints resolved without a
    /// configuration.
    #[must_use]
    pub fn path(&self) -> Option<&PathSpec> {
        self.path.as_ref()
    }

    #[must_use]
    pub fn config(&self) -> Option<&EndpointConfig> {
        self.config.as_ref()
    }

    #[must_use]
    pub fn shape(&self) -> &EndpointShape {
        &self.shape
    }

    #[must_use]
    pub fn variant(&self) -> Variant {
        match self.shape {
            EndpointShape::Annotated(_) => Variant::AnnotationDescribed,
            EndpointShape::Programmatic => Variant::Programmatic,
        }
    }

    /// Scanned bindings; `None` for programmatic endpoints.
    #[must_use]
    pub fn bindings(&self) -> Option<&BindingSet> {
        match &self.shape {
            EndpointShape::Annotated(bindings) => Some(bindings),
            EndpointShape::Programmatic => None,
        }
    }
}

/// Descriptor under construction for an annotation-described endpoint.
///
/// Handed to a `DescriptorScanner`, which fills in the bindings.
#[derive(Debug)]
pub struct AnnotatedMetadataBuilder {
    class: Arc<HandlerClass>,
    path: PathSpec,
    config: EndpointConfig,
    bindings: BindingSet,
}

impl AnnotatedMetadataBuilder {
    #[must_use]
    pub fn new(class: Arc<HandlerClass>, path: PathSpec, config: EndpointConfig) -> Self {
        Self {
            class,
            path,
            config,
            bindings: BindingSet::default(),
        }
    }

    #[must_use]
    pub fn class(&self) -> &Arc<HandlerClass> {
        &self.class
    }

    #[must_use]
    pub fn path(&self) -> &PathSpec {
        &self.path
    }

    #[must_use]
    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    #[must_use]
    pub fn bindings(&self) -> &BindingSet {
        &self.bindings
    }

    /// Adds a binding; see `BindingSet::insert`.
    ///
    /// # Errors
    ///
    /// Returns the already-bound `Binding` when the slot is occupied.
    pub fn bind(&mut self, binding: Binding) -> Result<(), Binding> {
        self.bindings.insert(binding)
    }

    /// Seals the descriptor.
    #[must_use]
    pub fn build(self) -> EndpointMetadata {
        EndpointMetadata {
            class: self.class,
            path: Some(self.path),
            config: Some(self.config),
            shape: EndpointShape::Annotated(self.bindings),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Feed;

    fn text_binding(method: &str) -> Binding {
        Binding {
            event: EventKind::Message,
            message_kind: Some(MessageKind::Text),
            method: method.to_string(),
            params: vec![ParamKind::Text],
        }
    }

    #[test]
    fn message_kind_from_params() {
        assert_eq!(
            MessageKind::from_params(&[ParamKind::Session, ParamKind::Binary]),
            Some(MessageKind::Binary)
        );
        assert_eq!(MessageKind::from_params(&[ParamKind::Session]), None);
    }

    #[test]
    fn binding_set_rejects_taken_slot() {
        let mut set = BindingSet::default();
        set.insert(text_binding("first")).unwrap();
        let existing = set.insert(text_binding("second")).unwrap_err();
        assert_eq!(existing.method, "first");
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn binding_set_allows_one_handler_per_message_kind() {
        let mut set = BindingSet::default();
        set.insert(text_binding("on_text")).unwrap();
        set.insert(Binding {
            event: EventKind::Message,
            message_kind: Some(MessageKind::Binary),
            method: "on_bytes".to_string(),
            params: vec![ParamKind::Binary],
        })
        .unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.message(MessageKind::Binary).unwrap().method, "on_bytes");
        assert!(set.message(MessageKind::Pong).is_none());
    }

    #[test]
    fn builder_produces_annotated_descriptor() {
        let class = Arc::new(HandlerClass::of::<Feed>());
        let path = PathSpec::parse("/feed").unwrap();
        let config = EndpointConfig::new(Arc::clone(&class), "/feed");
        let mut builder = AnnotatedMetadataBuilder::new(class, path, config);
        builder.bind(text_binding("on_text")).unwrap();

        let metadata = builder.build();
        assert_eq!(metadata.variant(), Variant::AnnotationDescribed);
        assert_eq!(metadata.path().map(PathSpec::as_str), Some("/feed"));
        assert_eq!(metadata.bindings().map(BindingSet::len), Some(1));
    }

    #[test]
    fn programmatic_descriptor_without_config_has_no_path() {
        let class = Arc::new(HandlerClass::of::<Feed>());
        let metadata = EndpointMetadata::programmatic(class, None).unwrap();
        assert_eq!(metadata.variant(), Variant::Programmatic);
        assert!(metadata.path().is_none());
        assert!(metadata.config().is_none());
        assert!(metadata.bindings().is_none());
    }

    #[test]
    fn programmatic_descriptor_validates_config_path() {
        let class = Arc::new(HandlerClass::of::<Feed>());
        let config = EndpointConfig::new(Arc::clone(&class), "feed");
        assert!(EndpointMetadata::programmatic(class, Some(config)).is_err());
    }
}
