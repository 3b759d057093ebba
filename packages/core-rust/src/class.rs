//! Runtime description of a handler type.
//!
//! A `HandlerClass` is what deployment callers hand to the container: the
//! type's identity, its declarative marker and callback declarations (if
//! any), and constructors for fresh instances. Which of these are present
//! decides how the type is classified.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::marker::{MethodDecl, ServerEndpoint};
use crate::traits::{AnnotatedEndpoint, Endpoint};

/// Builds a fresh instance of a handler implementing the `Endpoint` contract.
pub type EndpointCtor = Arc<dyn Fn() -> Box<dyn Endpoint> + Send + Sync>;

/// Builds a fresh type-erased instance of a handler.
pub type InstanceCtor = Arc<dyn Fn() -> Box<dyn Any + Send> + Send + Sync>;

/// Identity of a handler type. Used as the metadata cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId {
    type_id: TypeId,
    name: &'static str,
}

impl ClassId {
    /// Returns the identity of `T`.
    #[must_use]
    pub fn of<T: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Fully qualified type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A handler type as seen by the container.
#[derive(Clone)]
pub struct HandlerClass {
    id: ClassId,
    marker: Option<ServerEndpoint>,
    methods: Vec<MethodDecl>,
    endpoint_ctor: Option<EndpointCtor>,
    instance_ctor: InstanceCtor,
}

impl HandlerClass {
    /// Describes a plain type: no marker, no declared callbacks, and no
    /// `Endpoint` implementation.
    #[must_use]
    pub fn of<T: Default + Send + 'static>() -> Self {
        Self {
            id: ClassId::of::<T>(),
            marker: None,
            methods: Vec::new(),
            endpoint_ctor: None,
            instance_ctor: Arc::new(|| Box::new(T::default()) as Box<dyn Any + Send>),
        }
    }

    /// Describes a declaratively described handler. The marker and callback
    /// declarations come from its `AnnotatedEndpoint` impl.
    #[must_use]
    pub fn annotated<T: AnnotatedEndpoint + Default + Send + 'static>() -> Self {
        let mut class = Self::of::<T>().with_marker(T::server_endpoint());
        class.methods = T::methods();
        class
    }

    /// Describes a handler that implements the `Endpoint` contract directly.
    #[must_use]
    pub fn programmatic<T: Endpoint + Default>() -> Self {
        let mut class = Self::of::<T>();
        class.endpoint_ctor = Some(Arc::new(|| Box::new(T::default()) as Box<dyn Endpoint>));
        class
    }

    /// Attaches (or replaces) the endpoint marker.
    #[must_use]
    pub fn with_marker(mut self, marker: ServerEndpoint) -> Self {
        self.marker = Some(marker);
        self
    }

    /// Appends a callback declaration.
    #[must_use]
    pub fn with_method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }

    #[must_use]
    pub fn id(&self) -> ClassId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.id.name()
    }

    #[must_use]
    pub fn marker(&self) -> Option<&ServerEndpoint> {
        self.marker.as_ref()
    }

    #[must_use]
    pub fn methods(&self) -> &[MethodDecl] {
        &self.methods
    }

    /// Whether the type implements the `Endpoint` contract.
    #[must_use]
    pub fn is_endpoint(&self) -> bool {
        self.endpoint_ctor.is_some()
    }

    /// Creates a fresh `Endpoint` instance, if the type implements the contract.
    #[must_use]
    pub fn new_endpoint(&self) -> Option<Box<dyn Endpoint>> {
        self.endpoint_ctor.as_ref().map(|ctor| ctor())
    }

    /// Creates a fresh type-erased instance.
    #[must_use]
    pub fn new_instance(&self) -> Box<dyn Any + Send> {
        (self.instance_ctor)()
    }
}

impl fmt::Debug for HandlerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerClass")
            .field("id", &self.id)
            .field("marker", &self.marker.as_ref().map(|m| m.path.as_str()))
            .field("methods", &self.methods.len())
            .field("is_endpoint", &self.is_endpoint())
            .finish()
    }
}
