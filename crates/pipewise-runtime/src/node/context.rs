//! Opaque per-run execution context.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Host-supplied capability handed to nodes at construction.
///
/// The runtime never inspects the context. It is stored by every node
/// instance and passed to [`Node::run`](super::Node::run) unchanged; node
/// implementations that know the concrete type downcast it.
#[derive(Clone, Default)]
pub struct ExecutionContext {
    inner: Option<Arc<dyn Any + Send + Sync>>,
}

impl ExecutionContext {
    /// Wraps a host value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Some(Arc::new(value)),
        }
    }

    /// Creates a context that carries nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns whether a host value is attached.
    pub fn is_empty(&self) -> bool {
        self.inner.is_none()
    }

    /// Returns the attached value if it has type `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.as_deref()?.downcast_ref()
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("attached", &self.inner.is_some())
            .finish()
    }
}
