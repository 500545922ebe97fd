//! # Resource Handle
//!
//! Opaque, host-owned resource (a database connection, a pool, a client)
//! passed to every micro-app without inspection. Cloning a handle shares the
//! underlying resource; it is never copied.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Shared handle to a host resource.
#[derive(Clone)]
pub struct ResourceHandle {
    label: String,
    inner: Option<Arc<dyn Any + Send + Sync>>,
}

impl ResourceHandle {
    /// Wrap a host resource under a diagnostic label.
    pub fn new<T: Any + Send + Sync>(label: impl Into<String>, resource: T) -> Self {
        Self::from_arc(label, Arc::new(resource))
    }

    /// Wrap an already shared resource.
    pub fn from_arc<T: Any + Send + Sync>(label: impl Into<String>, resource: Arc<T>) -> Self {
        Self {
            label: label.into(),
            inner: Some(resource),
        }
    }

    /// A handle carrying no resource. Used by hosts without persistence.
    #[must_use]
    pub fn none() -> Self {
        Self {
            label: "none".to_string(),
            inner: None,
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn is_present(&self) -> bool {
        self.inner.is_some()
    }

    /// Borrow the resource as `T`, if that is what the host stored.
    #[must_use]
    pub fn downcast_ref<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.inner.as_deref().and_then(|r| r.downcast_ref::<T>())
    }

    /// Share the resource as `Arc<T>`, if that is what the host stored.
    #[must_use]
    pub fn downcast_arc<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.inner.clone().and_then(|r| r.downcast::<T>().ok())
    }
}

impl Default for ResourceHandle {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("label", &self.label)
            .field("present", &self.is_present())
            .finish()
    }
}
