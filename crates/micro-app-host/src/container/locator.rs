//! # Service Locator
//!
//! Named registry of shared service instances.
//!
//! Names are plain strings so the locator needs no central type registry;
//! call sites name the type they expect and the locator downcasts:
//!
//! - [`ServiceLocator::resolve`] is the hard-dependency accessor: a missing
//!   or mistyped service is an error.
//! - [`ServiceLocator::resolve_optional`] is the soft-dependency accessor: a
//!   missing or mistyped service yields `None`, letting a module degrade
//!   gracefully when a companion module is disabled.
//!
//! Registering an existing name replaces the old instance and logs a
//! warning. That is allowed, unlike duplicate app registration.

use std::any::{type_name, Any};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use host_telemetry::SERVICES_REGISTERED;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::error::MicroAppError;

/// Type-erased service instance plus the name of its concrete type.
#[derive(Clone)]
pub struct ServiceHandle {
    instance: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl ServiceHandle {
    pub fn new<T: Any + Send + Sync>(instance: Arc<T>) -> Self {
        Self {
            instance,
            type_name: type_name::<T>(),
        }
    }

    /// Concrete type the service was registered as.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Typed view of the instance, if it is a `T`.
    #[must_use]
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.instance).downcast::<T>().ok()
    }

    #[must_use]
    pub fn is<T: Any + Send + Sync>(&self) -> bool {
        self.instance.is::<T>()
    }

    /// True if both handles point at the same instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &ServiceHandle) -> bool {
        Arc::ptr_eq(&self.instance, &other.instance)
    }
}

impl fmt::Debug for ServiceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceHandle")
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Named service registry shared by every micro-app.
#[derive(Default)]
pub struct ServiceLocator {
    services: RwLock<HashMap<String, ServiceHandle>>,
}

impl ServiceLocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `instance` under `name`, replacing any previous instance.
    pub fn register<T: Any + Send + Sync>(&self, name: impl Into<String>, instance: Arc<T>) {
        self.register_handle(name, ServiceHandle::new(instance));
    }

    /// Store an already type-erased handle under `name`.
    pub fn register_handle(&self, name: impl Into<String>, handle: ServiceHandle) {
        let name = name.into();
        let type_name = handle.type_name();
        let previous = self.services.write().insert(name.clone(), handle);
        SERVICES_REGISTERED.inc();

        match previous {
            Some(old) => warn!(
                service = %name,
                old_type = old.type_name(),
                new_type = type_name,
                "Service already registered, replacing"
            ),
            None => debug!(service = %name, type_name, "Service registered"),
        }
    }

    /// Resolve a required service.
    ///
    /// # Errors
    ///
    /// - `ServiceNotFound` if nothing is registered under `name`
    /// - `ServiceTypeMismatch` if the registered instance is not a `T`
    pub fn resolve<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>, MicroAppError> {
        let handle = self.resolve_handle(name)?;
        handle
            .downcast::<T>()
            .ok_or_else(|| MicroAppError::ServiceTypeMismatch {
                name: name.to_string(),
                expected: type_name::<T>(),
                actual: handle.type_name(),
            })
    }

    /// Resolve an optional service. Never fails.
    #[must_use]
    pub fn resolve_optional<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        let handle = self.services.read().get(name).cloned()?;
        let typed = handle.downcast::<T>();
        if typed.is_none() {
            warn!(
                service = name,
                expected = type_name::<T>(),
                actual = handle.type_name(),
                "Optional service has unexpected type, treating as absent"
            );
        }
        typed
    }

    /// Resolve the type-erased handle for a required service.
    pub fn resolve_handle(&self, name: &str) -> Result<ServiceHandle, MicroAppError> {
        self.services
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| MicroAppError::ServiceNotFound {
                name: name.to_string(),
            })
    }

    /// Remove a service. Returns the removed handle, if any.
    pub fn unregister(&self, name: &str) -> Option<ServiceHandle> {
        let removed = self.services.write().remove(name);
        if removed.is_some() {
            debug!(service = name, "Service unregistered");
        }
        removed
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.services.read().contains_key(name)
    }

    /// Read-only snapshot of every registered service, sorted by name.
    #[must_use]
    pub fn get_all(&self) -> BTreeMap<String, ServiceHandle> {
        self.services
            .read()
            .iter()
            .map(|(name, handle)| (name.clone(), handle.clone()))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.services.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.read().is_empty()
    }

    /// Remove every service.
    pub fn clear_all(&self) {
        let mut services = self.services.write();
        let count = services.len();
        services.clear();
        debug!(count, "Service locator cleared");
    }
}

impl fmt::Debug for ServiceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceLocator")
            .field("services", &self.get_all().keys().collect::<Vec<_>>())
            .finish()
    }
}
