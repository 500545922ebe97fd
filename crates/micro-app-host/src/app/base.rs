//! Per-app descriptor and context helpers.
//!
//! Every micro-app embeds an [`AppCore`]. It carries the descriptor (name,
//! version, enabled flag) and, once `initialize` has run, the shared
//! context. The helpers proxy to that context and fail with
//! `ContextNotInitialized` when called too early.

use std::any::Any;
use std::sync::Arc;

use shared_bus::{AppEvent, DispatchReport, EventHandler, EventTopic};
use shared_types::AppConfig;

use crate::container::AppContext;
use crate::error::MicroAppError;

/// Descriptor and context slot embedded in every micro-app.
#[derive(Debug, Clone)]
pub struct AppCore {
    name: String,
    version: String,
    enabled: bool,
    context: Option<Arc<AppContext>>,
}

impl AppCore {
    /// New, enabled descriptor.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            enabled: true,
            context: None,
        }
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Store the shared context. Called by `MicroApp::initialize`.
    pub fn attach(&mut self, context: Arc<AppContext>) {
        self.context = Some(context);
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.context.is_some()
    }

    /// The shared context, or `ContextNotInitialized`.
    pub fn context(&self) -> Result<&Arc<AppContext>, MicroAppError> {
        self.context
            .as_ref()
            .ok_or_else(|| MicroAppError::ContextNotInitialized {
                app: self.name.clone(),
            })
    }

    pub fn config(&self) -> Result<&AppConfig, MicroAppError> {
        Ok(self.context()?.config())
    }

    pub fn emit(&self, event: AppEvent) -> Result<DispatchReport, MicroAppError> {
        Ok(self.context()?.emit(event))
    }

    pub fn on(&self, topic: EventTopic, handler: EventHandler) -> Result<bool, MicroAppError> {
        Ok(self.context()?.on(topic, handler))
    }

    pub fn off(&self, topic: &EventTopic, handler: &EventHandler) -> Result<bool, MicroAppError> {
        Ok(self.context()?.off(topic, handler))
    }

    pub fn register_service<T: Any + Send + Sync>(
        &self,
        name: impl Into<String>,
        instance: Arc<T>,
    ) -> Result<(), MicroAppError> {
        self.context()?.services().register(name, instance);
        Ok(())
    }

    /// Hard dependency lookup.
    pub fn resolve_service<T: Any + Send + Sync>(
        &self,
        name: &str,
    ) -> Result<Arc<T>, MicroAppError> {
        self.context()?.services().resolve(name)
    }

    /// Soft dependency lookup. Only fails if the context is missing.
    pub fn resolve_service_optional<T: Any + Send + Sync>(
        &self,
        name: &str,
    ) -> Result<Option<Arc<T>>, MicroAppError> {
        Ok(self.context()?.services().resolve_optional(name))
    }
}
