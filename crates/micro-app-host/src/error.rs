//! # Host Error Types
//!
//! Errors raised by the registry, the service locator and micro-app hooks.
//!
//! Boot-time errors (`DuplicateAppRegistration`, `InitializationFailure`)
//! propagate to the bootstrap caller. Shutdown errors and event handler
//! errors are collected and logged instead.

use thiserror::Error;

/// Errors produced by the micro-app host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MicroAppError {
    /// An app with this name is already registered.
    #[error("Micro-app already registered: {name}")]
    DuplicateAppRegistration { name: String },

    /// A micro-app's `initialize` failed; boot was aborted.
    #[error("Micro-app {app} failed to initialize: {source}")]
    InitializationFailure {
        app: String,
        #[source]
        source: Box<MicroAppError>,
    },

    /// Hard dependency lookup found nothing under this name.
    #[error("Service not found: {name}")]
    ServiceNotFound { name: String },

    /// A service exists under this name but has a different type.
    #[error("Service {name} is a {actual}, not a {expected}")]
    ServiceTypeMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A context helper was used before `initialize` attached the context.
    #[error("Micro-app {app} used its context before initialize")]
    ContextNotInitialized { app: String },

    /// A lifecycle hook reported a failure.
    #[error("[{app}] {message}")]
    HookFailed { app: String, message: String },

    /// A micro-app's `shutdown` reported a failure.
    #[error("Micro-app {app} failed to shut down: {message}")]
    ShutdownFailed { app: String, message: String },
}

impl MicroAppError {
    /// Convenience constructor for hook failures.
    pub fn hook(app: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HookFailed {
            app: app.into(),
            message: message.into(),
        }
    }

    /// The underlying cause, unwrapping `InitializationFailure`.
    #[must_use]
    pub fn root_cause(&self) -> &MicroAppError {
        match self {
            Self::InitializationFailure { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
