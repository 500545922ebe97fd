//! # Shared Container
//!
//! The service locator and the context that bundles it with the event bus,
//! the configuration and the host resource handle.

pub mod context;
pub mod locator;

pub use context::AppContext;
pub use locator::{ServiceHandle, ServiceLocator};
