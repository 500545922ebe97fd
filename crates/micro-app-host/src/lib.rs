//! # Micro-App Host
//!
//! Boots independently authored feature modules ("micro-apps") against one
//! shared context and tears them down again on exit.
//!
//! ## Modular Structure
//!
//! - `app/` - The lifecycle contract every module implements
//! - `container/` - Shared context and service locator
//! - `registry/` - Ordered registration, boot and shutdown
//! - `apps/` - Sample marketplace modules (auth, catalog, orders)
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (from env)
//! 2. Validate the token secret in production
//! 3. Register modules in dependency order
//! 4. Initialize enabled modules, aborting on the first failure
//! 5. Hand routes and providers to the web layer

pub mod app;
pub mod apps;
pub mod container;
pub mod error;
pub mod registry;

pub use app::{AppCore, AppState, MicroApp};
pub use container::{AppContext, ServiceHandle, ServiceLocator};
pub use error::MicroAppError;
pub use registry::{AppStatusEntry, MicroAppRegistry, ShutdownFailure, ShutdownReport};
