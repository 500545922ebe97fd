//! # Micro-App Lifecycle Template
//!
//! The contract every feature module implements. The registry only talks
//! to modules through this trait.
//!
//! ## Initialization Order
//!
//! `initialize` attaches the shared context, then runs three hooks in a
//! fixed order:
//!
//! 1. `register_services` - publish this module's services into the locator
//! 2. `setup_event_listeners` - subscribe handlers; services this module
//!    closes over already exist
//! 3. `on_initialize` - free-form startup logic
//!
//! `shutdown` runs `on_shutdown`.
//!
//! ## Example Implementation
//!
//! ```rust,ignore
//! struct ShippingApp { core: AppCore }
//!
//! #[async_trait]
//! impl MicroApp for ShippingApp {
//!     fn core(&self) -> &AppCore { &self.core }
//!     fn core_mut(&mut self) -> &mut AppCore { &mut self.core }
//!
//!     fn register_services(&mut self) -> Result<(), MicroAppError> {
//!         self.core.register_service("shipping", Arc::new(RateTable::default()))
//!     }
//!
//!     fn routes(&self) -> Vec<RouteDescriptor> {
//!         vec![RouteDescriptor::get("/shipping/rates", "rates")]
//!     }
//!     fn providers(&self) -> Vec<ProviderDescriptor> { Vec::new() }
//! }
//! ```

pub mod base;
pub mod state;

pub use base::AppCore;
pub use state::AppState;

use std::sync::Arc;

use async_trait::async_trait;
use shared_types::{ProviderDescriptor, RouteDescriptor};

use crate::container::AppContext;
use crate::error::MicroAppError;

/// The trait all micro-apps implement.
#[async_trait]
pub trait MicroApp: Send + Sync {
    /// Embedded descriptor and context slot.
    fn core(&self) -> &AppCore;

    fn core_mut(&mut self) -> &mut AppCore;

    /// Unique name across the registry.
    fn name(&self) -> &str {
        self.core().name()
    }

    /// Informational semantic version.
    fn version(&self) -> &str {
        self.core().version()
    }

    /// Read by the registry at every lifecycle and aggregation call.
    fn is_enabled(&self) -> bool {
        self.core().is_enabled()
    }

    /// Attach the context and run the three startup hooks in order.
    ///
    /// Override the hooks, not this method.
    async fn initialize(&mut self, context: Arc<AppContext>) -> Result<(), MicroAppError> {
        self.core_mut().attach(context);
        self.register_services()?;
        self.setup_event_listeners()?;
        self.on_initialize().await
    }

    /// Publish this module's services into the locator.
    fn register_services(&mut self) -> Result<(), MicroAppError> {
        Ok(())
    }

    /// Subscribe this module's event handlers.
    fn setup_event_listeners(&mut self) -> Result<(), MicroAppError> {
        Ok(())
    }

    async fn on_initialize(&mut self) -> Result<(), MicroAppError> {
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), MicroAppError> {
        self.on_shutdown().await
    }

    async fn on_shutdown(&mut self) -> Result<(), MicroAppError> {
        Ok(())
    }

    /// Routes this module mounts on the web layer. May be empty.
    fn routes(&self) -> Vec<RouteDescriptor>;

    /// Providers this module exposes to the web layer. May be empty.
    fn providers(&self) -> Vec<ProviderDescriptor>;
}
