//! # Shared Types Crate
//!
//! Value types that cross the boundary between the host process, the
//! micro-app registry and the feature modules it boots.
//!
//! ## Contents
//!
//! - [`AppConfig`]: flat configuration record with well-known keys plus
//!   unvalidated extension keys.
//! - [`ResourceHandle`]: opaque, host-owned resource (typically a database
//!   connection) threaded through to every module without inspection.
//! - [`RouteDescriptor`] / [`ProviderDescriptor`]: contributions a module
//!   hands to the consuming web framework.

pub mod config;
pub mod descriptors;
pub mod errors;
pub mod resource;

pub use config::{AppConfig, Environment};
pub use descriptors::{HttpMethod, ProviderDescriptor, ProviderScope, RouteDescriptor};
pub use errors::ConfigError;
pub use resource::ResourceHandle;
