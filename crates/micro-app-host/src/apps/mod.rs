//! Sample marketplace micro-apps.
//!
//! Register them in this order: `orders` hard-depends on `catalog`, and
//! `catalog` uses `auth` when it is present.

pub mod auth;
pub mod catalog;
pub mod orders;

pub use auth::{AuthApp, AuthService};
pub use catalog::{CatalogApp, CatalogService};
pub use orders::{OrderService, OrdersApp};
