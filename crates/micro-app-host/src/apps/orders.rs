//! # Orders Micro-App
//!
//! Requires the `catalog` service: boot fails if it is missing. Learns
//! which buyers are verified from `UserVerified` events instead of calling
//! the auth module.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;
use shared_bus::{handler, AppEvent, EventHandler, EventTopic};
use shared_types::{ProviderDescriptor, RouteDescriptor};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::app::{AppCore, MicroApp};
use crate::apps::catalog::{CatalogError, CatalogService, CATALOG_SERVICE};
use crate::container::AppContext;
use crate::error::MicroAppError;

/// Locator name of [`OrderService`].
pub const ORDER_SERVICE: &str = "orders";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("buyer {0} is not verified")]
    UnverifiedBuyer(String),

    #[error("order has no items")]
    Empty,

    #[error("order total exceeds {} cents", u64::MAX)]
    TotalOverflow,

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    pub product_id: String,
    pub quantity: u32,
    pub unit_cents: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub lines: Vec<OrderLine>,
    pub total_cents: u64,
}

pub struct OrderService {
    catalog: Arc<CatalogService>,
    verified_buyers: RwLock<HashSet<String>>,
    orders: RwLock<Vec<Order>>,
    context: Arc<AppContext>,
}

impl OrderService {
    pub fn new(context: Arc<AppContext>, catalog: Arc<CatalogService>) -> Self {
        Self {
            catalog,
            verified_buyers: RwLock::new(HashSet::new()),
            orders: RwLock::new(Vec::new()),
            context,
        }
    }

    pub fn mark_verified(&self, user_id: &str) {
        self.verified_buyers.write().insert(user_id.to_string());
    }

    #[must_use]
    pub fn is_verified_buyer(&self, user_id: &str) -> bool {
        self.verified_buyers.read().contains(user_id)
    }

    /// Price the items against the catalog, store the order and emit
    /// `OrderPlaced`.
    pub fn place_order(&self, user_id: &str, items: &[(&str, u32)]) -> Result<Order, OrderError> {
        if !self.is_verified_buyer(user_id) {
            return Err(OrderError::UnverifiedBuyer(user_id.to_string()));
        }
        if items.iter().all(|(_, qty)| *qty == 0) {
            return Err(OrderError::Empty);
        }

        let mut lines = Vec::with_capacity(items.len());
        for (product_id, quantity) in items.iter().filter(|(_, qty)| *qty > 0) {
            let product = self.catalog.get_product(product_id)?;
            lines.push(OrderLine {
                product_id: product.id,
                quantity: *quantity,
                unit_cents: product.price_cents,
            });
        }
        let total_cents = lines
            .iter()
            .try_fold(0_u64, |total, l| {
                l.unit_cents
                    .checked_mul(u64::from(l.quantity))
                    .and_then(|line| total.checked_add(line))
            })
            .ok_or(OrderError::TotalOverflow)?;

        let order = Order {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            lines,
            total_cents,
        };
        self.orders.write().push(order.clone());

        self.context.emit(AppEvent::OrderPlaced {
            order_id: order.id.clone(),
            user_id: order.user_id.clone(),
            total_cents,
        });
        Ok(order)
    }

    #[must_use]
    pub fn orders_for(&self, user_id: &str) -> Vec<Order> {
        self.orders
            .read()
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn order_count(&self) -> usize {
        self.orders.read().len()
    }
}

/// Checkout routes.
pub struct OrdersApp {
    core: AppCore,
    service: Option<Arc<OrderService>>,
    on_verified: Option<EventHandler>,
}

impl OrdersApp {
    pub fn new() -> Self {
        Self {
            core: AppCore::new("orders", "0.9.0"),
            service: None,
            on_verified: None,
        }
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.core.set_enabled(enabled);
        self
    }
}

impl Default for OrdersApp {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MicroApp for OrdersApp {
    fn core(&self) -> &AppCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut AppCore {
        &mut self.core
    }

    fn register_services(&mut self) -> Result<(), MicroAppError> {
        let catalog = self
            .core
            .resolve_service::<CatalogService>(CATALOG_SERVICE)?;
        let context = Arc::clone(self.core.context()?);

        let service = Arc::new(OrderService::new(context, catalog));
        self.core
            .register_service(ORDER_SERVICE, Arc::clone(&service))?;
        self.service = Some(service);
        Ok(())
    }

    fn setup_event_listeners(&mut self) -> Result<(), MicroAppError> {
        let Some(service) = self.service.clone() else {
            return Err(MicroAppError::hook(
                self.core.name(),
                "order service missing before listener setup",
            ));
        };

        let on_verified = handler(move |event| {
            if let AppEvent::UserVerified { user_id } = event {
                service.mark_verified(user_id);
            }
            Ok(())
        });
        self.core
            .on(EventTopic::UserVerified, Arc::clone(&on_verified))?;
        self.on_verified = Some(on_verified);
        Ok(())
    }

    async fn on_shutdown(&mut self) -> Result<(), MicroAppError> {
        if let Some(on_verified) = self.on_verified.take() {
            self.core.off(&EventTopic::UserVerified, &on_verified)?;
        }
        if let Some(service) = self.service.take() {
            info!("[orders] Shutting down with {} orders", service.order_count());
        }
        Ok(())
    }

    fn routes(&self) -> Vec<RouteDescriptor> {
        vec![
            RouteDescriptor::post("/orders", "checkout"),
            RouteDescriptor::get("/orders/mine", "history"),
        ]
    }

    fn providers(&self) -> Vec<ProviderDescriptor> {
        vec![ProviderDescriptor::new("OrderService").backed_by(ORDER_SERVICE)]
    }
}
