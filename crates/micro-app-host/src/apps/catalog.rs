//! # Catalog Micro-App
//!
//! Product listing. Uses the `auth` service when it is present to restrict
//! product creation to verified sellers; without it, creation is open.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;
use shared_bus::AppEvent;
use shared_types::{ProviderDescriptor, ProviderScope, RouteDescriptor};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::app::{AppCore, MicroApp};
use crate::apps::auth::{AuthService, AUTH_SERVICE};
use crate::container::AppContext;
use crate::error::MicroAppError;

/// Locator name of [`CatalogService`].
pub const CATALOG_SERVICE: &str = "catalog";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("product name must not be empty")]
    EmptyName,

    #[error("seller {0} is not verified")]
    UnverifiedSeller(String),

    #[error("unknown product: {0}")]
    UnknownProduct(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price_cents: u64,
    pub seller_id: Option<String>,
}

pub struct CatalogService {
    products: RwLock<BTreeMap<String, Product>>,
    auth: Option<Arc<AuthService>>,
    context: Arc<AppContext>,
}

impl CatalogService {
    pub fn new(context: Arc<AppContext>, auth: Option<Arc<AuthService>>) -> Self {
        Self {
            products: RwLock::new(BTreeMap::new()),
            auth,
            context,
        }
    }

    /// True when seller checks are enforced.
    #[must_use]
    pub fn requires_verified_sellers(&self) -> bool {
        self.auth.is_some()
    }

    /// Add a product and emit `ProductCreated`.
    pub fn create_product(
        &self,
        name: &str,
        price_cents: u64,
        seller_id: Option<&str>,
    ) -> Result<Product, CatalogError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CatalogError::EmptyName);
        }

        if let Some(auth) = &self.auth {
            let seller = seller_id.unwrap_or_default();
            if !auth.is_verified(seller) {
                return Err(CatalogError::UnverifiedSeller(seller.to_string()));
            }
        }

        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            price_cents,
            seller_id: seller_id.map(str::to_string),
        };
        self.products
            .write()
            .insert(product.id.clone(), product.clone());

        debug!(product_id = %product.id, "Product created");
        self.context.emit(AppEvent::ProductCreated {
            product_id: product.id.clone(),
            name: product.name.clone(),
            price_cents,
        });
        Ok(product)
    }

    pub fn get_product(&self, product_id: &str) -> Result<Product, CatalogError> {
        self.products
            .read()
            .get(product_id)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownProduct(product_id.to_string()))
    }

    #[must_use]
    pub fn list_products(&self) -> Vec<Product> {
        self.products.read().values().cloned().collect()
    }

    #[must_use]
    pub fn product_count(&self) -> usize {
        self.products.read().len()
    }
}

/// Product listing routes.
pub struct CatalogApp {
    core: AppCore,
}

impl CatalogApp {
    pub fn new() -> Self {
        Self {
            core: AppCore::new("catalog", "1.2.0"),
        }
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.core.set_enabled(enabled);
        self
    }
}

impl Default for CatalogApp {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MicroApp for CatalogApp {
    fn core(&self) -> &AppCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut AppCore {
        &mut self.core
    }

    fn register_services(&mut self) -> Result<(), MicroAppError> {
        let auth = self
            .core
            .resolve_service_optional::<AuthService>(AUTH_SERVICE)?;
        if auth.is_none() {
            warn!("[catalog] auth service unavailable, product creation is unrestricted");
        }

        let context = Arc::clone(self.core.context()?);
        self.core
            .register_service(CATALOG_SERVICE, Arc::new(CatalogService::new(context, auth)))
    }

    async fn on_initialize(&mut self) -> Result<(), MicroAppError> {
        info!("[catalog] Ready");
        Ok(())
    }

    fn routes(&self) -> Vec<RouteDescriptor> {
        vec![
            RouteDescriptor::get("/products", "list"),
            RouteDescriptor::get("/products/:id", "show"),
            RouteDescriptor::post("/products", "create"),
        ]
    }

    fn providers(&self) -> Vec<ProviderDescriptor> {
        vec![
            ProviderDescriptor::new("CatalogService").backed_by(CATALOG_SERVICE),
            ProviderDescriptor::new("ProductQuery").with_scope(ProviderScope::Request),
        ]
    }
}
