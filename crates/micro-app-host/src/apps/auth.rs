//! # Auth Micro-App
//!
//! Owns user accounts. Publishes the `auth` service and announces account
//! changes on the bus so other modules never call into it directly.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;
use shared_bus::AppEvent;
use shared_types::{HttpMethod, ProviderDescriptor, RouteDescriptor};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::app::{AppCore, MicroApp};
use crate::container::AppContext;
use crate::error::MicroAppError;

/// Locator name of [`AuthService`].
pub const AUTH_SERVICE: &str = "auth";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    #[error("email already registered: {0}")]
    EmailTaken(String),

    #[error("unknown user: {0}")]
    UnknownUser(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub verified: bool,
}

/// In-memory account store.
pub struct AuthService {
    users: RwLock<HashMap<String, User>>,
    token_ttl_secs: u64,
    context: Arc<AppContext>,
}

impl AuthService {
    /// Token lifetime comes from the context's configuration.
    pub fn new(context: Arc<AppContext>) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            token_ttl_secs: context.config().token_ttl_secs,
            context,
        }
    }

    /// Create an unverified account and emit `UserRegistered`.
    pub fn register_user(&self, email: &str) -> Result<User, AuthError> {
        let email = email.trim().to_lowercase();
        if !is_plausible_email(&email) {
            return Err(AuthError::InvalidEmail(email));
        }

        let user = {
            let mut users = self.users.write();
            if users.values().any(|u| u.email == email) {
                return Err(AuthError::EmailTaken(email));
            }
            let user = User {
                id: Uuid::new_v4().to_string(),
                email,
                verified: false,
            };
            users.insert(user.id.clone(), user.clone());
            user
        };

        debug!(user_id = %user.id, "User registered");
        self.context.emit(AppEvent::UserRegistered {
            user_id: user.id.clone(),
            email: user.email.clone(),
        });
        Ok(user)
    }

    /// Mark an account verified and emit `UserVerified`. Verifying twice
    /// emits nothing the second time.
    pub fn verify_user(&self, user_id: &str) -> Result<User, AuthError> {
        let (user, changed) = {
            let mut users = self.users.write();
            let user = users
                .get_mut(user_id)
                .ok_or_else(|| AuthError::UnknownUser(user_id.to_string()))?;
            let changed = !user.verified;
            user.verified = true;
            (user.clone(), changed)
        };

        if changed {
            self.context.emit(AppEvent::UserVerified {
                user_id: user.id.clone(),
            });
        }
        Ok(user)
    }

    #[must_use]
    pub fn find_user(&self, user_id: &str) -> Option<User> {
        self.users.read().get(user_id).cloned()
    }

    #[must_use]
    pub fn is_verified(&self, user_id: &str) -> bool {
        self.users
            .read()
            .get(user_id)
            .is_some_and(|u| u.verified)
    }

    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.read().len()
    }

    #[must_use]
    pub fn token_ttl_secs(&self) -> u64 {
        self.token_ttl_secs
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    }
}

/// Accounts, verification and login routes.
pub struct AuthApp {
    core: AppCore,
}

impl AuthApp {
    pub fn new() -> Self {
        Self {
            core: AppCore::new("auth", "1.0.0"),
        }
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.core.set_enabled(enabled);
        self
    }
}

impl Default for AuthApp {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MicroApp for AuthApp {
    fn core(&self) -> &AppCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut AppCore {
        &mut self.core
    }

    fn register_services(&mut self) -> Result<(), MicroAppError> {
        let service = AuthService::new(Arc::clone(self.core.context()?));
        self.core.register_service(AUTH_SERVICE, Arc::new(service))
    }

    async fn on_initialize(&mut self) -> Result<(), MicroAppError> {
        let ttl = self.core.config()?.token_ttl_secs;
        info!("[auth] Ready, tokens expire after {}s", ttl);
        Ok(())
    }

    async fn on_shutdown(&mut self) -> Result<(), MicroAppError> {
        // Disabled, or boot stopped before reaching this app.
        if !self.core.is_attached() {
            return Ok(());
        }
        if let Some(service) = self.core.resolve_service_optional::<AuthService>(AUTH_SERVICE)? {
            info!("[auth] Shutting down with {} accounts", service.user_count());
        }
        Ok(())
    }

    fn routes(&self) -> Vec<RouteDescriptor> {
        vec![
            RouteDescriptor::post("/auth/register", "register"),
            RouteDescriptor::post("/auth/verify", "verify"),
            RouteDescriptor::post("/auth/login", "login"),
            RouteDescriptor::new(HttpMethod::Get, "/auth/me", "profile"),
        ]
    }

    fn providers(&self) -> Vec<ProviderDescriptor> {
        vec![ProviderDescriptor::new("AuthService").backed_by(AUTH_SERVICE)]
    }
}
