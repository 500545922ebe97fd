//! # Application Events
//!
//! Closed set of events that flow through the bus. Every variant carries its
//! own typed payload; handlers subscribe by [`EventTopic`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// All events that can be emitted on the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AppEvent {
    // =========================================================================
    // REGISTRY LIFECYCLE
    // =========================================================================
    /// A micro-app finished `initialize` successfully.
    MicroAppInitialized {
        /// Registered app name.
        name: String,
        /// Informational semantic version.
        version: String,
    },

    /// A micro-app's `initialize` failed. Boot is aborted after this.
    MicroAppFailed {
        /// Registered app name.
        name: String,
        /// Rendered error message.
        error: String,
    },

    /// The registry is about to tear every micro-app down.
    ShutdownStarted {
        /// Number of registered apps about to be visited.
        app_count: usize,
    },

    // =========================================================================
    // MARKETPLACE DOMAIN
    // =========================================================================
    /// A new account was created.
    UserRegistered { user_id: String, email: String },

    /// An account confirmed its e-mail address.
    UserVerified { user_id: String },

    /// A product was added to the catalog.
    ProductCreated {
        product_id: String,
        name: String,
        price_cents: u64,
    },

    /// An order was placed.
    OrderPlaced {
        order_id: String,
        user_id: String,
        total_cents: u64,
    },

    // =========================================================================
    // EXTENSION
    // =========================================================================
    /// Event defined by an independently authored module.
    Custom {
        /// Event name, used as the topic.
        name: String,
        /// Free-form payload.
        payload: serde_json::Value,
    },
}

impl AppEvent {
    /// Get the topic handlers subscribe to for this event.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::MicroAppInitialized { .. } => EventTopic::MicroAppInitialized,
            Self::MicroAppFailed { .. } => EventTopic::MicroAppFailed,
            Self::ShutdownStarted { .. } => EventTopic::ShutdownStarted,
            Self::UserRegistered { .. } => EventTopic::UserRegistered,
            Self::UserVerified { .. } => EventTopic::UserVerified,
            Self::ProductCreated { .. } => EventTopic::ProductCreated,
            Self::OrderPlaced { .. } => EventTopic::OrderPlaced,
            Self::Custom { name, .. } => EventTopic::Custom(name.clone()),
        }
    }

    /// Build a custom event.
    pub fn custom(name: impl Into<String>, payload: serde_json::Value) -> Self {
        Self::Custom {
            name: name.into(),
            payload,
        }
    }
}

/// Subscription key for handlers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventTopic {
    MicroAppInitialized,
    MicroAppFailed,
    ShutdownStarted,
    UserRegistered,
    UserVerified,
    ProductCreated,
    OrderPlaced,
    /// Topic of [`AppEvent::Custom`] events with this name.
    Custom(String),
}

impl EventTopic {
    /// Dotted wire name, used in logs and metric labels.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::MicroAppInitialized => "micro-app.initialized",
            Self::MicroAppFailed => "micro-app.failed",
            Self::ShutdownStarted => "system.shutdown",
            Self::UserRegistered => "user.registered",
            Self::UserVerified => "user.verified",
            Self::ProductCreated => "product.created",
            Self::OrderPlaced => "order.placed",
            Self::Custom(name) => name,
        }
    }

    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }
}

impl fmt::Display for EventTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
