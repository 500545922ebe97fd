//! # Shared Bus - Event Bus for Inter-Module Communication
//!
//! Micro-apps never call each other directly for notifications; they emit
//! typed [`AppEvent`]s on the shared bus and subscribe handlers by
//! [`EventTopic`].
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │  Micro-app A │                    │  Micro-app B │
//! │              │      emit()        │              │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘    on()
//! ```
//!
//! ## Dispatch Rules
//!
//! - Synchronous: handlers run on the emitting thread before `emit` returns.
//! - Ordered: handlers run in subscription order.
//! - Isolated: a failing handler is logged and reported, never propagated.
//! - Bounded: nested emission deeper than [`MAX_EMIT_DEPTH`] is dropped.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod bus;
pub mod events;

// Re-export main types
pub use bus::{handler, DispatchReport, EventBus, EventHandler, HandlerError, HandlerFailure};
pub use events::{AppEvent, EventTopic};

/// Maximum nesting of `emit` calls made from inside handlers.
pub const MAX_EMIT_DEPTH: usize = 32;
