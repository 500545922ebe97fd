//! # Event Bus
//!
//! Synchronous, in-order publish/subscribe hub.
//!
//! `emit` snapshots the handler list for the event's topic, releases the
//! lock, and calls each handler in subscription order. A failing handler is
//! logged and recorded in the returned [`DispatchReport`]; the remaining
//! handlers still run and `emit` itself never fails. Because no lock is held
//! while handlers run, a handler may subscribe, unsubscribe or emit again.
//! Nested emission is bounded by a maximum depth.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, error, trace};

use crate::events::{AppEvent, EventTopic};
use crate::MAX_EMIT_DEPTH;

/// Error returned by a handler. Logged by the bus, never propagated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// A subscribed handler. Identity is the `Arc` allocation: subscribing the
/// same `Arc` twice to one topic has no effect.
pub type EventHandler = Arc<dyn Fn(&AppEvent) -> Result<(), HandlerError> + Send + Sync>;

/// Wrap a closure as an [`EventHandler`].
pub fn handler<F>(f: F) -> EventHandler
where
    F: Fn(&AppEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// One handler failure during a dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFailure {
    /// Position of the handler in subscription order.
    pub index: usize,
    pub error: HandlerError,
}

/// Outcome of a single `emit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub topic: EventTopic,
    /// Number of handlers invoked, including those that failed.
    pub delivered: usize,
    pub failures: Vec<HandlerFailure>,
    /// The event was dropped because nested emission went too deep.
    pub depth_exceeded: bool,
}

impl DispatchReport {
    fn empty(topic: EventTopic) -> Self {
        Self {
            topic,
            delivered: 0,
            failures: Vec::new(),
            depth_exceeded: false,
        }
    }

    /// True when every invoked handler succeeded and nothing was dropped.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && !self.depth_exceeded
    }
}

/// Decrements the nesting counter when a dispatch unwinds or returns.
struct DepthGuard<'a>(&'a AtomicUsize);

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-process event bus.
///
/// Intended to be driven from one thread at a time; the nesting counter is
/// shared across callers.
pub struct EventBus {
    /// Handlers per topic, in subscription order.
    handlers: RwLock<HashMap<EventTopic, Vec<EventHandler>>>,
    /// Current `emit` nesting depth.
    depth: AtomicUsize,
    /// Total events emitted, including dropped ones.
    events_emitted: AtomicU64,
    max_depth: usize,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_depth(MAX_EMIT_DEPTH)
    }

    /// Create a bus with a custom bound on nested emission.
    #[must_use]
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            depth: AtomicUsize::new(0),
            events_emitted: AtomicU64::new(0),
            max_depth: max_depth.max(1),
        }
    }

    /// Subscribe `handler` to `topic`.
    ///
    /// Returns `false` if this exact handler was already subscribed.
    pub fn on(&self, topic: EventTopic, handler: EventHandler) -> bool {
        let mut handlers = self.handlers.write();
        let list = handlers.entry(topic).or_default();

        if list.iter().any(|h| Arc::ptr_eq(h, &handler)) {
            return false;
        }

        list.push(handler);
        true
    }

    /// Unsubscribe `handler` from `topic`. Returns `false` if it was not
    /// subscribed.
    pub fn off(&self, topic: &EventTopic, handler: &EventHandler) -> bool {
        let mut handlers = self.handlers.write();
        let Some(list) = handlers.get_mut(topic) else {
            return false;
        };

        let before = list.len();
        list.retain(|h| !Arc::ptr_eq(h, handler));
        let removed = list.len() != before;

        if list.is_empty() {
            handlers.remove(topic);
        }
        removed
    }

    /// Invoke every handler subscribed to the event's topic, in order.
    pub fn emit(&self, event: AppEvent) -> DispatchReport {
        let topic = event.topic();
        self.events_emitted.fetch_add(1, Ordering::Relaxed);

        let depth = self.depth.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = DepthGuard(&self.depth);

        let mut report = DispatchReport::empty(topic);

        if depth > self.max_depth {
            error!(
                topic = %report.topic,
                depth,
                max_depth = self.max_depth,
                "Nested emit too deep, event dropped"
            );
            report.depth_exceeded = true;
            return report;
        }

        let snapshot: Vec<EventHandler> = self
            .handlers
            .read()
            .get(&report.topic)
            .cloned()
            .unwrap_or_default();

        if snapshot.is_empty() {
            trace!(topic = %report.topic, "Event emitted with no subscribers");
            return report;
        }

        for (index, handler) in snapshot.iter().enumerate() {
            report.delivered += 1;
            if let Err(err) = handler(&event) {
                error!(
                    topic = %report.topic,
                    handler = index,
                    error = %err,
                    "Event handler failed"
                );
                report.failures.push(HandlerFailure { index, error: err });
            }
        }

        debug!(
            topic = %report.topic,
            delivered = report.delivered,
            failed = report.failures.len(),
            "Event dispatched"
        );
        report
    }

    /// Drop every subscription for every topic.
    pub fn clear_all(&self) {
        let mut handlers = self.handlers.write();
        let topics = handlers.len();
        handlers.clear();
        debug!(topics, "Event bus cleared");
    }

    /// Number of handlers subscribed to `topic`.
    #[must_use]
    pub fn handler_count(&self, topic: &EventTopic) -> usize {
        self.handlers.read().get(topic).map_or(0, Vec::len)
    }

    /// Number of topics with at least one handler.
    #[must_use]
    pub fn topic_count(&self) -> usize {
        self.handlers.read().len()
    }

    /// Total number of `emit` calls.
    #[must_use]
    pub fn events_emitted(&self) -> u64 {
        self.events_emitted.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("topics", &self.topic_count())
            .field("events_emitted", &self.events_emitted())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}
