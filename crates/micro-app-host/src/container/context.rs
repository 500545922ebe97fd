//! # Application Context
//!
//! The single bundle every micro-app receives in `initialize`: the host's
//! resource handle, the shared event bus, the service locator and the flat
//! configuration record. Built once by the registry and shared as
//! `Arc<AppContext>`.

use std::sync::Arc;

use host_telemetry::{EVENTS_EMITTED, HANDLER_FAILURES};
use shared_bus::{AppEvent, DispatchReport, EventBus, EventHandler, EventTopic};
use shared_types::{AppConfig, ResourceHandle};

use crate::container::locator::ServiceLocator;

/// Shared context handed to every micro-app.
#[derive(Debug)]
pub struct AppContext {
    resource: ResourceHandle,
    event_bus: Arc<EventBus>,
    services: ServiceLocator,
    config: AppConfig,
}

impl AppContext {
    pub fn new(config: AppConfig, resource: ResourceHandle) -> Self {
        Self::with_event_bus(config, resource, Arc::new(EventBus::new()))
    }

    /// Build a context around an existing bus.
    pub fn with_event_bus(
        config: AppConfig,
        resource: ResourceHandle,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            resource,
            event_bus,
            services: ServiceLocator::new(),
            config,
        }
    }

    /// Host resource handle, passed through uninspected.
    #[must_use]
    pub fn resource(&self) -> &ResourceHandle {
        &self.resource
    }

    #[must_use]
    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    #[must_use]
    pub fn services(&self) -> &ServiceLocator {
        &self.services
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Emit an event on the shared bus and record bus metrics.
    pub fn emit(&self, event: AppEvent) -> DispatchReport {
        let report = self.event_bus.emit(event);
        let topic = metric_label(&report.topic);
        EVENTS_EMITTED.with_label_values(&[topic]).inc();
        if !report.failures.is_empty() {
            HANDLER_FAILURES
                .with_label_values(&[topic])
                .inc_by(report.failures.len() as u64);
        }
        report
    }

    /// Subscribe a handler on the shared bus.
    pub fn on(&self, topic: EventTopic, handler: EventHandler) -> bool {
        self.event_bus.on(topic, handler)
    }

    /// Unsubscribe a handler from the shared bus.
    pub fn off(&self, topic: &EventTopic, handler: &EventHandler) -> bool {
        self.event_bus.off(topic, handler)
    }
}

/// Metric label for a topic. Custom topics share one label so their
/// names cannot grow the label set.
fn metric_label(topic: &EventTopic) -> &str {
    match topic {
        EventTopic::Custom(_) => CUSTOM_TOPIC_LABEL,
        other => other.as_str(),
    }
}

const CUSTOM_TOPIC_LABEL: &str = "custom";

#[cfg(test)]
mod tests {
    use super::*;
    use shared_bus::{handler, HandlerError};

    #[test]
    fn test_context_exposes_parts() {
        let mut config = AppConfig::default();
        config.database_name = "shop".to_string();
        let ctx = AppContext::new(config, ResourceHandle::new("db", 42_u32));

        assert_eq!(ctx.config().database_name, "shop");
        assert_eq!(ctx.resource().downcast_ref::<u32>(), Some(&42));
        assert!(ctx.services().is_empty());
        assert_eq!(ctx.event_bus().topic_count(), 0);
    }

    #[test]
    fn test_emit_reports_handler_failures() {
        let ctx = AppContext::new(AppConfig::default(), ResourceHandle::none());
        ctx.on(
            EventTopic::OrderPlaced,
            handler(|_| Err(HandlerError::new("ledger offline"))),
        );

        let report = ctx.emit(AppEvent::OrderPlaced {
            order_id: "o-1".to_string(),
            user_id: "u-1".to_string(),
            total_cents: 1999,
        });

        assert_eq!(report.delivered, 1);
        assert_eq!(report.failures.len(), 1);
        assert!(HANDLER_FAILURES.with_label_values(&["order.placed"]).get() >= 1);
    }

    #[test]
    fn test_custom_topics_share_one_metric_label() {
        let ctx = AppContext::new(AppConfig::default(), ResourceHandle::none());
        let before = EVENTS_EMITTED.with_label_values(&["custom"]).get();

        ctx.emit(AppEvent::custom("tenant.17.sync", serde_json::json!({})));
        ctx.emit(AppEvent::custom("tenant.18.sync", serde_json::json!({})));

        assert!(EVENTS_EMITTED.with_label_values(&["custom"]).get() >= before + 2);
        assert_eq!(metric_label(&EventTopic::custom("tenant.17.sync")), "custom");
        assert_eq!(metric_label(&EventTopic::UserVerified), "user.verified");
    }

    #[test]
    fn test_shared_bus_is_the_same_instance() {
        let bus = Arc::new(EventBus::new());
        let ctx = AppContext::with_event_bus(
            AppConfig::default(),
            ResourceHandle::none(),
            Arc::clone(&bus),
        );
        assert!(Arc::ptr_eq(ctx.event_bus(), &bus));
    }
}
