//! Prometheus metrics for the micro-app host.
//!
//! All metrics follow the naming convention: `mah_<area>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // REGISTRY LIFECYCLE
    // =========================================================================

    /// Micro-apps accepted by `register`
    pub static ref APPS_REGISTERED: IntCounter = IntCounter::new(
        "mah_registry_apps_registered_total",
        "Total number of micro-apps registered"
    ).expect("metric creation failed");

    /// Micro-apps that finished `initialize`
    pub static ref APPS_INITIALIZED: IntCounter = IntCounter::new(
        "mah_registry_apps_initialized_total",
        "Total number of micro-apps initialized successfully"
    ).expect("metric creation failed");

    /// Micro-apps whose `initialize` failed, by app
    pub static ref APP_INIT_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("mah_registry_init_failures_total", "Micro-app initialization failures"),
        &["app"]
    ).expect("metric creation failed");

    /// Micro-apps whose `shutdown` failed, by app
    pub static ref APP_SHUTDOWN_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("mah_registry_shutdown_failures_total", "Micro-app shutdown failures"),
        &["app"]
    ).expect("metric creation failed");

    // =========================================================================
    // EVENT BUS
    // =========================================================================

    /// Events emitted through the shared context, by topic
    pub static ref EVENTS_EMITTED: IntCounterVec = IntCounterVec::new(
        Opts::new("mah_bus_events_emitted_total", "Events emitted on the bus"),
        &["topic"]
    ).expect("metric creation failed");

    /// Handler failures during dispatch, by topic
    pub static ref HANDLER_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("mah_bus_handler_failures_total", "Event handler failures"),
        &["topic"]
    ).expect("metric creation failed");

    // =========================================================================
    // SERVICE LOCATOR
    // =========================================================================

    /// Services published into the locator (including replacements)
    pub static ref SERVICES_REGISTERED: IntCounter = IntCounter::new(
        "mah_locator_services_registered_total",
        "Total number of service registrations"
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(APPS_REGISTERED.clone()),
        Box::new(APPS_INITIALIZED.clone()),
        Box::new(APP_INIT_FAILURES.clone()),
        Box::new(APP_SHUTDOWN_FAILURES.clone()),
        Box::new(EVENTS_EMITTED.clone()),
        Box::new(HANDLER_FAILURES.clone()),
        Box::new(SERVICES_REGISTERED.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_metrics() {
        // May fail if another test registered first, which is fine
        let _ = register_metrics();
        APPS_REGISTERED.inc();
        let text = encode_metrics().unwrap();
        assert!(text.contains("mah_registry_apps_registered_total"));
    }

    #[test]
    fn test_counter_increment() {
        APPS_REGISTERED.inc();
        assert!(APPS_REGISTERED.get() >= 1);
    }

    #[test]
    fn test_labelled_counter() {
        EVENTS_EMITTED.with_label_values(&["test.topic"]).inc();
        assert!(EVENTS_EMITTED.with_label_values(&["test.topic"]).get() >= 1);
    }
}
