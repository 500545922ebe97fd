//! # Host Telemetry
//!
//! Logging and metrics for the micro-app host.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use host_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     init_telemetry(&TelemetryConfig::from_env()).expect("Failed to init telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable           | Default          | Description             |
//! |--------------------|------------------|-------------------------|
//! | `APP_SERVICE_NAME` | `micro-app-host` | Service name in logs    |
//! | `APP_LOG_LEVEL`    | `info`           | Log level filter        |
//! | `APP_JSON_LOGS`    | `false`          | JSON formatted output   |
//! | `APP_LOG_SOURCE`   | `false`          | Include file and line   |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, APPS_INITIALIZED, APPS_REGISTERED, APP_INIT_FAILURES,
    APP_SHUTDOWN_FAILURES, EVENTS_EMITTED, HANDLER_FAILURES, SERVICES_REGISTERED,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and register metrics.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    logging::init_logging(config)?;
    register_metrics()?;
    Ok(())
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
