//! Marketplace host binary.
//!
//! Boots the sample modules, prints what they contribute to the web layer
//! and waits for Ctrl+C before shutting them down.

use anyhow::{Context, Result};
use host_telemetry::{encode_metrics, init_telemetry, TelemetryConfig};
use micro_app_host::apps::{AuthApp, CatalogApp, OrdersApp};
use micro_app_host::MicroAppRegistry;
use shared_types::{AppConfig, ResourceHandle};
use tracing::{debug, error, info, warn};

/// Register the sample modules in dependency order.
fn build_registry(config: AppConfig) -> Result<MicroAppRegistry> {
    let resource = ResourceHandle::new("database", config.database_uri.clone());
    let mut registry = MicroAppRegistry::new(config, resource);

    registry.register_app(AuthApp::new())?;
    registry.register_app(CatalogApp::new())?;
    registry.register_app(OrdersApp::new())?;

    Ok(registry)
}

/// Dump the Prometheus text exposition at debug level.
fn log_metrics() {
    match encode_metrics() {
        Ok(text) => debug!("Final metrics:\n{}", text),
        Err(e) => warn!("Failed to encode metrics: {}", e),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_telemetry(&TelemetryConfig::from_env()).context("failed to initialize telemetry")?;

    let config = AppConfig::from_env().context("failed to load configuration")?;
    config
        .validate_for_production()
        .context("refusing to start with an insecure configuration")?;

    info!("===========================================");
    info!("  Micro-App Host v{}", env!("CARGO_PKG_VERSION"));
    info!("  Environment: {}", config.environment);
    info!("===========================================");

    let mut registry = build_registry(config)?;

    if let Err(e) = registry.initialize_all().await {
        error!("Boot aborted: {}", e);
        registry.print_status();
        let report = registry.shutdown_all().await;
        if !report.is_clean() {
            warn!("{} module(s) failed to shut down", report.failures.len());
        }
        log_metrics();
        return Err(e).context("micro-app initialization failed");
    }

    for route in registry.all_routes() {
        info!("  route    {}", route);
    }
    for provider in registry.all_providers() {
        info!("  provider {} ({:?})", provider.token, provider.scope);
    }
    registry.print_status();

    info!("Host is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    let report = registry.shutdown_all().await;
    for failure in &report.failures {
        warn!("{}: {}", failure.app, failure.error);
    }
    log_metrics();
    info!("Host stopped");

    Ok(())
}
