//! # Micro-App Registry - Ordered Plug-and-Play Host
//!
//! Owns the shared [`AppContext`], holds every registered micro-app and
//! drives their lifecycle.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      MicroAppRegistry                           │
//! │                                                                 │
//! │  ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌──────────┐         │
//! │  │   auth   │  │ catalog  │  │ shipping │  │  orders  │         │
//! │  │ ENABLED  │  │ ENABLED  │  │ DISABLED │  │ ENABLED  │         │
//! │  └────┬─────┘  └────┬─────┘  └──────────┘  └────┬─────┘         │
//! │       │             │                           │               │
//! │       └─────────────┴──────────────┬────────────┘               │
//! │                                    ▼                            │
//! │              ┌───────────────────────────────────┐              │
//! │              │ AppContext (bus, locator, config, │              │
//! │              │          resource handle)         │              │
//! │              └───────────────────────────────────┘              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lifecycle Rules
//!
//! - Names are unique; a duplicate `register` is an error.
//! - `initialize_all` runs strictly in registration order, skips disabled
//!   apps and stops at the first failure. Apps initialized before the
//!   failure are not rolled back.
//! - `shutdown_all` visits every app in registration order whether or not
//!   it is enabled, collects failures instead of propagating them, and
//!   finally clears the locator and the bus.
//! - Route and provider aggregation follows registration order and skips
//!   apps disabled at call time.
//!
//! There is no dependency resolution (order is caller-supplied), no
//! unregistration, and no timeout: an `initialize` that never returns
//! blocks the boot.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use host_telemetry::{
    metric_inc, APPS_INITIALIZED, APPS_REGISTERED, APP_INIT_FAILURES, APP_SHUTDOWN_FAILURES,
};
use serde::Serialize;
use shared_bus::AppEvent;
use shared_types::{AppConfig, ProviderDescriptor, ResourceHandle, RouteDescriptor};
use tracing::{debug, error, info, warn};

use crate::app::{AppState, MicroApp};
use crate::container::AppContext;
use crate::error::MicroAppError;

/// Diagnostic snapshot of one registered app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppStatusEntry {
    pub version: String,
    pub enabled: bool,
    pub state: AppState,
}

/// One app whose shutdown failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownFailure {
    pub app: String,
    pub error: MicroAppError,
}

/// Outcome of [`MicroAppRegistry::shutdown_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Apps whose `shutdown` was called.
    pub attempted: usize,
    pub failures: Vec<ShutdownFailure>,
}

impl ShutdownReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Registered app plus its lifecycle state.
struct AppEntry {
    app: Box<dyn MicroApp>,
    state: AppState,
}

/// The central micro-app registry.
pub struct MicroAppRegistry {
    /// Apps in registration order.
    apps: Vec<AppEntry>,
    /// Name -> position in `apps`.
    index: HashMap<String, usize>,
    /// Shared context, created once.
    context: Arc<AppContext>,
    /// Set after a full `initialize_all` pass.
    initialized: bool,
    /// Error that aborted boot, if any.
    boot_failure: Option<MicroAppError>,
}

impl MicroAppRegistry {
    /// Create the registry and the shared context.
    pub fn new(config: AppConfig, resource: ResourceHandle) -> Self {
        info!(
            environment = %config.environment,
            resource = resource.label(),
            "[Registry] Creating micro-app registry"
        );
        Self {
            apps: Vec::new(),
            index: HashMap::new(),
            context: Arc::new(AppContext::new(config, resource)),
            initialized: false,
            boot_failure: None,
        }
    }

    /// Register a micro-app.
    ///
    /// # Errors
    ///
    /// `DuplicateAppRegistration` if an app with the same name exists. The
    /// registry is unchanged in that case.
    pub fn register(&mut self, app: Box<dyn MicroApp>) -> Result<(), MicroAppError> {
        let name = app.name().to_string();

        if self.index.contains_key(&name) {
            error!("[Registry] Micro-app {} is already registered", name);
            return Err(MicroAppError::DuplicateAppRegistration { name });
        }

        info!(
            "[Registry] Registered micro-app: {} v{}{}",
            name,
            app.version(),
            if app.is_enabled() { "" } else { " (disabled)" }
        );

        self.index.insert(name, self.apps.len());
        self.apps.push(AppEntry {
            app,
            state: AppState::Registered,
        });
        metric_inc!(APPS_REGISTERED);

        Ok(())
    }

    /// Register a concrete micro-app value.
    pub fn register_app<A: MicroApp + 'static>(&mut self, app: A) -> Result<(), MicroAppError> {
        self.register(Box::new(app))
    }

    /// Initialize every enabled app in registration order.
    ///
    /// Stops at the first failure: emits `MicroAppFailed`, marks the app
    /// `Failed` and returns `InitializationFailure`. Later apps are never
    /// initialized. Once boot has failed, further calls return the same
    /// error. Apps already `Ready` are not initialized again.
    pub async fn initialize_all(&mut self) -> Result<(), MicroAppError> {
        if let Some(failure) = &self.boot_failure {
            warn!("[Registry] Boot already failed, refusing to initialize again");
            return Err(failure.clone());
        }

        info!(
            "[Registry] Initializing {} micro-apps in registration order",
            self.apps.len()
        );

        for entry in &mut self.apps {
            let name = entry.app.name().to_string();

            if !entry.app.is_enabled() {
                if entry.state == AppState::Registered {
                    entry.state = AppState::Skipped;
                }
                info!("[Registry] Skipping disabled micro-app: {}", name);
                continue;
            }

            if !entry.state.awaits_initialization() {
                debug!("[Registry] {} is {}, not initializing again", name, entry.state);
                continue;
            }

            info!("[Registry] Initializing {}", name);
            entry.state = AppState::Initializing;

            match entry.app.initialize(Arc::clone(&self.context)).await {
                Ok(()) => {
                    entry.state = AppState::Ready;
                    metric_inc!(APPS_INITIALIZED);
                    self.context.emit(AppEvent::MicroAppInitialized {
                        name: name.clone(),
                        version: entry.app.version().to_string(),
                    });
                    info!("[Registry] ✓ {} initialized", name);
                }
                Err(e) => {
                    entry.state = AppState::Failed;
                    metric_inc!(APP_INIT_FAILURES, &[name.as_str()]);
                    error!("[Registry] ✗ {} failed to initialize: {}", name, e);
                    self.context.emit(AppEvent::MicroAppFailed {
                        name: name.clone(),
                        error: e.to_string(),
                    });

                    let failure = MicroAppError::InitializationFailure {
                        app: name,
                        source: Box::new(e),
                    };
                    self.boot_failure = Some(failure.clone());
                    return Err(failure);
                }
            }
        }

        self.initialized = true;
        info!("[Registry] All enabled micro-apps initialized");
        Ok(())
    }

    /// Shut every registered app down, then clear the locator and the bus.
    ///
    /// Visits all apps in registration order, including disabled ones.
    /// Failures are logged and returned in the report, never propagated.
    pub async fn shutdown_all(&mut self) -> ShutdownReport {
        info!("[Registry] Shutting down {} micro-apps", self.apps.len());
        self.context.emit(AppEvent::ShutdownStarted {
            app_count: self.apps.len(),
        });

        let mut report = ShutdownReport::default();

        for entry in &mut self.apps {
            let name = entry.app.name().to_string();
            entry.state = AppState::ShuttingDown;
            report.attempted += 1;

            match entry.app.shutdown().await {
                Ok(()) => info!("[Registry] ✓ {} shut down", name),
                Err(e) => {
                    metric_inc!(APP_SHUTDOWN_FAILURES, &[name.as_str()]);
                    error!("[Registry] ✗ {} failed to shut down: {}", name, e);
                    report.failures.push(ShutdownFailure {
                        app: name.clone(),
                        error: MicroAppError::ShutdownFailed {
                            app: name,
                            message: e.to_string(),
                        },
                    });
                }
            }

            entry.state = AppState::Shutdown;
        }

        self.context.services().clear_all();
        self.context.event_bus().clear_all();
        self.initialized = false;

        if report.is_clean() {
            info!("[Registry] Shutdown complete");
        } else {
            warn!(
                "[Registry] Shutdown complete with {} failure(s)",
                report.failures.len()
            );
        }
        report
    }

    /// Routes of every enabled app, concatenated in registration order.
    #[must_use]
    pub fn all_routes(&self) -> Vec<RouteDescriptor> {
        self.enabled_apps().flat_map(|app| app.routes()).collect()
    }

    /// Providers of every enabled app, concatenated in registration order.
    #[must_use]
    pub fn all_providers(&self) -> Vec<ProviderDescriptor> {
        self.enabled_apps().flat_map(|app| app.providers()).collect()
    }

    fn enabled_apps(&self) -> impl Iterator<Item = &(dyn MicroApp + 'static)> {
        self.apps
            .iter()
            .map(|entry| entry.app.as_ref())
            .filter(|app| app.is_enabled())
    }

    #[must_use]
    pub fn get_app(&self, name: &str) -> Option<&dyn MicroApp> {
        self.index
            .get(name)
            .map(|&i| self.apps[i].app.as_ref() as &dyn MicroApp)
    }

    /// Mutable access, e.g. to flip the enabled flag.
    pub fn get_app_mut(&mut self, name: &str) -> Option<&mut (dyn MicroApp + 'static)> {
        let i = *self.index.get(name)?;
        Some(self.apps[i].app.as_mut())
    }

    /// The shared context.
    #[must_use]
    pub fn context(&self) -> Arc<AppContext> {
        Arc::clone(&self.context)
    }

    /// True after a complete, successful `initialize_all` and until
    /// `shutdown_all`.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// All apps in registration order.
    #[must_use]
    pub fn all(&self) -> Vec<&dyn MicroApp> {
        self.apps
            .iter()
            .map(|entry| entry.app.as_ref() as &dyn MicroApp)
            .collect()
    }

    /// Lifecycle state of one app.
    #[must_use]
    pub fn state(&self, name: &str) -> Option<AppState> {
        self.index.get(name).map(|&i| self.apps[i].state)
    }

    /// Name -> {version, enabled, state} for diagnostics.
    #[must_use]
    pub fn status(&self) -> BTreeMap<String, AppStatusEntry> {
        self.apps
            .iter()
            .map(|entry| {
                (
                    entry.app.name().to_string(),
                    AppStatusEntry {
                        version: entry.app.version().to_string(),
                        enabled: entry.app.is_enabled(),
                        state: entry.state,
                    },
                )
            })
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.apps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    /// Print registry status.
    pub fn print_status(&self) {
        info!("===========================================");
        info!("  MICRO-APP REGISTRY STATUS");
        info!("===========================================");

        for entry in &self.apps {
            let icon = match entry.state {
                AppState::Ready => "✅",
                AppState::Skipped => "⏸️ ",
                AppState::Failed => "❌",
                AppState::Shutdown => "⏹️ ",
                _ => "⏳",
            };
            info!(
                "  {} {:20} v{:10} {}",
                icon,
                entry.app.name(),
                entry.app.version(),
                entry.state
            );
        }

        info!("===========================================");
    }
}

impl std::fmt::Debug for MicroAppRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MicroAppRegistry")
            .field("apps", &self.apps.iter().map(|e| e.app.name()).collect::<Vec<_>>())
            .field("initialized", &self.initialized)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppCore;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    type Journal = Arc<Mutex<Vec<String>>>;

    /// Configurable app that records its lifecycle calls.
    struct Probe {
        core: AppCore,
        journal: Journal,
        fail_init: bool,
        fail_shutdown: bool,
        routes: Vec<&'static str>,
    }

    impl Probe {
        fn new(name: &str, journal: &Journal) -> Self {
            Self {
                core: AppCore::new(name, "1.0.0"),
                journal: Arc::clone(journal),
                fail_init: false,
                fail_shutdown: false,
                routes: Vec::new(),
            }
        }

        fn disabled(mut self) -> Self {
            self.core.set_enabled(false);
            self
        }

        fn failing_init(mut self) -> Self {
            self.fail_init = true;
            self
        }

        fn failing_shutdown(mut self) -> Self {
            self.fail_shutdown = true;
            self
        }

        fn with_routes(mut self, routes: Vec<&'static str>) -> Self {
            self.routes = routes;
            self
        }
    }

    #[async_trait]
    impl MicroApp for Probe {
        fn core(&self) -> &AppCore {
            &self.core
        }
        fn core_mut(&mut self) -> &mut AppCore {
            &mut self.core
        }
        async fn on_initialize(&mut self) -> Result<(), MicroAppError> {
            self.journal.lock().push(format!("init:{}", self.core.name()));
            if self.fail_init {
                return Err(MicroAppError::hook(self.core.name(), "init exploded"));
            }
            Ok(())
        }
        async fn on_shutdown(&mut self) -> Result<(), MicroAppError> {
            self.journal
                .lock()
                .push(format!("shutdown:{}", self.core.name()));
            if self.fail_shutdown {
                return Err(MicroAppError::hook(self.core.name(), "teardown exploded"));
            }
            Ok(())
        }
        fn routes(&self) -> Vec<RouteDescriptor> {
            self.routes
                .iter()
                .map(|p| RouteDescriptor::get(*p, "index"))
                .collect()
        }
        fn providers(&self) -> Vec<ProviderDescriptor> {
            vec![ProviderDescriptor::new(format!("{}Provider", self.core.name()))]
        }
    }

    fn registry() -> MicroAppRegistry {
        MicroAppRegistry::new(AppConfig::default(), ResourceHandle::none())
    }

    fn journal() -> Journal {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let j = journal();
        let mut reg = registry();

        reg.register_app(Probe::new("auth", &j)).unwrap();
        let err = reg.register_app(Probe::new("auth", &j).disabled()).unwrap_err();

        assert_eq!(
            err,
            MicroAppError::DuplicateAppRegistration {
                name: "auth".to_string()
            }
        );
        assert_eq!(reg.len(), 1);
        assert!(reg.get_app("auth").unwrap().is_enabled());
    }

    #[tokio::test]
    async fn test_disabled_apps_are_skipped() {
        let j = journal();
        let mut reg = registry();
        reg.register_app(Probe::new("a", &j)).unwrap();
        reg.register_app(Probe::new("b", &j).disabled()).unwrap();
        reg.register_app(Probe::new("c", &j)).unwrap();

        reg.initialize_all().await.unwrap();

        assert_eq!(*j.lock(), vec!["init:a", "init:c"]);
        assert_eq!(reg.state("b"), Some(AppState::Skipped));
        assert_eq!(reg.state("c"), Some(AppState::Ready));
        assert!(reg.is_initialized());
    }

    #[tokio::test]
    async fn test_failure_aborts_boot() {
        let j = journal();
        let mut reg = registry();
        reg.register_app(Probe::new("a", &j)).unwrap();
        reg.register_app(Probe::new("c", &j).failing_init()).unwrap();
        reg.register_app(Probe::new("d", &j)).unwrap();

        let failed = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&failed);
        reg.context().on(
            shared_bus::EventTopic::MicroAppFailed,
            shared_bus::handler(move |event| {
                if let AppEvent::MicroAppFailed { name, error } = event {
                    sink.lock().push((name.clone(), error.clone()));
                }
                Ok(())
            }),
        );

        let err = reg.initialize_all().await.unwrap_err();

        assert_eq!(*j.lock(), vec!["init:a", "init:c"]);
        assert_eq!(
            err.root_cause(),
            &MicroAppError::hook("c", "init exploded")
        );
        assert_eq!(reg.state("a"), Some(AppState::Ready));
        assert_eq!(reg.state("c"), Some(AppState::Failed));
        assert_eq!(reg.state("d"), Some(AppState::Registered));
        assert!(!reg.is_initialized());

        let failed = failed.lock();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].0, "c");
        assert!(failed[0].1.contains("init exploded"));
    }

    #[tokio::test]
    async fn test_failed_boot_is_not_resumed() {
        let j = journal();
        let mut reg = registry();
        reg.register_app(Probe::new("a", &j).failing_init()).unwrap();
        reg.register_app(Probe::new("b", &j)).unwrap();

        let first = reg.initialize_all().await.unwrap_err();
        let second = reg.initialize_all().await.unwrap_err();

        assert_eq!(first, second);
        assert_eq!(*j.lock(), vec!["init:a"]);
    }

    #[tokio::test]
    async fn test_no_app_is_initialized_twice() {
        let j = journal();
        let mut reg = registry();
        reg.register_app(Probe::new("a", &j)).unwrap();

        reg.initialize_all().await.unwrap();
        reg.initialize_all().await.unwrap();

        assert_eq!(*j.lock(), vec!["init:a"]);
    }

    #[tokio::test]
    async fn test_initialized_event_emitted_per_app() {
        let j = journal();
        let mut reg = registry();
        reg.register_app(Probe::new("a", &j)).unwrap();
        reg.register_app(Probe::new("b", &j)).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        reg.context().on(
            shared_bus::EventTopic::MicroAppInitialized,
            shared_bus::handler(move |event| {
                if let AppEvent::MicroAppInitialized { name, version } = event {
                    sink.lock().push(format!("{name}@{version}"));
                }
                Ok(())
            }),
        );

        reg.initialize_all().await.unwrap();

        assert_eq!(*seen.lock(), vec!["a@1.0.0", "b@1.0.0"]);
    }

    #[tokio::test]
    async fn test_shutdown_continues_past_failures() {
        let j = journal();
        let mut reg = registry();
        reg.register_app(Probe::new("a", &j)).unwrap();
        reg.register_app(Probe::new("m", &j).failing_shutdown()).unwrap();
        reg.register_app(Probe::new("z", &j).disabled()).unwrap();
        reg.initialize_all().await.unwrap();
        reg.context().services().register("leftover", Arc::new(1_u8));

        let report = reg.shutdown_all().await;

        assert_eq!(
            *j.lock(),
            vec!["init:a", "init:m", "shutdown:a", "shutdown:m", "shutdown:z"]
        );
        assert_eq!(report.attempted, 3);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].app, "m");
        assert!(matches!(
            report.failures[0].error,
            MicroAppError::ShutdownFailed { .. }
        ));
        assert!(reg.context().services().is_empty());
        assert_eq!(reg.context().event_bus().topic_count(), 0);
        assert_eq!(reg.state("z"), Some(AppState::Shutdown));
        assert!(!reg.is_initialized());
    }

    #[tokio::test]
    async fn test_aggregation_follows_registration_order() {
        let j = journal();
        let mut reg = registry();
        reg.register_app(Probe::new("auth", &j).with_routes(vec!["/auth"]))
            .unwrap();
        reg.register_app(Probe::new("hidden", &j).with_routes(vec!["/hidden"]).disabled())
            .unwrap();
        reg.register_app(Probe::new("catalog", &j).with_routes(vec!["/products", "/categories"]))
            .unwrap();

        let paths: Vec<String> = reg.all_routes().into_iter().map(|r| r.path).collect();
        assert_eq!(paths, vec!["/auth", "/products", "/categories"]);

        let tokens: Vec<String> = reg.all_providers().into_iter().map(|p| p.token).collect();
        assert_eq!(tokens, vec!["authProvider", "catalogProvider"]);
    }

    #[test]
    fn test_enabled_flag_is_read_at_call_time() {
        let j = journal();
        let mut reg = registry();
        reg.register_app(Probe::new("auth", &j).with_routes(vec!["/auth"]))
            .unwrap();

        assert_eq!(reg.all_routes().len(), 1);
        reg.get_app_mut("auth").unwrap().core_mut().set_enabled(false);
        assert!(reg.all_routes().is_empty());
        assert!(!reg.status()["auth"].enabled);
    }

    #[test]
    fn test_accessors() {
        let j = journal();
        let mut reg = registry();
        assert!(reg.is_empty());
        reg.register_app(Probe::new("b", &j)).unwrap();
        reg.register_app(Probe::new("a", &j)).unwrap();

        let names: Vec<&str> = reg.all().iter().map(|app| app.name()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert!(reg.get_app("missing").is_none());
        assert_eq!(reg.state("missing"), None);
        assert_eq!(
            reg.status()["a"],
            AppStatusEntry {
                version: "1.0.0".to_string(),
                enabled: true,
                state: AppState::Registered,
            }
        );
    }
}
