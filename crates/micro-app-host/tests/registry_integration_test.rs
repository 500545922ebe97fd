//! End-to-end boot and shutdown of the registry with the marketplace apps
//! and small recording apps.

use std::sync::Arc;

use async_trait::async_trait;
use host_telemetry::EVENTS_EMITTED;
use micro_app_host::apps::{
    AuthApp, AuthService, CatalogApp, CatalogService, OrderService, OrdersApp,
};
use micro_app_host::{AppCore, AppState, MicroApp, MicroAppError, MicroAppRegistry};
use parking_lot::Mutex;
use serde_json::json;
use shared_bus::{handler, AppEvent, EventTopic, HandlerError};
use shared_types::{AppConfig, ProviderDescriptor, ResourceHandle, RouteDescriptor};

type Journal = Arc<Mutex<Vec<String>>>;

/// Records every lifecycle call into a shared journal.
struct Recorder {
    core: AppCore,
    journal: Journal,
    routes: Vec<&'static str>,
    fail_init: bool,
    fail_shutdown: bool,
}

impl Recorder {
    fn new(name: &str, journal: &Journal) -> Self {
        Self {
            core: AppCore::new(name, "1.0.0"),
            journal: Arc::clone(journal),
            routes: Vec::new(),
            fail_init: false,
            fail_shutdown: false,
        }
    }
}

#[async_trait]
impl MicroApp for Recorder {
    fn core(&self) -> &AppCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut AppCore {
        &mut self.core
    }

    fn register_services(&mut self) -> Result<(), MicroAppError> {
        let name = self.core.name().to_string();
        self.core
            .register_service(format!("{name}.marker"), Arc::new(name))
    }

    async fn on_initialize(&mut self) -> Result<(), MicroAppError> {
        self.journal.lock().push(format!("init:{}", self.core.name()));
        if self.fail_init {
            return Err(MicroAppError::hook(self.core.name(), "database unreachable"));
        }
        Ok(())
    }

    async fn on_shutdown(&mut self) -> Result<(), MicroAppError> {
        self.journal
            .lock()
            .push(format!("shutdown:{}", self.core.name()));
        if self.fail_shutdown {
            return Err(MicroAppError::hook(self.core.name(), "flush failed"));
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
        Vec::new()
    }
}

fn registry() -> MicroAppRegistry {
    MicroAppRegistry::new(AppConfig::default(), ResourceHandle::new("database", "memory://"))
}

fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

#[tokio::test]
async fn test_end_to_end_routes_and_status() {
    let j = journal();
    let mut reg = registry();

    let mut auth = Recorder::new("Auth", &j);
    auth.routes = vec!["/auth"];
    let mut catalog = Recorder::new("Catalog", &j);
    catalog.routes = vec!["/products"];
    reg.register_app(auth).unwrap();
    reg.register_app(catalog).unwrap();

    reg.initialize_all().await.unwrap();

    let paths: Vec<String> = reg.all_routes().into_iter().map(|r| r.path).collect();
    assert_eq!(paths, vec!["/auth", "/products"]);

    let status = serde_json::to_value(reg.status()).unwrap();
    assert_eq!(
        status,
        json!({
            "Auth": { "version": "1.0.0", "enabled": true, "state": "ready" },
            "Catalog": { "version": "1.0.0", "enabled": true, "state": "ready" }
        })
    );
}

#[tokio::test]
async fn test_duplicate_name_leaves_registry_unchanged() {
    let j = journal();
    let mut reg = registry();
    reg.register_app(Recorder::new("auth", &j)).unwrap();

    let err = reg.register_app(Recorder::new("auth", &j)).unwrap_err();

    assert!(matches!(err, MicroAppError::DuplicateAppRegistration { .. }));
    assert_eq!(reg.len(), 1);
    reg.initialize_all().await.unwrap();
    assert_eq!(*j.lock(), vec!["init:auth"]);
}

#[tokio::test]
async fn test_initialize_skips_disabled_in_order() {
    let j = journal();
    let mut reg = registry();
    reg.register_app(Recorder::new("A", &j)).unwrap();
    let mut b = Recorder::new("B", &j);
    b.core.set_enabled(false);
    reg.register_app(b).unwrap();
    reg.register_app(Recorder::new("C", &j)).unwrap();

    reg.initialize_all().await.unwrap();

    assert_eq!(*j.lock(), vec!["init:A", "init:C"]);
    assert!(!reg.context().services().contains("B.marker"));
}

#[tokio::test]
async fn test_failed_boot_keeps_earlier_side_effects() {
    let j = journal();
    let mut reg = registry();
    reg.register_app(Recorder::new("A", &j)).unwrap();
    let mut c = Recorder::new("C", &j);
    c.fail_init = true;
    reg.register_app(c).unwrap();
    reg.register_app(Recorder::new("D", &j)).unwrap();

    let err = reg.initialize_all().await.unwrap_err();

    match &err {
        MicroAppError::InitializationFailure { app, source } => {
            assert_eq!(app, "C");
            assert_eq!(**source, MicroAppError::hook("C", "database unreachable"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(reg.context().services().contains("A.marker"));
    assert!(!reg.context().services().contains("D.marker"));
    assert_eq!(reg.state("A"), Some(AppState::Ready));
    assert_eq!(reg.state("D"), Some(AppState::Registered));
}

#[tokio::test]
async fn test_shutdown_visits_everyone_then_clears_once() {
    let j = journal();
    let mut reg = registry();
    reg.register_app(Recorder::new("A", &j)).unwrap();
    let mut m = Recorder::new("M", &j);
    m.fail_shutdown = true;
    reg.register_app(m).unwrap();
    reg.register_app(Recorder::new("Z", &j)).unwrap();
    reg.initialize_all().await.unwrap();

    let ctx = reg.context();
    let shutdown_seen = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&shutdown_seen);
    let services_at_start = Arc::new(Mutex::new(0));
    let services_sink = Arc::clone(&services_at_start);
    let probe_ctx = Arc::clone(&ctx);
    ctx.on(
        EventTopic::ShutdownStarted,
        handler(move |event| {
            if let AppEvent::ShutdownStarted { app_count } = event {
                *sink.lock() = Some(*app_count);
            }
            *services_sink.lock() = probe_ctx.services().len();
            Ok(())
        }),
    );

    let report = reg.shutdown_all().await;

    assert_eq!(
        *j.lock(),
        vec![
            "init:A", "init:M", "init:Z", "shutdown:A", "shutdown:M", "shutdown:Z"
        ]
    );
    assert_eq!(report.attempted, 3);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].app, "M");
    assert_eq!(*shutdown_seen.lock(), Some(3));
    assert_eq!(*services_at_start.lock(), 3);
    assert!(ctx.services().is_empty());
    assert_eq!(ctx.event_bus().topic_count(), 0);
}

#[tokio::test]
async fn test_shutdown_includes_disabled_apps() {
    let j = journal();
    let mut reg = registry();
    let mut idle = Recorder::new("idle", &j);
    idle.core.set_enabled(false);
    reg.register_app(idle).unwrap();

    reg.initialize_all().await.unwrap();
    let report = reg.shutdown_all().await;

    assert_eq!(*j.lock(), vec!["shutdown:idle"]);
    assert!(report.is_clean());
}

#[test]
fn test_aggregation_reads_enabled_flag_at_call_time() {
    let j = journal();
    let mut reg = registry();
    let mut a = Recorder::new("a", &j);
    a.routes = vec!["/a"];
    let mut b = Recorder::new("b", &j);
    b.routes = vec!["/b1", "/b2"];
    reg.register_app(a).unwrap();
    reg.register_app(b).unwrap();

    reg.get_app_mut("a").unwrap().core_mut().set_enabled(false);

    let paths: Vec<String> = reg.all_routes().into_iter().map(|r| r.path).collect();
    assert_eq!(paths, vec!["/b1", "/b2"]);
}

#[test]
fn test_emit_without_subscribers_and_with_failing_handler() {
    let reg = registry();
    let ctx = reg.context();

    let report = ctx.emit(AppEvent::custom("nobody.listens", json!(null)));
    assert_eq!(report.delivered, 0);
    assert!(report.is_clean());

    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    ctx.on(
        EventTopic::custom("x"),
        handler(|_| Err(HandlerError::new("h1 broke"))),
    );
    ctx.on(
        EventTopic::custom("x"),
        handler(move |event| {
            sink.lock().push(event.clone());
            Ok(())
        }),
    );

    let event = AppEvent::custom("x", json!({ "n": 1 }));
    let report = ctx.emit(event.clone());

    assert_eq!(report.delivered, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(*received.lock(), vec![event]);
}

#[tokio::test]
async fn test_marketplace_flow() {
    let mut reg = registry();
    reg.register_app(AuthApp::new()).unwrap();
    reg.register_app(CatalogApp::new()).unwrap();
    reg.register_app(OrdersApp::new()).unwrap();
    reg.initialize_all().await.unwrap();

    let ctx = reg.context();
    let services = ctx.services();
    let auth = services.resolve::<AuthService>("auth").unwrap();
    let catalog = services.resolve::<CatalogService>("catalog").unwrap();
    let orders = services.resolve::<OrderService>("orders").unwrap();
    assert!(catalog.requires_verified_sellers());

    let placed = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&placed);
    ctx.on(
        EventTopic::OrderPlaced,
        handler(move |event| {
            if let AppEvent::OrderPlaced { total_cents, .. } = event {
                sink.lock().push(*total_cents);
            }
            Ok(())
        }),
    );

    let user = auth.register_user("buyer@shop.io").unwrap();
    auth.verify_user(&user.id).unwrap();
    assert!(orders.is_verified_buyer(&user.id));

    let lamp = catalog
        .create_product("Lamp", 2_500, Some(&user.id))
        .unwrap();
    let placed_before = EVENTS_EMITTED.with_label_values(&["order.placed"]).get();
    let order = orders
        .place_order(&user.id, &[(lamp.id.as_str(), 2)])
        .unwrap();

    assert_eq!(order.total_cents, 5_000);
    assert_eq!(*placed.lock(), vec![5_000]);
    assert!(EVENTS_EMITTED.with_label_values(&["order.placed"]).get() > placed_before);

    let report = reg.shutdown_all().await;
    assert!(report.is_clean());
}

#[tokio::test]
async fn test_catalog_degrades_without_auth() {
    let mut reg = registry();
    reg.register_app(AuthApp::new().enabled(false)).unwrap();
    reg.register_app(CatalogApp::new()).unwrap();

    reg.initialize_all().await.unwrap();

    let catalog = reg
        .context()
        .services()
        .resolve::<CatalogService>("catalog")
        .unwrap();
    assert!(!catalog.requires_verified_sellers());
    assert!(catalog.create_product("Chair", 4_000, None).is_ok());

    let report = reg.shutdown_all().await;
    assert_eq!(report.attempted, 2);
    assert!(report.is_clean(), "unexpected failures: {:?}", report.failures);
}

#[tokio::test]
async fn test_aborted_boot_shuts_down_cleanly() {
    let mut reg = registry();
    reg.register_app(CatalogApp::new().enabled(false)).unwrap();
    reg.register_app(OrdersApp::new()).unwrap();
    reg.register_app(AuthApp::new()).unwrap();

    assert!(reg.initialize_all().await.is_err());
    let report = reg.shutdown_all().await;

    assert_eq!(report.attempted, 3);
    assert!(report.is_clean(), "unexpected failures: {:?}", report.failures);
}

#[tokio::test]
async fn test_orders_without_catalog_aborts_boot() {
    let mut reg = registry();
    reg.register_app(CatalogApp::new().enabled(false)).unwrap();
    reg.register_app(OrdersApp::new()).unwrap();

    let err = reg.initialize_all().await.unwrap_err();

    assert_eq!(
        err.root_cause(),
        &MicroAppError::ServiceNotFound {
            name: "catalog".to_string()
        }
    );
    assert_eq!(reg.state("orders"), Some(AppState::Failed));
}
