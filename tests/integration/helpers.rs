//! Shared test helpers for integration tests.

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use http::{HeaderMap, Request, StatusCode};
use serde_json::Value;
use tokio::sync::Mutex;
use tower::ServiceExt;

use hotroute_api::{ApiState, build_router};
use hotroute_host::{HostApp, HostConfig, Response, RouteOptions, SharedHost};
use hotroute_plugin::{CatalogLoader, Plugin, PluginCatalog, PluginManager, PluginResult, PluginSource};

/// Directory of a fixture application under `tests/fixtures`.
pub fn fixture_root(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Binds `index` first and only then routes `/` to it.
fn only_endpoint(source: &PluginSource) -> PluginResult<Plugin> {
    let mut plugin = Plugin::from_manifest(&source.manifest, source.root.clone())?;
    plugin.bind_endpoint("index", |_ctx| Ok(Response::text("index")))?;
    plugin.add_url_rule("/", "index", None, RouteOptions::default())?;
    Ok(plugin)
}

/// Mounted at a domain equal to the blueprint.
fn same_domain(source: &PluginSource) -> PluginResult<Plugin> {
    let mut plugin = Plugin::from_manifest(&source.manifest, source.root.clone())?;
    plugin.template_folder("templates");
    plugin.route("/<string:name>", "index", |ctx| {
        let mut context = serde_json::Map::new();
        context.insert(
            "name".to_string(),
            Value::from(ctx.arg("name").unwrap_or_default()),
        );
        ctx.render_template("index.html", context)
    })?;
    Ok(plugin)
}

/// Greeting plugins plus the fixture-only entries.
pub fn catalog() -> PluginCatalog {
    let mut catalog = PluginCatalog::new();
    plugin_greeter::register(&mut catalog);
    catalog
        .register("only-endpoint", only_endpoint)
        .register("same-domain-as-blueprint", same_domain);
    catalog
}

/// Response captured by [`TestApp::request`].
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub text: String,
}

impl TestResponse {
    /// Body parsed as JSON.
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.text).expect("Response body is not JSON")
    }
}

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Lifecycle control shared with the router
    pub manager: Arc<Mutex<PluginManager>>,
    /// The host requests are dispatched into
    pub host: SharedHost,
}

impl TestApp {
    /// Application rooted at `tests/fixtures/app`.
    pub async fn new() -> Self {
        Self::with_config("app", |_| {}).await
    }

    /// Application rooted at fixture `name`, with host configuration
    /// adjusted by `configure` before the manager resolves it.
    pub async fn with_config(name: &str, configure: impl FnOnce(&mut HostConfig)) -> Self {
        let mut app = HostApp::new(fixture_root(name));
        configure(app.config_mut());
        let host = app.into_shared();

        let manager = PluginManager::new(host, CatalogLoader::new(catalog()))
            .await
            .expect("Failed to create plugin manager");
        let state = ApiState::new(manager);

        Self {
            manager: state.manager.clone(),
            host: state.host.clone(),
            router: build_router(state),
        }
    }

    /// Loads every discoverable plugin.
    pub async fn load_all(&self) {
        let mut manager = self.manager.lock().await;
        let scanned: Vec<Plugin> = manager
            .scan()
            .expect("Failed to scan")
            .collect::<PluginResult<_>>()
            .expect("Failed to discover plugin");
        for plugin in scanned {
            manager.load(plugin).expect("Failed to load plugin");
        }
    }

    /// Loads and starts every discoverable plugin.
    pub async fn start_all(&self) {
        self.load_all().await;
        let mut manager = self.manager.lock().await;
        let ids: Vec<String> = manager.tracked().map(|p| p.id().to_string()).collect();
        for id in ids {
            manager.start(&id).await.expect("Failed to start plugin");
        }
    }

    /// Sends a request through the router.
    pub async fn request(&self, method: &str, path: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");

        TestResponse {
            status,
            headers,
            text: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path).await
    }
}
