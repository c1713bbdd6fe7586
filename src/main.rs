//! HotRoute server: a web host whose plugins can be loaded, started,
//! stopped and unloaded while it keeps serving.
//!
//! Main entry point that wires all crates together and starts the server.

use std::path::PathBuf;

use tracing_subscriber::{EnvFilter, fmt};

use hotroute_core::config::AppConfig;
use hotroute_core::error::AppError;
use hotroute_host::{HostApp, HostConfig};
use hotroute_plugin::manager::{BLUEPRINT_KEY, DIRECTORY_KEY, EXCLUDES_KEY, PROPAGATE_KEY};
use hotroute_plugin::{CatalogLoader, PluginCatalog, PluginManager};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from `config/` and the environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("HOTROUTE_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Seeds the host configuration keys the plugin manager resolves.
fn host_config(config: &AppConfig, host: &mut HostConfig) {
    host.set(BLUEPRINT_KEY, config.plugins.blueprint.clone());
    host.set(DIRECTORY_KEY, config.plugins.directory.clone());
    host.set(EXCLUDES_KEY, config.plugins.excludes_directory.clone());
    if let Some(propagate) = config.plugins.propagate_errors {
        host.set(PROPAGATE_KEY, propagate);
    }
}

/// Builds the host application from the server section.
fn build_host(config: &AppConfig) -> HostApp {
    let root = PathBuf::from(&config.server.root_path);
    let mut host = HostApp::new(&root);
    if let Some(folder) = &config.server.template_folder {
        host = host.with_template_folder(folder);
    }
    host_config(config, host.config_mut());
    host
}

/// Loads every discoverable plugin, then starts the configured ones.
async fn bootstrap_plugins(config: &AppConfig, manager: &mut PluginManager) -> Result<(), AppError> {
    if config.plugins.auto_load {
        let discovered: Vec<_> = manager.scan()?.collect();
        for item in discovered {
            match item {
                Ok(plugin) => {
                    let id = plugin.id().to_string();
                    if let Err(e) = manager.load(plugin) {
                        tracing::warn!(plugin_id = %id, error = %e, "Skipping plugin");
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
        tracing::info!("Loaded {} plugin(s)", manager.tracked().count());
    }

    for id in &config.plugins.auto_start {
        manager.start(id).await?;
    }
    Ok(())
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting HotRoute v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Host application ─────────────────────────────────
    let host = build_host(&config).into_shared();

    // ── Step 2: Plugin manager ───────────────────────────────────
    tracing::info!("Initializing plugin system...");
    let mut catalog = PluginCatalog::new();
    plugin_greeter::register(&mut catalog);
    let mut manager = PluginManager::new(host, CatalogLoader::new(catalog)).await?;

    if let Err(e) = bootstrap_plugins(&config, &mut manager).await {
        manager.unload_all().await;
        return Err(e);
    }

    // ── Step 3: Build and start HTTP server ──────────────────────
    let state = hotroute_api::ApiState::new(manager);
    let manager = state.manager.clone();
    let app = hotroute_api::build_router(state);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("HotRoute server listening on {}", addr);

    // ── Step 4: Graceful shutdown ────────────────────────────────
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    manager.lock().await.unload_all().await;

    tracing::info!("HotRoute server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
