//! # hotroute-plugin
//!
//! Plugin lifecycle for HotRoute:
//!
//! - `StateMachine` and the `Loaded`/`Running`/`Stopped`/`Unloaded` table
//! - `Plugin` with deferred register, unregister and cleanup actions
//! - `PluginManager` for discovery, the tracked set and lifecycle events
//! - `plugin.json` manifests and the pluggable `PluginLoader`
//! - Optional shared-library loading via `libloading` (feature `dynamic`)

pub mod error;
pub mod loader;
pub mod manager;
pub mod manifest;
pub mod plugin;
pub mod states;

pub use error::{PluginError, PluginResult};
pub use loader::{CatalogLoader, PluginCatalog, PluginFactory, PluginLoader, PluginSource};
pub use manager::{FindQuery, ManagerConfig, PluginManager, PluginRef, Scan};
pub use manifest::Manifest;
pub use plugin::{Plugin, PluginInfo, StatusRecord};
pub use states::{Operation, PluginStatus, StateMachine, TRANSITIONS, Transition};

#[cfg(feature = "dynamic")]
pub use loader::DynamicLoader;
