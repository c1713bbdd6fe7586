//! Turning a discovered plugin directory into a [`Plugin`].
//!
//! The manager only knows the [`PluginLoader`] trait. Plugins compiled into
//! the binary are found through a [`PluginCatalog`]; with the `dynamic`
//! feature, plugins can also be loaded from shared libraries.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use tracing::debug;

use crate::error::{PluginError, PluginResult};
use crate::manifest::Manifest;
use crate::plugin::Plugin;

/// A discovered plugin directory.
#[derive(Debug, Clone)]
pub struct PluginSource {
    /// Absolute directory of the plugin.
    pub root: PathBuf,
    /// Directory name inside the scan directory.
    pub basedir: String,
    /// The directory's manifest.
    pub manifest: Manifest,
}

impl PluginSource {
    fn discovery_error(&self, message: impl Into<String>) -> PluginError {
        PluginError::Discovery {
            directory: self.basedir.clone(),
            message: message.into(),
        }
    }
}

/// Produces a plugin from a discovered directory.
pub trait PluginLoader: Send + Sync {
    /// Builds the plugin described by `source`.
    fn load(&self, source: &PluginSource) -> PluginResult<Plugin>;
}

/// Constructor of a compiled-in plugin.
pub type PluginFactory = fn(&PluginSource) -> PluginResult<Plugin>;

/// Compiled-in plugin constructors keyed by entry name.
#[derive(Clone, Default)]
pub struct PluginCatalog {
    entries: BTreeMap<String, PluginFactory>,
}

impl PluginCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` under `entry`, replacing any previous one.
    pub fn register(&mut self, entry: impl Into<String>, factory: PluginFactory) -> &mut Self {
        self.entries.insert(entry.into(), factory);
        self
    }

    /// Constructor registered under `entry`.
    pub fn get(&self, entry: &str) -> Option<PluginFactory> {
        self.entries.get(entry).copied()
    }

    /// Registered entry names.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl fmt::Debug for PluginCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginCatalog")
            .field("entries", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Loads plugins from a [`PluginCatalog`] using the manifest's entry name.
#[derive(Debug, Clone, Default)]
pub struct CatalogLoader {
    catalog: PluginCatalog,
}

impl CatalogLoader {
    pub fn new(catalog: PluginCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &PluginCatalog {
        &self.catalog
    }
}

impl PluginLoader for CatalogLoader {
    fn load(&self, source: &PluginSource) -> PluginResult<Plugin> {
        let entry = source.manifest.entry_name();
        let factory = self
            .catalog
            .get(entry)
            .ok_or_else(|| source.discovery_error(format!("no plugin entry '{entry}' registered")))?;

        let plugin = finish(factory(source)?, source)?;
        debug!(entry = %entry, plugin_id = %plugin.id(), "Plugin constructed from catalog");
        Ok(plugin)
    }
}

/// Checks the constructed plugin against its manifest and roots it in the
/// plugin directory.
fn finish(mut plugin: Plugin, source: &PluginSource) -> PluginResult<Plugin> {
    if plugin.id() != source.manifest.id {
        return Err(source.discovery_error(format!(
            "entry produced plugin '{}' but the manifest declares '{}'",
            plugin.id(),
            source.manifest.id
        )));
    }
    if plugin.root_path().is_none() {
        plugin.set_root_path(&source.root);
    }
    Ok(plugin)
}

#[cfg(feature = "dynamic")]
pub mod dynamic_loader {
    use std::sync::{Mutex, PoisonError};

    use tracing::info;

    use super::{CatalogLoader, PluginLoader, PluginSource, finish};
    use crate::error::PluginResult;
    use crate::plugin::Plugin;

    /// Constructor exported by a plugin library as `create_plugin`.
    ///
    /// The library must be built by the same compiler as the host.
    pub type CreatePluginFn = unsafe fn(&PluginSource) -> PluginResult<Plugin>;

    /// Loads plugins whose manifest names a `library`, falling back to a
    /// catalog for the others.
    pub struct DynamicLoader {
        fallback: Option<CatalogLoader>,
        /// Kept alive for as long as the loader, since plugin closures
        /// point into them.
        libraries: Mutex<Vec<libloading::Library>>,
    }

    impl DynamicLoader {
        pub fn new() -> Self {
            Self {
                fallback: None,
                libraries: Mutex::new(Vec::new()),
            }
        }

        /// Uses `fallback` for manifests without a `library`.
        pub fn with_fallback(mut self, fallback: CatalogLoader) -> Self {
            self.fallback = Some(fallback);
            self
        }
    }

    impl Default for DynamicLoader {
        fn default() -> Self {
            Self::new()
        }
    }

    impl PluginLoader for DynamicLoader {
        fn load(&self, source: &PluginSource) -> PluginResult<Plugin> {
            let Some(library) = source.manifest.library.as_deref() else {
                return match &self.fallback {
                    Some(fallback) => fallback.load(source),
                    None => Err(source.discovery_error("manifest names no library")),
                };
            };
            let path = source.root.join(library);

            // SAFETY: plugins are trusted code built against this crate.
            let lib = unsafe { libloading::Library::new(&path) }.map_err(|e| {
                source.discovery_error(format!("cannot open '{}': {e}", path.display()))
            })?;

            let plugin = {
                // SAFETY: the symbol has the `CreatePluginFn` signature by contract.
                let create: libloading::Symbol<CreatePluginFn> = unsafe { lib.get(b"create_plugin") }
                    .map_err(|e| source.discovery_error(format!("missing 'create_plugin': {e}")))?;
                unsafe { create(source) }?
            };

            info!(path = %path.display(), plugin_id = %plugin.id(), "Dynamic plugin loaded");
            self.libraries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(lib);

            finish(plugin, source)
        }
    }

    impl std::fmt::Debug for DynamicLoader {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            let loaded = self
                .libraries
                .lock()
                .map(|libs| libs.len())
                .unwrap_or_default();
            f.debug_struct("DynamicLoader")
                .field("loaded_count", &loaded)
                .field("fallback", &self.fallback)
                .finish()
        }
    }

}

#[cfg(feature = "dynamic")]
pub use dynamic_loader::DynamicLoader;
