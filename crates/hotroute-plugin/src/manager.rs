//! Plugin manager: discovery, the tracked set, and lifecycle control.

use std::ops::Deref;
use std::path::{Path, PathBuf};

use tokio::sync::broadcast;
use tracing::{error, info, warn};

use hotroute_core::{PluginEvent, PluginEventKind};
use hotroute_host::{HostConfig, SharedHost};

use crate::error::{PluginError, PluginResult};
use crate::loader::{PluginLoader, PluginSource};
use crate::manifest;
use crate::plugin::{Plugin, SEPARATOR, StatusRecord};
use crate::states::{Operation, PluginStatus};

/// Host configuration key of the URL prefix plugins are mounted under.
pub const BLUEPRINT_KEY: &str = "PLUGINS_BLUEPRINT";
/// Host configuration key of the scan directory.
pub const DIRECTORY_KEY: &str = "PLUGINS_DIRECTORY";
/// Host configuration key of the directory names skipped by scans.
pub const EXCLUDES_KEY: &str = "PLUGINS_EXCLUDES_DIRECTORY";
/// Host configuration key forcing discovery failures to surface.
pub const PROPAGATE_KEY: &str = "PROPAGATE_EXCEPTIONS";

const TESTING_KEY: &str = "TESTING";
const DEBUG_KEY: &str = "DEBUG";
const EVENT_CAPACITY: usize = 64;

/// Resolved manager settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    /// URL prefix and endpoint scope all plugins live under.
    pub blueprint: String,
    /// Scan directory, relative to the host root.
    pub directory: String,
    /// Directory names never scanned.
    pub excludes_directory: Vec<String>,
    /// Whether discovery failures end a scan instead of being skipped.
    pub propagate_errors: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            blueprint: "plugins".to_string(),
            directory: "plugins".to_string(),
            excludes_directory: vec!["__pycache__".to_string()],
            propagate_errors: false,
        }
    }
}

impl ManagerConfig {
    /// Reads each setting from `config`, falling back to the default, and
    /// writes the resolved values back.
    ///
    /// Error propagation follows `PROPAGATE_EXCEPTIONS` when set, otherwise
    /// `TESTING` or `DEBUG`.
    pub fn resolve(config: &mut HostConfig) -> PluginResult<Self> {
        let defaults = Self::default();

        let blueprint = config
            .get_str(BLUEPRINT_KEY)
            .map(str::to_string)
            .unwrap_or(defaults.blueprint);
        if blueprint.is_empty() || blueprint.contains(SEPARATOR) || blueprint.contains('/') {
            return Err(PluginError::validation(format!(
                "{BLUEPRINT_KEY} '{blueprint}' must be a single non-empty path segment"
            )));
        }
        let directory = config
            .get_str(DIRECTORY_KEY)
            .map(str::to_string)
            .unwrap_or(defaults.directory);
        let excludes_directory = config
            .get_string_list(EXCLUDES_KEY)
            .unwrap_or(defaults.excludes_directory);
        let propagate_errors = config.get_bool(PROPAGATE_KEY).unwrap_or_else(|| {
            config.get_bool(TESTING_KEY).unwrap_or(false) || config.get_bool(DEBUG_KEY).unwrap_or(false)
        });

        config.set(BLUEPRINT_KEY, blueprint.clone());
        config.set(DIRECTORY_KEY, directory.clone());
        config.set(EXCLUDES_KEY, excludes_directory.clone());

        Ok(Self {
            blueprint,
            directory,
            excludes_directory,
            propagate_errors,
        })
    }
}

/// Criteria for [`PluginManager::find`]. A plugin matches when any given
/// criterion matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct FindQuery<'q> {
    pub id: Option<&'q str>,
    pub domain: Option<&'q str>,
    pub name: Option<&'q str>,
}

impl<'q> FindQuery<'q> {
    pub fn by_id(id: &'q str) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn by_domain(domain: &'q str) -> Self {
        Self {
            domain: Some(domain),
            ..Self::default()
        }
    }

    pub fn by_name(name: &'q str) -> Self {
        Self {
            name: Some(name),
            ..Self::default()
        }
    }

    /// Whether no criterion is set.
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.domain.is_none() && self.name.is_none()
    }

    fn matches(&self, plugin: &Plugin) -> bool {
        self.id == Some(plugin.id())
            || self.domain == Some(plugin.domain())
            || self.name == Some(plugin.name())
    }
}

/// A plugin yielded by [`PluginManager::plugins`]: freshly scanned and
/// owned, or borrowed from the tracked set.
#[derive(Debug)]
pub enum PluginRef<'a> {
    Scanned(Plugin),
    Tracked(&'a Plugin),
}

impl PluginRef<'_> {
    pub fn is_tracked(&self) -> bool {
        matches!(self, Self::Tracked(_))
    }
}

impl Deref for PluginRef<'_> {
    type Target = Plugin;

    fn deref(&self) -> &Plugin {
        match self {
            Self::Scanned(plugin) => plugin,
            Self::Tracked(plugin) => plugin,
        }
    }
}

/// Lazy discovery over the scan directory. See [`PluginManager::scan`].
pub struct Scan<'a> {
    entries: std::vec::IntoIter<(String, PathBuf)>,
    loader: &'a dyn PluginLoader,
    propagate: bool,
    done: bool,
}

impl Scan<'_> {
    fn load_unit(&self, basedir: &str, root: &Path) -> PluginResult<Plugin> {
        let manifest = manifest::load(root)?;
        let source = PluginSource {
            root: root.to_path_buf(),
            basedir: basedir.to_string(),
            manifest,
        };
        let mut plugin = self.loader.load(&source)?;
        plugin.set_basedir(basedir);
        Ok(plugin)
    }
}

impl Iterator for Scan<'_> {
    type Item = PluginResult<Plugin>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        while let Some((basedir, root)) = self.entries.next() {
            match self.load_unit(&basedir, &root) {
                Ok(plugin) => return Some(Ok(plugin)),
                Err(err) if self.propagate => {
                    self.done = true;
                    return Some(Err(err));
                }
                Err(err) => {
                    warn!(basedir = %basedir, error = %err, "Skipping plugin directory");
                }
            }
        }
        None
    }
}

/// Discovers plugins and drives their lifecycle against one host.
///
/// Lifecycle calls take `&mut self`; callers sharing a manager serialize
/// them, typically behind a `tokio::sync::Mutex`.
pub struct PluginManager {
    host: SharedHost,
    config: ManagerConfig,
    loader: Box<dyn PluginLoader>,
    tracked: Vec<Plugin>,
    events: broadcast::Sender<PluginEvent>,
    root: PathBuf,
}

impl PluginManager {
    /// Creates a manager for `host`, resolving its settings from the host
    /// configuration.
    pub async fn new(host: SharedHost, loader: impl PluginLoader + 'static) -> PluginResult<Self> {
        let (config, root) = {
            let mut app = host.write().await;
            let config = ManagerConfig::resolve(app.config_mut())?;
            (config, app.root_path().to_path_buf())
        };
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        info!(
            blueprint = %config.blueprint,
            directory = %root.join(&config.directory).display(),
            propagate_errors = config.propagate_errors,
            "Plugin manager initialized"
        );

        Ok(Self {
            host,
            config,
            loader: Box::new(loader),
            tracked: Vec::new(),
            events,
            root,
        })
    }

    pub fn host(&self) -> &SharedHost {
        &self.host
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// URL prefix plugins are mounted under.
    pub fn domain(&self) -> &str {
        &self.config.blueprint
    }

    /// Absolute scan directory.
    pub fn scan_directory(&self) -> PathBuf {
        self.root.join(&self.config.directory)
    }

    /// Receives lifecycle events emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<PluginEvent> {
        self.events.subscribe()
    }

    /// Discovers plugins in the scan directory.
    ///
    /// Skips excluded and already-tracked directories. Each call re-reads
    /// the directory; units load one at a time as the iterator advances.
    /// Failing units are logged and skipped unless errors propagate, in
    /// which case the failure is yielded and the scan ends.
    pub fn scan(&self) -> PluginResult<Scan<'_>> {
        let directory = self.scan_directory();
        let read_error = |source| PluginError::ScanDirectory {
            path: directory.clone(),
            source,
        };

        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&directory).map_err(read_error)? {
            let entry = entry.map_err(read_error)?;
            if !entry.file_type().map_err(read_error)?.is_dir() {
                continue;
            }
            let basedir = entry.file_name().to_string_lossy().into_owned();
            if self.config.excludes_directory.contains(&basedir)
                || self.tracked.iter().any(|p| p.basedir() == Some(basedir.as_str()))
            {
                continue;
            }
            entries.push((basedir, entry.path()));
        }
        entries.sort();

        Ok(Scan {
            entries: entries.into_iter(),
            loader: self.loader.as_ref(),
            propagate: self.config.propagate_errors,
            done: false,
        })
    }

    /// Scanned plugins followed by the tracked ones.
    pub fn plugins(&self) -> PluginResult<impl Iterator<Item = PluginResult<PluginRef<'_>>>> {
        let scanned = self.scan()?.map(|item| item.map(PluginRef::Scanned));
        let tracked: Vec<&Plugin> = self.tracked.iter().collect();
        Ok(scanned.chain(tracked.into_iter().map(|p| Ok(PluginRef::Tracked(p)))))
    }

    /// Tracked plugins.
    pub fn tracked(&self) -> impl Iterator<Item = &Plugin> {
        self.tracked.iter()
    }

    /// Tracked plugin with `id`.
    pub fn get(&self, id: &str) -> Option<&Plugin> {
        self.tracked.iter().find(|p| p.id() == id)
    }

    /// First plugin matching `query`, or `None` when nothing matches or no
    /// criterion is given.
    pub fn find(&self, query: FindQuery<'_>) -> PluginResult<Option<PluginRef<'_>>> {
        if query.is_empty() {
            return Ok(None);
        }
        for item in self.plugins()? {
            let plugin = item?;
            if query.matches(&plugin) {
                return Ok(Some(plugin));
            }
        }
        Ok(None)
    }

    /// Status records of every known plugin.
    pub fn status(&self) -> PluginResult<Vec<StatusRecord>> {
        self.plugins()?
            .map(|item| item.map(|plugin| plugin.status_record()))
            .collect()
    }

    /// Starts tracking a scanned plugin and moves it to `Loaded`.
    pub fn load(&mut self, mut plugin: Plugin) -> PluginResult<()> {
        plugin.state_machine().require(Operation::Load)?;
        if self.tracked.iter().any(|p| p.id() == plugin.id()) {
            return Err(PluginError::DuplicateId {
                id: plugin.id().to_string(),
            });
        }
        let Some(basedir) = plugin.basedir().map(str::to_string) else {
            return Err(PluginError::MissingBasedir {
                id: plugin.id().to_string(),
            });
        };

        plugin.load()?;
        info!(plugin_id = %plugin.id(), basedir = %basedir, "Plugin tracked");
        self.emit(PluginEventKind::Loaded, &plugin);
        self.tracked.push(plugin);
        Ok(())
    }

    /// Scans for the plugin with `id` and loads it.
    pub fn load_id(&mut self, id: &str) -> PluginResult<()> {
        if self.get(id).is_some() {
            return Err(PluginError::DuplicateId { id: id.to_string() });
        }
        let mut found = None;
        for item in self.scan()? {
            let plugin = item?;
            if plugin.id() == id {
                found = Some(plugin);
                break;
            }
        }
        let plugin = found.ok_or_else(|| PluginError::UnknownPlugin { id: id.to_string() })?;
        self.load(plugin)
    }

    fn untracked(id: &str, operation: Operation) -> PluginError {
        warn!(plugin_id = %id, operation = %operation, "Lifecycle call for untracked plugin");
        PluginError::OperationNotPermitted {
            operation: operation.to_string(),
            state: PluginStatus::Unloaded.to_string(),
        }
    }

    /// Installs the plugin on the host and moves it to `Running`.
    pub async fn start(&mut self, id: &str) -> PluginResult<()> {
        let Some(plugin) = self.tracked.iter_mut().find(|p| p.id() == id) else {
            return Err(Self::untracked(id, Operation::Start));
        };
        plugin.register(&self.host, &self.config).await?;
        let started = event(PluginEventKind::Started, plugin);
        self.send(started);
        Ok(())
    }

    /// Silences the plugin's endpoints and moves it to `Stopped`.
    pub async fn stop(&mut self, id: &str) -> PluginResult<()> {
        let Some(plugin) = self.tracked.iter_mut().find(|p| p.id() == id) else {
            return Err(Self::untracked(id, Operation::Stop));
        };
        plugin.unregister(&self.host, &self.config).await?;
        let stopped = event(PluginEventKind::Stopped, plugin);
        self.send(stopped);
        Ok(())
    }

    /// Removes the plugin from the host and the tracked set. The returned
    /// plugin is `Unloaded` and can be loaded again.
    pub async fn unload(&mut self, id: &str) -> PluginResult<Plugin> {
        let Some(index) = self.tracked.iter().position(|p| p.id() == id) else {
            return Err(Self::untracked(id, Operation::Unload));
        };
        self.tracked[index].clean(&self.host, &self.config).await?;
        let plugin = self.tracked.remove(index);
        self.emit(PluginEventKind::Unloaded, &plugin);
        Ok(plugin)
    }

    /// Stops and unloads every tracked plugin. Failures are logged.
    pub async fn unload_all(&mut self) {
        let ids: Vec<String> = self.tracked.iter().map(|p| p.id().to_string()).collect();
        for id in ids {
            if self.get(&id).map(Plugin::status) == Some(PluginStatus::Running) {
                if let Err(e) = self.stop(&id).await {
                    error!(plugin_id = %id, error = %e, "Error stopping plugin");
                }
            }
            if let Err(e) = self.unload(&id).await {
                error!(plugin_id = %id, error = %e, "Error unloading plugin");
            }
        }
        info!("All plugins unloaded");
    }

    fn emit(&self, kind: PluginEventKind, plugin: &Plugin) {
        self.send(event(kind, plugin));
    }

    fn send(&self, event: PluginEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }
}

fn event(kind: PluginEventKind, plugin: &Plugin) -> PluginEvent {
    PluginEvent::new(kind, plugin.id(), plugin.name(), plugin.domain())
}

impl std::fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginManager")
            .field("config", &self.config)
            .field("root", &self.root)
            .field("tracked", &self.tracked.iter().map(Plugin::id).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{CatalogLoader, PluginCatalog};
    use hotroute_host::{HostApp, Request, Response};
    use serde_json::json;

    fn greeter(source: &PluginSource) -> PluginResult<Plugin> {
        let mut plugin = Plugin::from_manifest(&source.manifest, &source.root)?;
        let greeting = format!("HI FROM {}", source.manifest.domain);
        plugin.route("/", "index", move |_ctx| Ok(Response::text(greeting.clone())))?;
        Ok(plugin)
    }

    fn write_plugin(root: &Path, basedir: &str, id: &str, domain: &str) {
        let dir = root.join("plugins").join(basedir);
        std::fs::create_dir_all(&dir).unwrap();
        let manifest = json!({
            "id": id,
            "domain": domain,
            "entry": "greeter",
            "plugin": {"name": format!("Plugin {id}"), "author": "HotRoute Team"},
            "releases": [{"version": "0.1.0", "download": "https://example.invalid/p.tar.gz"}]
        });
        std::fs::write(dir.join(manifest::MANIFEST_FILE), manifest.to_string()).unwrap();
    }

    async fn manager_at(root: &Path, settings: &[(&str, serde_json::Value)]) -> PluginManager {
        let mut app = HostApp::new(root);
        for (key, value) in settings {
            app.config_mut().set(*key, value.clone());
        }
        let mut catalog = PluginCatalog::new();
        catalog.register("greeter", greeter);
        PluginManager::new(app.into_shared(), CatalogLoader::new(catalog))
            .await
            .unwrap()
    }

    fn ids(manager: &PluginManager) -> Vec<String> {
        manager
            .scan()
            .unwrap()
            .map(|p| p.unwrap().id().to_string())
            .collect()
    }

    #[test]
    fn test_resolve_defaults_written_back() {
        let mut config = HostConfig::new();
        let resolved = ManagerConfig::resolve(&mut config).unwrap();
        assert_eq!(resolved, ManagerConfig::default());
        assert_eq!(config.get_str(BLUEPRINT_KEY), Some("plugins"));
        assert_eq!(config.get_str(DIRECTORY_KEY), Some("plugins"));
        assert_eq!(
            config.get_string_list(EXCLUDES_KEY),
            Some(vec!["__pycache__".to_string()])
        );
    }

    #[test]
    fn test_resolve_overrides_and_propagation() {
        let mut config = HostConfig::new();
        config.set(BLUEPRINT_KEY, "ext");
        config.set(EXCLUDES_KEY, json!(["tmp", "old"]));
        config.set(DEBUG_KEY, true);
        let resolved = ManagerConfig::resolve(&mut config).unwrap();
        assert_eq!(resolved.blueprint, "ext");
        assert_eq!(resolved.excludes_directory, vec!["tmp", "old"]);
        assert!(resolved.propagate_errors);

        config.set(PROPAGATE_KEY, false);
        assert!(!ManagerConfig::resolve(&mut config).unwrap().propagate_errors);

        config.set(BLUEPRINT_KEY, "a.b");
        assert!(ManagerConfig::resolve(&mut config).is_err());
    }

    #[tokio::test]
    async fn test_scan_skips_excluded_directory() {
        let dir = tempfile::tempdir().unwrap();
        write_plugin(dir.path(), "__pycache__", "cached", "cached");
        write_plugin(dir.path(), "hello", "hello", "hello");
        let manager = manager_at(dir.path(), &[(PROPAGATE_KEY, json!(true))]).await;

        let found: Vec<Plugin> = manager.scan().unwrap().map(Result::unwrap).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), "hello");
        assert_eq!(found[0].basedir(), Some("hello"));
        assert_eq!(found[0].status(), PluginStatus::Unloaded);
    }

    #[tokio::test]
    async fn test_broken_unit_skipped_or_propagated() {
        let dir = tempfile::tempdir().unwrap();
        write_plugin(dir.path(), "hello", "hello", "hello");
        std::fs::create_dir_all(dir.path().join("plugins/a-broken")).unwrap();

        let lenient = manager_at(dir.path(), &[]).await;
        assert_eq!(ids(&lenient), vec!["hello"]);

        let strict = manager_at(dir.path(), &[(PROPAGATE_KEY, json!(true))]).await;
        let mut scan = strict.scan().unwrap();
        assert!(matches!(scan.next(), Some(Err(PluginError::Manifest { .. }))));
        assert!(scan.next().is_none());
    }

    #[tokio::test]
    async fn test_missing_scan_directory() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_at(dir.path(), &[]).await;
        assert!(matches!(manager.scan(), Err(PluginError::ScanDirectory { .. })));
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_plugin(dir.path(), "dup-a", "dup", "dup_a");
        write_plugin(dir.path(), "dup-b", "dup", "dup_b");
        let mut manager = manager_at(dir.path(), &[]).await;

        let mut found = manager.scan().unwrap().map(Result::unwrap);
        let (first, second) = (found.next().unwrap(), found.next().unwrap());
        drop(found);

        manager.load(first).unwrap();
        let err = manager.load(second).unwrap_err();
        assert!(matches!(err, PluginError::DuplicateId { ref id } if id == "dup"));
        assert_eq!(manager.tracked().count(), 1);
        assert_eq!(manager.get("dup").and_then(Plugin::basedir), Some("dup-a"));
    }

    #[tokio::test]
    async fn test_unscanned_plugin_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = manager_at(dir.path(), &[]).await;
        let orphan = Plugin::new("orphan", "Orphan", None).unwrap();
        let err = manager.load(orphan).unwrap_err();
        assert!(matches!(err, PluginError::MissingBasedir { .. }));
        assert_eq!(manager.tracked().count(), 0);
    }

    #[tokio::test]
    async fn test_find_any_criterion() {
        let dir = tempfile::tempdir().unwrap();
        write_plugin(dir.path(), "hello", "hello", "hi");
        write_plugin(dir.path(), "goodbye", "goodbye", "bye");
        let mut manager = manager_at(dir.path(), &[]).await;
        manager.load_id("goodbye").unwrap();

        let by_domain = manager.find(FindQuery::by_domain("hi")).unwrap().unwrap();
        assert_eq!(by_domain.id(), "hello");
        assert!(!by_domain.is_tracked());

        let by_name = manager.find(FindQuery::by_name("Plugin goodbye")).unwrap().unwrap();
        assert!(by_name.is_tracked());

        let either = FindQuery {
            id: Some("nope"),
            domain: Some("bye"),
            name: None,
        };
        assert_eq!(manager.find(either).unwrap().unwrap().id(), "goodbye");

        assert!(manager.find(FindQuery::default()).unwrap().is_none());
        assert!(manager.find(FindQuery::by_id("missing")).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_round_trip_and_events() {
        let dir = tempfile::tempdir().unwrap();
        write_plugin(dir.path(), "hello", "hello", "hello");
        let mut manager = manager_at(dir.path(), &[]).await;
        let mut events = manager.subscribe();

        manager.load_id("hello").unwrap();
        assert!(ids(&manager).is_empty());
        manager.start("hello").await.unwrap();
        {
            let host = manager.host().read().await;
            let resp = host.dispatch(&Request::get("/plugins/hello/"));
            assert_eq!(resp.body_text(), "HI FROM hello");
        }
        manager.stop("hello").await.unwrap();
        let plugin = manager.unload("hello").await.unwrap();

        assert_eq!(plugin.status(), PluginStatus::Unloaded);
        assert!(plugin.endpoints().is_empty());
        assert!(manager.get("hello").is_none());
        assert_eq!(ids(&manager), vec!["hello"]);

        let mut kinds = Vec::new();
        while let Ok(event) = events.try_recv() {
            assert_eq!(event.plugin_id, "hello");
            kinds.push(event.kind);
        }
        assert_eq!(
            kinds,
            vec![
                PluginEventKind::Loaded,
                PluginEventKind::Started,
                PluginEventKind::Stopped,
                PluginEventKind::Unloaded,
            ]
        );

        manager.load(plugin).unwrap();
        manager.start("hello").await.unwrap();
        let status = manager.status().unwrap();
        assert_eq!(status.len(), 1);
        assert_eq!(status[0].status, PluginStatus::Running);
    }

    #[tokio::test]
    async fn test_lifecycle_errors() {
        let dir = tempfile::tempdir().unwrap();
        write_plugin(dir.path(), "hello", "hello", "hello");
        let mut manager = manager_at(dir.path(), &[]).await;

        assert!(matches!(
            manager.start("hello").await,
            Err(PluginError::OperationNotPermitted { .. })
        ));
        assert!(matches!(
            manager.load_id("missing"),
            Err(PluginError::UnknownPlugin { .. })
        ));

        manager.load_id("hello").unwrap();
        assert!(matches!(
            manager.load_id("hello"),
            Err(PluginError::DuplicateId { .. })
        ));
        assert!(manager.stop("hello").await.is_err());
        manager.start("hello").await.unwrap();
        assert!(manager.unload("hello").await.is_err());
        assert_eq!(manager.get("hello").map(Plugin::status), Some(PluginStatus::Running));

        manager.unload_all().await;
        assert_eq!(manager.tracked().count(), 0);
        let host = manager.host().read().await;
        assert_eq!(
            host.url_map()
                .iter_rules()
                .filter(|r| r.endpoint().starts_with("plugins.hello."))
                .count(),
            0
        );
    }
}
