//! A plugin: identity, lifecycle state and the deferred actions that
//! install it into, and remove it from, a live host.
//!
//! Registration calls only record actions. [`Plugin::register`] replays the
//! register actions, [`Plugin::unregister`] points endpoints at the shared
//! not-found responder, and [`Plugin::clean`] runs each structural cleanup
//! once. Only `clean` changes the shape of the routing table.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, info};

use hotroute_host::hooks::{
    AfterRequestFn, BeforeRequestFn, ContextProcessorFn, TeardownFn, UrlDefaultsFn,
    UrlValuePreprocessorFn,
};
use hotroute_host::{
    Abort, ErrorHandlerFn, ErrorKey, HandlerResult, Hook, HookKind, HostApp, PendingHooks,
    RequestContext, Response, RouteOptions, Rule, RulePattern, ScopeResources, ViewArgs, ViewFn,
    not_found_view,
};

use crate::error::{PluginError, PluginResult};
use crate::manager::ManagerConfig;
use crate::manifest::Manifest;
use crate::states::{Operation, PluginStatus, StateMachine};

/// Separator between the parts of a qualified endpoint.
pub const SEPARATOR: char = '.';

/// Checks that `domain` can serve as a URL segment and endpoint scope.
pub fn check_domain(domain: &str) -> PluginResult<()> {
    if domain.is_empty() {
        return Err(PluginError::validation("plugin domain must not be empty"));
    }
    if domain.contains(SEPARATOR) || domain.contains('/') {
        return Err(PluginError::validation(format!(
            "plugin domain '{domain}' must not contain '{SEPARATOR}' or '/'"
        )));
    }
    Ok(())
}

fn check_endpoint(endpoint: &str) -> PluginResult<()> {
    if endpoint.is_empty() {
        return Err(PluginError::validation("endpoint name must not be empty"));
    }
    if endpoint.contains(SEPARATOR) {
        return Err(PluginError::validation(format!(
            "endpoint '{endpoint}' must not contain '{SEPARATOR}'"
        )));
    }
    Ok(())
}

/// Editable metadata shown in status listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    pub author: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
}

/// Snapshot of a plugin for status listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub id: String,
    pub name: String,
    pub status: PluginStatus,
    pub domain: String,
    pub info: PluginInfo,
}

enum RegisterAction {
    AddUrlRule {
        pattern: RulePattern,
        endpoint: String,
        view: Option<ViewFn>,
        options: RouteOptions,
    },
    BindView {
        endpoint: String,
        view: ViewFn,
    },
    ErrorHandler {
        key: ErrorKey,
        handler: ErrorHandlerFn,
    },
    AttachHook(HookKind),
    Resources,
}

enum UnregisterAction {
    SilenceEndpoint(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum CleanupKind {
    UrlRules,
    ViewFunctions,
    ErrorHandlers,
    Hooks(HookKind),
    Resources,
}

/// Names a plugin's registrations live under on the host.
struct Scope {
    /// `blueprint.domain`, the key of scoped tables.
    qualified: String,
    /// URL segments every rule is mounted under.
    prefix: [String; 2],
}

impl Scope {
    fn endpoint(&self, local: &str) -> String {
        format!("{}{SEPARATOR}{local}", self.qualified)
    }

    fn endpoint_prefix(&self) -> String {
        format!("{}{SEPARATOR}", self.qualified)
    }
}

/// One extension unit.
pub struct Plugin {
    id: String,
    name: String,
    domain: String,
    info: PluginInfo,
    status: StateMachine<PluginStatus>,
    basedir: Option<String>,
    root_path: Option<PathBuf>,
    static_folder: Option<PathBuf>,
    template_folder: Option<PathBuf>,
    endpoints: BTreeSet<String>,
    register_actions: Vec<RegisterAction>,
    unregister_actions: Vec<UnregisterAction>,
    cleanup_actions: Vec<CleanupKind>,
    pending_hooks: PendingHooks,
}

impl Plugin {
    /// Creates a plugin. Without an explicit domain one is derived from the
    /// name by replacing every non-letter with `_`.
    pub fn new(id: impl Into<String>, name: impl Into<String>, domain: Option<&str>) -> PluginResult<Self> {
        let id = id.into();
        let name = name.into();
        if id.is_empty() {
            return Err(PluginError::validation("plugin id must not be empty"));
        }
        let domain = match domain {
            Some(domain) => domain.to_string(),
            None => name
                .chars()
                .map(|c| if c.is_alphabetic() { c } else { '_' })
                .collect(),
        };
        check_domain(&domain)?;

        Ok(Self {
            id,
            name,
            domain,
            info: PluginInfo::default(),
            status: StateMachine::lifecycle(),
            basedir: None,
            root_path: None,
            static_folder: None,
            template_folder: None,
            endpoints: BTreeSet::new(),
            register_actions: Vec::new(),
            unregister_actions: Vec::new(),
            cleanup_actions: Vec::new(),
            pending_hooks: PendingHooks::new(),
        })
    }

    /// Creates a plugin from its manifest, rooted at `root`.
    pub fn from_manifest(manifest: &Manifest, root: impl Into<PathBuf>) -> PluginResult<Self> {
        let mut plugin = Self::new(&manifest.id, &manifest.plugin.name, Some(manifest.domain.as_str()))?;
        plugin.root_path = Some(root.into());
        plugin.info = PluginInfo {
            author: Some(manifest.plugin.author.clone()),
            version: manifest.version().map(str::to_string),
            description: Some(manifest.plugin.summary.clone()).filter(|s| !s.is_empty()),
        };
        Ok(plugin)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn info(&self) -> &PluginInfo {
        &self.info
    }

    pub fn info_mut(&mut self) -> &mut PluginInfo {
        &mut self.info
    }

    /// Current lifecycle state.
    pub fn status(&self) -> PluginStatus {
        self.status.current()
    }

    /// The lifecycle state machine.
    pub fn state_machine(&self) -> &StateMachine<PluginStatus> {
        &self.status
    }

    /// Directory name the plugin was discovered in.
    pub fn basedir(&self) -> Option<&str> {
        self.basedir.as_deref()
    }

    pub(crate) fn set_basedir(&mut self, basedir: impl Into<String>) {
        self.basedir = Some(basedir.into());
    }

    /// Directory relative folders are resolved against.
    pub fn root_path(&self) -> Option<&Path> {
        self.root_path.as_deref()
    }

    pub(crate) fn set_root_path(&mut self, root: impl Into<PathBuf>) {
        self.root_path = Some(root.into());
    }

    /// Qualified endpoints currently installed. Empty unless started.
    pub fn endpoints(&self) -> &BTreeSet<String> {
        &self.endpoints
    }

    /// Status listing entry.
    pub fn status_record(&self) -> StatusRecord {
        StatusRecord {
            id: self.id.clone(),
            name: self.name.clone(),
            status: self.status(),
            domain: self.domain.clone(),
            info: self.info.clone(),
        }
    }

    fn add_cleanup(&mut self, kind: CleanupKind) {
        if !self.cleanup_actions.contains(&kind) {
            self.cleanup_actions.push(kind);
        }
    }

    fn resolve(&self, folder: &Path) -> PathBuf {
        match &self.root_path {
            Some(root) => root.join(folder),
            None => folder.to_path_buf(),
        }
    }

    fn scope(&self, config: &ManagerConfig) -> Scope {
        Scope {
            qualified: format!("{}{SEPARATOR}{}", config.blueprint, self.domain),
            prefix: [config.blueprint.clone(), self.domain.clone()],
        }
    }

    // -- registration API --

    /// Routes `rule` (relative to the plugin's mount point) to `endpoint`.
    /// Without a view the endpoint must be bound with
    /// [`bind_endpoint`](Self::bind_endpoint).
    pub fn add_url_rule(
        &mut self,
        rule: &str,
        endpoint: &str,
        view: Option<ViewFn>,
        options: RouteOptions,
    ) -> PluginResult<()> {
        check_endpoint(endpoint)?;
        let pattern = RulePattern::parse(rule)?;

        self.register_actions.push(RegisterAction::AddUrlRule {
            pattern,
            endpoint: endpoint.to_string(),
            view,
            options,
        });
        self.unregister_actions
            .push(UnregisterAction::SilenceEndpoint(endpoint.to_string()));
        self.add_cleanup(CleanupKind::UrlRules);
        self.add_cleanup(CleanupKind::ViewFunctions);
        Ok(())
    }

    /// Routes `rule` to `endpoint` served by `view`, for `GET`.
    pub fn route<F>(&mut self, rule: &str, endpoint: &str, view: F) -> PluginResult<()>
    where
        F: Fn(&RequestContext<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.add_url_rule(rule, endpoint, Some(Arc::new(view)), RouteOptions::default())
    }

    /// Binds `view` to `endpoint` without a rule.
    pub fn bind_endpoint<F>(&mut self, endpoint: &str, view: F) -> PluginResult<()>
    where
        F: Fn(&RequestContext<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        check_endpoint(endpoint)?;
        self.register_actions.push(RegisterAction::BindView {
            endpoint: endpoint.to_string(),
            view: Arc::new(view),
        });
        self.unregister_actions
            .push(UnregisterAction::SilenceEndpoint(endpoint.to_string()));
        self.add_cleanup(CleanupKind::ViewFunctions);
        Ok(())
    }

    /// Handles aborts raised inside this plugin's endpoints.
    pub fn error_handler<F>(&mut self, key: ErrorKey, handler: F) -> PluginResult<()>
    where
        F: Fn(&RequestContext<'_>, &Abort) -> Response + Send + Sync + 'static,
    {
        key.validate()?;
        self.register_actions.push(RegisterAction::ErrorHandler {
            key,
            handler: Arc::new(handler),
        });
        self.add_cleanup(CleanupKind::ErrorHandlers);
        Ok(())
    }

    fn queue_hook(&mut self, hook: Hook) {
        let kind = hook.kind();
        self.pending_hooks.push(hook);
        self.register_actions.push(RegisterAction::AttachHook(kind));
        self.add_cleanup(CleanupKind::Hooks(kind));
    }

    /// Runs before this plugin's views. A response ends the request early.
    pub fn before_request<F>(&mut self, hook: F)
    where
        F: Fn(&RequestContext<'_>) -> Result<Option<Response>, Abort> + Send + Sync + 'static,
    {
        let hook: BeforeRequestFn = Arc::new(hook);
        self.queue_hook(Hook::BeforeRequest(hook));
    }

    /// Rewrites responses of this plugin's views.
    pub fn after_request<F>(&mut self, hook: F)
    where
        F: Fn(&RequestContext<'_>, Response) -> Response + Send + Sync + 'static,
    {
        let hook: AfterRequestFn = Arc::new(hook);
        self.queue_hook(Hook::AfterRequest(hook));
    }

    /// Runs after each request to this plugin.
    pub fn teardown_request<F>(&mut self, hook: F)
    where
        F: Fn(&RequestContext<'_>, Option<&Abort>) + Send + Sync + 'static,
    {
        let hook: TeardownFn = Arc::new(hook);
        self.queue_hook(Hook::TeardownRequest(hook));
    }

    /// Adds variables to templates rendered by this plugin.
    pub fn context_processor<F>(&mut self, hook: F)
    where
        F: Fn(&RequestContext<'_>) -> Map<String, Value> + Send + Sync + 'static,
    {
        let hook: ContextProcessorFn = Arc::new(hook);
        self.queue_hook(Hook::ContextProcessor(hook));
    }

    /// Adjusts captured URL values before this plugin's views see them.
    pub fn url_value_preprocessor<F>(&mut self, hook: F)
    where
        F: Fn(Option<&str>, &mut ViewArgs) + Send + Sync + 'static,
    {
        let hook: UrlValuePreprocessorFn = Arc::new(hook);
        self.queue_hook(Hook::UrlValuePreprocessor(hook));
    }

    /// Injects defaults when building URLs to this plugin's endpoints.
    pub fn url_defaults<F>(&mut self, hook: F)
    where
        F: Fn(&str, &mut ViewArgs) + Send + Sync + 'static,
    {
        let hook: UrlDefaultsFn = Arc::new(hook);
        self.queue_hook(Hook::UrlDefaults(hook));
    }

    fn ensure_resources(&mut self) {
        if !self
            .register_actions
            .iter()
            .any(|a| matches!(a, RegisterAction::Resources))
        {
            self.register_actions.push(RegisterAction::Resources);
        }
        self.add_cleanup(CleanupKind::Resources);
    }

    /// Serves `folder` (relative to the plugin root) at `static/<path>`
    /// under endpoint `static`.
    pub fn static_folder(&mut self, folder: impl Into<PathBuf>) -> PluginResult<()> {
        let first = self.static_folder.is_none();
        self.static_folder = Some(folder.into());
        self.ensure_resources();
        if first {
            self.route("/static/<path:filename>", "static", |ctx| {
                ctx.send_static_file(ctx.arg("filename").unwrap_or_default())
            })?;
        }
        Ok(())
    }

    /// Looks up templates in `folder` (relative to the plugin root) first.
    pub fn template_folder(&mut self, folder: impl Into<PathBuf>) {
        self.template_folder = Some(folder.into());
        self.ensure_resources();
    }

    // -- lifecycle --

    /// Enters `Loaded`. Installs nothing on the host.
    pub fn load(&mut self) -> PluginResult<()> {
        self.status.require(Operation::Load)?;
        self.status.transition(PluginStatus::Loaded)?;
        info!(plugin_id = %self.id, domain = %self.domain, "Plugin loaded");
        Ok(())
    }

    /// Replays every register action in order, then enters `Running`.
    ///
    /// The host write lock is taken per action, so requests may be served
    /// between two actions.
    pub async fn register(&mut self, host: &RwLock<HostApp>, config: &ManagerConfig) -> PluginResult<()> {
        self.status.require(Operation::Start)?;
        let scope = self.scope(config);
        let resources = ScopeResources {
            template_folder: self.template_folder.as_deref().map(|f| self.resolve(f)),
            static_folder: self.static_folder.as_deref().map(|f| self.resolve(f)),
        };

        for action in &self.register_actions {
            let mut app = host.write().await;
            match action {
                RegisterAction::AddUrlRule {
                    pattern,
                    endpoint,
                    view,
                    options,
                } => {
                    let qualified = scope.endpoint(endpoint);
                    let prefix: [&str; 2] = [&scope.prefix[0], &scope.prefix[1]];
                    app.add_url_rule(Rule::new(pattern.prefixed(&prefix), &qualified, options));
                    if let Some(view) = view {
                        app.set_view_function(&qualified, view.clone());
                    }
                    self.endpoints.insert(qualified);
                }
                RegisterAction::BindView { endpoint, view } => {
                    let qualified = scope.endpoint(endpoint);
                    app.set_view_function(&qualified, view.clone());
                    self.endpoints.insert(qualified);
                }
                RegisterAction::ErrorHandler { key, handler } => {
                    app.set_error_handler(Some(scope.qualified.as_str()), key.clone(), handler.clone())?;
                }
                RegisterAction::AttachHook(kind) => {
                    let attached =
                        app.attach_pending_hook(*kind, Some(scope.qualified.as_str()), &mut self.pending_hooks);
                    debug!(plugin_id = %self.id, hook = %kind, attached, "Hook attach replayed");
                }
                RegisterAction::Resources => {
                    app.set_resources(scope.qualified.clone(), resources.clone());
                }
            }
        }

        self.status.transition(PluginStatus::Running)?;
        info!(
            plugin_id = %self.id,
            domain = %self.domain,
            endpoints = self.endpoints.len(),
            "Plugin started"
        );
        Ok(())
    }

    /// Points every endpoint at the not-found responder, then enters
    /// `Stopped`. Rules stay in the routing table.
    pub async fn unregister(&mut self, host: &RwLock<HostApp>, config: &ManagerConfig) -> PluginResult<()> {
        self.status.require(Operation::Stop)?;
        let scope = self.scope(config);

        for action in &self.unregister_actions {
            let mut app = host.write().await;
            match action {
                UnregisterAction::SilenceEndpoint(endpoint) => {
                    let qualified = scope.endpoint(endpoint);
                    if app.view_function(&qualified).is_some() {
                        app.set_view_function(&qualified, not_found_view());
                    }
                }
            }
        }

        self.status.transition(PluginStatus::Stopped)?;
        info!(plugin_id = %self.id, domain = %self.domain, "Plugin stopped");
        Ok(())
    }

    /// Runs each cleanup once, forgets the endpoints, then enters `Unloaded`.
    pub async fn clean(&mut self, host: &RwLock<HostApp>, config: &ManagerConfig) -> PluginResult<()> {
        self.status.require(Operation::Unload)?;
        self.run_cleanup(host, config).await;
        self.endpoints.clear();
        self.status.transition(PluginStatus::Unloaded)?;
        info!(plugin_id = %self.id, domain = %self.domain, "Plugin unloaded");
        Ok(())
    }

    async fn run_cleanup(&mut self, host: &RwLock<HostApp>, config: &ManagerConfig) {
        let scope = self.scope(config);
        let prefix = scope.endpoint_prefix();
        let qualified = Some(scope.qualified.as_str());

        for kind in &self.cleanup_actions {
            let mut app = host.write().await;
            match kind {
                CleanupKind::UrlRules => {
                    let removed = app.remove_rules_where(|rule| rule.endpoint().starts_with(&prefix));
                    debug!(plugin_id = %self.id, removed, "Url rules removed");
                }
                CleanupKind::ViewFunctions => {
                    let removed = app.remove_view_functions_where(|endpoint| endpoint.starts_with(&prefix));
                    debug!(plugin_id = %self.id, removed, "View functions removed");
                }
                CleanupKind::ErrorHandlers => {
                    app.remove_error_handlers(qualified);
                }
                CleanupKind::Hooks(kind) => {
                    app.detach_hooks(*kind, qualified, &mut self.pending_hooks);
                }
                CleanupKind::Resources => {
                    app.remove_resources(&scope.qualified);
                }
            }
        }
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("domain", &self.domain)
            .field("status", &self.status())
            .field("basedir", &self.basedir)
            .field("endpoints", &self.endpoints)
            .field("register_actions", &self.register_actions.len())
            .field("cleanup_actions", &self.cleanup_actions)
            .finish()
    }
}
