//! The host application: routing table, handler tables, scoped registries
//! and the request dispatch pipeline.
//!
//! Every table edit is a single structural change so that concurrent
//! readers never see half of one edit. Callers sequencing many edits share
//! the host as [`SharedHost`] and hold the write lock per edit.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use http::Method;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::HostConfig;
use crate::context::RequestContext;
use crate::error::HostError;
use crate::handlers::{ErrorHandlerFn, ErrorKey, ViewFn};
use crate::hooks::{Hook, HookKind, PendingHooks, ScopedHooks};
use crate::http::{Abort, HandlerResult, Request, Response, ViewArgs};
use crate::routing::{RouteOptions, Rule, RulePattern, UrlMap};

/// Host shared between the request path and the lifecycle controller.
pub type SharedHost = Arc<RwLock<HostApp>>;

/// File locations owned by a scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeResources {
    /// Folder searched first by `render_template`.
    pub template_folder: Option<PathBuf>,
    /// Folder served by `send_static_file`.
    pub static_folder: Option<PathBuf>,
}

/// The host application.
pub struct HostApp {
    url_map: UrlMap,
    view_functions: HashMap<String, ViewFn>,
    error_handlers: HashMap<Option<String>, HashMap<ErrorKey, ErrorHandlerFn>>,
    hooks: HashMap<HookKind, ScopedHooks>,
    resources: HashMap<String, ScopeResources>,
    config: HostConfig,
    root_path: PathBuf,
    template_folder: Option<PathBuf>,
}

impl HostApp {
    /// Creates an empty host rooted at `root_path`.
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            url_map: UrlMap::new(),
            view_functions: HashMap::new(),
            error_handlers: HashMap::new(),
            hooks: HashMap::new(),
            resources: HashMap::new(),
            config: HostConfig::new(),
            root_path: root_path.into(),
            template_folder: None,
        }
    }

    /// Sets the application template folder, relative to the root path.
    pub fn with_template_folder(mut self, folder: impl AsRef<Path>) -> Self {
        self.template_folder = Some(self.root_path.join(folder));
        self
    }

    /// Wraps the host for sharing.
    pub fn into_shared(self) -> SharedHost {
        Arc::new(RwLock::new(self))
    }

    /// Root path of the application.
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Application template folder.
    pub fn template_folder(&self) -> Option<&Path> {
        self.template_folder.as_deref()
    }

    /// Configuration table.
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Mutable configuration table.
    pub fn config_mut(&mut self) -> &mut HostConfig {
        &mut self.config
    }

    // -- routing table --

    /// The routing table.
    pub fn url_map(&self) -> &UrlMap {
        &self.url_map
    }

    /// Adds a rule, or updates it in place when the same endpoint and
    /// pattern are already present.
    pub fn add_url_rule(&mut self, rule: Rule) {
        debug!(rule = %rule.rule(), endpoint = %rule.endpoint(), "Url rule added");
        self.url_map.add(rule);
    }

    /// Removes matching rules and rebuilds the routing index.
    pub fn remove_rules_where(&mut self, remove: impl FnMut(&Rule) -> bool) -> usize {
        self.url_map.remove_where(remove)
    }

    // -- handler-reference table --

    /// View bound to `endpoint`.
    pub fn view_function(&self, endpoint: &str) -> Option<&ViewFn> {
        self.view_functions.get(endpoint)
    }

    /// Binds `view` to `endpoint`, replacing any previous binding.
    pub fn set_view_function(&mut self, endpoint: impl Into<String>, view: ViewFn) {
        self.view_functions.insert(endpoint.into(), view);
    }

    /// Unbinds `endpoint`.
    pub fn remove_view_function(&mut self, endpoint: &str) -> Option<ViewFn> {
        self.view_functions.remove(endpoint)
    }

    /// Unbinds every endpoint for which `remove` returns true.
    pub fn remove_view_functions_where(&mut self, mut remove: impl FnMut(&str) -> bool) -> usize {
        let before = self.view_functions.len();
        self.view_functions.retain(|endpoint, _| !remove(endpoint));
        before - self.view_functions.len()
    }

    /// All bound endpoints.
    pub fn endpoints(&self) -> impl Iterator<Item = &str> {
        self.view_functions.keys().map(String::as_str)
    }

    // -- scoped error handlers --

    /// Installs an error handler for `scope`.
    pub fn set_error_handler(
        &mut self,
        scope: Option<&str>,
        key: ErrorKey,
        handler: ErrorHandlerFn,
    ) -> Result<(), HostError> {
        key.validate()?;
        self.error_handlers
            .entry(scope.map(str::to_string))
            .or_default()
            .insert(key, handler);
        Ok(())
    }

    /// Drops every error handler of `scope`. Returns how many were removed.
    pub fn remove_error_handlers(&mut self, scope: Option<&str>) -> usize {
        self.error_handlers
            .remove(&scope.map(str::to_string))
            .map_or(0, |handlers| handlers.len())
    }

    /// Number of error handlers installed for `scope`.
    pub fn error_handler_count(&self, scope: Option<&str>) -> usize {
        self.error_handlers
            .get(&scope.map(str::to_string))
            .map_or(0, HashMap::len)
    }

    // -- scoped hooks --

    /// Hooks of `kind` installed for `scope`, in registration order.
    pub fn hooks(&self, kind: HookKind, scope: Option<&str>) -> &[Hook] {
        self.hooks
            .get(&kind)
            .and_then(|scoped| scoped.get(&scope.map(str::to_string)))
            .map_or(&[], Vec::as_slice)
    }

    /// Appends a hook to `scope`.
    pub fn add_hook(&mut self, scope: Option<&str>, hook: Hook) {
        self.hooks
            .entry(hook.kind())
            .or_default()
            .entry(scope.map(str::to_string))
            .or_default()
            .push(hook);
    }

    /// Moves the latest pending hook of `kind` into `scope`. Returns false
    /// when nothing of that kind is pending.
    pub fn attach_pending_hook(
        &mut self,
        kind: HookKind,
        scope: Option<&str>,
        pending: &mut PendingHooks,
    ) -> bool {
        match pending.pop(kind) {
            Some(hook) => {
                self.add_hook(scope, hook);
                true
            }
            None => false,
        }
    }

    /// Removes the whole `scope` entry for `kind`, returning its hooks to
    /// `pending`. Returns how many were detached.
    pub fn detach_hooks(
        &mut self,
        kind: HookKind,
        scope: Option<&str>,
        pending: &mut PendingHooks,
    ) -> usize {
        let detached = self
            .hooks
            .get_mut(&kind)
            .and_then(|scoped| scoped.remove(&scope.map(str::to_string)))
            .unwrap_or_default();
        let count = detached.len();
        pending.restore(kind, detached);
        count
    }

    // -- scope resources --

    /// File locations of `scope`.
    pub fn resources(&self, scope: &str) -> Option<&ScopeResources> {
        self.resources.get(scope)
    }

    /// Sets the file locations of `scope`.
    pub fn set_resources(&mut self, scope: impl Into<String>, resources: ScopeResources) {
        self.resources.insert(scope.into(), resources);
    }

    /// Forgets the file locations of `scope`.
    pub fn remove_resources(&mut self, scope: &str) -> Option<ScopeResources> {
        self.resources.remove(scope)
    }

    // -- application-level registration --

    /// Routes `rule` to an application endpoint.
    pub fn route<F>(&mut self, rule: &str, endpoint: &str, view: F) -> Result<(), HostError>
    where
        F: Fn(&RequestContext<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.route_with(rule, endpoint, RouteOptions::default(), view)
    }

    /// Routes `rule` to an application endpoint with explicit options.
    pub fn route_with<F>(
        &mut self,
        rule: &str,
        endpoint: &str,
        options: RouteOptions,
        view: F,
    ) -> Result<(), HostError>
    where
        F: Fn(&RequestContext<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        let pattern = RulePattern::parse(rule)?;
        self.add_url_rule(Rule::new(pattern, endpoint, &options));
        self.set_view_function(endpoint, Arc::new(view));
        Ok(())
    }

    /// Installs an application-wide error handler.
    pub fn error_handler<F>(&mut self, key: ErrorKey, handler: F) -> Result<(), HostError>
    where
        F: Fn(&RequestContext<'_>, &Abort) -> Response + Send + Sync + 'static,
    {
        self.set_error_handler(None, key, Arc::new(handler))
    }

    // -- dispatch --

    /// `None` followed by `scopes` outermost first.
    pub fn scopes_outer_first<'s>(
        &self,
        scopes: &'s [String],
    ) -> impl Iterator<Item = Option<&'s str>> {
        std::iter::once(None).chain(scopes.iter().rev().map(|s| Some(s.as_str())))
    }

    fn scopes_inner_first<'s>(scopes: &'s [String]) -> impl Iterator<Item = Option<&'s str>> {
        scopes
            .iter()
            .map(|s| Some(s.as_str()))
            .chain(std::iter::once(None))
    }

    /// Handles one request end to end.
    ///
    /// URL value preprocessors and before-request hooks run from the
    /// application scope inwards; after-request and teardown hooks run from
    /// the innermost scope outwards, each list in reverse registration order.
    /// Aborts are resolved by the innermost scope with a matching handler.
    pub fn dispatch(&self, request: &Request) -> Response {
        let (endpoint, mut view_args, routing_error) =
            match self.url_map.match_path(&request.method, &request.path) {
                Ok(matched) => (Some(matched.endpoint), matched.view_args, None),
                Err(abort) => (None, ViewArgs::new(), Some(abort)),
            };

        if let Some(endpoint) = endpoint.as_deref() {
            let scopes = crate::context::blueprints_of(endpoint);
            for scope in self.scopes_outer_first(&scopes) {
                for hook in self.hooks(HookKind::UrlValuePreprocessor, scope) {
                    if let Hook::UrlValuePreprocessor(preprocess) = hook {
                        preprocess(Some(endpoint), &mut view_args);
                    }
                }
            }
        }

        let ctx = RequestContext::new(self, request, endpoint, view_args);

        let outcome = self.preprocess_request(&ctx).and_then(|early| match early {
            Some(response) => Ok(response),
            None => match routing_error {
                Some(abort) => Err(abort),
                None => self.dispatch_view(&ctx),
            },
        });

        let (response, failure) = match outcome {
            Ok(response) => (response, None),
            Err(abort) => (self.handle_abort(&ctx, &abort), Some(abort)),
        };

        let response = self.process_response(&ctx, response);

        for scope in Self::scopes_inner_first(ctx.blueprints()) {
            for hook in self.hooks(HookKind::TeardownRequest, scope).iter().rev() {
                if let Hook::TeardownRequest(teardown) = hook {
                    teardown(&ctx, failure.as_ref());
                }
            }
        }

        if request.method == Method::HEAD {
            response.without_body()
        } else {
            response
        }
    }

    fn preprocess_request(&self, ctx: &RequestContext<'_>) -> Result<Option<Response>, Abort> {
        for scope in self.scopes_outer_first(ctx.blueprints()) {
            for hook in self.hooks(HookKind::BeforeRequest, scope) {
                if let Hook::BeforeRequest(before) = hook {
                    if let Some(response) = before(ctx)? {
                        return Ok(Some(response));
                    }
                }
            }
        }
        Ok(None)
    }

    fn dispatch_view(&self, ctx: &RequestContext<'_>) -> HandlerResult {
        let view = ctx
            .endpoint()
            .and_then(|endpoint| self.view_functions.get(endpoint))
            .ok_or_else(|| {
                warn!(endpoint = ?ctx.endpoint(), "No view bound to matched endpoint");
                Abort::not_found()
            })?;
        view(ctx)
    }

    fn handle_abort(&self, ctx: &RequestContext<'_>, abort: &Abort) -> Response {
        let keys: Vec<ErrorKey> = abort
            .kind
            .iter()
            .map(|kind| ErrorKey::Kind(kind.clone()))
            .chain(std::iter::once(ErrorKey::Status(abort.status.as_u16())))
            .collect();

        for scope in Self::scopes_inner_first(ctx.blueprints()) {
            let Some(handlers) = self.error_handlers.get(&scope.map(str::to_string)) else {
                continue;
            };
            if let Some(handler) = keys.iter().find_map(|key| handlers.get(key)) {
                return handler(ctx, abort);
            }
        }

        abort.to_response()
    }

    fn process_response(&self, ctx: &RequestContext<'_>, mut response: Response) -> Response {
        for scope in Self::scopes_inner_first(ctx.blueprints()) {
            for hook in self.hooks(HookKind::AfterRequest, scope).iter().rev() {
                if let Hook::AfterRequest(after) = hook {
                    response = after(ctx, response);
                }
            }
        }
        response
    }
}

impl fmt::Debug for HostApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostApp")
            .field("root_path", &self.root_path)
            .field("rules", &self.url_map.len())
            .field("view_functions", &self.view_functions.len())
            .field("error_scopes", &self.error_handlers.len())
            .field("resources", &self.resources.keys().collect::<Vec<_>>())
            .finish()
    }
}
