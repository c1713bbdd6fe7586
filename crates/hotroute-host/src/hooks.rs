//! Per-kind request hooks, registered per scope.
//!
//! A scope is `None` for the application or the qualified name of a
//! blueprint such as `plugins.hello`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::context::RequestContext;
use crate::http::{Abort, Response, ViewArgs};

/// Runs before the view. Returning a response ends the request early.
pub type BeforeRequestFn =
    Arc<dyn Fn(&RequestContext<'_>) -> Result<Option<Response>, Abort> + Send + Sync>;

/// Rewrites the response.
pub type AfterRequestFn = Arc<dyn Fn(&RequestContext<'_>, Response) -> Response + Send + Sync>;

/// Runs once the response is produced, with the abort if one occurred.
pub type TeardownFn = Arc<dyn Fn(&RequestContext<'_>, Option<&Abort>) + Send + Sync>;

/// Contributes variables to every rendered template.
pub type ContextProcessorFn =
    Arc<dyn Fn(&RequestContext<'_>) -> Map<String, Value> + Send + Sync>;

/// Adjusts the captured URL values before the view sees them.
pub type UrlValuePreprocessorFn = Arc<dyn Fn(Option<&str>, &mut ViewArgs) + Send + Sync>;

/// Injects default values when building URLs.
pub type UrlDefaultsFn = Arc<dyn Fn(&str, &mut ViewArgs) + Send + Sync>;

/// The six hook kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    BeforeRequest,
    AfterRequest,
    TeardownRequest,
    ContextProcessor,
    UrlValuePreprocessor,
    UrlDefaults,
}

impl HookKind {
    /// Every kind, in registration order.
    pub const ALL: [HookKind; 6] = [
        HookKind::BeforeRequest,
        HookKind::AfterRequest,
        HookKind::TeardownRequest,
        HookKind::ContextProcessor,
        HookKind::UrlValuePreprocessor,
        HookKind::UrlDefaults,
    ];

    /// Snake-case name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BeforeRequest => "before_request",
            Self::AfterRequest => "after_request",
            Self::TeardownRequest => "teardown_request",
            Self::ContextProcessor => "context_processor",
            Self::UrlValuePreprocessor => "url_value_preprocessor",
            Self::UrlDefaults => "url_defaults",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A hook function of any kind.
#[derive(Clone)]
pub enum Hook {
    BeforeRequest(BeforeRequestFn),
    AfterRequest(AfterRequestFn),
    TeardownRequest(TeardownFn),
    ContextProcessor(ContextProcessorFn),
    UrlValuePreprocessor(UrlValuePreprocessorFn),
    UrlDefaults(UrlDefaultsFn),
}

impl Hook {
    /// Kind of this hook.
    pub fn kind(&self) -> HookKind {
        match self {
            Self::BeforeRequest(_) => HookKind::BeforeRequest,
            Self::AfterRequest(_) => HookKind::AfterRequest,
            Self::TeardownRequest(_) => HookKind::TeardownRequest,
            Self::ContextProcessor(_) => HookKind::ContextProcessor,
            Self::UrlValuePreprocessor(_) => HookKind::UrlValuePreprocessor,
            Self::UrlDefaults(_) => HookKind::UrlDefaults,
        }
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hook({})", self.kind())
    }
}

/// Hooks of one kind keyed by scope.
pub type ScopedHooks = HashMap<Option<String>, Vec<Hook>>;

/// Hooks declared but not yet installed on a host, stacked per kind.
///
/// Attaching takes the most recently declared hook first, so a plugin's
/// installed list for a kind is in reverse declaration order.
#[derive(Debug, Default, Clone)]
pub struct PendingHooks {
    stacks: HashMap<HookKind, Vec<Hook>>,
}

impl PendingHooks {
    /// Creates empty stacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a hook onto its kind's stack.
    pub fn push(&mut self, hook: Hook) {
        self.stacks.entry(hook.kind()).or_default().push(hook);
    }

    /// Returns hooks detached from a host, in their installed order, so
    /// that popping reinstalls them in that same order.
    pub fn restore(&mut self, kind: HookKind, installed: Vec<Hook>) {
        self.stacks
            .entry(kind)
            .or_default()
            .extend(installed.into_iter().rev());
    }

    /// Takes the most recently pushed hook of `kind`.
    pub fn pop(&mut self, kind: HookKind) -> Option<Hook> {
        self.stacks.get_mut(&kind).and_then(Vec::pop)
    }

    /// Number of pending hooks of `kind`.
    pub fn len(&self, kind: HookKind) -> usize {
        self.stacks.get(&kind).map_or(0, Vec::len)
    }

    /// Whether no hooks of any kind are pending.
    pub fn is_empty(&self) -> bool {
        self.stacks.values().all(Vec::is_empty)
    }
}
