//! # hotroute-host
//!
//! The host application that plugins are installed into: a routing table
//! that can be edited while serving, handler and error-handler tables,
//! scoped request hooks, per-scope file resources, a configuration table,
//! and the dispatch pipeline tying them together.

pub mod app;
pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod hooks;
pub mod http;
pub mod routing;
pub mod template;

pub use app::{HostApp, ScopeResources, SharedHost};
pub use config::HostConfig;
pub use context::RequestContext;
pub use error::HostError;
pub use handlers::{ErrorHandlerFn, ErrorKey, ViewFn, is_not_found_view, not_found_view};
pub use hooks::{Hook, HookKind, PendingHooks};
pub use self::http::{Abort, HandlerResult, Request, Response, ViewArgs, abort};
pub use routing::{RouteOptions, Rule, RulePattern, UrlMap};
