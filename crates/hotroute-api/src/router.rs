//! Route definitions.
//!
//! Only the admin endpoints are Axum routes. Plugin routes live in the host
//! routing table and are reached through the fallback.

use axum::Router;
use axum::routing::{any, get};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::ApiState;

/// Builds the Axum router.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/api", get(handlers::admin::status))
        .route("/{action}/{id}", any(handlers::admin::lifecycle))
        .fallback(handlers::dispatch::dispatch)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
