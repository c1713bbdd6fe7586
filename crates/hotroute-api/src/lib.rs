//! # hotroute-api
//!
//! HTTP layer for HotRoute built on Axum.
//!
//! Serves the plugin admin endpoints and forwards every other request into
//! the host dispatch pipeline, so plugin routes become live without
//! rebuilding the Axum router.

pub mod handlers;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::ApiState;
