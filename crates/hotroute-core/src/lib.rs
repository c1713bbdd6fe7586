//! # hotroute-core
//!
//! Core crate for HotRoute. Contains the application configuration
//! schema, plugin lifecycle events, and the unified error system.
//!
//! This crate has **no** internal dependencies on other HotRoute crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;

pub use error::{AppError, ErrorKind};
pub use events::{PluginEvent, PluginEventKind};
pub use result::AppResult;
