//! The `goodbye` plugin.

use hotroute_plugin::{Plugin, PluginResult, PluginSource};

use crate::greeting;

/// Catalog entry name.
pub const ENTRY: &str = "goodbye";

/// Constructs the plugin.
pub fn create(source: &PluginSource) -> PluginResult<Plugin> {
    greeting::build(source, "Goodbye Forbidden!")
}
