//! Plugin system configuration.

use serde::{Deserialize, Serialize};

/// Plugin system configuration.
///
/// These values seed the host configuration keys (`PLUGINS_BLUEPRINT`,
/// `PLUGINS_DIRECTORY`, `PLUGINS_EXCLUDES_DIRECTORY`, `PROPAGATE_EXCEPTIONS`)
/// which the plugin manager resolves at start-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    /// URL prefix and scope name under which every plugin is mounted.
    #[serde(default = "default_blueprint")]
    pub blueprint: String,
    /// Directory scanned for plugin subdirectories.
    #[serde(default = "default_directory")]
    pub directory: String,
    /// Subdirectory names skipped while scanning.
    #[serde(default = "default_excludes")]
    pub excludes_directory: Vec<String>,
    /// Surface discovery failures instead of skipping them.
    #[serde(default)]
    pub propagate_errors: Option<bool>,
    /// Whether to load every discovered plugin on startup.
    #[serde(default = "default_true")]
    pub auto_load: bool,
    /// Plugin identifiers started right after auto-loading.
    #[serde(default)]
    pub auto_start: Vec<String>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            blueprint: default_blueprint(),
            directory: default_directory(),
            excludes_directory: default_excludes(),
            propagate_errors: None,
            auto_load: true,
            auto_start: Vec::new(),
        }
    }
}

fn default_blueprint() -> String {
    "plugins".to_string()
}

fn default_directory() -> String {
    "plugins".to_string()
}

fn default_excludes() -> Vec<String> {
    vec!["__pycache__".to_string()]
}

fn default_true() -> bool {
    true
}
