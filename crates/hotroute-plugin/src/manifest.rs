//! `plugin.json` manifests describing a plugin directory.

use std::path::Path;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::{PluginError, PluginResult};
use crate::plugin::check_domain;

/// File name of the manifest inside a plugin directory.
pub const MANIFEST_FILE: &str = "plugin.json";

/// Parsed plugin manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Manifest {
    /// Stable plugin identifier.
    #[validate(length(min = 1, message = "id is required"))]
    pub id: String,
    /// URL segment the plugin is mounted under.
    #[validate(custom(function = "validate_domain"))]
    pub domain: String,
    /// Catalog entry name. Defaults to the id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
    /// Shared library file, relative to the plugin directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library: Option<String>,
    /// Descriptive metadata.
    #[validate(nested)]
    pub plugin: ManifestPlugin,
    /// Published releases, newest first.
    #[serde(default)]
    #[validate(nested)]
    pub releases: Vec<Release>,
}

/// Descriptive block of a manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ManifestPlugin {
    #[validate(length(min = 1, message = "plugin.name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "plugin.author is required"))]
    pub author: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// One published release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Release {
    #[validate(length(min = 1, message = "release version is required"))]
    pub version: String,
    #[validate(length(min = 1, message = "release download is required"))]
    pub download: String,
}

impl Manifest {
    /// Catalog entry to construct the plugin from.
    pub fn entry_name(&self) -> &str {
        self.entry.as_deref().unwrap_or(&self.id)
    }

    /// Version of the newest release.
    pub fn version(&self) -> Option<&str> {
        self.releases.first().map(|r| r.version.as_str())
    }
}

fn validate_domain(domain: &str) -> Result<(), ValidationError> {
    check_domain(domain).map_err(|e| {
        let mut error = ValidationError::new("domain");
        error.message = Some(e.to_string().into());
        error
    })
}

/// Validates a manifest read from `path`.
pub fn validate(manifest: &Manifest, path: &Path) -> PluginResult<()> {
    manifest.validate().map_err(|e| PluginError::Manifest {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Reads and validates the manifest of the plugin directory `dir`.
pub fn load(dir: &Path) -> PluginResult<Manifest> {
    let path = dir.join(MANIFEST_FILE);
    let raw = std::fs::read_to_string(&path).map_err(|e| PluginError::Manifest {
        path: path.clone(),
        message: e.to_string(),
    })?;
    let manifest: Manifest = serde_json::from_str(&raw).map_err(|e| PluginError::Manifest {
        path: path.clone(),
        message: e.to_string(),
    })?;
    validate(&manifest, &path)?;
    Ok(manifest)
}
