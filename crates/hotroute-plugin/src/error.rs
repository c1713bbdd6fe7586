//! Errors raised by the plugin lifecycle, discovery and registration API.

use std::path::PathBuf;

use thiserror::Error;

use hotroute_core::{AppError, ErrorKind};
use hotroute_host::HostError;

/// Plugin lifecycle and discovery failures.
#[derive(Debug, Error)]
pub enum PluginError {
    /// No rule leads from the current state to the requested one.
    #[error("illegal transition from {from} to {to}")]
    IllegalTransition { from: String, to: String },

    /// The operation is not valid in the current state.
    #[error("operation '{operation}' not permitted in state {state}")]
    OperationNotPermitted { operation: String, state: String },

    /// Another tracked plugin already uses this identifier.
    #[error("plugin with id '{id}' is already loaded")]
    DuplicateId { id: String },

    /// No discoverable plugin has this identifier.
    #[error("no plugin with id '{id}' found")]
    UnknownPlugin { id: String },

    /// The plugin was not produced by discovery.
    #[error("plugin '{id}' has no base directory; only scanned plugins can be loaded")]
    MissingBasedir { id: String },

    /// A bad domain, endpoint name or registration value.
    #[error("{0}")]
    Validation(String),

    /// A discovered directory did not yield a plugin.
    #[error("failed to load plugin from '{directory}': {message}")]
    Discovery { directory: String, message: String },

    /// The scan directory could not be read.
    #[error("cannot read plugin directory '{}': {source}", path.display())]
    ScanDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A `plugin.json` manifest is unreadable or invalid.
    #[error("invalid manifest '{}': {message}", path.display())]
    Manifest { path: PathBuf, message: String },
}

/// Result alias for plugin operations.
pub type PluginResult<T> = Result<T, PluginError>;

impl PluginError {
    /// Validation failure with a message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<HostError> for PluginError {
    fn from(err: HostError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<PluginError> for AppError {
    fn from(err: PluginError) -> Self {
        let message = err.to_string();
        match err {
            PluginError::IllegalTransition { .. } | PluginError::OperationNotPermitted { .. } => {
                AppError::invalid_state(message)
            }
            PluginError::DuplicateId { .. } => AppError::conflict(message),
            PluginError::UnknownPlugin { .. } => AppError::not_found(message),
            PluginError::Validation(_)
            | PluginError::MissingBasedir { .. }
            | PluginError::Manifest { .. } => AppError::validation(message),
            PluginError::Discovery { .. } => AppError::discovery(message),
            PluginError::ScanDirectory { source, .. } => {
                AppError::with_source(ErrorKind::Discovery, message, source)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_mapping() {
        let err: AppError = PluginError::DuplicateId { id: "dup".into() }.into();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(err.message, "plugin with id 'dup' is already loaded");

        let err: AppError = PluginError::OperationNotPermitted {
            operation: "stop".into(),
            state: "Loaded".into(),
        }
        .into();
        assert_eq!(err.kind, ErrorKind::InvalidState);

        let err: AppError = PluginError::MissingBasedir { id: "x".into() }.into();
        assert_eq!(err.kind, ErrorKind::Validation);

        let err: AppError = PluginError::ScanDirectory {
            path: PathBuf::from("/nowhere"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        }
        .into();
        assert_eq!(err.kind, ErrorKind::Discovery);
    }
}
