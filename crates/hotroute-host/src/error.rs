//! Host-level errors raised while declaring routes or building URLs.

use thiserror::Error;

use hotroute_core::AppError;

/// Errors produced by the host routing and rendering primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// A rule pattern could not be parsed.
    #[error("malformed url rule '{rule}': {reason}")]
    MalformedRule {
        /// The offending rule text.
        rule: String,
        /// Why it was rejected.
        reason: String,
    },
    /// No rule could build a URL for the endpoint with the given values.
    #[error("could not build url for endpoint '{endpoint}'")]
    BuildFailed {
        /// The endpoint requested.
        endpoint: String,
    },
    /// An error handler was registered for a code that is not an HTTP error.
    #[error("'{0}' is not a recognized HTTP error code")]
    UnknownErrorCode(u16),
    /// A template could not be located or read.
    #[error("template '{name}' not found")]
    TemplateNotFound {
        /// Requested template name.
        name: String,
    },
    /// A template failed to parse or render.
    #[error("template '{name}' failed to render: {message}")]
    TemplateRender {
        /// Template name.
        name: String,
        /// Engine diagnostics.
        message: String,
    },
}

impl From<HostError> for AppError {
    fn from(err: HostError) -> Self {
        match err {
            HostError::MalformedRule { .. } | HostError::UnknownErrorCode(_) => {
                AppError::validation(err.to_string())
            }
            HostError::BuildFailed { .. }
            | HostError::TemplateNotFound { .. }
            | HostError::TemplateRender { .. } => {
                AppError::internal(err.to_string())
            }
        }
    }
}
