//! View and error-handler references stored in the host tables.

use std::fmt;
use std::sync::{Arc, LazyLock};

use crate::context::RequestContext;
use crate::error::HostError;
use crate::http::{Abort, HandlerResult, Response};

/// A view bound to a fully-qualified endpoint.
pub type ViewFn = Arc<dyn Fn(&RequestContext<'_>) -> HandlerResult + Send + Sync>;

/// A handler turning an abort into a response.
pub type ErrorHandlerFn = Arc<dyn Fn(&RequestContext<'_>, &Abort) -> Response + Send + Sync>;

static NOT_FOUND_VIEW: LazyLock<ViewFn> = LazyLock::new(|| {
    let view: ViewFn = Arc::new(|_ctx: &RequestContext<'_>| -> HandlerResult { Err(Abort::not_found()) });
    view
});

/// The shared responder that always aborts with `404`.
///
/// Stopped plugin endpoints are pointed at this value so the routing table
/// keeps its shape while the endpoint is inactive.
pub fn not_found_view() -> ViewFn {
    NOT_FOUND_VIEW.clone()
}

/// Whether `view` is the shared not-found responder.
pub fn is_not_found_view(view: &ViewFn) -> bool {
    Arc::ptr_eq(view, &NOT_FOUND_VIEW)
}

/// Key of an entry in the scoped error-handler registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKey {
    /// An HTTP error status (`400..=599`).
    Status(u16),
    /// A typed abort raised with [`Abort::kind`].
    Kind(String),
}

impl ErrorKey {
    /// Key for an HTTP error status, rejecting codes outside `400..=599`.
    pub fn status(code: u16) -> Result<Self, HostError> {
        if (400..=599).contains(&code) {
            Ok(Self::Status(code))
        } else {
            Err(HostError::UnknownErrorCode(code))
        }
    }

    /// Key for a typed abort.
    pub fn kind(name: impl Into<String>) -> Self {
        Self::Kind(name.into())
    }

    /// Checks that the key can be registered.
    pub fn validate(&self) -> Result<(), HostError> {
        match self {
            Self::Status(code) => Self::status(*code).map(|_| ()),
            Self::Kind(_) => Ok(()),
        }
    }
}

impl fmt::Display for ErrorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "{code}"),
            Self::Kind(name) => f.write_str(name),
        }
    }
}
