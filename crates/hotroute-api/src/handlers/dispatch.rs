//! Forwarding into the host dispatch pipeline.

use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::response::{IntoResponse, Response};
use percent_encoding::percent_decode_str;
use tracing::warn;

use hotroute_core::AppError;

use crate::state::ApiState;

const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Converts the request, dispatches it through the host and converts the
/// response back.
pub async fn dispatch(State(state): State<ApiState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, "Failed to read request body");
            return AppError::validation(format!("unreadable request body: {e}")).into_response();
        }
    };

    let path = percent_decode_str(parts.uri.path())
        .decode_utf8_lossy()
        .into_owned();
    let mut host_request = hotroute_host::Request::new(parts.method, path)
        .with_headers(parts.headers)
        .with_body(body);
    if let Some(query) = parts.uri.query() {
        host_request = host_request.with_query(query);
    }

    let host_response = state.host.read().await.dispatch(&host_request);

    let mut response = Response::new(Body::from(host_response.body));
    *response.status_mut() = host_response.status;
    *response.headers_mut() = host_response.headers;
    response
}
