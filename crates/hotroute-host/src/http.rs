//! Request, response, and abort types used by the host dispatch pipeline.

use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use http::header::{self, HeaderName};
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use percent_encoding::percent_decode_str;

/// Variables captured from the matched URL rule.
pub type ViewArgs = BTreeMap<String, String>;

/// Outcome of a view or request hook.
pub type HandlerResult = Result<Response, Abort>;

/// An incoming request as seen by the host.
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method.
    pub method: Method,
    /// Decoded request path, starting with `/`.
    pub path: String,
    /// Decoded query parameters.
    pub query: BTreeMap<String, String>,
    /// Request headers.
    pub headers: HeaderMap,
    /// Raw request body.
    pub body: Bytes,
}

impl Request {
    /// Creates a request with no query, headers, or body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: BTreeMap::new(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Creates a `GET` request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Parses a raw `a=1&b=2` query string into the request.
    pub fn with_query(mut self, raw: &str) -> Self {
        for pair in raw.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            self.query.insert(decode(key), decode(value));
        }
        self
    }

    /// Attaches headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Attaches a body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}

fn decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// A response produced by a view, error handler, or hook.
#[derive(Debug, Clone)]
pub struct Response {
    /// Status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Bytes,
}

impl Response {
    /// Creates a response with the given status and body and no headers.
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// `200 OK` plain text response.
    pub fn text(body: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, body.into())
            .with_header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
    }

    /// `200 OK` HTML response.
    pub fn html(body: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, body.into())
            .with_header(header::CONTENT_TYPE, "text/html; charset=utf-8")
    }

    /// `200 OK` JSON response.
    pub fn json(value: &serde_json::Value) -> Self {
        Self::new(StatusCode::OK, value.to_string())
            .with_header(header::CONTENT_TYPE, "application/json")
    }

    /// `302 Found` redirect.
    pub fn redirect(location: &str) -> Self {
        Self::new(StatusCode::FOUND, Bytes::new()).with_header(header::LOCATION, location)
    }

    /// Replaces the status code.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Sets a header. Values that are not valid header text are dropped.
    pub fn with_header(mut self, name: HeaderName, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Drops the body for a `HEAD` reply, keeping its length in
    /// `Content-Length`.
    pub fn without_body(mut self) -> Self {
        if !self.headers.contains_key(header::CONTENT_LENGTH) {
            self.headers
                .insert(header::CONTENT_LENGTH, HeaderValue::from(self.body.len()));
        }
        self.body = Bytes::new();
        self
    }

    /// Body decoded as UTF-8, lossily.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Signal raised by views and hooks to end the request with an HTTP status.
///
/// `kind` names a typed failure so error handlers can be registered for it
/// independently of the status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Abort {
    /// Status code to respond with.
    pub status: StatusCode,
    /// Optional failure kind used for error-handler lookup.
    pub kind: Option<String>,
    /// Optional description.
    pub message: Option<String>,
}

impl Abort {
    /// Aborts with the given status.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            kind: None,
            message: None,
        }
    }

    /// `404 Not Found`.
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND)
    }

    /// `500 Internal Server Error` with a description.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR).with_message(message)
    }

    /// A typed failure carrying a kind name.
    pub fn kind(kind: impl Into<String>, status: StatusCode) -> Self {
        Self {
            status,
            kind: Some(kind.into()),
            message: None,
        }
    }

    /// Attaches a description.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Default response used when no error handler claims the abort.
    pub fn to_response(&self) -> Response {
        let reason = self.status.canonical_reason().unwrap_or("Error");
        let body = match &self.message {
            Some(message) => format!("{} {}: {}", self.status.as_u16(), reason, message),
            None => format!("{} {}", self.status.as_u16(), reason),
        };
        Response::text(body).with_status(self.status)
    }
}

impl fmt::Display for Abort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.status)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Abort {}

impl From<StatusCode> for Abort {
    fn from(status: StatusCode) -> Self {
        Self::new(status)
    }
}

/// Aborts the current request with a numeric status code.
///
/// Codes that are not valid HTTP statuses become `500`.
pub fn abort(code: u16) -> Abort {
    Abort::new(StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR))
}
