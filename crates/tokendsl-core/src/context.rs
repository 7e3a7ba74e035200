//! Request context types.
//!
//! A [`RequestContext`] is built by the server for every matched request and
//! handed to the handler and hooks alongside the validated input.

use std::time::{Duration, Instant};

use http::HeaderMap;
use serde::{Deserialize, Serialize};
use tokendsl_router::{HttpMethod, RouteKey};
use uuid::Uuid;

/// Header carrying a caller-supplied request ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps IDs sortable in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Reads the ID from `x-request-id` if it holds a UUID, otherwise
    /// creates a fresh one.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v.trim()).ok())
            .map_or_else(Self::new, Self)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Per-request information available to handlers and hooks.
///
/// # Example
///
/// ```
/// use tokendsl_core::RequestContext;
/// use tokendsl_router::RouteKey;
///
/// let route = RouteKey::parse("GET /users/:id").unwrap();
/// let ctx = RequestContext::new(route, "/users/42");
/// assert_eq!(ctx.route().to_string(), "GET /users/:id");
/// assert_eq!(ctx.path(), "/users/42");
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    route: RouteKey,
    path: String,
    headers: HeaderMap,
    started_at: Instant,
}

impl RequestContext {
    /// Creates a context for a request to `path` matched by `route`.
    #[must_use]
    pub fn new(route: RouteKey, path: impl Into<String>) -> Self {
        Self {
            request_id: RequestId::new(),
            route,
            path: path.into(),
            headers: HeaderMap::new(),
            started_at: Instant::now(),
        }
    }

    /// Attaches the request headers. Picks up `x-request-id` if present.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.request_id = RequestId::from_headers(&headers);
        self.headers = headers;
        self
    }

    /// Overrides the request ID.
    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the route key that matched.
    #[must_use]
    pub const fn route(&self) -> &RouteKey {
        &self.route
    }

    /// Returns the request method.
    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.route.method()
    }

    /// Returns the concrete request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the request headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the time since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}
