//! Default response mapping.
//!
//! Success: `201` for `POST`, `200` otherwise, body is the handler value.
//!
//! Errors:
//!
//! | Error | Status | Body |
//! |-------|--------|------|
//! | validation | 400 | `{"error": [{"path", "message"}, ...]}` |
//! | not found (kind or sentinel message) | 404 | `{"error": message}` |
//! | anything else | 500 | `{"error": "Internal server error"}` |
//!
//! The 500 body gains a `"message"` field only when
//! [`DispatchConfig::expose_internal_messages`] is set.

use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, StatusCode};
use serde_json::{json, Value};
use tokendsl_router::HttpMethod;

use crate::dispatch::DispatchConfig;
use crate::error::ApiError;

/// Message of the default 500 body.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// A fully decided response: status, JSON body and extra headers.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointResponse {
    /// Status code.
    pub status: StatusCode,
    /// JSON body.
    pub body: Value,
    /// Headers in addition to `content-type: application/json`.
    pub headers: HeaderMap,
}

impl EndpointResponse {
    /// Creates a response.
    #[must_use]
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body,
            headers: HeaderMap::new(),
        }
    }

    /// `200 OK`.
    #[must_use]
    pub fn ok(body: Value) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// `201 Created`.
    #[must_use]
    pub fn created(body: Value) -> Self {
        Self::new(StatusCode::CREATED, body)
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Serializes the body and returns the full header set.
    ///
    /// `content-type` defaults to `application/json` unless a hook set it.
    #[must_use]
    pub fn into_parts(self) -> (StatusCode, HeaderMap, Vec<u8>) {
        let mut headers = self.headers;
        headers
            .entry(CONTENT_TYPE)
            .or_insert(HeaderValue::from_static("application/json"));
        // Serializing a `Value` cannot fail.
        let body = serde_json::to_vec(&self.body).unwrap_or_default();
        (self.status, headers, body)
    }
}

/// Maps a handler value to the default success response.
#[must_use]
pub fn success_response(method: HttpMethod, value: Value) -> EndpointResponse {
    match method {
        HttpMethod::Post => EndpointResponse::created(value),
        HttpMethod::Get | HttpMethod::Put | HttpMethod::Delete | HttpMethod::Patch => {
            EndpointResponse::ok(value)
        }
    }
}

/// Returns true if the error should be answered with 404.
///
/// That is the case for [`ApiError::NotFound`], and for any other non-validation
/// error whose message equals one of the configured sentinels.
#[must_use]
pub fn is_not_found(err: &ApiError, config: &DispatchConfig) -> bool {
    match err {
        ApiError::NotFound { .. } => true,
        ApiError::Validation { .. } => false,
        ApiError::Internal { message, .. } => config
            .not_found_messages
            .iter()
            .any(|sentinel| sentinel == message),
    }
}

/// Maps an error to the default error response.
#[must_use]
pub fn error_response(err: &ApiError, config: &DispatchConfig) -> EndpointResponse {
    if let ApiError::Validation { issues } = err {
        return EndpointResponse::new(StatusCode::BAD_REQUEST, json!({ "error": issues }));
    }

    if is_not_found(err, config) {
        return EndpointResponse::new(StatusCode::NOT_FOUND, json!({ "error": err.message() }));
    }

    let body = if config.expose_internal_messages {
        json!({ "error": INTERNAL_ERROR_MESSAGE, "message": err.message() })
    } else {
        json!({ "error": INTERNAL_ERROR_MESSAGE })
    };
    EndpointResponse::new(StatusCode::INTERNAL_SERVER_ERROR, body)
}
