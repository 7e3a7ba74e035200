//! Test response wrapper.

use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, StatusCode};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokendsl_core::REQUEST_ID_HEADER;
use tokendsl_server::HttpResponse;

use crate::error::TestError;

/// A fully read response with assertion helpers.
#[derive(Debug, Clone)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    /// Reads an app response.
    pub async fn from_http(response: HttpResponse) -> Result<Self, TestError> {
        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| TestError::BodyRead(e.to_string()))?
            .to_bytes();

        Ok(Self::new(parts.status, parts.headers, body))
    }

    /// Creates a response from parts.
    #[must_use]
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Returns the status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the status as a number.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns the headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header.
    #[must_use]
    pub fn header(&self, name: impl AsRef<str>) -> Option<&HeaderValue> {
        self.headers.get(name.as_ref())
    }

    /// Returns a header as a string.
    #[must_use]
    pub fn header_str(&self, name: impl AsRef<str>) -> Option<&str> {
        self.header(name).and_then(|v| v.to_str().ok())
    }

    /// Returns `Content-Type`.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header_str(header::CONTENT_TYPE.as_str())
    }

    /// Returns the request id the app assigned.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.header_str(REQUEST_ID_HEADER)
    }

    /// Returns the raw body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as UTF-8 text.
    pub fn text(&self) -> Result<String, TestError> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| TestError::BodyRead(format!("invalid UTF-8: {e}")))
    }

    /// Deserializes the body.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Parses the body as a JSON value.
    pub fn json_value(&self) -> Result<Value, TestError> {
        self.json()
    }

    /// Asserts the status.
    ///
    /// # Panics
    ///
    /// Panics on mismatch, printing the body.
    #[track_caller]
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "expected status {expected}, got {} with body {}",
            self.status,
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    /// Asserts the body equals `expected` as JSON.
    ///
    /// # Panics
    ///
    /// Panics if the body is not JSON or differs.
    #[track_caller]
    pub fn assert_json(&self, expected: &Value) -> &Self {
        match self.json_value() {
            Ok(actual) => assert_eq!(&actual, expected, "JSON body mismatch"),
            Err(e) => panic!("body is not JSON: {e}"),
        }
        self
    }

    /// Asserts `pointer` (RFC 6901, like `/error/0/path`) resolves to `expected`.
    ///
    /// # Panics
    ///
    /// Panics if the body is not JSON, the pointer is absent or the value differs.
    #[track_caller]
    pub fn assert_json_pointer(&self, pointer: &str, expected: &Value) -> &Self {
        let body = match self.json_value() {
            Ok(body) => body,
            Err(e) => panic!("body is not JSON: {e}"),
        };
        match body.pointer(pointer) {
            Some(actual) => assert_eq!(actual, expected, "mismatch at {pointer}"),
            None => panic!("{pointer} not found in {body}"),
        }
        self
    }

    /// Asserts the body is a validation error with an issue at `path`.
    ///
    /// # Panics
    ///
    /// Panics unless the status is 400 and some issue has that path.
    #[track_caller]
    pub fn assert_validation_issue(&self, path: &str) -> &Self {
        self.assert_status(StatusCode::BAD_REQUEST);
        let body = self.json_value().unwrap_or(Value::Null);
        let found = body["error"]
            .as_array()
            .is_some_and(|issues| issues.iter().any(|issue| issue["path"] == path));
        assert!(found, "no validation issue at {path} in {body}");
        self
    }

    /// Asserts a header value.
    ///
    /// # Panics
    ///
    /// Panics if the header is absent or differs.
    #[track_caller]
    pub fn assert_header(&self, name: impl AsRef<str>, expected: impl AsRef<str>) -> &Self {
        let name = name.as_ref();
        assert_eq!(
            self.header_str(name),
            Some(expected.as_ref()),
            "header {name} mismatch"
        );
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: StatusCode, body: &str) -> TestResponse {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        TestResponse::new(status, headers, Bytes::from(body.to_string()))
    }

    #[test]
    fn test_accessors() {
        let res = response(StatusCode::CREATED, r#"{"id":"1"}"#);
        assert_eq!(res.status_code(), 201);
        assert_eq!(res.content_type(), Some("application/json"));
        assert_eq!(res.request_id(), None);
        assert_eq!(res.json_value().unwrap(), json!({"id": "1"}));
    }

    #[test]
    fn test_assertions_chain() {
        response(StatusCode::BAD_REQUEST, r#"{"error":[{"path":"email","message":"invalid email"}]}"#)
            .assert_status(StatusCode::BAD_REQUEST)
            .assert_validation_issue("email")
            .assert_json_pointer("/error/0/message", &json!("invalid email"))
            .assert_header("content-type", "application/json");
    }

    #[test]
    #[should_panic(expected = "expected status 200")]
    fn test_status_mismatch_panics() {
        response(StatusCode::NOT_FOUND, "{}").assert_status(StatusCode::OK);
    }

    #[test]
    fn test_text_rejects_invalid_utf8() {
        let res = TestResponse::new(StatusCode::OK, HeaderMap::new(), Bytes::from_static(&[0xff]));
        assert!(matches!(res.text(), Err(TestError::BodyRead(_))));
    }
}
