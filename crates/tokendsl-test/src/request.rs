//! Test request building.

use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue, Method, Request, Uri};
use serde::Serialize;

use crate::error::TestError;

/// A built request, ready to hand to an app.
#[derive(Debug, Clone)]
pub struct TestRequest {
    /// HTTP method.
    pub method: Method,
    /// Request URI, including any query string.
    pub uri: Uri,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request body.
    pub body: Bytes,
}

impl TestRequest {
    /// Starts a GET request.
    pub fn get(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::GET, uri)
    }

    /// Starts a POST request.
    pub fn post(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::POST, uri)
    }

    /// Starts a PUT request.
    pub fn put(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::PUT, uri)
    }

    /// Starts a PATCH request.
    pub fn patch(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::PATCH, uri)
    }

    /// Starts a DELETE request.
    pub fn delete(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::DELETE, uri)
    }

    /// Converts to the request type [`App::handle`](tokendsl_server::App::handle) takes.
    #[must_use]
    pub fn into_http_request(self) -> Request<Bytes> {
        let mut request = Request::new(self.body);
        *request.method_mut() = self.method;
        *request.uri_mut() = self.uri;
        *request.headers_mut() = self.headers;
        request
    }
}

/// Builder for [`TestRequest`].
///
/// Invalid input is remembered and reported by [`build`](Self::build), so
/// calls can be chained without handling errors at every step.
#[derive(Debug)]
#[must_use]
pub struct TestRequestBuilder {
    method: Method,
    uri: String,
    query: Vec<String>,
    headers: HeaderMap,
    body: Option<Bytes>,
    error: Option<TestError>,
}

impl TestRequestBuilder {
    /// Creates a builder.
    pub fn new(method: Method, uri: impl AsRef<str>) -> Self {
        Self {
            method,
            uri: uri.as_ref().to_string(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            error: None,
        }
    }

    /// Sets a header, replacing any previous value.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = HeaderName::try_from(name.as_ref());
        let value = HeaderValue::try_from(value.as_ref());
        match (name, value) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            (Err(e), _) => self.fail(TestError::InvalidHeader(e.to_string())),
            (_, Err(e)) => self.fail(TestError::InvalidHeader(e.to_string())),
        }
        self
    }

    /// Sets the `Content-Type` header.
    pub fn content_type(self, content_type: impl AsRef<str>) -> Self {
        self.header(header::CONTENT_TYPE.as_str(), content_type)
    }

    /// Appends query parameters encoded from `params`.
    ///
    /// ```
    /// use tokendsl_test::TestRequest;
    ///
    /// let request = TestRequest::get("/users")
    ///     .query(&[("page", "2"), ("q", "a b")])
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(request.uri.query(), Some("page=2&q=a+b"));
    /// ```
    pub fn query<T: Serialize + ?Sized>(mut self, params: &T) -> Self {
        match serde_urlencoded::to_string(params) {
            Ok(encoded) if encoded.is_empty() => {}
            Ok(encoded) => self.query.push(encoded),
            Err(e) => self.fail(TestError::RequestBuild(format!("invalid query: {e}"))),
        }
        self
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets a JSON body and `Content-Type: application/json`.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                self.body = Some(Bytes::from(bytes));
                self.content_type("application/json")
            }
            Err(e) => {
                self.fail(TestError::Json(e));
                self
            }
        }
    }

    /// Builds the request.
    pub fn build(self) -> Result<TestRequest, TestError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let uri = if self.query.is_empty() {
            self.uri
        } else {
            let separator = if self.uri.contains('?') { '&' } else { '?' };
            format!("{}{separator}{}", self.uri, self.query.join("&"))
        };
        let uri: Uri = uri
            .parse()
            .map_err(|e| TestError::RequestBuild(format!("invalid URI: {e}")))?;

        Ok(TestRequest {
            method: self.method,
            uri,
            headers: self.headers,
            body: self.body.unwrap_or_default(),
        })
    }

    fn fail(&mut self, error: TestError) {
        self.error.get_or_insert(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_methods() {
        assert_eq!(TestRequest::get("/a").build().unwrap().method, Method::GET);
        assert_eq!(TestRequest::post("/a").build().unwrap().method, Method::POST);
        assert_eq!(TestRequest::put("/a").build().unwrap().method, Method::PUT);
        assert_eq!(TestRequest::patch("/a").build().unwrap().method, Method::PATCH);
        assert_eq!(TestRequest::delete("/a").build().unwrap().method, Method::DELETE);
    }

    #[test]
    fn test_json_body_sets_content_type() {
        let request = TestRequest::post("/users")
            .json(&json!({"name": "Alice"}))
            .build()
            .unwrap();
        assert_eq!(request.headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(request.body.as_ref(), br#"{"name":"Alice"}"#);
    }

    #[test]
    fn test_query_appends_to_existing() {
        let request = TestRequest::get("/users?sort=name")
            .query(&[("page", "1")])
            .build()
            .unwrap();
        assert_eq!(request.uri.query(), Some("sort=name&page=1"));
    }

    #[test]
    fn test_invalid_header_reported_on_build() {
        let result = TestRequest::get("/users")
            .header("bad header", "x")
            .header("x-ok", "1")
            .build();
        assert!(matches!(result, Err(TestError::InvalidHeader(_))));
    }

    #[test]
    fn test_invalid_uri() {
        let result = TestRequest::get("not a uri").build();
        assert!(matches!(result, Err(TestError::RequestBuild(_))));
    }

    #[test]
    fn test_into_http_request() {
        let request = TestRequest::put("/users/1")
            .header("x-test", "value")
            .body("raw")
            .build()
            .unwrap()
            .into_http_request();
        assert_eq!(request.method(), Method::PUT);
        assert_eq!(request.uri().path(), "/users/1");
        assert_eq!(request.headers()["x-test"], "value");
        assert_eq!(request.body().as_ref(), b"raw");
    }
}
