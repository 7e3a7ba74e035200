//! In-memory client over an [`App`].

use std::sync::Arc;

use bytes::Bytes;
use http::Method;
use serde::Serialize;
use tokendsl_core::Dispatcher;
use tokendsl_server::App;

use crate::error::TestError;
use crate::request::TestRequestBuilder;
use crate::response::TestResponse;

/// Sends requests straight to an [`App`] without binding a port.
///
/// Requests take the same path as over the network: routing, 404/405
/// handling, dispatch and request ids.
///
/// ```ignore
/// let client = TestClient::from_dispatcher(&dispatcher)?;
/// let response = client
///     .post("/api/users")
///     .json(&json!({"name": "Ada", "email": "ada@example.com"}))
///     .send()
///     .await;
/// response.assert_status(StatusCode::CREATED);
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct TestClient {
    app: Arc<App>,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Wraps an app.
    pub fn new(app: App) -> Self {
        Self {
            app: Arc::new(app),
            default_headers: Vec::new(),
        }
    }

    /// Binds every endpoint of `dispatcher` into a fresh app.
    pub fn from_dispatcher(dispatcher: &Dispatcher) -> Result<Self, TestError> {
        Ok(Self::new(App::from_dispatcher(dispatcher)?))
    }

    /// Adds a header sent with every request.
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Returns the app.
    #[must_use]
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Starts a GET request.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::GET, uri)
    }

    /// Starts a POST request.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::POST, uri)
    }

    /// Starts a PUT request.
    pub fn put(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PUT, uri)
    }

    /// Starts a PATCH request.
    pub fn patch(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PATCH, uri)
    }

    /// Starts a DELETE request.
    pub fn delete(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::DELETE, uri)
    }

    /// Starts a request with any method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        let builder = self
            .default_headers
            .iter()
            .fold(TestRequestBuilder::new(method, uri), |builder, (name, value)| {
                builder.header(name, value)
            });
        TestClientRequest {
            client: self,
            builder,
        }
    }
}

/// A request bound to a [`TestClient`].
#[derive(Debug)]
#[must_use]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl TestClientRequest<'_> {
    /// Sets a header.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Appends query parameters.
    pub fn query<T: Serialize + ?Sized>(mut self, params: &T) -> Self {
        self.builder = self.builder.query(params);
        self
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets a JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Sends the request.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built. Use [`try_send`](Self::try_send)
    /// to get the error instead.
    pub async fn send(self) -> TestResponse {
        match self.try_send().await {
            Ok(response) => response,
            Err(e) => panic!("test request failed: {e}"),
        }
    }

    /// Sends the request, returning build errors.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        let request = self.builder.build()?;
        let response = self.client.app.handle(request.into_http_request()).await;
        TestResponse::from_http(response).await
    }
}
