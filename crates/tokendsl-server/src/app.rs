//! In-memory request handling.
//!
//! [`App`] is the routing table the dispatcher binds into. It answers
//! `http::Request<Bytes>` without any network I/O, which is what the
//! [`Server`](crate::Server) calls per request and what test clients call
//! directly.

use std::collections::HashMap;
use std::fmt;

use bytes::Bytes;
use http::header::{HeaderValue, ALLOW, CONTENT_TYPE};
use http::{Method, Request, Response, StatusCode};
use http_body_util::Full;
use serde_json::json;
use tokendsl_core::{
    BoundHandler, DispatchRequest, Dispatcher, EndpointResponse, RequestContext, RouteRegistrar,
    ValidationIssues, REQUEST_ID_HEADER,
};
use tokendsl_router::{HttpMethod, InsertError, RouteKey, Router};

use crate::error::ServerError;

/// Response body type.
pub type ResponseBody = Full<Bytes>;

/// HTTP response produced by the app.
pub type HttpResponse = Response<ResponseBody>;

/// A routing table of bound endpoints.
#[derive(Default)]
pub struct App {
    router: Router,
    handlers: HashMap<String, (RouteKey, BoundHandler)>,
    metrics_path: Option<String>,
}

impl App {
    /// Creates an empty app.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an app with every endpoint of `dispatcher` bound.
    pub fn from_dispatcher(dispatcher: &Dispatcher) -> Result<Self, ServerError> {
        let mut app = Self::new();
        dispatcher.bind(&mut app)?;
        tracing::info!(routes = app.len(), "routes bound");
        Ok(app)
    }

    /// Serves Prometheus metrics at `path`.
    #[must_use]
    pub fn with_metrics_path(mut self, path: Option<String>) -> Self {
        self.metrics_path = path;
        self
    }

    /// Returns the number of bound endpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Handles one request.
    pub async fn handle(&self, request: Request<Bytes>) -> HttpResponse {
        let (parts, body) = request.into_parts();
        let path = parts.uri.path().to_string();
        let query = parts.uri.query().unwrap_or_default().to_string();

        if parts.method == Method::GET && self.metrics_path.as_deref() == Some(path.as_str()) {
            return metrics_response();
        }

        let found = HttpMethod::from_http(&parts.method)
            .and_then(|method| self.router.match_route(method, &path));

        let Some(found) = found else {
            return self.unmatched(&path);
        };

        let Some((key, handler)) = self.handlers.get(found.operation_id) else {
            tracing::error!(operation = found.operation_id, "route without a bound handler");
            return into_http(EndpointResponse::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({"error": tokendsl_core::INTERNAL_ERROR_MESSAGE}),
            ));
        };

        let ctx = RequestContext::new(key.clone(), path).with_headers(parts.headers);
        let request_id = ctx.request_id();
        let request = DispatchRequest::new(ctx)
            .captures(found.params)
            .query(query)
            .body(body);

        let mut response = into_http(handler(request).await);
        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        response
    }

    fn unmatched(&self, path: &str) -> HttpResponse {
        match self.router.match_path(path) {
            Some((methods, _)) => {
                let mut response = into_http(EndpointResponse::new(
                    StatusCode::METHOD_NOT_ALLOWED,
                    json!({"error": "Method Not Allowed"}),
                ));
                if let Ok(allow) = HeaderValue::from_str(&methods.allow_header()) {
                    response.headers_mut().insert(ALLOW, allow);
                }
                response
            }
            None => {
                tracing::debug!(path, "no route for path");
                not_found()
            }
        }
    }
}

impl RouteRegistrar for App {
    type Error = InsertError;

    fn register(&mut self, key: &RouteKey, handler: BoundHandler) -> Result<(), Self::Error> {
        let operation_id = key.to_string();
        self.router.route(key, operation_id.clone())?;
        self.handlers.insert(operation_id, (key.clone(), handler));
        Ok(())
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut routes: Vec<&String> = self.handlers.keys().collect();
        routes.sort();
        f.debug_struct("App")
            .field("routes", &routes)
            .field("metrics_path", &self.metrics_path)
            .finish()
    }
}

/// Converts a dispatcher response to an HTTP response.
#[must_use]
pub fn into_http(response: EndpointResponse) -> HttpResponse {
    let (status, headers, body) = response.into_parts();
    let mut http = Response::new(Full::new(Bytes::from(body)));
    *http.status_mut() = status;
    *http.headers_mut() = headers;
    http
}

/// The 404 for a path no route matches.
#[must_use]
pub fn not_found() -> HttpResponse {
    into_http(EndpointResponse::new(
        StatusCode::NOT_FOUND,
        json!({"error": "Not Found"}),
    ))
}

/// A 400 carrying validation issues, for failures before dispatch.
#[must_use]
pub fn bad_request(issues: &ValidationIssues) -> HttpResponse {
    into_http(EndpointResponse::new(
        StatusCode::BAD_REQUEST,
        json!({ "error": issues }),
    ))
}

fn metrics_response() -> HttpResponse {
    match tokendsl_telemetry::render_metrics() {
        Some(text) => {
            let mut response = Response::new(Full::new(Bytes::from(text)));
            response.headers_mut().insert(
                CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            );
            response
        }
        None => not_found(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use std::sync::Arc;
    use tokendsl_core::{DispatchConfig, Endpoint, Registry, RegistryConfig};

    fn app() -> App {
        let registry = Registry::from_definitions(
            [
                (
                    "GET /items/:id",
                    Endpoint::new()
                        .description("Get an item")
                        .handler(|input, _| async move { Ok(input) }),
                ),
                (
                    "POST /items",
                    Endpoint::new()
                        .description("Create an item")
                        .handler(|input, _| async move { Ok(input) }),
                ),
            ],
            &RegistryConfig::default(),
        )
        .unwrap();
        App::from_dispatcher(&Dispatcher::new(
            Arc::new(registry),
            DispatchConfig::default(),
        ))
        .unwrap()
    }

    async fn send(app: &App, method: Method, uri: &str, body: &str) -> (StatusCode, http::HeaderMap, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Bytes::from(body.to_string()))
            .unwrap();
        let response = app.handle(request).await;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, headers, json)
    }

    #[tokio::test]
    async fn test_matched_route() {
        let (status, headers, body) = send(&app(), Method::GET, "/items/7?x=1", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"id": "7", "x": "1"}));
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert!(headers.contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let (status, _, body) = send(&app(), Method::GET, "/nothing", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Not Found"}));
    }

    #[tokio::test]
    async fn test_wrong_method_lists_allowed() {
        let (status, headers, _) = send(&app(), Method::DELETE, "/items", "").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(headers[ALLOW], "POST");
    }

    #[tokio::test]
    async fn test_unsupported_method_on_known_path() {
        let (status, headers, _) = send(&app(), Method::OPTIONS, "/items/1", "").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(headers[ALLOW], "GET");
    }

    #[tokio::test]
    async fn test_malformed_json_is_400() {
        let (status, _, body) = send(&app(), Method::POST, "/items", "{").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"][0]["path"], json!("$"));
    }

    #[test]
    fn test_registering_twice_fails() {
        let registry = Registry::from_definitions(
            [(
                "GET /x",
                Endpoint::new()
                    .description("x")
                    .handler(|_, _| async { Ok(Value::Null) }),
            )],
            &RegistryConfig::default(),
        )
        .unwrap();
        let dispatcher = Dispatcher::new(Arc::new(registry), DispatchConfig::default());

        let mut app = App::new();
        dispatcher.bind(&mut app).unwrap();
        assert!(matches!(
            dispatcher.bind(&mut app),
            Err(InsertError::DuplicateMethod { .. })
        ));
    }
}
