//! HTTP server.
//!
//! Accepts TCP connections, serves them with hyper's HTTP/1 connection
//! builder and hands every request to the shared [`App`]. Shutdown stops
//! the accept loop, then waits up to the configured timeout for open
//! connections to drain.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use serde_json::json;
use tokendsl_core::{EndpointResponse, ValidationIssues};
use tokio::net::{TcpListener, TcpStream};

use crate::app::{bad_request, into_http, App, HttpResponse};
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// The TokenDSL HTTP server.
///
/// ```rust
/// use tokendsl_server::{App, Server, ServerConfig};
///
/// let config = ServerConfig::builder().http_addr("127.0.0.1:0").build();
/// let server = Server::new(config, App::new());
/// assert_eq!(server.config().http_addr(), "127.0.0.1:0");
/// ```
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    app: Arc<App>,
}

impl Server {
    /// Creates a server.
    #[must_use]
    pub fn new(config: ServerConfig, app: App) -> Self {
        let app = app.with_metrics_path(config.metrics_path().map(str::to_string));
        Self {
            config,
            app: Arc::new(app),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the app.
    #[must_use]
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Runs until SIGTERM or SIGINT.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Binds the configured address and runs until `shutdown` fires.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self
            .config
            .socket_addr()
            .map_err(|source| ServerError::InvalidAddress {
                addr: self.config.http_addr().to_string(),
                source,
            })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;

        self.serve(listener, shutdown).await
    }

    /// Runs on an already bound listener until `shutdown` fires.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, "server listening");

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote_addr)) => {
                        let server = Arc::clone(&server);
                        let token = tracker.acquire();
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            if let Err(e) = server.handle_connection(stream, remote_addr, shutdown).await {
                                tracing::warn!(remote = %remote_addr, error = %e, "connection error");
                            }
                            drop(token);
                        });
                    }
                    Err(e) => tracing::error!(error = %e, "failed to accept connection"),
                },
                () = shutdown.recv() => {
                    tracing::info!("shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        let timeout = server.config.shutdown_timeout();
        tracing::info!(
            active = tracker.active_connections(),
            timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            "draining connections"
        );
        if tokio::time::timeout(timeout, tracker.wait_for_drain())
            .await
            .is_err()
        {
            tracing::warn!(
                active = tracker.active_connections(),
                "shutdown timeout reached with connections still open"
            );
        }

        tracing::info!("server stopped");
        Ok(())
    }

    async fn handle_connection(
        self: &Arc<Self>,
        stream: TcpStream,
        remote_addr: SocketAddr,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let server = Arc::clone(self);
        let service = service_fn(move |request: Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle_request(request).await) }
        });

        let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => result,
            () = shutdown.recv() => {
                tracing::debug!(remote = %remote_addr, "finishing connection for shutdown");
                conn.as_mut().graceful_shutdown();
                conn.await
            }
        }
    }

    async fn handle_request(&self, request: Request<Incoming>) -> HttpResponse {
        let method = request.method().clone();
        let path = request.uri().path().to_string();
        let app = Arc::clone(&self.app);

        let work = async move {
            let (parts, body) = request.into_parts();
            match collect_body(body).await {
                Ok(bytes) => app.handle(Request::from_parts(parts, bytes)).await,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read request body");
                    bad_request(&ValidationIssues::single(
                        "$",
                        format!("failed to read request body: {e}"),
                    ))
                }
            }
        };

        match tokio::time::timeout(self.config.request_timeout(), work).await {
            Ok(response) => response,
            Err(_) => {
                tracing::warn!(http.method = %method, http.path = %path, "request timed out");
                gateway_timeout(self.config.request_timeout())
            }
        }
    }
}

async fn collect_body(body: Incoming) -> Result<Bytes, hyper::Error> {
    Ok(body.collect().await?.to_bytes())
}

fn gateway_timeout(limit: Duration) -> HttpResponse {
    into_http(EndpointResponse::new(
        StatusCode::GATEWAY_TIMEOUT,
        json!({
            "error": "Gateway Timeout",
            "timeout_ms": u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        }),
    ))
}
