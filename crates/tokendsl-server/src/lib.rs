//! # TokenDSL Server
//!
//! Hosts a TokenDSL [`Dispatcher`](tokendsl_core::Dispatcher) over HTTP/1.1
//! with hyper and Tokio.
//!
//! - [`App`] - Routing table implementing [`RouteRegistrar`](tokendsl_core::RouteRegistrar)
//! - [`Server`] - Accept loop with per-request timeout
//! - [`ShutdownSignal`] / [`ConnectionTracker`] - Graceful shutdown
//!
//! Unmatched paths answer `404 {"error": "Not Found"}`; a known path with an
//! unregistered method answers `405` with an `Allow` header.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tokendsl_core::{DispatchConfig, Dispatcher};
//! use tokendsl_server::{App, Server, ServerConfig};
//!
//! let dispatcher = Dispatcher::new(Arc::new(registry), DispatchConfig::default());
//! let app = App::from_dispatcher(&dispatcher)?;
//! Server::new(ServerConfig::default(), app).run().await?;
//! ```

#![doc(html_root_url = "https://docs.rs/tokendsl-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
mod config;
mod error;
mod server;
mod shutdown;

pub use crate::app::{bad_request, into_http, not_found, App, HttpResponse, ResponseBody};
pub use crate::config::{
    ServerConfig, ServerConfigBuilder, DEFAULT_HTTP_ADDR, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
};
pub use crate::error::ServerError;
pub use crate::server::Server;
pub use crate::shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};
