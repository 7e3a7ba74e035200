//! # TokenDSL
//!
//! Declare HTTP endpoints as data, then bind, validate and serve them.
//!
//! An API is a list of `("METHOD /path/:param", Endpoint)` pairs. Each
//! request has its path captures, query string and JSON body merged into a
//! single input, validated against the endpoint's schema and passed to the
//! handler. The handler's value or error becomes the HTTP response.
//!
//! ```rust,ignore
//! use tokendsl::prelude::*;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), tokendsl::Error> {
//!     let config = ConfigLoader::new().with_env_prefix("TOKENDSL").load()?;
//!     let api = vec![(
//!         "GET /hello/:name",
//!         Endpoint::new()
//!             .description("Greets someone")
//!             .handler(|input, _ctx| async move { Ok(json!({"hello": input["name"]})) }),
//!     )];
//!     Service::new(config).serve(api).await
//! }
//! ```
//!
//! ## Request pipeline
//!
//! ```text
//! route match → merge(path, query, body) → validate → handler → respond
//!                                              ↓           ↓
//!                                      400 {"error": [..]}  on_error / 404 / 500
//! ```

#![doc(html_root_url = "https://docs.rs/tokendsl/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::sync::Arc;

use thiserror::Error;

pub use tokendsl_config as config;
pub use tokendsl_core as core;
pub use tokendsl_router as router;
pub use tokendsl_server as server;
pub use tokendsl_telemetry as telemetry;

use tokendsl_config::{AppConfig, ConfigError};
use tokendsl_core::{Dispatcher, Endpoint, HookSet, Registry, RegistryError};
use tokendsl_server::{App, Server, ServerError, ShutdownSignal};
use tokendsl_telemetry::TelemetryError;

/// Errors from building or running a service.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration failed to load or validate.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The API declaration is invalid.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Telemetry could not be installed.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    /// The server failed to bind or run.
    #[error(transparent)]
    Server(#[from] ServerError),
}

/// Builds and runs a service from an API declaration and an [`AppConfig`].
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct Service {
    config: AppConfig,
    hooks: HookSet,
}

impl Service {
    /// Creates a service with `config`.
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            hooks: HookSet::new(),
        }
    }

    /// Sets hooks applied to every endpoint that has none of its own.
    pub fn hooks(mut self, hooks: HookSet) -> Self {
        self.hooks = hooks;
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Checks `api` and builds its registry.
    pub fn registry<I, S>(&self, api: I) -> Result<Registry, Error>
    where
        I: IntoIterator<Item = (S, Endpoint)>,
        S: AsRef<str>,
    {
        let registry = Registry::from_definitions(api, &self.config.registry_config())?
            .with_hooks(self.hooks.clone());
        Ok(registry)
    }

    /// Builds the dispatcher for `api`.
    pub fn dispatcher<I, S>(&self, api: I) -> Result<Dispatcher, Error>
    where
        I: IntoIterator<Item = (S, Endpoint)>,
        S: AsRef<str>,
    {
        let registry = self.registry(api)?;
        Ok(Dispatcher::new(Arc::new(registry), self.config.dispatch_config()))
    }

    /// Builds the routing table for `api`.
    pub fn app<I, S>(&self, api: I) -> Result<App, Error>
    where
        I: IntoIterator<Item = (S, Endpoint)>,
        S: AsRef<str>,
    {
        let app = App::from_dispatcher(&self.dispatcher(api)?)?;
        Ok(app.with_metrics_path(self.config.server.metrics_path.clone()))
    }

    /// Installs telemetry, then serves `api` until SIGTERM or SIGINT.
    pub async fn serve<I, S>(self, api: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = (S, Endpoint)>,
        S: AsRef<str>,
    {
        self.serve_with_shutdown(api, ShutdownSignal::with_os_signals())
            .await
    }

    /// Installs telemetry, then serves `api` until `shutdown` fires.
    pub async fn serve_with_shutdown<I, S>(self, api: I, shutdown: ShutdownSignal) -> Result<(), Error>
    where
        I: IntoIterator<Item = (S, Endpoint)>,
        S: AsRef<str>,
    {
        tokendsl_telemetry::init_telemetry(&self.config.telemetry_config())?;

        let app = self.app(api)?;
        tracing::info!(
            service = %self.config.telemetry.service_name,
            routes = app.len(),
            "starting service"
        );
        Server::new(self.config.server_config(), app)
            .run_with_shutdown(shutdown)
            .await?;
        Ok(())
    }
}

/// Common imports.
///
/// ```rust,ignore
/// use tokendsl::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{Error, Service};

    pub use tokendsl_config::{AppConfig, ConfigLoader};
    pub use tokendsl_core::{
        ApiError, ApiResult, DispatchConfig, Dispatcher, DuplicateRoutePolicy, Endpoint,
        EndpointResponse, HookSet, JsonSchema, Registry, RegistryConfig, RegistryError,
        RequestContext, Schema, UiField, UiLayout, UiSchema, ValidationIssue, ValidationIssues,
    };
    pub use tokendsl_router::{HttpMethod, RouteKey};
    pub use tokendsl_server::{App, Server, ServerConfig, ShutdownSignal};
}
