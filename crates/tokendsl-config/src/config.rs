//! The root configuration type.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokendsl_core::{DispatchConfig, RegistryConfig};
use tokendsl_telemetry::{LogConfig, MetricsConfig, TelemetryConfig};

use crate::schema::{LogFormat, ServerSection, TelemetrySection};
use crate::ConfigError;

/// Complete service configuration.
///
/// Loaded once at startup, usually through [`ConfigLoader`](crate::ConfigLoader),
/// then split into the per-crate configuration values.
///
/// ```
/// use tokendsl_config::AppConfig;
///
/// let config = AppConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// assert!(config.registry.strict);
/// assert!(!config.dispatch.expose_internal_messages);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// HTTP server.
    #[serde(default)]
    pub server: ServerSection,

    /// Error classification.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Registry construction.
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Logging and metrics.
    #[serde(default)]
    pub telemetry: TelemetrySection,
}

impl AppConfig {
    /// Pretty debug logs, internal messages exposed, metrics off.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.telemetry.logging.level = "debug".to_string();
        config.telemetry.logging.format = LogFormat::Pretty;
        config.telemetry.metrics.enabled = false;
        config.dispatch.expose_internal_messages = true;
        config
    }

    /// JSON logs at info, metrics served at `/metrics`.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.server.metrics_path = Some("/metrics".to_string());
        config
    }

    /// Checks values serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self
            .server
            .http_addr
            .parse::<std::net::SocketAddr>()
            .is_err()
        {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        if self.server.request_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "server.request_timeout_ms",
                "must be greater than zero",
            ));
        }

        if let Some(path) = &self.server.metrics_path {
            if !path.starts_with('/') {
                return Err(ConfigError::invalid_value(
                    "server.metrics_path",
                    "must start with '/'",
                ));
            }
        }

        if self.telemetry.metrics.enabled && self.telemetry.metrics.histogram_buckets.is_empty() {
            return Err(ConfigError::invalid_value(
                "telemetry.metrics.histogram_buckets",
                "must not be empty when metrics are enabled",
            ));
        }

        if self
            .dispatch
            .not_found_messages
            .iter()
            .any(|m| m.trim().is_empty())
        {
            return Err(ConfigError::invalid_value(
                "dispatch.not_found_messages",
                "entries must not be blank",
            ));
        }

        Ok(())
    }

    /// Builds the server configuration.
    #[must_use]
    pub fn server_config(&self) -> tokendsl_server::ServerConfig {
        tokendsl_server::ServerConfig::builder()
            .http_addr(self.server.http_addr.clone())
            .shutdown_timeout(Duration::from_secs(self.server.shutdown_timeout_secs))
            .request_timeout(Duration::from_millis(self.server.request_timeout_ms))
            .metrics_path(self.server.metrics_path.clone())
            .build()
    }

    /// Builds the logging configuration.
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        let logging = &self.telemetry.logging;
        let base = match logging.format {
            LogFormat::Json => LogConfig::production(),
            LogFormat::Pretty => LogConfig::development(),
        };
        LogConfig {
            enabled: logging.enabled,
            level: logging.level.clone(),
            service_name: self.telemetry.service_name.clone(),
            ..base
        }
    }

    /// Builds the telemetry configuration.
    #[must_use]
    pub fn telemetry_config(&self) -> TelemetryConfig {
        TelemetryConfig::builder()
            .service_name(self.telemetry.service_name.clone())
            .logging(self.log_config())
            .metrics(MetricsConfig {
                enabled: self.telemetry.metrics.enabled,
                duration_buckets: self.telemetry.metrics.histogram_buckets.clone(),
            })
            .build()
    }

    /// Returns the dispatch configuration.
    #[must_use]
    pub fn dispatch_config(&self) -> DispatchConfig {
        self.dispatch.clone()
    }

    /// Returns the registry configuration.
    #[must_use]
    pub fn registry_config(&self) -> RegistryConfig {
        self.registry.clone()
    }
}
