//! Structured logging.
//!
//! Wraps `tracing-subscriber` so a service can switch between JSON lines for
//! production and pretty output for local work with one config value.
//!
//! # Example
//!
//! ```rust,ignore
//! use tokendsl_telemetry::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!(route = "GET /users", "bound");
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Filter directive, e.g. `"info"` or `"tokendsl_core=debug,hyper=warn"`.
    pub level: String,

    /// Emit JSON lines instead of pretty text.
    pub json_format: bool,

    /// Emit span open/close events.
    pub span_events: bool,

    /// Include file and line of the call site.
    pub file_line_info: bool,

    /// Include thread IDs.
    pub thread_ids: bool,

    /// Include the module path target.
    pub include_target: bool,

    /// Service name attached to startup logs.
    pub service_name: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl LogConfig {
    /// Human-readable output at debug level.
    #[must_use]
    pub fn development() -> Self {
        Self {
            enabled: true,
            level: "debug".to_string(),
            json_format: false,
            span_events: true,
            file_line_info: true,
            thread_ids: false,
            include_target: true,
            service_name: "tokendsl".to_string(),
        }
    }

    /// JSON output at info level.
    #[must_use]
    pub fn production() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: true,
            span_events: false,
            file_line_info: false,
            thread_ids: false,
            include_target: true,
            service_name: "tokendsl".to_string(),
        }
    }
}

/// Installs the global log subscriber.
///
/// Does nothing when `config.enabled` is false. Fails if the filter is
/// invalid or a global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;

    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    if config.json_format {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_span_events(span_events)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_thread_ids(config.thread_ids)
            .with_target(config.include_target)
            .with_filter(filter);

        tracing_subscriber::registry()
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_span_events(span_events)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_thread_ids(config.thread_ids)
            .with_target(config.include_target)
            .with_filter(filter);

        tracing_subscriber::registry()
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    }

    tracing::info!(service = %config.service_name, "logging initialized");
    Ok(())
}

/// Parses a filter directive string.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter)
        .map_err(|e| TelemetryError::LoggingInit(format!("invalid log filter '{filter}': {e}")))
}

/// Field names shared by every crate's log events.
pub mod fields {
    /// Request ID.
    pub const REQUEST_ID: &str = "request_id";

    /// Canonical route key, e.g. `GET /users/:id`.
    pub const ROUTE: &str = "route";

    /// Dispatch phase.
    pub const PHASE: &str = "phase";

    /// HTTP method.
    pub const HTTP_METHOD: &str = "http.method";

    /// Concrete request path.
    pub const HTTP_PATH: &str = "http.path";

    /// Response status code.
    pub const HTTP_STATUS: &str = "http.status_code";

    /// Duration in milliseconds.
    pub const DURATION_MS: &str = "duration_ms";

    /// Error description.
    pub const ERROR: &str = "error";
}

/// Logs the start of a dispatched request.
#[macro_export]
macro_rules! log_request_start {
    ($request_id:expr, $method:expr, $path:expr, $route:expr) => {
        tracing::debug!(
            request_id = %$request_id,
            http.method = %$method,
            http.path = %$path,
            route = %$route,
            "Request started"
        );
    };
}

/// Logs the completion of a dispatched request.
#[macro_export]
macro_rules! log_request_complete {
    ($request_id:expr, $status:expr, $duration_ms:expr) => {
        tracing::info!(
            request_id = %$request_id,
            http.status_code = $status,
            duration_ms = $duration_ms,
            "Request completed"
        );
    };
}

/// Logs a request that ended in an internal error.
#[macro_export]
macro_rules! log_request_error {
    ($request_id:expr, $error:expr) => {
        tracing::error!(
            request_id = %$request_id,
            error = %$error,
            "Request failed"
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_production() {
        assert_eq!(LogConfig::default(), LogConfig::production());
        assert!(LogConfig::default().json_format);
    }

    #[test]
    fn test_development_config() {
        let config = LogConfig::development();
        assert!(!config.json_format);
        assert!(config.span_events);
        assert_eq!(config.level, "debug");
    }

    #[test]
    fn test_env_filter_accepts_directives() {
        assert!(create_env_filter("info").is_ok());
        assert!(create_env_filter("tokendsl_core=debug,hyper=warn").is_ok());
    }

    #[test]
    fn test_env_filter_rejects_garbage() {
        let err = create_env_filter("tokendsl=verbose").unwrap_err();
        assert!(matches!(err, TelemetryError::LoggingInit(_)));
    }

    #[test]
    fn test_disabled_logging_is_noop() {
        let config = LogConfig {
            enabled: false,
            level: "not a filter [".to_string(),
            ..LogConfig::default()
        };
        assert!(init_logging(&config).is_ok());
    }
}
