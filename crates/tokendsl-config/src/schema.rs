//! Configuration sections.
//!
//! Every section rejects unknown keys, so a typo in a file fails the load
//! instead of being ignored. Dispatch and registry options are the core
//! crate's own types, see [`DispatchConfig`](tokendsl_core::DispatchConfig)
//! and [`RegistryConfig`](tokendsl_core::RegistryConfig).

use serde::{Deserialize, Serialize};

/// HTTP server section.
///
/// ```
/// use tokendsl_config::ServerSection;
///
/// let section = ServerSection::default();
/// assert_eq!(section.http_addr, "0.0.0.0:8080");
/// assert_eq!(section.request_timeout_ms, 30_000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// Bind address.
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Path serving Prometheus metrics. Unset disables it.
    #[serde(default)]
    pub metrics_path: Option<String>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            request_timeout_ms: default_request_timeout(),
            metrics_path: None,
        }
    }
}

fn default_http_addr() -> String {
    tokendsl_server::DEFAULT_HTTP_ADDR.to_string()
}

fn default_shutdown_timeout() -> u64 {
    tokendsl_server::DEFAULT_SHUTDOWN_TIMEOUT_SECS
}

fn default_request_timeout() -> u64 {
    tokendsl_server::DEFAULT_REQUEST_TIMEOUT_SECS * 1000
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable text.
    Pretty,
}

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::Json,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Metrics section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    /// Install the Prometheus recorder.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Request duration buckets in seconds.
    #[serde(default = "default_histogram_buckets")]
    pub histogram_buckets: Vec<f64>,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            enabled: true,
            histogram_buckets: default_histogram_buckets(),
        }
    }
}

fn default_histogram_buckets() -> Vec<f64> {
    tokendsl_telemetry::MetricsConfig::default().duration_buckets
}

/// Telemetry section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TelemetrySection {
    /// Service name used in logs.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Metrics.
    #[serde(default)]
    pub metrics: MetricsSection,

    /// Logging.
    #[serde(default)]
    pub logging: LoggingSection,
}

impl Default for TelemetrySection {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            metrics: MetricsSection::default(),
            logging: LoggingSection::default(),
        }
    }
}

fn default_service_name() -> String {
    "tokendsl".to_string()
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_section_fills_defaults() {
        let section: ServerSection = toml::from_str(r#"http_addr = "127.0.0.1:3000""#).unwrap();
        assert_eq!(section.http_addr, "127.0.0.1:3000");
        assert_eq!(section.shutdown_timeout_secs, 30);
        assert_eq!(section.metrics_path, None);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<LoggingSection, _> = toml::from_str(r#"levle = "debug""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_log_format_names() {
        let section: LoggingSection = serde_json::from_str(r#"{"format":"pretty"}"#).unwrap();
        assert_eq!(section.format, LogFormat::Pretty);
        assert!(section.enabled);
    }
}
