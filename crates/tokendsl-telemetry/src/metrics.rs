//! Prometheus metrics.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `tokendsl_requests_total` | Counter | `route`, `status` | Dispatched requests |
//! | `tokendsl_request_duration_seconds` | Histogram | `route` | Dispatch latency |
//! | `tokendsl_validation_failures_total` | Counter | `route` | Inputs rejected by a schema |
//! | `tokendsl_in_flight_requests` | Gauge | - | Requests being served |
//!
//! Recording functions are safe to call before [`init_metrics`]; without a
//! recorder installed they are no-ops.

use crate::error::TelemetryError;
use crate::TelemetryResult;
use ::metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;

/// Request counter name.
pub const REQUESTS_TOTAL: &str = "tokendsl_requests_total";
/// Request duration histogram name.
pub const REQUEST_DURATION_SECONDS: &str = "tokendsl_request_duration_seconds";
/// Validation failure counter name.
pub const VALIDATION_FAILURES_TOTAL: &str = "tokendsl_validation_failures_total";
/// In-flight gauge name.
pub const IN_FLIGHT_REQUESTS: &str = "tokendsl_in_flight_requests";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsConfig {
    /// Whether a Prometheus recorder is installed.
    pub enabled: bool,

    /// Histogram buckets for request duration, in seconds.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            duration_buckets: vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        }
    }
}

/// Installs the global Prometheus recorder.
///
/// The recorder is process-wide; calling this a second time returns
/// [`TelemetryError::MetricsInit`].
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }
    if config.duration_buckets.is_empty() {
        return Err(TelemetryError::InvalidConfig(
            "duration_buckets must not be empty".to_string(),
        ));
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(REQUEST_DURATION_SECONDS.to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::InvalidConfig(e.to_string()))?
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let _ = METRICS_HANDLE.set(handle);
    register_metric_descriptions();

    Ok(())
}

/// Renders all metrics in Prometheus text format.
///
/// Returns `None` if [`init_metrics`] has not installed a recorder.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_counter!(REQUESTS_TOTAL, "Total number of dispatched requests");
    describe_histogram!(
        REQUEST_DURATION_SECONDS,
        "Time from merge to response in seconds"
    );
    describe_counter!(
        VALIDATION_FAILURES_TOTAL,
        "Total number of inputs rejected by an endpoint schema"
    );
    describe_gauge!(
        IN_FLIGHT_REQUESTS,
        "Number of HTTP requests currently being served"
    );
}

/// Records a completed dispatch.
pub fn record_request(route: &str, status_code: u16, duration: Duration) {
    counter!(
        REQUESTS_TOTAL,
        "route" => route.to_string(),
        "status" => status_code.to_string()
    )
    .increment(1);

    histogram!(REQUEST_DURATION_SECONDS, "route" => route.to_string())
        .record(duration.as_secs_f64());
}

/// Records an input rejected by a schema.
pub fn record_validation_failure(route: &str) {
    counter!(VALIDATION_FAILURES_TOTAL, "route" => route.to_string()).increment(1);
}

/// Keeps the in-flight gauge raised for as long as it is alive.
#[derive(Debug)]
pub struct InFlightGuard {
    _private: (),
}

impl InFlightGuard {
    /// Increments the in-flight gauge.
    #[must_use]
    pub fn new() -> Self {
        gauge!(IN_FLIGHT_REQUESTS).increment(1.0);
        Self { _private: () }
    }
}

impl Default for InFlightGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        gauge!(IN_FLIGHT_REQUESTS).decrement(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MetricsConfig::default();
        assert!(config.enabled);
        assert_eq!(config.duration_buckets.len(), 12);
    }

    #[test]
    fn test_disabled_is_noop() {
        let config = MetricsConfig {
            enabled: false,
            duration_buckets: Vec::new(),
        };
        assert!(init_metrics(&config).is_ok());
    }

    #[test]
    fn test_empty_buckets_rejected() {
        let config = MetricsConfig {
            enabled: true,
            duration_buckets: Vec::new(),
        };
        assert!(matches!(
            init_metrics(&config),
            Err(TelemetryError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_recording_without_recorder() {
        record_request("GET /users", 200, Duration::from_millis(3));
        record_validation_failure("POST /users");
        let guard = InFlightGuard::new();
        drop(guard);
    }
}
