//! Observability for TokenDSL services.
//!
//! - **Logging**: `tracing-subscriber` with JSON or pretty output
//! - **Metrics**: Prometheus text format via the `metrics` crate
//!
//! # Example
//!
//! ```rust,ignore
//! use tokendsl_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::builder().service_name("users-api").build();
//! init_telemetry(&config)?;
//! ```
//!
//! Scraped output looks like:
//!
//! ```text
//! # TYPE tokendsl_requests_total counter
//! tokendsl_requests_total{route="GET /users/:id",status="200"} 1234
//! tokendsl_requests_total{route="GET /users/:id",status="404"} 56
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use crate::config::{TelemetryConfig, TelemetryConfigBuilder};
pub use crate::error::TelemetryError;
pub use crate::logging::{init_logging, LogConfig};
pub use crate::metrics::{init_metrics, render_metrics, InFlightGuard, MetricsConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initializes logging first, then metrics.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    init_logging(&config.logging)?;
    init_metrics(&config.metrics)?;
    Ok(())
}
