//! Typed configuration for TokenDSL services.
//!
//! - TOML and JSON files
//! - `.env` files and `PREFIX__SECTION__KEY` environment overrides
//! - Unknown keys rejected
//!
//! ```no_run
//! use tokendsl_config::ConfigLoader;
//!
//! # fn main() -> Result<(), tokendsl_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("tokendsl.toml")?
//!     .with_env_prefix("TOKENDSL")
//!     .load()?;
//! println!("listening on {}", config.server.http_addr);
//! # Ok(())
//! # }
//! ```
//!
//! # File format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! shutdown_timeout_secs = 30
//! request_timeout_ms = 30000
//! metrics_path = "/metrics"
//!
//! [dispatch]
//! expose_internal_messages = false
//! not_found_messages = ["Not found", "User not found"]
//!
//! [registry]
//! strict = true
//! duplicate_policy = "reject"
//!
//! [telemetry]
//! service_name = "users-api"
//!
//! [telemetry.logging]
//! level = "info"
//! format = "json"
//! ```

#![doc(html_root_url = "https://docs.rs/tokendsl-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::AppConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{LogFormat, LoggingSection, MetricsSection, ServerSection, TelemetrySection};
