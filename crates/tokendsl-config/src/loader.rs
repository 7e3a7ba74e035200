//! Layered configuration loading.
//!
//! Layers apply in call order and later layers win:
//! 1. Defaults or a preset
//! 2. A TOML or JSON file, or an inline string
//! 3. Environment overrides named `PREFIX__SECTION__KEY`

use std::env;
use std::fs;
use std::path::Path;

use tokendsl_core::DuplicateRoutePolicy;

use crate::schema::LogFormat;
use crate::{AppConfig, ConfigError};

/// Builds an [`AppConfig`] from defaults, files and the environment.
///
/// ```no_run
/// use tokendsl_config::ConfigLoader;
///
/// # fn main() -> Result<(), tokendsl_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_dotenv()?
///     .with_optional_file("tokendsl.toml")?
///     .with_env_prefix("TOKENDSL")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: AppConfig,
    env_prefix: Option<String>,
    env_vars: Option<Vec<(String, String)>>,
}

impl ConfigLoader {
    /// Creates a loader holding the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets to the defaults.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = AppConfig::default();
        self
    }

    /// Resets to the development preset.
    ///
    /// ```
    /// use tokendsl_config::{ConfigLoader, LogFormat};
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.telemetry.logging.format, LogFormat::Pretty);
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = AppConfig::development();
        self
    }

    /// Resets to the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = AppConfig::production();
        self
    }

    /// Loads a file, picking the format from its extension.
    ///
    /// The file replaces everything loaded so far. Keys it leaves out take
    /// their default values.
    ///
    /// # Errors
    ///
    /// Fails if the file is missing or unreadable, has an extension other
    /// than `.toml` or `.json`, or does not parse. Unknown keys are parse
    /// errors.
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_string();

        tracing::debug!(path = %path.display(), "loading configuration file");
        self.with_string(&content, &format)
    }

    /// Like [`with_file`](Self::with_file), but a missing file is skipped.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Loads configuration from a string in `"toml"` or `"json"` format.
    ///
    /// ```
    /// use tokendsl_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[server]\nhttp_addr = \"127.0.0.1:3000\"", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    /// assert_eq!(config.server.http_addr, "127.0.0.1:3000");
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_ascii_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };
        Ok(self)
    }

    /// Enables environment overrides under `prefix`.
    ///
    /// `TOKENDSL__SERVER__HTTP_ADDR=127.0.0.1:9000` sets `server.http_addr`
    /// when the prefix is `TOKENDSL`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Reads overrides from `vars` instead of the process environment.
    #[must_use]
    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env_vars = Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    /// Loads `.env` from the working directory or its parents, if present.
    ///
    /// Variables already set in the process are not overwritten.
    ///
    /// # Errors
    ///
    /// Fails if a `.env` file exists but cannot be parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded dotenv file"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(e.into()),
        }
        Ok(self)
    }

    /// Loads a specific dotenv file into the process environment.
    ///
    /// # Errors
    ///
    /// Fails if the file is missing or cannot be parsed.
    pub fn with_dotenv_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }
        dotenvy::from_path(path)?;
        Ok(self)
    }

    /// Applies environment overrides and validates.
    pub fn load(self) -> Result<AppConfig, ConfigError> {
        let config = self.load_unvalidated()?;
        config.validate()?;
        Ok(config)
    }

    /// Applies environment overrides without validating.
    pub fn load_unvalidated(mut self) -> Result<AppConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            let vars = self.env_vars.take().unwrap_or_else(|| env::vars().collect());
            let mut vars: Vec<_> = vars
                .into_iter()
                .filter(|(k, _)| k.starts_with(&prefix))
                .collect();
            // Stable order so the outcome does not depend on the environment.
            vars.sort();
            for (key, value) in vars {
                self.apply_env_var(&key, &value, &prefix)?;
            }
        }
        Ok(self.config)
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let Some(rest) = key.strip_prefix(prefix).and_then(|k| k.strip_prefix("__")) else {
            return Ok(());
        };
        let parts: Vec<&str> = rest.split("__").collect();
        let config = &mut self.config;

        match parts.as_slice() {
            ["SERVER", "HTTP_ADDR"] => config.server.http_addr = value.to_string(),
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                config.server.shutdown_timeout_secs = parse_int(key, value)?;
            }
            ["SERVER", "REQUEST_TIMEOUT_MS"] => {
                config.server.request_timeout_ms = parse_int(key, value)?;
            }
            ["SERVER", "METRICS_PATH"] => {
                config.server.metrics_path = if value.is_empty() || value.eq_ignore_ascii_case("none") {
                    None
                } else {
                    Some(value.to_string())
                };
            }

            ["DISPATCH", "EXPOSE_INTERNAL_MESSAGES"] => {
                config.dispatch.expose_internal_messages = parse_flag(key, value)?;
            }
            ["DISPATCH", "NOT_FOUND_MESSAGES"] => {
                config.dispatch.not_found_messages = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
            }

            ["REGISTRY", "STRICT"] => config.registry.strict = parse_flag(key, value)?,
            ["REGISTRY", "DUPLICATE_POLICY"] => {
                config.registry.duplicate_policy = match value.to_ascii_lowercase().as_str() {
                    "reject" => DuplicateRoutePolicy::Reject,
                    "first_wins" => DuplicateRoutePolicy::FirstWins,
                    "last_wins" => DuplicateRoutePolicy::LastWins,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected reject, first_wins or last_wins",
                        ))
                    }
                };
            }

            ["TELEMETRY", "SERVICE_NAME"] => config.telemetry.service_name = value.to_string(),
            ["TELEMETRY", "METRICS", "ENABLED"] => {
                config.telemetry.metrics.enabled = parse_flag(key, value)?;
            }
            ["TELEMETRY", "LOGGING", "ENABLED"] => {
                config.telemetry.logging.enabled = parse_flag(key, value)?;
            }
            ["TELEMETRY", "LOGGING", "LEVEL"] => {
                config.telemetry.logging.level = value.to_string();
            }
            ["TELEMETRY", "LOGGING", "FORMAT"] => {
                config.telemetry.logging.format = match value.to_ascii_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => return Err(ConfigError::env_parse_error(key, "expected json or pretty")),
                };
            }

            _ => tracing::debug!(var = key, "ignoring unknown configuration variable"),
        }

        Ok(())
    }
}

fn parse_int(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn load_env(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        ConfigLoader::new()
            .with_env_prefix("APP")
            .with_env_vars(vars.iter().map(|(k, v)| (*k, *v)))
            .load()
    }

    #[test]
    fn test_defaults() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_presets() {
        let config = ConfigLoader::new().with_production().load().unwrap();
        assert_eq!(config.server.metrics_path.as_deref(), Some("/metrics"));

        let config = ConfigLoader::new()
            .with_production()
            .with_defaults()
            .load()
            .unwrap();
        assert_eq!(config.server.metrics_path, None);
    }

    #[test]
    fn test_json_string() {
        let config = ConfigLoader::new()
            .with_string(r#"{"dispatch": {"expose_internal_messages": true}}"#, "json")
            .unwrap()
            .load()
            .unwrap();
        assert!(config.dispatch.expose_internal_messages);
    }

    #[test]
    fn test_unsupported_format() {
        let result = ConfigLoader::new().with_string("a: 1", "yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(f)) if f == "yaml"));
    }

    #[test]
    fn test_unknown_key_in_file() {
        let result = ConfigLoader::new().with_string("[server]\nport = 80", "toml");
        assert!(matches!(result, Err(ConfigError::TomlError(_))));
    }

    #[test]
    fn test_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
            [server]
            http_addr = "127.0.0.1:9000"
            request_timeout_ms = 250

            [telemetry]
            service_name = "users-api"

            [telemetry.logging]
            format = "pretty"
            "#
        )
        .unwrap();

        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
        assert_eq!(config.server.http_addr, "127.0.0.1:9000");
        assert_eq!(config.server.request_timeout_ms, 250);
        assert_eq!(config.telemetry.service_name, "users-api");
        assert_eq!(config.telemetry.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_file_with_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        let result = ConfigLoader::new().with_file(file.path());
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        assert!(matches!(
            ConfigLoader::new().with_file(&path),
            Err(ConfigError::FileNotFound { .. })
        ));
        assert!(ConfigLoader::new().with_optional_file(&path).is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let config = load_env(&[
            ("APP__SERVER__HTTP_ADDR", "127.0.0.1:7000"),
            ("APP__SERVER__METRICS_PATH", "/stats"),
            ("APP__DISPATCH__NOT_FOUND_MESSAGES", "User not found, Order not found"),
            ("APP__REGISTRY__STRICT", "off"),
            ("APP__REGISTRY__DUPLICATE_POLICY", "last_wins"),
            ("APP__TELEMETRY__LOGGING__LEVEL", "warn"),
            ("APP__TELEMETRY__METRICS__ENABLED", "0"),
        ])
        .unwrap();

        assert_eq!(config.server.http_addr, "127.0.0.1:7000");
        assert_eq!(config.server.metrics_path.as_deref(), Some("/stats"));
        assert_eq!(
            config.dispatch.not_found_messages,
            ["User not found", "Order not found"]
        );
        assert!(!config.registry.strict);
        assert_eq!(config.registry.duplicate_policy, DuplicateRoutePolicy::LastWins);
        assert_eq!(config.telemetry.logging.level, "warn");
        assert!(!config.telemetry.metrics.enabled);
    }

    #[test]
    fn test_env_overrides_file() {
        let config = ConfigLoader::new()
            .with_string("[server]\nrequest_timeout_ms = 100", "toml")
            .unwrap()
            .with_env_prefix("APP")
            .with_env_vars([("APP__SERVER__REQUEST_TIMEOUT_MS", "900")])
            .load()
            .unwrap();
        assert_eq!(config.server.request_timeout_ms, 900);
    }

    #[test]
    fn test_env_parse_errors() {
        assert!(matches!(
            load_env(&[("APP__SERVER__REQUEST_TIMEOUT_MS", "soon")]),
            Err(ConfigError::EnvParseError { .. })
        ));
        assert!(matches!(
            load_env(&[("APP__REGISTRY__STRICT", "maybe")]),
            Err(ConfigError::EnvParseError { .. })
        ));
        assert!(matches!(
            load_env(&[("APP__TELEMETRY__LOGGING__FORMAT", "xml")]),
            Err(ConfigError::EnvParseError { .. })
        ));
    }

    #[test]
    fn test_unknown_env_keys_ignored() {
        let config = load_env(&[("APP__SERVER__PORT", "80"), ("APPLE", "x")]).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_env_value_still_validated() {
        let result = load_env(&[("APP__SERVER__HTTP_ADDR", "nowhere")]);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_dotenv_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "TOKENDSL_DOTENV_TEST__TELEMETRY__SERVICE_NAME=from-dotenv").unwrap();

        let config = ConfigLoader::new()
            .with_dotenv_file(file.path())
            .unwrap()
            .with_env_prefix("TOKENDSL_DOTENV_TEST")
            .load()
            .unwrap();
        assert_eq!(config.telemetry.service_name, "from-dotenv");
    }

    #[test]
    fn test_parse_bool() {
        for value in ["true", "TRUE", "1", "yes", "on"] {
            assert_eq!(parse_bool(value), Some(true), "{value}");
        }
        for value in ["false", "0", "No", "off"] {
            assert_eq!(parse_bool(value), Some(false), "{value}");
        }
        assert_eq!(parse_bool("2"), None);
    }
}
