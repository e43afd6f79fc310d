//! Configuration management for the travel planner
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `TRAVEL_PLANNER_<SECTION>__<KEY>` environment variables. `DATABASE_URL`
//! (from the environment or a `.env` file) always wins for the database location.

use crate::TravelPlannerError;
use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "travel-planner.toml";

const ENV_PREFIX: &str = "TRAVEL_PLANNER";

/// Root configuration structure for the travel planner
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TravelPlannerConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Database settings
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Art Institute API settings
    #[serde(default)]
    pub art_api: ArtApiConfig,
    /// Artwork cache settings
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Maximum accepted request body in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection string, e.g. `sqlite:///db.sqlite3`
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Maximum pooled connections
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

/// Art Institute API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtApiConfig {
    /// Base URL of the public API
    #[serde(default = "default_art_api_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_art_api_timeout")]
    pub timeout_seconds: u64,
    /// Retries for transient failures
    #[serde(default = "default_art_api_max_retries")]
    pub max_retries: u32,
    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Artwork cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How long a fetched artwork stays fresh, in seconds
    #[serde(default = "default_cache_ttl")]
    pub ttl_seconds: u64,
    /// Cache directory location
    #[serde(default = "default_cache_location")]
    pub location: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// OTLP/HTTP collector endpoint; spans are exported only when set
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

// Default value functions
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

fn default_database_url() -> String {
    "sqlite:///db.sqlite3".to_string()
}

fn default_pool_size() -> u32 {
    5
}

fn default_art_api_base_url() -> String {
    "https://api.artic.edu/api/v1".to_string()
}

fn default_art_api_timeout() -> u64 {
    10
}

fn default_art_api_max_retries() -> u32 {
    2
}

fn default_user_agent() -> String {
    format!("travel-planner/{}", env!("CARGO_PKG_VERSION"))
}

fn default_cache_ttl() -> u64 {
    60 * 60
}

fn default_cache_location() -> String {
    "data/artwork-cache".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            pool_size: default_pool_size(),
        }
    }
}

impl Default for ArtApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_art_api_base_url(),
            timeout_seconds: default_art_api_timeout(),
            max_retries: default_art_api_max_retries(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_cache_ttl(),
            location: default_cache_location(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            otlp_endpoint: None,
        }
    }
}

impl TravelPlannerConfig {
    /// Load configuration from the specified path (or the default file when `None`)
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        // A missing .env file is normal outside development.
        let _ = dotenvy::dotenv();

        if let Some(path) = &config_path {
            if !path.exists() {
                return Err(TravelPlannerError::config(format!(
                    "Config file not found: {}",
                    path.display()
                ))
                .into());
            }
        }

        let config_file = config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::from_sources(Some(&config_file), None)
    }

    /// Build configuration from an optional file and an environment snapshot.
    ///
    /// `env_vars` replaces the process environment when given.
    pub fn from_sources(
        config_file: Option<&Path>,
        env_vars: Option<HashMap<String, String>>,
    ) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(config_file) = config_file.filter(|path| path.exists()) {
            builder = builder.add_source(
                File::from(config_file.to_path_buf())
                    .required(false)
                    .format(FileFormat::Toml),
            );
        }

        let database_url = match &env_vars {
            Some(vars) => vars.get("DATABASE_URL").cloned(),
            None => std::env::var("DATABASE_URL").ok(),
        };

        builder = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env_vars),
            )
            .set_override_option("database.url", database_url)
            .with_context(|| "Failed to apply DATABASE_URL")?;

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: TravelPlannerConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.server.host.is_empty() {
            self.server.host = default_host();
        }
        if self.database.url.is_empty() {
            self.database.url = default_database_url();
        }
        if self.art_api.base_url.is_empty() {
            self.art_api.base_url = default_art_api_base_url();
        }
        if self.art_api.user_agent.is_empty() {
            self.art_api.user_agent = default_user_agent();
        }
        if self.cache.location.is_empty() {
            self.cache.location = default_cache_location();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self
            .logging
            .otlp_endpoint
            .as_deref()
            .is_some_and(str::is_empty)
        {
            self.logging.otlp_endpoint = None;
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.server.request_timeout_seconds == 0 || self.server.request_timeout_seconds > 300 {
            return Err(
                TravelPlannerError::config("Request timeout must be between 1 and 300 seconds")
                    .into(),
            );
        }

        if self.server.max_body_bytes < 1024 {
            return Err(TravelPlannerError::config("Max body size must be at least 1024 bytes").into());
        }

        if self.database.pool_size == 0 || self.database.pool_size > 32 {
            return Err(TravelPlannerError::config("Database pool size must be between 1 and 32").into());
        }

        if self.art_api.timeout_seconds == 0 || self.art_api.timeout_seconds > 120 {
            return Err(TravelPlannerError::config(
                "Art Institute API timeout must be between 1 and 120 seconds",
            )
            .into());
        }

        if self.art_api.max_retries > 10 {
            return Err(
                TravelPlannerError::config("Art Institute API max retries cannot exceed 10").into(),
            );
        }

        if self.cache.ttl_seconds == 0 || self.cache.ttl_seconds > 7 * 24 * 60 * 60 {
            return Err(TravelPlannerError::config(
                "Cache TTL must be between 1 second and 168 hours (1 week)",
            )
            .into());
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(TravelPlannerError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(TravelPlannerError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if !is_http_url(&self.art_api.base_url) {
            return Err(TravelPlannerError::config(
                "Art Institute API base URL must be a valid HTTP or HTTPS URL",
            )
            .into());
        }

        if let Some(endpoint) = &self.logging.otlp_endpoint {
            if !is_http_url(endpoint) {
                return Err(TravelPlannerError::config(
                    "OTLP endpoint must be a valid HTTP or HTTPS URL",
                )
                .into());
            }
        }

        Ok(())
    }

    /// Socket address string the server binds to
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_default_config() {
        let config = TravelPlannerConfig::default();
        assert_eq!(config.database.url, "sqlite:///db.sqlite3");
        assert_eq!(config.art_api.base_url, "https://api.artic.edu/api/v1");
        assert_eq!(config.art_api.timeout_seconds, 10);
        assert_eq!(config.cache.ttl_seconds, 3600);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.server.port, 8000);
        assert!(config.logging.otlp_endpoint.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = TravelPlannerConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = TravelPlannerConfig::default();
        config.art_api.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout must be between"));

        let mut config = TravelPlannerConfig::default();
        config.database.pool_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_base_url() {
        let mut config = TravelPlannerConfig::default();
        config.art_api.base_url = "ftp://api.artic.edu".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_otlp_endpoint_is_disabled() {
        let mut config = TravelPlannerConfig::default();
        config.logging.otlp_endpoint = Some(String::new());
        config.apply_defaults();
        assert!(config.logging.otlp_endpoint.is_none());
    }

    #[test]
    fn test_environment_variable_override() {
        let config = TravelPlannerConfig::from_sources(
            None,
            env(&[
                ("DATABASE_URL", "sqlite:///trips.db"),
                ("TRAVEL_PLANNER_SERVER__PORT", "9090"),
                ("TRAVEL_PLANNER_ART_API__MAX_RETRIES", "0"),
            ]),
        )
        .unwrap();

        assert_eq!(config.database.url, "sqlite:///trips.db");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.art_api.max_retries, 0);
        assert_eq!(config.cache.ttl_seconds, 3600);
    }

    #[test]
    fn test_file_then_environment_layering() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\nport = 7000\nhost = \"0.0.0.0\"\n\n[cache]\nttl_seconds = 60\n"
        )
        .unwrap();

        let config = TravelPlannerConfig::from_sources(
            Some(file.path()),
            env(&[("TRAVEL_PLANNER_SERVER__PORT", "7001")]),
        )
        .unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 7001);
        assert_eq!(config.cache.ttl_seconds, 60);
        assert_eq!(config.database.url, "sqlite:///db.sqlite3");
        assert_eq!(config.bind_address(), "0.0.0.0:7001");
    }

    #[test]
    fn test_invalid_file_values_are_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[logging]\nformat = \"xml\"\n").unwrap();

        let result = TravelPlannerConfig::from_sources(Some(file.path()), env(&[]));
        assert!(result.is_err());
        assert!(format!("{:#}", result.unwrap_err()).contains("Invalid log format"));
    }

    #[test]
    fn test_missing_explicit_config_file() {
        let result =
            TravelPlannerConfig::load_from_path(Some(PathBuf::from("/nonexistent/planner.toml")));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Config file not found"));
    }
}
