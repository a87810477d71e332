//! Configuration management for the climate forecast service
//!
//! Settings are read from an optional TOML file and then overridden by
//! `CLIMATE_*` environment variables (`CLIMATE_SERVER__PORT=8080`).

use crate::ClimateError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "CLIMATE_CONFIG";

/// Root configuration structure for the service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClimateConfig {
    /// Climate data provider configuration
    pub provider: ProviderConfig,
    /// Response cache configuration
    pub cache: CacheConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// HTTP server configuration
    pub server: ServerConfig,
}

/// Climate data provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Endpoint of the climate API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    /// Maximum number of retries for transient failures
    pub max_retries: u32,
    /// Smallest backoff between retries in milliseconds
    pub backoff_min_ms: u64,
    /// Largest backoff between retries in milliseconds
    pub backoff_max_ms: u64,
    /// User agent sent with every request
    pub user_agent: String,
}

/// Response cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether provider responses are cached on disk
    pub enabled: bool,
    /// Time-to-live of a cached response in seconds
    pub ttl_seconds: u64,
    /// Cache directory location
    pub location: String,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
    /// OTLP/HTTP collector endpoint for trace export
    pub otlp_endpoint: Option<String>,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory with a built frontend to serve for non-API paths
    pub static_dir: Option<String>,
    /// PEM certificate chain for HTTPS
    pub tls_cert_path: Option<String>,
    /// PEM private key for HTTPS
    pub tls_key_path: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://climate-api.open-meteo.com/v1/climate".to_string(),
            timeout_seconds: 60,
            max_retries: 5,
            backoff_min_ms: 200,
            backoff_max_ms: 10_000,
            user_agent: format!("climate-forecast/{}", crate::VERSION),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: 3600,
            location: ".cache/climate-forecast".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            otlp_endpoint: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            static_dir: None,
            tls_cert_path: None,
            tls_key_path: None,
        }
    }
}

impl ProviderConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl CacheConfig {
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

impl ServerConfig {
    /// Address to bind, `host:port`
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Certificate and key paths when HTTPS is configured
    #[must_use]
    pub fn tls_paths(&self) -> Option<(&str, &str)> {
        match (&self.tls_cert_path, &self.tls_key_path) {
            (Some(cert), Some(key)) => Some((cert.as_str(), key.as_str())),
            _ => None,
        }
    }
}

impl ClimateConfig {
    /// Load from `$CLIMATE_CONFIG` or the per-user config directory
    pub fn load() -> Result<Self> {
        let explicit = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        Self::load_from_path(explicit)
    }

    /// Load from `config_path`, falling back to the default location
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // CLIMATE_SERVER__PORT=8080 overrides server.port
        builder = builder.add_source(
            Environment::with_prefix("CLIMATE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let config: ClimateConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// `<config dir>/climate-forecast/config.toml`
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("climate-forecast").join("config.toml"))
    }

    /// Reject out-of-range or unknown values
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.provider.timeout_seconds == 0 || self.provider.timeout_seconds > 300 {
            return Err(ClimateError::config(
                "Provider timeout must be between 1 and 300 seconds",
            )
            .into());
        }

        if self.provider.max_retries > 10 {
            return Err(ClimateError::config("Provider max retries cannot exceed 10").into());
        }

        if self.provider.backoff_min_ms > self.provider.backoff_max_ms {
            return Err(ClimateError::config(
                "Provider backoff_min_ms cannot exceed backoff_max_ms",
            )
            .into());
        }

        if self.cache.ttl_seconds > 7 * 24 * 3600 {
            return Err(ClimateError::config("Cache TTL cannot exceed 1 week").into());
        }

        if self.server.port == 0 {
            return Err(ClimateError::config("Server port cannot be 0").into());
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(ClimateError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(ClimateError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if !self.provider.base_url.starts_with("http://")
            && !self.provider.base_url.starts_with("https://")
        {
            return Err(ClimateError::config(
                "Provider base URL must be a valid HTTP or HTTPS URL",
            )
            .into());
        }

        if self.server.tls_cert_path.is_some() != self.server.tls_key_path.is_some() {
            return Err(ClimateError::config(
                "TLS needs both tls_cert_path and tls_key_path",
            )
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ClimateConfig::default();
        assert_eq!(
            config.provider.base_url,
            "https://climate-api.open-meteo.com/v1/climate"
        );
        assert_eq!(config.provider.max_retries, 5);
        assert_eq!(config.cache.ttl(), Duration::from_secs(3600));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.server.bind_address(), "0.0.0.0:5000");
        assert!(config.server.tls_paths().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = ClimateConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = ClimateConfig::default();
        config.provider.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout must be"));
    }

    #[test]
    fn test_config_validation_half_tls() {
        let mut config = ClimateConfig::default();
        config.server.tls_cert_path = Some("cert.pem".to_string());
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("TLS needs both"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[server]\nport = 8088\n\n[cache]\nenabled = false\n\n[logging]\nformat = \"json\""
        )
        .unwrap();

        let config = ClimateConfig::load_from_path(Some(path)).unwrap();
        assert_eq!(config.server.port, 8088);
        assert!(!config.cache.enabled);
        assert_eq!(config.logging.format, "json");
        // Untouched sections keep their defaults
        assert_eq!(config.provider.max_retries, 5);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[logging]\nlevel = \"loud\"\n").unwrap();

        assert!(ClimateConfig::load_from_path(Some(path)).is_err());
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = ClimateConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("climate-forecast"));
            assert!(path.to_string_lossy().contains("config.toml"));
        }
    }
}
