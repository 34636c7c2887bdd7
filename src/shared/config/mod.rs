//! Application configuration module
//!
//! Provides configuration types for the client. Values come from, in order of
//! precedence: the `ARTLINE_API_URL` environment variable, a TOML file, and
//! built-in defaults.
//!
//! ```toml
//! server_url = "https://api.example.com"
//! retry_attempts = 3
//! retry_delay_ms = 1000
//! data_dir = "/home/me/.local/share/artline"
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default backend URL
pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";

/// Environment variable overriding the backend URL
pub const SERVER_URL_ENV: &str = "ARTLINE_API_URL";

const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Backend base URL, without trailing slash
    pub server_url: String,
    /// Attempts per request before a transport failure is final
    pub retry_attempts: u32,
    /// Wait between attempts, in milliseconds
    pub retry_delay_ms: u64,
    /// Directory holding persisted local state
    pub data_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            data_dir: default_data_dir(),
        }
    }
}

/// On-disk shape of the config file; every field optional.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    server_url: Option<String>,
    retry_attempts: Option<u32>,
    retry_delay_ms: Option<u64>,
    data_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Parse a TOML document, falling back to defaults for missing keys
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile =
            toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let mut builder = AppConfig::builder();
        if let Some(url) = file.server_url {
            builder = builder.server_url(url);
        }
        if let Some(attempts) = file.retry_attempts {
            builder = builder.retry_attempts(attempts);
        }
        if let Some(delay) = file.retry_delay_ms {
            builder = builder.retry_delay_ms(delay);
        }
        if let Some(dir) = file.data_dir {
            builder = builder.data_dir(dir);
        }
        builder.build()
    }

    /// Load configuration from an optional file and the environment.
    ///
    /// A missing file is not an error; the defaults are used instead.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) if path.exists() => {
                let source = std::fs::read_to_string(path)
                    .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
                Self::from_toml_str(&source)?
            }
            _ => Self::default(),
        };

        if let Ok(url) = std::env::var(SERVER_URL_ENV) {
            config.server_url = normalize_url(&url);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.server_url.starts_with("http://") || self.server_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(self.server_url.clone()));
        }
        if self.retry_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retry_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    server_url: Option<String>,
    retry_attempts: Option<u32>,
    retry_delay_ms: Option<u64>,
    data_dir: Option<PathBuf>,
}

impl AppConfigBuilder {
    /// Set the server URL
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = Some(url.into());
        self
    }

    /// Set the retry budget
    pub fn retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = Some(attempts);
        self
    }

    /// Set the wait between attempts
    pub fn retry_delay_ms(mut self, delay: u64) -> Self {
        self.retry_delay_ms = Some(delay);
        self
    }

    /// Set the local state directory
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let defaults = AppConfig::default();
        let config = AppConfig {
            server_url: self
                .server_url
                .map(|url| normalize_url(&url))
                .unwrap_or(defaults.server_url),
            retry_attempts: self.retry_attempts.unwrap_or(defaults.retry_attempts),
            retry_delay_ms: self.retry_delay_ms.unwrap_or(defaults.retry_delay_ms),
            data_dir: self.data_dir.unwrap_or(defaults.data_dir),
        };
        config.validate()?;
        Ok(config)
    }
}

fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn default_data_dir() -> PathBuf {
    let mut path = dirs::data_dir().unwrap_or_else(std::env::temp_dir);
    path.push("artline");
    path
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("failed to read config: {0}")]
    Io(String),
}
