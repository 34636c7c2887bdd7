use crate::client::retry::RetryPolicy;
use crate::shared::config::{AppConfig, AppConfigBuilder, ConfigError};
use std::path::Path;
use std::time::Duration;

/// Client configuration: the application settings plus the bearer token.
#[derive(Debug, Clone)]
pub struct Config {
    app: AppConfig,
    token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app: AppConfig::default(),
            token: None,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_app(app: AppConfig) -> Self {
        Self { app, token: None }
    }

    pub fn with_builder(builder: AppConfigBuilder) -> Result<Self, ConfigError> {
        Ok(Self::from_app(builder.build()?))
    }

    /// Load from an optional TOML file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Ok(Self::from_app(AppConfig::load(path)?))
    }

    /// Set the bearer token
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    /// Get the bearer token
    pub fn get_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Clear the token (logout)
    pub fn clear_token(&mut self) {
        self.token = None;
    }

    /// Get the full URL for an API endpoint
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.server_url(), path)
    }

    pub fn server_url(&self) -> &str {
        &self.app.server_url
    }

    pub fn data_dir(&self) -> &Path {
        &self.app.data_dir
    }

    /// Retry policy derived from the configured budget
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(
            self.app.retry_attempts,
            Duration::from_millis(self.app.retry_delay_ms),
        )
    }

    pub fn app(&self) -> &AppConfig {
        &self.app
    }
}
