//! Configuration management utilities

use crate::LogFormat;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Error raised when a configuration value is out of range
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Configuration error: {0}")]
pub struct ConfigError(pub String);

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application name
    pub app_name: String,
    /// Environment (dev, prod, etc.)
    pub environment: String,
    /// Interface the HTTP server binds to
    pub host: String,
    /// Port the HTTP server listens on
    pub port: u16,
    /// Model used by `/react` when the request names none
    pub default_model: String,
    /// Iteration bound used by `/react` when the request names none
    pub default_max_iterations: u32,
    /// Largest iteration bound a request may ask for
    pub max_iterations_limit: u32,
    /// Deadline for a whole `/react` or `/chat` request
    pub request_timeout: Duration,
    /// Deadline for a single tool invocation
    pub tool_timeout: Duration,
    /// Primary model for the chat pass-through
    pub chat_model: String,
    /// Model tried when the primary chat model fails
    pub chat_fallback_model: String,
    /// Log output format
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "harperbot".to_string(),
            environment: "development".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8000,
            default_model: "gpt-4".to_string(),
            default_max_iterations: 3,
            max_iterations_limit: 25,
            request_timeout: Duration::from_secs(120),
            tool_timeout: Duration::from_secs(30),
            chat_model: "gpt-5".to_string(),
            chat_fallback_model: "gpt-4".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Create a new configuration builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Socket address string (`host:port`) for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations_limit == 0 {
            return Err(ConfigError(
                "max_iterations_limit must be greater than 0".to_string(),
            ));
        }

        if self.default_max_iterations == 0
            || self.default_max_iterations > self.max_iterations_limit
        {
            return Err(ConfigError(format!(
                "default_max_iterations must be between 1 and {}",
                self.max_iterations_limit
            )));
        }

        if self.request_timeout.is_zero() || self.tool_timeout.is_zero() {
            return Err(ConfigError("timeouts must be non-zero".to_string()));
        }

        if self.default_model.trim().is_empty() || self.chat_model.trim().is_empty() {
            return Err(ConfigError("model names must not be empty".to_string()));
        }

        Ok(())
    }
}

/// Builder for Config
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    host: Option<String>,
    port: Option<u16>,
    default_model: Option<String>,
    default_max_iterations: Option<u32>,
    max_iterations_limit: Option<u32>,
    request_timeout: Option<Duration>,
    tool_timeout: Option<Duration>,
    chat_model: Option<String>,
    chat_fallback_model: Option<String>,
    log_format: Option<LogFormat>,
    environment: Option<String>,
}

impl ConfigBuilder {
    /// Set the bind host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the listen port
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the environment name
    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// Set the default agent model
    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    /// Set the default iteration bound
    pub fn default_max_iterations(mut self, max: u32) -> Self {
        self.default_max_iterations = Some(max);
        self
    }

    /// Set the iteration bound ceiling
    pub fn max_iterations_limit(mut self, limit: u32) -> Self {
        self.max_iterations_limit = Some(limit);
        self
    }

    /// Set the request deadline
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the per-tool deadline
    pub fn tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = Some(timeout);
        self
    }

    /// Set the primary chat model
    pub fn chat_model(mut self, model: impl Into<String>) -> Self {
        self.chat_model = Some(model.into());
        self
    }

    /// Set the fallback chat model
    pub fn chat_fallback_model(mut self, model: impl Into<String>) -> Self {
        self.chat_fallback_model = Some(model.into());
        self
    }

    /// Set the log format
    pub fn log_format(mut self, format: LogFormat) -> Self {
        self.log_format = Some(format);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<Config, ConfigError> {
        let defaults = Config::default();

        let config = Config {
            app_name: defaults.app_name,
            environment: self.environment.unwrap_or(defaults.environment),
            host: self.host.unwrap_or(defaults.host),
            port: self.port.unwrap_or(defaults.port),
            default_model: self.default_model.unwrap_or(defaults.default_model),
            default_max_iterations: self
                .default_max_iterations
                .unwrap_or(defaults.default_max_iterations),
            max_iterations_limit: self
                .max_iterations_limit
                .unwrap_or(defaults.max_iterations_limit),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            tool_timeout: self.tool_timeout.unwrap_or(defaults.tool_timeout),
            chat_model: self.chat_model.unwrap_or(defaults.chat_model),
            chat_fallback_model: self
                .chat_fallback_model
                .unwrap_or(defaults.chat_fallback_model),
            log_format: self.log_format.unwrap_or(defaults.log_format),
        };

        config.validate()?;
        Ok(config)
    }
}
