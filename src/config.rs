//! Configuration management for AgentDesk
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{AgentDeskError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for AgentDesk
///
/// Holds the platform API location, chat behaviour, upload limits and
/// fine-tuning monitor settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Platform API settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Chat settings
    #[serde(default)]
    pub chat: ChatConfig,
    /// Document upload settings
    #[serde(default)]
    pub upload: UploadConfig,
    /// Fine-tuning monitor settings
    #[serde(default)]
    pub training: TrainingConfig,
}

/// Platform API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the versioned API (e.g. `http://localhost:8000/api/v1`)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds, applied to every call
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "http://localhost:8000/api/v1".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_user_agent() -> String {
    concat!("agentdesk/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Chat configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Assistant message appended to the transcript when a send fails
    #[serde(default = "default_error_message")]
    pub error_message: String,
}

/// Transcript text shown in place of an answer when a chat request fails
pub const DEFAULT_CHAT_ERROR_MESSAGE: &str =
    "Sorry, I encountered an error processing your request.";

fn default_error_message() -> String {
    DEFAULT_CHAT_ERROR_MESSAGE.to_string()
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            error_message: default_error_message(),
        }
    }
}

/// Document upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Largest file accepted for upload (bytes)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

fn default_max_file_size() -> u64 {
    50 * 1024 * 1024 // 50 MB
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
        }
    }
}

/// Fine-tuning monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Status poll interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Base model passed to `POST /ml/train`
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Default number of epochs for a training run
    #[serde(default = "default_epochs")]
    pub epochs: u32,
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_model_name() -> String {
    "TinyLlama/TinyLlama-1.1B-Chat-v1.0".to_string()
}

fn default_epochs() -> u32 {
    3
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            model_name: default_model_name(),
            epochs: default_epochs(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AgentDeskError::Config(format!("Failed to read config file: {}", e)))?;
        let config = serde_yaml::from_str(&contents).map_err(AgentDeskError::from)?;
        Ok(config)
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("AGENTDESK_API_URL") {
            tracing::debug!(base_url = %base_url, "Env override: AGENTDESK_API_URL");
            self.api.base_url = base_url;
        }

        if let Ok(timeout) = std::env::var("AGENTDESK_TIMEOUT_SECONDS") {
            match timeout.parse::<u64>() {
                Ok(v) => {
                    self.api.timeout_seconds = v;
                    tracing::debug!(timeout_seconds = v, "Env override: AGENTDESK_TIMEOUT_SECONDS");
                }
                Err(_) => {
                    tracing::warn!("Invalid value for AGENTDESK_TIMEOUT_SECONDS: {}", timeout);
                }
            }
        }

        if let Ok(interval) = std::env::var("AGENTDESK_POLL_INTERVAL_MS") {
            match interval.parse::<u64>() {
                Ok(v) => {
                    self.training.poll_interval_ms = v;
                    tracing::debug!(poll_interval_ms = v, "Env override: AGENTDESK_POLL_INTERVAL_MS");
                }
                Err(_) => {
                    tracing::warn!("Invalid value for AGENTDESK_POLL_INTERVAL_MS: {}", interval);
                }
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(api_url) = &cli.api_url {
            self.api.base_url = api_url.clone();
        }
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns a [`AgentDeskError::Config`] describing the first invalid field
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(AgentDeskError::Config("api.base_url cannot be empty".to_string()).into());
        }

        let parsed = url::Url::parse(&self.api.base_url).map_err(|e| {
            AgentDeskError::Config(format!(
                "api.base_url is not a valid URL ({}): {}",
                self.api.base_url, e
            ))
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(AgentDeskError::Config(format!(
                "api.base_url must use http or https, got: {}",
                parsed.scheme()
            ))
            .into());
        }

        if self.api.timeout_seconds == 0 {
            return Err(AgentDeskError::Config(
                "api.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.upload.max_file_size == 0 {
            return Err(AgentDeskError::Config(
                "upload.max_file_size must be greater than 0".to_string(),
            )
            .into());
        }

        if self.training.poll_interval_ms == 0 {
            return Err(AgentDeskError::Config(
                "training.poll_interval_ms must be greater than 0".to_string(),
            )
            .into());
        }

        if self.training.epochs == 0 {
            return Err(
                AgentDeskError::Config("training.epochs must be greater than 0".to_string()).into(),
            );
        }

        Ok(())
    }
}
