//! Configuration loading, validation, and management for DeepDesk.
//!
//! Loads configuration from `~/.deepdesk/config.toml` with environment
//! variable overrides. Validates all settings at startup — the core assumes
//! a valid credential is present by the time a turn runs, so the missing-key
//! case is caught here and in the CLI, never mid-turn.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default completion endpoint.
pub const DEFAULT_API_URL: &str = "https://api.deepseek.com/v1/chat/completions";

/// The set of models the client can be pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ModelChoice {
    /// General-purpose chat model
    #[default]
    DeepseekChat,
    /// Reasoning model
    DeepseekReasoner,
}

impl ModelChoice {
    /// The model identifier sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeepseekChat => "deepseek-chat",
            Self::DeepseekReasoner => "deepseek-reasoner",
        }
    }

}

impl std::fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelChoice {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deepseek-chat" => Ok(Self::DeepseekChat),
            "deepseek-reasoner" => Ok(Self::DeepseekReasoner),
            other => Err(ConfigError::ValidationError(format!(
                "unknown model '{other}' (expected deepseek-chat or deepseek-reasoner)"
            ))),
        }
    }
}

/// The root configuration structure.
///
/// Maps directly to `~/.deepdesk/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the completion endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Completion endpoint URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Which model to use
    #[serde(default)]
    pub model: ModelChoice,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// System prompt prepended to every request
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Maximum messages kept in the API context window
    #[serde(default = "default_max_context_messages")]
    pub max_context_messages: usize,

    /// Maximum characters extracted per attached file
    #[serde(default = "default_max_file_content")]
    pub max_file_content: usize,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_system_prompt() -> String {
    "You are an expert AI assistant. Provide detailed, accurate responses.".into()
}
fn default_max_context_messages() -> usize {
    8
}
fn default_max_file_content() -> usize {
    1000
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("system_prompt", &self.system_prompt)
            .field("max_context_messages", &self.max_context_messages)
            .field("max_file_content", &self.max_file_content)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.deepdesk/config.toml).
    ///
    /// Also checks environment variables for the API key:
    /// - `DEEPDESK_API_KEY` (highest priority)
    /// - `DEEPSEEK_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        let api_key = std::env::var("DEEPDESK_API_KEY")
            .ok()
            .or_else(|| std::env::var("DEEPSEEK_API_KEY").ok());
        config.apply_env_overrides(api_key, std::env::var("DEEPDESK_MODEL").ok())?;

        Ok(config)
    }

    /// Apply environment-sourced values on top of the file-sourced config.
    /// A value present in the environment wins over the file.
    fn apply_env_overrides(
        &mut self,
        api_key: Option<String>,
        model: Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(key) = api_key {
            self.api_key = Some(key);
        }
        if let Some(model) = model {
            self.model = model.parse()?;
        }
        Ok(())
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".deepdesk")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 1.0".into(),
            ));
        }

        if self.api_url.is_empty() {
            return Err(ConfigError::ValidationError("api_url must not be empty".into()));
        }

        Ok(())
    }

    /// The API key, or the missing-key error the CLI surfaces before any
    /// turn can run.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key.as_deref().ok_or(ConfigError::MissingApiKey)
    }

    /// Generate a default config TOML string (for `onboard`).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            model: ModelChoice::default(),
            temperature: default_temperature(),
            system_prompt: default_system_prompt(),
            max_context_messages: default_max_context_messages(),
            max_file_content: default_max_file_content(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("No API key configured")]
    MissingApiKey,
}
