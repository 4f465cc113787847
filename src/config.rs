//! Configuration management
//!
//! Values come from `~/.parley/config.json` when it exists, then environment
//! variables (optionally loaded from a `.env` file) override them.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use crate::Result;
use crate::error::Error;

/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
/// Environment variable holding the API base URL.
pub const ENV_API_BASE: &str = "OPENAI_API_BASE";
/// Environment variable holding the chat model name.
pub const ENV_CHAT_MODEL: &str = "OPENAI_CHAT_MODEL";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API key for the completion service
    #[serde(default)]
    pub api_key: String,

    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Model to use
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Maximum output tokens per completion
    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// Rounds allowed in an interactive conversation
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,

    /// Completion/tool iterations allowed within one task run
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Upper bound on a single completion call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Directory file tools resolve relative paths against
    #[serde(default = "default_workspace")]
    pub workspace: PathBuf,
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_rounds() -> usize {
    20
}

fn default_max_iterations() -> usize {
    10
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_workspace() -> PathBuf {
    PathBuf::from(".")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: default_api_base(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: None,
            max_rounds: default_max_rounds(),
            max_iterations: default_max_iterations(),
            request_timeout_secs: default_request_timeout_secs(),
            workspace: default_workspace(),
        }
    }
}

impl Config {
    /// Apply environment overrides through a lookup function.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_API_KEY).filter(|v| !v.is_empty()) {
            self.api_key = key;
        }
        if let Some(base) = lookup(ENV_API_BASE).filter(|v| !v.is_empty()) {
            self.api_base = base;
        }
        if let Some(model) = lookup(ENV_CHAT_MODEL).filter(|v| !v.is_empty()) {
            self.model = model;
        }
    }

    /// Fail early when the completion service cannot be reached at all.
    pub fn require_api_key(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(Error::Config(format!(
                "No API key configured. Set {ENV_API_KEY} or add \"api_key\" to {:?}",
                config_path()
            )));
        }
        Ok(())
    }
}

/// Get the config directory path
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".parley")
}

/// Get the config file path
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Load configuration: file (if any), then `.env`, then process environment.
pub fn load() -> Result<Config> {
    dotenvy::dotenv().ok();

    let path = config_path();
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(&path)?;
        serde_json::from_str(&content)?
    } else {
        Config::default()
    };

    config.apply_env(|name| std::env::var(name).ok());
    Ok(config)
}

/// Save configuration to file
pub fn save(config: &Config) -> Result<()> {
    let path = config_path();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.max_rounds, 20);
        assert_eq!(config.request_timeout_secs, 60);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"model": "gpt-4o-mini"}"#).unwrap();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.api_base, "https://api.openai.com/v1");
        assert_eq!(config.max_iterations, 10);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env(|name| match name {
            ENV_API_KEY => Some("sk-test".to_string()),
            ENV_CHAT_MODEL => Some("gpt-4.1-mini".to_string()),
            ENV_API_BASE => Some(String::new()),
            _ => None,
        });

        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.model, "gpt-4.1-mini");
        // Empty values are ignored
        assert_eq!(config.api_base, "https://api.openai.com/v1");
    }

    #[test]
    fn test_require_api_key() {
        let mut config = Config::default();
        assert!(matches!(config.require_api_key(), Err(Error::Config(_))));
        config.api_key = "sk-test".to_string();
        assert!(config.require_api_key().is_ok());
    }
}
