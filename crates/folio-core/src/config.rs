//! Engine configuration.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Engine configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Reserved request parameter names.
    #[serde(default)]
    pub params: ParamNames,

    /// Model and response defaults.
    #[serde(default)]
    pub model: ModelConfig,

    /// Persistent page registry settings.
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Anti-forgery token settings.
    #[serde(default)]
    pub nonce: NonceConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LogConfig,
}

impl EngineConfig {
    /// Load config from a TOML or JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: EngineConfig = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?
        };

        config
            .validate()
            .with_context(|| format!("Invalid config: {}", path.display()))?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.params.page_id.is_empty() || self.params.nonce.is_empty() {
            return Err(ConfigError::Invalid(
                "reserved parameter names cannot be empty".into(),
            ));
        }
        if self.params.page_id == self.params.nonce {
            return Err(ConfigError::Invalid(
                "page id and nonce parameters must differ".into(),
            ));
        }
        if self.model.nonce_key.is_empty() {
            return Err(ConfigError::Invalid("model nonce key cannot be empty".into()));
        }
        if self.nonce.token_bytes == 0 {
            return Err(ConfigError::Invalid("nonce token_bytes cannot be 0".into()));
        }
        if self.registry.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "registry sweep_interval_secs cannot be 0".into(),
            ));
        }
        Ok(())
    }
}

/// Reserved request parameter names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamNames {
    /// Parameter carrying the persistent page identity.
    #[serde(default = "default_page_id_param")]
    pub page_id: String,

    /// Parameter carrying the anti-forgery token.
    #[serde(default = "default_nonce_param")]
    pub nonce: String,
}

impl Default for ParamNames {
    fn default() -> Self {
        Self {
            page_id: default_page_id_param(),
            nonce: default_nonce_param(),
        }
    }
}

fn default_page_id_param() -> String {
    "_pid".to_string()
}

fn default_nonce_param() -> String {
    "_nonce".to_string()
}

/// Model and response defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model key under which the session token is exposed.
    #[serde(default = "default_nonce_param")]
    pub nonce_key: String,

    /// Content type used unless a page sets its own.
    #[serde(default = "default_content_type")]
    pub default_content_type: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            nonce_key: default_nonce_param(),
            default_content_type: default_content_type(),
        }
    }
}

/// Default response content type.
pub fn default_content_type() -> String {
    "text/html; charset=UTF-8".to_string()
}

/// Persistent page registry settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Idle time after which a persistent page is evicted.
    #[serde(default = "default_max_idle_secs")]
    pub max_idle_secs: u64,

    /// Period of the background eviction sweep.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_idle_secs: default_max_idle_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_max_idle_secs() -> u64 {
    30 * 60 // 30 minutes
}

fn default_sweep_interval_secs() -> u64 {
    60
}

/// Anti-forgery token settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonceConfig {
    /// Random bytes per token.
    #[serde(default = "default_token_bytes")]
    pub token_bytes: usize,

    /// Issue a fresh token after every successful verification.
    #[serde(default)]
    pub rotate_after_verify: bool,
}

impl Default for NonceConfig {
    fn default() -> Self {
        Self {
            token_bytes: default_token_bytes(),
            rotate_after_verify: false,
        }
    }
}

fn default_token_bytes() -> usize {
    24
}

/// Output format for logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format (for production/log aggregation).
    #[default]
    Json,
    /// Human-readable format (for development).
    Human,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Default filter directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
