//! Server configuration.
//!
//! Loaded once at startup from an optional TOML file, then overridden by
//! environment variables. Nothing reads configuration after startup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use mentor_embeddings::GeminiProvider;
use mentor_retrieval::RetrievalConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The config file is not valid TOML for this schema.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Embedding provider settings.
    pub provider: ProviderConfig,

    /// Store, schema, query and batch settings.
    pub retrieval: RetrievalConfig,

    /// Logging settings.
    pub logging: LoggingConfig,
}

impl ServerConfig {
    /// Load configuration from `path`, or from the default location when it
    /// exists, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match Self::resolve_path(path) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// The file `load` reads: `path` if given, else the default location
    /// when it exists.
    pub fn resolve_path(path: Option<&Path>) -> Option<PathBuf> {
        path.map(Path::to_path_buf).or_else(|| {
            let default = default_config_path()?;
            default.exists().then_some(default)
        })
    }

    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse TOML text.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.provider.api_key = Some(key);
        }
    }
}

/// Default config file location.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mentor").join("config.toml"))
}

/// Embedding provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Gemini API key.
    pub api_key: Option<String>,

    /// Override for the API endpoint.
    pub base_url: Option<String>,

    /// Override for the embedding model.
    pub model: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: None,
            timeout_secs: 30,
        }
    }
}

impl ProviderConfig {
    /// Construct the Gemini client described by this configuration.
    pub fn build_provider(&self) -> GeminiProvider {
        let mut provider =
            GeminiProvider::new().with_timeout(Duration::from_secs(self.timeout_secs.max(1)));
        if let Some(key) = &self.api_key {
            provider = provider.with_api_key(key.clone());
        }
        if let Some(url) = &self.base_url {
            provider = provider.with_base_url(url.clone());
        }
        if let Some(model) = &self.model {
            provider = provider.with_model(model.clone());
        }
        provider
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}
