//! Configuration System
//!
//! Loads the client configuration from a TOML file with environment
//! variable overrides. The only setting the backend contract needs is the
//! base URL; the rest tunes the HTTP client and logging.

use reqwest::Url;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::api::ClientConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    pub user_agent: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            user_agent: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,

    pub file: Option<String>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

const ENV_BASE_URL: &str = "SOCIAL_FE_BE_URL";
const ENV_TIMEOUT: &str = "SOCIAL_REQUEST_TIMEOUT";
const ENV_LOG_LEVEL: &str = "SOCIAL_LOG_LEVEL";
const ENV_LOG_FORMAT: &str = "SOCIAL_LOG_FORMAT";

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Defaults plus environment overrides
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from `explicit` if given, else from the default locations
    ///
    /// An explicit path must load; a broken file in a default location is
    /// logged and skipped.
    pub fn load_default(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            let config = Self::load_with_env(path)?;
            config.validate()?;
            return Ok(config);
        }

        for path in default_paths() {
            if !path.exists() {
                continue;
            }
            match Self::load_with_env(&path) {
                Ok(config) => {
                    tracing::debug!("Loaded config from {:?}", path);
                    config.validate()?;
                    return Ok(config);
                }
                Err(e) => {
                    tracing::warn!("Failed to load config from {:?}: {}", path, e);
                }
            }
        }

        tracing::debug!("Using default config with environment overrides");
        let config = Self::from_env();
        config.validate()?;
        Ok(config)
    }

    /// Check the base URL before any client is built
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidBaseUrl {
            url: self.api.base_url.clone(),
            reason,
        };
        let url = Url::parse(&self.api.base_url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
        }
        Ok(())
    }

    /// Settings for [`crate::api::ApiClient::new`]
    pub fn client_config(&self) -> ClientConfig {
        let defaults = ClientConfig::default();
        ClientConfig {
            base_url: self.api.base_url.clone(),
            request_timeout_secs: self.api.request_timeout_secs,
            user_agent: self.api.user_agent.clone().unwrap_or(defaults.user_agent),
        }
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var(ENV_BASE_URL) {
            self.api.base_url = url;
        }
        if let Some(timeout) = var(ENV_TIMEOUT) {
            match timeout.parse() {
                Ok(secs) => self.api.request_timeout_secs = secs,
                Err(_) => tracing::warn!("Ignoring {}={:?}: not a number", ENV_TIMEOUT, timeout),
            }
        }
        if let Some(level) = var(ENV_LOG_LEVEL) {
            self.logging.level = level;
        }
        if let Some(format) = var(ENV_LOG_FORMAT) {
            self.logging.format = format;
        }
    }
}

fn default_paths() -> Vec<PathBuf> {
    [
        dirs::config_dir().map(|p| p.join("social").join("config.toml")),
        Some(PathBuf::from("./social.toml")),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid backend URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Social client configuration
#
# Environment variables override these settings:
# - SOCIAL_FE_BE_URL
# - SOCIAL_REQUEST_TIMEOUT
# - SOCIAL_LOG_LEVEL
# - SOCIAL_LOG_FORMAT

[api]
# Backend origin
base_url = "http://localhost:5000"

# Request timeout in seconds
request_timeout_secs = 30

# User-Agent header (defaults to social/<version>)
# user_agent = "social"

[logging]
# Log level: trace, debug, info, warn, error
level = "warn"

# Log format: pretty or json
format = "pretty"

# Optional log file path (logs go to stderr otherwise)
# file = "/tmp/social.log"
"#
    .to_string()
}
