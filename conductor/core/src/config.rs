//! TOML Configuration File Support
//!
//! Client configuration is read from `~/.config/medrag/chat.toml`.
//!
//! # Configuration Priority
//!
//! Values are resolved with the following priority (highest first):
//! 1. CLI arguments (via [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [backend]
//! url = "http://localhost:3001"
//! connect_timeout_ms = 5000
//! request_timeout_ms = 0
//! channel_capacity = 100
//!
//! [session]
//! default_mode = "agent"
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::routing::ChatMode;

/// Backend URL used when nothing else is configured
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3001";

const ENV_BACKEND_URL: &str = "MEDRAG_BACKEND_URL";
const ENV_MODE: &str = "MEDRAG_MODE";
const ENV_CONNECT_TIMEOUT: &str = "MEDRAG_CONNECT_TIMEOUT";
const ENV_REQUEST_TIMEOUT: &str = "MEDRAG_REQUEST_TIMEOUT";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Tracks where the configuration last changed from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Command-line argument
    Cli,
    /// Environment variable
    Env,
    /// TOML configuration file
    File,
    /// Built-in default
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// `[backend]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendToml {
    /// Base URL of the RAG backend
    pub url: Option<String>,

    /// Connection timeout in milliseconds
    pub connect_timeout_ms: Option<u64>,

    /// Total request timeout in milliseconds (0 = no timeout)
    pub request_timeout_ms: Option<u64>,

    /// Buffered events between the body reader and the session
    pub channel_capacity: Option<usize>,
}

/// `[session]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionToml {
    /// Mode a new session starts in
    pub default_mode: Option<String>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatToml {
    /// Backend section
    pub backend: BackendToml,

    /// Session section
    pub session: SessionToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Resolved client configuration
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL of the RAG backend
    pub backend_url: String,

    /// Connection timeout in milliseconds
    pub connect_timeout_ms: u64,

    /// Total request timeout in milliseconds (0 = no timeout)
    pub request_timeout_ms: u64,

    /// Buffered events between the body reader and the session
    pub channel_capacity: usize,

    /// Mode a new session starts in
    pub default_mode: ChatMode,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    source: ConfigSource,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            connect_timeout_ms: 5000,
            request_timeout_ms: 0,
            channel_capacity: 100,
            default_mode: ChatMode::Default,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl ClientConfig {
    /// Create a configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the backend base URL
    #[must_use]
    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = url.into();
        self
    }

    /// Set the connection timeout
    #[must_use]
    pub fn with_connect_timeout_ms(mut self, ms: u64) -> Self {
        self.connect_timeout_ms = ms;
        self
    }

    /// Set the total request timeout (0 = none)
    #[must_use]
    pub fn with_request_timeout_ms(mut self, ms: u64) -> Self {
        self.request_timeout_ms = ms;
        self
    }

    /// Set the event channel capacity
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Where the configuration last changed from
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Check that the resolved values are usable
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] for a non-HTTP backend URL or a
    /// zero channel capacity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.backend_url.starts_with("http://") || self.backend_url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "backend url must start with http:// or https://, got '{}'",
                self.backend_url
            )));
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "channel_capacity must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/medrag/chat.toml`, falling back to
/// `~/.config/medrag/chat.toml`.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("medrag").join("chat.toml"))
}

/// Load configuration from the default path and the environment
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if
/// the resolved values fail validation. A missing file is not an error.
pub fn load_config() -> Result<ClientConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path and the environment
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if the resolved
/// values fail validation.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<ClientConfig, ConfigError> {
    load_config_with(path, |key| std::env::var(key).ok())
}

/// Load configuration using a custom environment lookup
///
/// # Errors
///
/// Same as [`load_config_from_path`].
pub fn load_config_with<F>(path: Option<PathBuf>, env: F) -> Result<ClientConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = ClientConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: ChatToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config)?;
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, env);
    config.validate()?;

    Ok(config)
}

fn apply_toml_config(config: &mut ClientConfig, toml: &ChatToml) -> Result<(), ConfigError> {
    if let Some(ref url) = toml.backend.url {
        config.backend_url = url.trim().to_string();
    }
    if let Some(timeout) = toml.backend.connect_timeout_ms {
        config.connect_timeout_ms = timeout;
    }
    if let Some(timeout) = toml.backend.request_timeout_ms {
        config.request_timeout_ms = timeout;
    }
    if let Some(capacity) = toml.backend.channel_capacity {
        config.channel_capacity = capacity;
    }

    if let Some(ref mode) = toml.session.default_mode {
        config.default_mode = mode
            .parse()
            .map_err(|e| ConfigError::ValidationError(format!("session.default_mode: {e}")))?;
    }

    Ok(())
}

/// Apply environment overrides
///
/// Unparseable values are ignored with a warning.
fn apply_env_config<F>(config: &mut ClientConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = env(ENV_BACKEND_URL) {
        config.backend_url = url.trim().to_string();
        config.source = ConfigSource::Env;
    }
    if let Some(mode) = env(ENV_MODE) {
        match mode.parse::<ChatMode>() {
            Ok(mode) => {
                config.default_mode = mode;
                config.source = ConfigSource::Env;
            }
            Err(e) => tracing::warn!(error = %e, "Ignoring {}", ENV_MODE),
        }
    }
    if let Some(timeout) = env(ENV_CONNECT_TIMEOUT) {
        if let Ok(ms) = timeout.parse::<u64>() {
            config.connect_timeout_ms = ms;
            config.source = ConfigSource::Env;
        } else {
            tracing::warn!(value = %timeout, "Ignoring {}", ENV_CONNECT_TIMEOUT);
        }
    }
    if let Some(timeout) = env(ENV_REQUEST_TIMEOUT) {
        if let Ok(ms) = timeout.parse::<u64>() {
            config.request_timeout_ms = ms;
            config.source = ConfigSource::Env;
        } else {
            tracing::warn!(value = %timeout, "Ignoring {}", ENV_REQUEST_TIMEOUT);
        }
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Command-line overrides, applied after [`load_config`]
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Backend URL override
    pub backend_url: Option<String>,

    /// Starting mode override
    pub default_mode: Option<ChatMode>,

    /// Connect timeout override (milliseconds)
    pub connect_timeout_ms: Option<u64>,
}

impl ConfigOverrides {
    /// Create an empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set backend URL override
    #[must_use]
    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = Some(url.into());
        self
    }

    /// Set starting mode override
    #[must_use]
    pub fn with_default_mode(mut self, mode: ChatMode) -> Self {
        self.default_mode = Some(mode);
        self
    }

    /// Set connect timeout override
    #[must_use]
    pub fn with_connect_timeout_ms(mut self, ms: u64) -> Self {
        self.connect_timeout_ms = Some(ms);
        self
    }

    /// Apply overrides and re-validate
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if an override makes the
    /// configuration invalid.
    pub fn apply(&self, config: &mut ClientConfig) -> Result<(), ConfigError> {
        if self.backend_url.is_some()
            || self.default_mode.is_some()
            || self.connect_timeout_ms.is_some()
        {
            config.source = ConfigSource::Cli;
        }

        if let Some(ref url) = self.backend_url {
            config.backend_url = url.trim().to_string();
        }
        if let Some(mode) = self.default_mode {
            config.default_mode = mode;
        }
        if let Some(timeout) = self.connect_timeout_ms {
            config.connect_timeout_ms = timeout;
        }

        config.validate()
    }
}
