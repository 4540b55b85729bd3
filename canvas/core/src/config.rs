//! TOML Configuration File Support
//!
//! Configuration for the research client, loaded from
//! `~/.config/research-canvas/canvas.toml` plus environment overrides.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (via [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [backend]
//! url = "http://localhost:8000"
//! request_timeout_ms = 60000
//!
//! [session]
//! default_title = "New Research"
//! carry_pending_text = true
//!
//! [display]
//! notice_secs = 4
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Placeholder title for new conversations
pub const DEFAULT_CONVERSATION_TITLE: &str = "New Research";

/// Backend address used when nothing else is configured
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Smallest controller-to-surface channel accepted
///
/// One intent or one completion emits at most a handful of messages; the
/// surface drains the channel after each of them.
pub const MIN_CHANNEL_CAPACITY: usize = 16;

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

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
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
    /// Base URL of the research backend
    pub url: Option<String>,

    /// Per-request timeout in milliseconds
    pub request_timeout_ms: Option<u64>,
}

/// `[session]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionToml {
    /// Title given to newly created conversations
    pub default_title: Option<String>,

    /// Send text typed with no selection to the conversation created for it
    pub carry_pending_text: Option<bool>,
}

/// `[display]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayToml {
    /// How long notices stay in the status bar
    pub notice_secs: Option<u64>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasToml {
    /// Backend section
    pub backend: BackendToml,

    /// Session section
    pub session: SessionToml,

    /// Display section
    pub display: DisplayToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Client configuration
///
/// Use [`load_config`] to load it with proper priority handling.
#[derive(Clone, Debug)]
pub struct CanvasConfig {
    /// Base URL of the research backend
    pub backend_url: String,

    /// Per-request HTTP timeout
    pub request_timeout: Duration,

    /// Title for newly created conversations
    pub default_title: String,

    /// Whether text submitted with no selection is sent to the conversation
    /// created for it (otherwise it is dropped)
    pub carry_pending_text: bool,

    /// How long a notice stays visible
    pub notice_duration: Duration,

    /// Capacity of the controller-to-surface channel
    pub channel_capacity: usize,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    pub source: ConfigSource,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout: Duration::from_secs(120),
            default_title: DEFAULT_CONVERSATION_TITLE.to_string(),
            carry_pending_text: true,
            notice_duration: Duration::from_secs(4),
            channel_capacity: 256,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl CanvasConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Reject values the client cannot work with
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.backend_url.starts_with("http://") || self.backend_url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "backend url must start with http:// or https://, got '{}'",
                self.backend_url
            )));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "request timeout must be greater than zero".to_string(),
            ));
        }
        if self.default_title.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "default conversation title must not be blank".to_string(),
            ));
        }
        if self.channel_capacity < MIN_CHANNEL_CAPACITY {
            return Err(ConfigError::ValidationError(format!(
                "channel capacity must be at least {MIN_CHANNEL_CAPACITY}, got {}",
                self.channel_capacity
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/research-canvas/canvas.toml` or
/// `~/.config/research-canvas/canvas.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("research-canvas").join("canvas.toml"))
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if
/// the merged values fail validation. A missing config file is not an error.
pub fn load_config() -> Result<CanvasConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path, reading the process environment
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<CanvasConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration with an explicit environment lookup
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed,
/// or if the result fails [`CanvasConfig::validate`].
pub fn load_config_with_env<F>(path: Option<PathBuf>, env: F) -> Result<CanvasConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = CanvasConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: CanvasToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
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

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut CanvasConfig, toml: &CanvasToml) {
    if let Some(ref url) = toml.backend.url {
        config.backend_url = url.clone();
    }
    if let Some(ms) = toml.backend.request_timeout_ms {
        config.request_timeout = Duration::from_millis(ms);
    }
    if let Some(ref title) = toml.session.default_title {
        config.default_title = title.clone();
    }
    if let Some(carry) = toml.session.carry_pending_text {
        config.carry_pending_text = carry;
    }
    if let Some(secs) = toml.display.notice_secs {
        config.notice_duration = Duration::from_secs(secs);
    }
}

/// Apply environment variable overrides to the config
fn apply_env_config<F>(config: &mut CanvasConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = env("CANVAS_BACKEND_URL").or_else(|| env("BACKEND_URL")) {
        config.backend_url = url;
        config.source = ConfigSource::Env;
    }
    if let Some(timeout) = env("CANVAS_REQUEST_TIMEOUT_MS") {
        match timeout.parse::<u64>() {
            Ok(ms) => {
                config.request_timeout = Duration::from_millis(ms);
                config.source = ConfigSource::Env;
            }
            Err(_) => tracing::warn!(value = %timeout, "Ignoring unparsable CANVAS_REQUEST_TIMEOUT_MS"),
        }
    }
    if let Some(title) = env("CANVAS_DEFAULT_TITLE") {
        config.default_title = title;
        config.source = ConfigSource::Env;
    }
    if let Some(carry) = env("CANVAS_CARRY_PENDING_TEXT") {
        config.carry_pending_text = carry != "0" && carry.to_lowercase() != "false";
        config.source = ConfigSource::Env;
    }
    if let Some(secs) = env("CANVAS_NOTICE_SECS") {
        if let Ok(s) = secs.parse::<u64>() {
            config.notice_duration = Duration::from_secs(s);
            config.source = ConfigSource::Env;
        }
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Backend URL override
    pub backend_url: Option<String>,

    /// Request timeout override (milliseconds)
    pub request_timeout_ms: Option<u64>,

    /// Pending text carry override
    pub carry_pending_text: Option<bool>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
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

    /// Set request timeout override
    #[must_use]
    pub fn with_request_timeout_ms(mut self, ms: u64) -> Self {
        self.request_timeout_ms = Some(ms);
        self
    }

    /// Set pending text carry override
    #[must_use]
    pub fn with_carry_pending_text(mut self, carry: bool) -> Self {
        self.carry_pending_text = Some(carry);
        self
    }

    /// Whether any override is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.backend_url.is_none()
            && self.request_timeout_ms.is_none()
            && self.carry_pending_text.is_none()
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut CanvasConfig) {
        if !self.is_empty() {
            config.source = ConfigSource::Cli;
        }

        if let Some(ref url) = self.backend_url {
            config.backend_url = url.clone();
        }
        if let Some(ms) = self.request_timeout_ms {
            config.request_timeout = Duration::from_millis(ms);
        }
        if let Some(carry) = self.carry_pending_text {
            config.carry_pending_text = carry;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
