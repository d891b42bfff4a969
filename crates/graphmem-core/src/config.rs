//! Configuration management for graphmem.
//!
//! Configuration is loaded from multiple sources with precedence:
//! 1. Environment variables (GRAPHMEM_*)
//! 2. Config file ($GRAPHMEM_CONFIG or <config dir>/graphmem/config.toml)
//! 3. Default values
//!
//! The resulting [`Config`] is built once and passed by reference to the
//! client and both pipelines; nothing mutates it afterwards.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Knowledge graph service settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Automatic recall before each turn
    #[serde(default)]
    pub recall: RecallConfig,

    /// Automatic capture of conversation content
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Content filters shared by both pipelines
    #[serde(default)]
    pub filters: FilterConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the knowledge graph service
    #[serde(default = "default_url")]
    pub url: String,

    /// Bearer token, sent only when set
    #[serde(default)]
    pub token: Option<String>,

    /// Group namespace for every search, ingest and listing
    #[serde(default = "default_group_id")]
    pub group_id: String,

    /// Health check timeout in milliseconds
    #[serde(default = "default_health_timeout_ms")]
    pub health_timeout_ms: u64,

    /// Search, ingest and get-memory timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Episode listing timeout in milliseconds
    #[serde(default = "default_episodes_timeout_ms")]
    pub episodes_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecallConfig {
    /// Inject facts before each turn (autoRecall)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Prompts shorter than this (in characters) are not searched
    #[serde(default = "default_min_prompt_length")]
    pub min_prompt_length: usize,

    /// Facts requested per recall
    #[serde(default = "default_recall_max_facts")]
    pub max_facts: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Capture before compaction and reset (autoCapture)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Also capture the last exchange after each successful turn
    #[serde(default)]
    pub on_turn_end: bool,

    /// Hard cap on one episode body, in characters
    #[serde(default = "default_max_episode_chars")]
    pub max_episode_chars: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Operational sentinels; prompts or turns containing one are ignored
    #[serde(default = "default_skip_markers")]
    pub skip_markers: Vec<String>,

    /// Turns consisting only of one of these phrases are not captured
    #[serde(default = "default_acknowledgements")]
    pub acknowledgements: Vec<String>,
}

// Default value functions
fn default_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_group_id() -> String {
    "default".to_string()
}

fn default_health_timeout_ms() -> u64 {
    5_000
}

fn default_request_timeout_ms() -> u64 {
    15_000
}

fn default_episodes_timeout_ms() -> u64 {
    10_000
}

fn default_true() -> bool {
    true
}

fn default_min_prompt_length() -> usize {
    10
}

fn default_recall_max_facts() -> usize {
    1
}

fn default_max_episode_chars() -> usize {
    12_000
}

fn default_skip_markers() -> Vec<String> {
    [
        "HEARTBEAT",
        "NO_REPLY",
        "BOOT_CHECK",
        "Pre-compaction memory flush",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_acknowledgements() -> Vec<String> {
    [
        "ok", "okay", "k", "thanks", "thank you", "thx", "got it", "sure", "yes", "no",
        "yep", "nope", "cool", "great", "done", "sounds good",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            token: None,
            group_id: default_group_id(),
            health_timeout_ms: default_health_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            episodes_timeout_ms: default_episodes_timeout_ms(),
        }
    }
}

impl Default for RecallConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            min_prompt_length: default_min_prompt_length(),
            max_facts: default_recall_max_facts(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            on_turn_end: false,
            max_episode_chars: default_max_episode_chars(),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            skip_markers: default_skip_markers(),
            acknowledgements: default_acknowledgements(),
        }
    }
}

impl ServerConfig {
    pub fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.health_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn episodes_timeout(&self) -> Duration {
        Duration::from_millis(self.episodes_timeout_ms)
    }
}

impl FilterConfig {
    /// First configured skip marker contained in `text`
    pub fn skip_marker_in<'a>(&'a self, text: &str) -> Option<&'a str> {
        self.skip_markers
            .iter()
            .map(String::as_str)
            .find(|marker| !marker.is_empty() && text.contains(marker))
    }

    /// Whether `text` is nothing but an acknowledgement phrase
    pub fn is_acknowledgement(&self, text: &str) -> bool {
        if self.acknowledgements.is_empty() {
            return false;
        }
        let normalized = text
            .trim()
            .trim_end_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace())
            .to_lowercase();
        self.acknowledgements
            .iter()
            .any(|phrase| phrase.to_lowercase() == normalized)
    }
}

impl Config {
    /// Load configuration from file and environment.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults when it
    /// does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize to pretty TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Apply GRAPHMEM_URL, GRAPHMEM_TOKEN and GRAPHMEM_GROUP_ID overrides.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("GRAPHMEM_URL") {
            self.server.url = url;
        }
        if let Some(token) = lookup("GRAPHMEM_TOKEN") {
            self.server.token = if token.trim().is_empty() { None } else { Some(token) };
        }
        if let Some(group_id) = lookup("GRAPHMEM_GROUP_ID") {
            self.server.group_id = group_id;
        }
    }

    /// Get the config file path.
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("GRAPHMEM_CONFIG") {
            PathBuf::from(path)
        } else {
            default_config_dir().join("config.toml")
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        if self.server.url.trim().is_empty() {
            return Err(ConfigValidationError::MissingUrl);
        }

        if !self.server.url.starts_with("http://") && !self.server.url.starts_with("https://") {
            return Err(ConfigValidationError::InvalidValue {
                field: "server.url".into(),
                message: "must start with http:// or https://".into(),
            });
        }

        if self.server.group_id.trim().is_empty() {
            return Err(ConfigValidationError::MissingGroupId);
        }

        if self.recall.max_facts == 0 {
            return Err(ConfigValidationError::InvalidValue {
                field: "recall.max_facts".into(),
                message: "must be greater than 0".into(),
            });
        }

        if self.capture.max_episode_chars == 0 {
            return Err(ConfigValidationError::InvalidValue {
                field: "capture.max_episode_chars".into(),
                message: "must be greater than 0".into(),
            });
        }

        Ok(())
    }
}

fn default_config_dir() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("dev", "graphmem", "graphmem") {
        proj_dirs.config_dir().to_path_buf()
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".graphmem")
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("server.url is required")]
    MissingUrl,

    #[error("server.group_id is required")]
    MissingGroupId,

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<ConfigValidationError> for Error {
    fn from(e: ConfigValidationError) -> Self {
        Error::Config(e.to_string())
    }
}
