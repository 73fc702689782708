//! Configuration management for realbotd.
//!
//! Loads settings from /etc/realbot/config.toml, then ./realbot.toml, or uses
//! defaults. Environment variables (OPENAI_API_KEY, PORT, REALBOT_DATA_DIR)
//! override whatever the file said.

use anyhow::{Context, Result};
use realbot_shared::analytics::DEFAULT_MAX_CONVERSATIONS;
use realbot_shared::{ANALYTICS_FILE, KNOWLEDGE_FILE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// System-wide config file path
pub const CONFIG_PATH: &str = "/etc/realbot/config.toml";

/// Local override, relative to the working directory
pub const LOCAL_CONFIG_PATH: &str = "realbot.toml";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration: {}", .0.join(", "))]
    MissingKeys(Vec<String>),
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Chat completion backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Never ship a key in the file; prefer OPENAI_API_KEY
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Whole-request timeout; on expiry the visitor gets the apology
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    "https://api.openai.com".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    500
}

fn default_timeout() -> u64 {
    30
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_endpoint(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// tracing filter directive; RUST_LOG wins when set
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default = "default_analytics_enabled")]
    pub enabled: bool,

    #[serde(default = "default_max_conversations")]
    pub max_conversations: usize,
}

fn default_analytics_enabled() -> bool {
    true
}

fn default_max_conversations() -> usize {
    DEFAULT_MAX_CONVERSATIONS
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            enabled: default_analytics_enabled(),
            max_conversations: default_max_conversations(),
        }
    }
}

/// Where the JSON documents live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
        }
    }
}

/// Full daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub openai: OpenAiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub analytics: AnalyticsConfig,

    #[serde(default)]
    pub data: DataConfig,
}

impl Config {
    /// Load config from an explicit path, or from the standard locations,
    /// or return defaults. An explicit path that fails to load is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_path(path);
        }

        Self::load_first(&[Path::new(CONFIG_PATH), Path::new(LOCAL_CONFIG_PATH)])
    }

    /// Load the first candidate that exists. Only a missing file falls
    /// through to the next one; an unreadable or malformed file is an error.
    fn load_first(candidates: &[&Path]) -> Result<Self> {
        for path in candidates {
            match fs::metadata(path) {
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                _ => return Self::load_from_path(path),
            }
        }

        warn!("No config file found, using defaults");
        Ok(Config::default())
    }

    /// Load config from specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply environment overrides. `lookup` is `std::env::var(..).ok()` in
    /// production and a map in tests.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()) {
            info!("Using OpenAI API key from environment variables");
            self.openai.api_key = Some(key);
        }

        if let Some(port) = lookup("PORT") {
            match port.parse::<u16>() {
                Ok(p) => self.server.port = p,
                Err(_) => warn!("Ignoring invalid PORT value: {}", port),
            }
        }

        if let Some(dir) = lookup("REALBOT_DATA_DIR") {
            self.data.dir = PathBuf::from(dir);
        }
    }

    /// Check required settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut missing = Vec::new();

        let has_key = self
            .openai
            .api_key
            .as_deref()
            .map(|k| !k.trim().is_empty())
            .unwrap_or(false);
        if !has_key {
            missing.push("openai.api_key".to_string());
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingKeys(missing))
        }
    }

    /// Write this config as TOML, creating parent dirs
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, content)?;
        info!("Saved config to {}", path.display());
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn knowledge_path(&self) -> PathBuf {
        self.data.dir.join(KNOWLEDGE_FILE)
    }

    pub fn analytics_path(&self) -> PathBuf {
        self.data.dir.join(ANALYTICS_FILE)
    }
}
