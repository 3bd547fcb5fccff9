//! Configuration management for the announcer
//!
//! This module handles loading and validating configuration from a TOML file
//! and environment variable overrides. A validated [`Config`] is turned into a
//! live [`ConfigHandle`] that the scheduler snapshots once per cycle.

mod handle;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::dispatch::DisplayMode;
use crate::models::{Announcement, GLOBAL_DESTINATION};
use crate::scheduler::SelectionMethod;

pub use handle::{ConfigHandle, Settings, Snapshot};

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// File is not valid TOML for the expected layout
    #[error("Failed to parse TOML config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// Environment override has an unusable value
    #[error("Invalid value '{value}' for environment variable {var}")]
    Env { var: String, value: String },

    /// A value failed validation
    #[error("Invalid configuration for '{field}': {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    /// Create a validation error
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ticks between announcement cycles
    pub delay: u32,

    /// Text placed in front of every announcement (legacy `&` codes)
    pub prefix: String,

    /// Selection policy
    pub method: SelectionMethod,

    /// Delivery transport
    pub display: DisplayMode,

    /// How many ticks an action bar announcement stays up
    pub action_bar_period: u32,

    /// Title overlay settings
    pub title: TitleDisplay,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Announcements in rotation order
    pub announcements: Vec<AnnouncementConfig>,
}

/// A single configured announcement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnouncementConfig {
    /// Unique key
    pub name: String,

    /// Body text
    pub text: String,

    /// Destination names, `"global"`, or regex patterns
    #[serde(default = "default_servers")]
    pub servers: Vec<String>,
}

fn default_servers() -> Vec<String> {
    vec![GLOBAL_DESTINATION.to_string()]
}

impl From<&AnnouncementConfig> for Announcement {
    fn from(config: &AnnouncementConfig) -> Self {
        Announcement::new(&config.name, &config.text, &config.servers)
    }
}

/// Title overlay timing (in client ticks) and headline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleDisplay {
    pub fade_in: u32,
    pub stay: u32,
    pub fade_out: u32,
    pub title: String,
}

impl Default for TitleDisplay {
    fn default() -> Self {
        Self {
            fade_in: 20,
            stay: 60,
            fade_out: 20,
            title: String::from("&6Announcement"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Read a file, apply environment overrides and validate
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: "<inline>".to_string(),
            source: e,
        })
    }

    /// Apply `ANNOUNCER_*` environment overrides
    pub fn apply_env(&mut self) -> ConfigResult<()> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// Apply overrides from an arbitrary lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("ANNOUNCER_DELAY") {
            self.delay = value.parse().map_err(|_| ConfigError::Env {
                var: "ANNOUNCER_DELAY".to_string(),
                value: value.clone(),
            })?;
        }

        if let Some(value) = lookup("ANNOUNCER_METHOD") {
            self.method = value.parse().map_err(|_| ConfigError::Env {
                var: "ANNOUNCER_METHOD".to_string(),
                value: value.clone(),
            })?;
        }

        if let Some(value) = lookup("ANNOUNCER_DISPLAY") {
            self.display = value.parse().map_err(|_| ConfigError::Env {
                var: "ANNOUNCER_DISPLAY".to_string(),
                value: value.clone(),
            })?;
        }

        if let Some(value) = lookup("ANNOUNCER_LOG_LEVEL") {
            self.logging.level = value;
        }

        if let Some(value) = lookup("ANNOUNCER_LOG_FORMAT") {
            self.logging.format = value;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.delay == 0 {
            return Err(ConfigError::invalid("delay", "must be at least 1 tick"));
        }

        if self.action_bar_period == 0 {
            return Err(ConfigError::invalid(
                "action_bar_period",
                "must be at least 1 tick",
            ));
        }

        let mut seen = HashSet::new();
        for announcement in &self.announcements {
            if announcement.name.trim().is_empty() {
                return Err(ConfigError::invalid("announcements.name", "must not be empty"));
            }

            if !seen.insert(announcement.name.as_str()) {
                return Err(ConfigError::invalid(
                    "announcements.name",
                    format!("duplicate announcement '{}'", announcement.name),
                ));
            }

            if announcement.servers.is_empty() {
                return Err(ConfigError::invalid(
                    format!("announcements.{}.servers", announcement.name),
                    "at least one destination is required",
                ));
            }
        }

        Ok(())
    }

    /// Announcements in rotation order
    pub fn announcement_list(&self) -> Vec<Announcement> {
        self.announcements.iter().map(Announcement::from).collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            delay: 300,
            prefix: String::from("&6[&cAnnouncement&6] &r"),
            method: SelectionMethod::Sequential,
            display: DisplayMode::Chat,
            action_bar_period: 5,
            title: TitleDisplay::default(),
            logging: LoggingConfig::default(),
            announcements: Vec::new(),
        }
    }
}
