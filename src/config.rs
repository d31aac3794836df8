//! Configuration management for the notes client.
//!
//! This module handles loading and saving client configuration to/from
//! a JSON file. The config directory can be customized.
//!
//! Settings:
//! - base_url: where the notes API lives (all endpoint paths are relative to it)
//! - request_timeout_secs / health_timeout_secs: request bounds
//! - endpoints: resource paths for notes, tags and categories
//! - insert_position: where a newly created entity lands in a held collection

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{NotesError, NotesResult};

/// Resource endpoint paths, relative to the base URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    #[serde(default = "default_notes_path")]
    pub notes: String,
    #[serde(default = "default_tags_path")]
    pub tags: String,
    #[serde(default = "default_categories_path")]
    pub categories: String,
}

fn default_notes_path() -> String {
    "/notes".to_string()
}

fn default_tags_path() -> String {
    "/tags".to_string()
}

fn default_categories_path() -> String {
    "/categories".to_string()
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            notes: default_notes_path(),
            tags: default_tags_path(),
            categories: default_categories_path(),
        }
    }
}

/// Where a newly created entity is placed in a held collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertPosition {
    Front,
    #[default]
    Back,
}

impl std::str::FromStr for InsertPosition {
    type Err = NotesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "front" => Ok(InsertPosition::Front),
            "back" => Ok(InsertPosition::Back),
            other => Err(NotesError::Config(format!(
                "insert_position must be 'front' or 'back', got '{}'",
                other
            ))),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigData {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Bound for the lightweight reachability check
    #[serde(default = "default_health_timeout_secs")]
    pub health_timeout_secs: u64,
    #[serde(default)]
    pub endpoints: Endpoints,
    #[serde(default)]
    pub insert_position: InsertPosition,
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_health_timeout_secs() -> u64 {
    5
}

impl Default for ConfigData {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            health_timeout_secs: default_health_timeout_secs(),
            endpoints: Endpoints::default(),
            insert_position: InsertPosition::default(),
        }
    }
}

impl ConfigData {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

/// Configuration manager
#[derive(Debug, Clone)]
pub struct Config {
    config_file: Option<PathBuf>,
    data: ConfigData,
}

impl Config {
    /// Create a new configuration manager backed by `config.json`
    ///
    /// Without the `desktop` feature, `config_dir` is required.
    pub fn new(config_dir: Option<PathBuf>) -> NotesResult<Self> {
        let config_dir = match config_dir {
            Some(dir) => dir,
            None => {
                #[cfg(feature = "desktop")]
                {
                    dirs::config_dir()
                        .unwrap_or_else(|| PathBuf::from("."))
                        .join("notes")
                }
                #[cfg(not(feature = "desktop"))]
                {
                    return Err(NotesError::Config(
                        "config_dir is required without the desktop feature".to_string(),
                    ));
                }
            }
        };

        fs::create_dir_all(&config_dir)?;
        let config_file = config_dir.join("config.json");

        let data = if config_file.exists() {
            let content = fs::read_to_string(&config_file)?;
            match serde_json::from_str(&content) {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!(
                        "Ignoring unreadable config file {}: {}",
                        config_file.display(),
                        e
                    );
                    ConfigData::default()
                }
            }
        } else {
            ConfigData::default()
        };

        let config = Self {
            config_file: Some(config_file),
            data,
        };

        if let Some(path) = &config.config_file {
            if !path.exists() {
                config.save()?;
            }
        }

        Ok(config)
    }

    /// Configuration that lives only in memory; `save` is a no-op.
    pub fn in_memory(data: ConfigData) -> Self {
        Self {
            config_file: None,
            data,
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> NotesResult<()> {
        if let Some(path) = &self.config_file {
            let content = serde_json::to_string_pretty(&self.data)?;
            fs::write(path, content)?;
        }
        Ok(())
    }

    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    pub fn data(&self) -> &ConfigData {
        &self.data
    }

    /// Base URL with any trailing slash removed
    pub fn base_url(&self) -> &str {
        self.data.base_url.trim_end_matches('/')
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.data.request_timeout_secs)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.data.health_timeout_secs)
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.data.endpoints
    }

    pub fn insert_position(&self) -> InsertPosition {
        self.data.insert_position
    }

    /// Override the base URL for this process without persisting it
    pub fn override_base_url(&mut self, base_url: &str) {
        self.data.base_url = base_url.to_string();
    }

    /// Get a configuration value
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "base_url" => Some(self.data.base_url.clone()),
            "request_timeout_secs" => Some(self.data.request_timeout_secs.to_string()),
            "health_timeout_secs" => Some(self.data.health_timeout_secs.to_string()),
            "endpoints.notes" => Some(self.data.endpoints.notes.clone()),
            "endpoints.tags" => Some(self.data.endpoints.tags.clone()),
            "endpoints.categories" => Some(self.data.endpoints.categories.clone()),
            "insert_position" => Some(
                match self.data.insert_position {
                    InsertPosition::Front => "front",
                    InsertPosition::Back => "back",
                }
                .to_string(),
            ),
            _ => None,
        }
    }

    /// Set a configuration value
    pub fn set(&mut self, key: &str, value: &str) -> NotesResult<()> {
        match key {
            "base_url" => self.data.base_url = value.to_string(),
            "request_timeout_secs" => self.data.request_timeout_secs = parse_secs(key, value)?,
            "health_timeout_secs" => self.data.health_timeout_secs = parse_secs(key, value)?,
            "endpoints.notes" => self.data.endpoints.notes = value.to_string(),
            "endpoints.tags" => self.data.endpoints.tags = value.to_string(),
            "endpoints.categories" => self.data.endpoints.categories = value.to_string(),
            "insert_position" => self.data.insert_position = value.parse()?,
            _ => return Err(NotesError::Config(format!("Unknown config key: {}", key))),
        }
        self.save()
    }
}

fn parse_secs(key: &str, value: &str) -> NotesResult<u64> {
    match value.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(NotesError::Config(format!(
            "{} must be a positive number of seconds, got '{}'",
            key, value
        ))),
    }
}
