//! Top-level application configuration.
//!
//! Configuration is stored in `.helpqueue/config.yaml` (or the file named by
//! `HELPQUEUE_CONFIG`) and includes:
//! - Remote collection name and ordering field
//! - Wait-time refresh interval
//! - Error recovery and write-failure policies

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HelpQueueError, Result};
use crate::types::{DEFAULT_COLLECTION, DEFAULT_ORDER_BY};

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "HELPQUEUE_CONFIG";

/// Directory holding the default config file
pub const CONFIG_DIR: &str = ".helpqueue";

/// What happens to a subscription error once the feed delivers data again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorRecovery {
    /// The error view stays until the controller is rebuilt
    #[default]
    Sticky,
    /// The next successful snapshot clears the error
    ClearOnSnapshot,
}

/// How a rejected create/update/delete is surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteFailurePolicy {
    /// Return the error and show it as a notice until the next successful write
    #[default]
    Banner,
    /// Only return the error to the caller
    Propagate,
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Remote collection holding the tickets (default: tickets)
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Field the live feed is ordered by (default: timeOpen)
    #[serde(default = "default_order_by")]
    pub order_by: String,

    /// Seconds between wait-time refreshes (default: 60)
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    #[serde(default)]
    pub error_recovery: ErrorRecovery,

    #[serde(default)]
    pub write_failure: WriteFailurePolicy,
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

fn default_order_by() -> String {
    DEFAULT_ORDER_BY.to_string()
}

fn default_refresh_interval_secs() -> u64 {
    60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            order_by: default_order_by(),
            refresh_interval_secs: default_refresh_interval_secs(),
            error_recovery: ErrorRecovery::default(),
            write_failure: WriteFailurePolicy::default(),
        }
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> PathBuf {
        match env::var(CONFIG_ENV) {
            Ok(path) if !path.is_empty() => PathBuf::from(path),
            _ => PathBuf::from(CONFIG_DIR).join("config.yaml"),
        }
    }

    /// Load configuration from the default location, or return defaults if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, or return defaults if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            HelpQueueError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config at {}: {}", path.display(), e),
            ))
        })?;
        let config: Config = serde_yaml_ng::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| {
                HelpQueueError::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create directory for config at {}: {}",
                        parent.display(),
                        e
                    ),
                ))
            })?;
        }

        let content = serde_yaml_ng::to_string(self)?;
        fs::write(path, content).map_err(|e| {
            HelpQueueError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write config at {}: {}", path.display(), e),
            ))
        })?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.collection.trim().is_empty() {
            return Err(HelpQueueError::Config(
                "collection cannot be empty".to_string(),
            ));
        }
        if self.order_by.trim().is_empty() {
            return Err(HelpQueueError::Config("order_by cannot be empty".to_string()));
        }
        if self.refresh_interval_secs == 0 {
            return Err(HelpQueueError::Config(
                "refresh_interval_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the wait-time refresh interval
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}
