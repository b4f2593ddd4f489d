//! CLI configuration management.
//!
//! Values come from environment variables, a JSON config file and built-in
//! defaults, in that order of precedence.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_TICKS: u32 = 300;

/// Application-wide configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the wallet server.
    pub server_url: String,

    /// Per-request timeout.
    pub timeout_secs: u64,

    /// Tick limit for `bm render` when `--ticks` is not given.
    pub max_ticks: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_ticks: DEFAULT_MAX_TICKS,
        }
    }
}

impl Config {
    /// Load configuration from environment variables and config file.
    pub fn load() -> Result<Self> {
        // Load .env file if present (silently ignore if missing)
        let _ = dotenvy::dotenv();

        let mut config = Self::load_file()?;
        config.apply_env()?;
        Ok(config)
    }

    /// Load only the persisted config file, or defaults when there is none.
    ///
    /// Use this before [`Config::save`] so environment overrides never end
    /// up in the file.
    pub fn load_file() -> Result<Self> {
        match Self::config_file_path() {
            Some(path) if path.exists() => {
                let contents = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config from {}", path.display()))?;
                serde_json::from_str(&contents)
                    .with_context(|| format!("Failed to parse config file {}", path.display()))
            }
            _ => Ok(Self::default()),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("BUBBLEMAP_SERVER_URL") {
            self.server_url = url;
        }
        if let Ok(timeout) = std::env::var("BUBBLEMAP_TIMEOUT_SECS") {
            self.timeout_secs = timeout
                .parse()
                .with_context(|| format!("Invalid BUBBLEMAP_TIMEOUT_SECS: {timeout}"))?;
        }
        if let Ok(ticks) = std::env::var("BUBBLEMAP_MAX_TICKS") {
            self.max_ticks = ticks
                .parse()
                .with_context(|| format!("Invalid BUBBLEMAP_MAX_TICKS: {ticks}"))?;
        }
        Ok(())
    }

    /// Save current configuration to the config file.
    pub fn save(&self) -> Result<()> {
        if let Some(config_path) = Self::config_file_path() {
            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create config directory: {}", parent.display())
                })?;
            }
            let contents = serde_json::to_string_pretty(self)?;
            std::fs::write(&config_path, contents)
                .with_context(|| format!("Failed to write config to {}", config_path.display()))?;
        }
        Ok(())
    }

    /// Get the path to the config file.
    ///
    /// `BUBBLEMAP_CONFIG_DIR` overrides the platform config directory.
    pub fn config_file_path() -> Option<PathBuf> {
        if let Some(dir) = std::env::var_os("BUBBLEMAP_CONFIG_DIR") {
            return Some(PathBuf::from(dir).join("config.json"));
        }
        ProjectDirs::from("dev", "bubblemap", "bm")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
