//! Cache configuration.
//!
//! Loaded from TOML, then optionally overridden from the environment.
//!
//! # Environment Variables
//!
//! - `STATCACHE_DIR`: cache directory (default: `cache`)
//! - `STATCACHE_DISABLE`: `1`/`true`/`yes` turns caching off

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_DIR: &str = "STATCACHE_DIR";
pub const ENV_DISABLE: &str = "STATCACHE_DISABLE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("parse config TOML: {0}")]
    Parse(String),
}

/// Where the cache lives and whether it is used at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub dir: PathBuf,
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("cache"),
            enabled: true,
        }
    }
}

impl CacheConfig {
    /// Load from a TOML file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse from a TOML string, either flat or under a `[cache]` table.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        #[derive(Deserialize)]
        struct Wrapped {
            cache: CacheConfig,
        }

        let value: toml::Table =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        if value.contains_key("cache") {
            toml::from_str::<Wrapped>(content)
                .map(|w| w.cache)
                .map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
        }
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().apply_env()
    }

    /// Apply `STATCACHE_DIR` / `STATCACHE_DISABLE` on top of this config.
    pub fn apply_env(self) -> Self {
        self.apply_overrides(env::var(ENV_DIR).ok(), env::var(ENV_DISABLE).ok())
    }

    fn apply_overrides(mut self, dir: Option<String>, disable: Option<String>) -> Self {
        if let Some(dir) = dir.filter(|d| !d.trim().is_empty()) {
            self.dir = PathBuf::from(dir);
        }
        if let Some(flag) = disable {
            if matches!(flag.trim().to_lowercase().as_str(), "1" | "true" | "yes") {
                self.enabled = false;
            }
        }
        self
    }
}
