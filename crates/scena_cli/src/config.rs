//! Scena configuration file handling

use anyhow::{Context, Result};
use scena_animation::{Easing, DEFAULT_TICK_HZ};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// File looked up in the working directory when no `--config` is given
pub const CONFIG_FILE: &str = "scena.toml";

/// Top-level Scena configuration (scena.toml)
#[derive(Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ScenaConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Preview playback configuration
#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct PlaybackConfig {
    /// Ticks per second while previewing
    #[serde(default = "default_tick_hz")]
    pub tick_hz: u32,
    /// Curve applied to linear progress
    #[serde(default)]
    pub easing: Easing,
}

fn default_tick_hz() -> u32 {
    DEFAULT_TICK_HZ
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_hz: default_tick_hz(),
            easing: Easing::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct LogConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

impl ScenaConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `scena.toml` in the working
    /// directory is used if present, and defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_file(path),
            None => {
                let path = Path::new(CONFIG_FILE);
                if path.exists() {
                    Self::load_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load configuration from a specific file
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}
