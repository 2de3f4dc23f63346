//! Configuration file support for quickrewind.
//!
//! This module handles loading and validating user settings from the
//! configuration file located at `~/.config/quickrewind/config.toml`.
//! Settings include the rolling-buffer length, active-recording frame rate
//! and duration ceiling, and the output folder for exported artifacts.
//!
//! If no config file exists, sensible defaults are used automatically. The
//! capture scheduler reads these values at construction only; changing them
//! requires rebuilding the scheduler, so the configuration stays the single
//! source of truth for capture parameters.

pub mod types;

pub use types::{CaptureConfig, OutputConfig};

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Main configuration structure containing all user settings.
///
/// # Example TOML
/// ```toml
/// [capture]
/// buffer_seconds = 30
/// recording_fps = 10
/// max_recording_minutes = 3
///
/// [output]
/// folder = "~/QuickRewind"
/// ```
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    /// Buffer sizing and active-recording limits
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Export destination settings
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Validates and clamps all configuration values to acceptable ranges.
    ///
    /// Invalid values are clamped to the nearest valid value and a warning
    /// is logged.
    ///
    /// Validated ranges:
    /// - `buffer_seconds`: 10 - 60
    /// - `recording_fps`: 5 - 30
    /// - `max_recording_minutes`: 1 - 15
    fn validate_and_clamp(&mut self) {
        if !(10..=60).contains(&self.capture.buffer_seconds) {
            log::warn!(
                "Invalid buffer_seconds {}, clamping to 10-60 range",
                self.capture.buffer_seconds
            );
            self.capture.buffer_seconds = self.capture.buffer_seconds.clamp(10, 60);
        }

        if !(5..=30).contains(&self.capture.recording_fps) {
            log::warn!(
                "Invalid recording_fps {}, clamping to 5-30 range",
                self.capture.recording_fps
            );
            self.capture.recording_fps = self.capture.recording_fps.clamp(5, 30);
        }

        if !(1..=15).contains(&self.capture.max_recording_minutes) {
            log::warn!(
                "Invalid max_recording_minutes {}, clamping to 1-15 range",
                self.capture.max_recording_minutes
            );
            self.capture.max_recording_minutes = self.capture.max_recording_minutes.clamp(1, 15);
        }

        // Expand ~ in the output folder so downstream path handling sees a
        // real directory.
        if let Some(s) = self.output.folder.to_str() {
            self.output.folder = expand_tilde(s);
        }
    }

    /// Returns the path to the configuration file.
    ///
    /// The config file is located at `~/.config/quickrewind/config.toml`.
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be determined
    /// (e.g., HOME not set).
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("quickrewind");

        Ok(config_dir.join("config.toml"))
    }

    /// Loads configuration from file, or returns defaults if not found.
    ///
    /// All loaded values are validated and clamped to acceptable ranges.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The config directory path cannot be determined
    /// - The file exists but cannot be read
    /// - The file exists but contains invalid TOML syntax
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            info!("Config file not found, using defaults");
            debug!("Expected config at: {}", config_path.display());
            return Ok(Self::default());
        }

        let config_str = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        let config = Self::from_toml_str(&config_str)
            .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

        info!("Loaded config from {}", config_path.display());
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Parses configuration from a TOML string, clamping invalid values.
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(config_str)?;
        config.validate_and_clamp();
        Ok(config)
    }

    /// Saves the current configuration to file.
    ///
    /// Creates the parent directory if it doesn't exist.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The config directory cannot be created
    /// - The config cannot be serialized to TOML
    /// - The file cannot be written
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let config_str = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_path, config_str)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        info!("Saved config to {}", config_path.display());
        Ok(())
    }
}

/// Expand tilde (~) in path strings.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(stripped);
    }
    PathBuf::from(path)
}
