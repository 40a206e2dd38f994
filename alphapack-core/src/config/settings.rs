//! Settings configuration loaded from TOML files.
//!
//! Non-sensitive configuration lives in the XDG config directory
//! (`~/.config/alphapack/config.toml`). A default file is written on first
//! run so operators have something to edit.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Errors that can occur when loading settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config directory not found")]
    NoConfigDir,

    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settings file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize default settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Discord-facing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordSettings {
    /// Whether the bot reacts to commands at all.
    pub enabled: bool,
    /// Command prefix, e.g. `*pack count`.
    pub command_prefix: String,
    /// Only channels whose name contains this fragment are watched.
    pub channel_name_fragment: String,
}

impl Default for DiscordSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            command_prefix: "*pack".to_string(),
            channel_name_fragment: "pack".to_string(),
        }
    }
}

/// Image download and history fetch tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingSettings {
    /// Process-wide cap on simultaneous image downloads.
    pub download_concurrency: usize,
    /// Initial delay before retrying a rate-limited history page.
    pub fetch_retry_initial_ms: u64,
    /// Maximum attempts per history page before giving up.
    pub fetch_retry_max_attempts: u32,
    /// Optional override for the embedded calibration table.
    pub signatures_path: Option<PathBuf>,
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            download_concurrency: 16,
            fetch_retry_initial_ms: 5000,
            fetch_retry_max_attempts: 5,
            signatures_path: None,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default tracing filter when RUST_LOG is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Full settings tree as stored in the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub discord: DiscordSettings,
    pub processing: ProcessingSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Load settings from the default path, writing defaults on first run.
    pub fn load() -> Result<Self, SettingsError> {
        let path = Self::settings_path()?;
        Self::load_from(&path)
    }

    /// Load settings from an explicit path, writing defaults if missing.
    pub fn load_from(path: &PathBuf) -> Result<Self, SettingsError> {
        if !path.exists() {
            let defaults = Self::default();
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, toml::to_string_pretty(&defaults)?)?;
            return Ok(defaults);
        }

        let raw = fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Default settings file location.
    pub fn settings_path() -> Result<PathBuf, SettingsError> {
        let config_dir = dirs::config_dir().ok_or(SettingsError::NoConfigDir)?;
        Ok(config_dir.join("alphapack").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let settings = Settings::default();
        assert!(settings.discord.enabled);
        assert_eq!(settings.discord.command_prefix, "*pack");
        assert!(settings.processing.download_concurrency > 0);
        assert!(settings.processing.fetch_retry_max_attempts > 0);
    }

    #[test]
    fn load_from_writes_and_reads_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");

        let first = Settings::load_from(&path).expect("write defaults");
        assert!(path.exists());

        let second = Settings::load_from(&path).expect("read back");
        assert_eq!(
            first.discord.command_prefix,
            second.discord.command_prefix
        );
        assert_eq!(
            first.processing.download_concurrency,
            second.processing.download_concurrency
        );
    }

    #[test]
    fn partial_files_fall_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[discord]\ncommand_prefix = \"!loot\"\n").expect("write");

        let settings = Settings::load_from(&path).expect("load");
        assert_eq!(settings.discord.command_prefix, "!loot");
        assert_eq!(settings.processing.download_concurrency, 16);
    }
}
