//! Configuration management for alphapack.
//!
//! Secrets (environment variables) are kept separate from settings (TOML
//! file in the XDG config directory).
//!
//! # Configuration sources
//!
//! ## Secrets (environment variables)
//! - `DISCORD_BOT_TOKEN` - Discord bot token
//!
//! ## Settings (TOML file)
//! Located at `~/.config/alphapack/config.toml`:
//! ```toml
//! [discord]
//! enabled = true
//! command_prefix = "*pack"
//! channel_name_fragment = "pack"
//!
//! [processing]
//! download_concurrency = 16
//! fetch_retry_initial_ms = 5000
//! fetch_retry_max_attempts = 5
//!
//! [logging]
//! level = "info"
//! ```

mod secrets;
mod settings;

pub use secrets::{Secrets, SecretsError};
pub use settings::{
    DiscordSettings, LoggingSettings, ProcessingSettings, Settings, SettingsError,
};

use std::path::Path;

use crate::signatures::{SignatureError, SignatureTable};

/// Errors that can occur when loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Secrets error: {0}")]
    Secrets(#[from] SecretsError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Calibration error: {0}")]
    Signatures(#[from] SignatureError),
}

/// Combined configuration containing both secrets and settings.
#[derive(Debug, Clone)]
pub struct Config {
    /// Secrets loaded from environment variables
    pub secrets: Secrets,
    /// Settings loaded from the TOML configuration file
    pub settings: Settings,
}

impl Config {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, ConfigError> {
        let secrets = Secrets::from_env();
        let settings = Settings::load()?;
        Ok(Self { secrets, settings })
    }

    /// The calibration table to classify with: the configured override file
    /// when set, otherwise the table embedded in this crate.
    pub fn signature_table(&self) -> Result<SignatureTable, ConfigError> {
        match &self.settings.processing.signatures_path {
            Some(path) => Ok(SignatureTable::load_from_file(Path::new(path))?),
            None => Ok(SignatureTable::builtin()),
        }
    }

    /// Discord bot token, if configured.
    pub fn discord_bot_token(&self) -> Option<&str> {
        self.secrets.discord_bot_token.as_deref()
    }
}
