//! Secrets loaded from environment variables only.
//!
//! Sensitive values never live in the settings file. In development a `.env`
//! file is honored; production should rely on real environment variables.

use std::env;

/// Secrets loaded exclusively from environment variables.
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    /// Discord bot token (env: DISCORD_BOT_TOKEN)
    pub discord_bot_token: Option<String>,
}

/// Errors that can occur when loading secrets
#[derive(Debug, thiserror::Error)]
pub enum SecretsError {
    #[error("Missing required secret: {0}")]
    MissingSecret(String),
}

impl Secrets {
    /// Load secrets from environment variables, reading `.env` first if
    /// present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_env_inner()
    }

    pub(crate) fn from_env_inner() -> Self {
        Self {
            discord_bot_token: env::var("DISCORD_BOT_TOKEN").ok(),
        }
    }

    /// The bot token, or an error naming the missing variable.
    pub fn require_discord_token(&self) -> Result<&str, SecretsError> {
        self.discord_bot_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SecretsError::MissingSecret("DISCORD_BOT_TOKEN".to_string()))
    }
}
