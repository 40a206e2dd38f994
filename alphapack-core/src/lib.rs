//! alphapack-core: domain types for the pack-counting bot.
//!
//! This crate is platform-free: reward tiers and their calibrated color
//! signatures, the neutral channel-message model, operator command parsing,
//! and configuration loading. Everything that touches Discord, HTTP or the
//! database lives in the gateway and db crates.

pub mod command;
pub mod config;
pub mod message;
pub mod rarity;
pub mod signatures;

pub use command::{Command, CommandError};
pub use config::{Config, ConfigError, Secrets, SecretsError, Settings, SettingsError};
pub use message::{ChannelMessage, IGNORE_TOKEN, candidates_for};
pub use rarity::Rarity;
pub use signatures::{
    COMMON_CHANNEL_TOLERANCE, ColorSignature, SignatureError, SignatureTable,
};
