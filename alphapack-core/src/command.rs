//! Operator command parsing.
//!
//! Commands arrive as plain channel messages starting with the configured
//! prefix, e.g. `*pack count @user` or `*pack first epic`. Mentions are
//! resolved by the platform layer; this module only parses the verb and the
//! optional rarity argument.

use crate::rarity::Rarity;

/// Usage text sent back on an unparseable command.
pub const USAGE: &str = "Invalid command, available commands:\n\
    count - Counts all rarities\n\
    first <rarity> - Prints first occurrence of rarity\n\
    last <rarity> - Prints last occurrence of rarity\n\
    status - Prints processing status";

/// Usage text sent back on an unparseable rarity argument.
pub const RARITY_USAGE: &str =
    "Invalid rarity, acceptable rarities: Common, Uncommon, Rare, Epic, Legendary, Unknown";

/// A parsed operator command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Count rarities for the mentioned users (or the requester).
    Count,
    /// Earliest message whose resolved tier equals the argument.
    First(Rarity),
    /// Latest message whose resolved tier equals the argument.
    Last(Rarity),
    /// Report in-flight work and bot state.
    Status,
}

/// Why a message failed to parse as a command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("{USAGE}")]
    InvalidCommand,

    #[error("{RARITY_USAGE}")]
    InvalidRarity,
}

impl Command {
    /// Parse a message that is already known to start with `prefix`.
    ///
    /// Returns `None` when the message does not carry the prefix at all (not
    /// addressed to the bot), `Some(Err(..))` when it does but the verb or
    /// rarity is invalid.
    pub fn parse(content: &str, prefix: &str) -> Option<Result<Command, CommandError>> {
        let rest = strip_prefix_ci(content.trim(), prefix)?;
        let mut words = rest.split_whitespace();

        let verb = match words.next() {
            Some(verb) => verb.to_lowercase(),
            None => return Some(Err(CommandError::InvalidCommand)),
        };

        let parsed = match verb.as_str() {
            "count" => Ok(Command::Count),
            "status" => Ok(Command::Status),
            "first" | "last" => match words.next().and_then(|w| w.parse::<Rarity>().ok()) {
                Some(rarity) if verb == "first" => Ok(Command::First(rarity)),
                Some(rarity) => Ok(Command::Last(rarity)),
                None => Err(CommandError::InvalidRarity),
            },
            _ => Err(CommandError::InvalidCommand),
        };
        Some(parsed)
    }
}

fn strip_prefix_ci<'a>(content: &'a str, prefix: &str) -> Option<&'a str> {
    // `get` also rejects a split inside a multibyte character.
    let head = content.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&content[prefix.len()..])
    } else {
        None
    }
}
