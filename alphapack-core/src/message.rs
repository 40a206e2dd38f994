//! Platform-neutral message model shared between the gateway and the
//! counting pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rarity::Rarity;

/// Text token that excludes a message from counting entirely.
pub const IGNORE_TOKEN: &str = "*ignored";

/// Snapshot of one channel message, reduced to what counting needs.
///
/// `id` is the platform snowflake, which is monotonic in creation time; the
/// pipeline relies on it both for stable chronological ordering and as the
/// persisted resume marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMessage {
    pub id: u64,
    pub channel_id: u64,
    pub guild_id: Option<u64>,
    pub author_id: u64,
    pub content: String,
    pub attachment_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl ChannelMessage {
    /// Whether this message is a counting candidate for `author_id`:
    /// authored by them, carrying at least one attachment, and not marked
    /// with the ignore token.
    pub fn is_candidate_for(&self, author_id: u64) -> bool {
        self.author_id == author_id
            && !self.attachment_urls.is_empty()
            && !self.content.contains(IGNORE_TOKEN)
    }

    /// Explicit tier override carried in the message text.
    ///
    /// A message starting with `*epic` (or any other tier name) is recorded
    /// as that tier without touching the image. The ignore token is not an
    /// override even though it shares the `*` prefix.
    pub fn forced_rarity(&self) -> Option<Rarity> {
        let rest = self.content.strip_prefix('*')?;
        let word = rest.split_whitespace().next()?;
        word.parse::<Rarity>().ok()
    }

    /// First attachment URL, the one offered to cache and classifier.
    pub fn primary_attachment(&self) -> Option<&str> {
        self.attachment_urls.first().map(String::as_str)
    }

    /// Link to the message on Discord, for occurrence replies.
    pub fn jump_url(&self) -> String {
        match self.guild_id {
            Some(guild) => format!(
                "https://discord.com/channels/{}/{}/{}",
                guild, self.channel_id, self.id
            ),
            None => format!("https://discord.com/channels/@me/{}/{}", self.channel_id, self.id),
        }
    }
}

/// Filter a fetched history down to counting candidates for one user,
/// preserving the input order.
pub fn candidates_for<'a>(
    messages: &'a [ChannelMessage],
    author_id: u64,
) -> Vec<&'a ChannelMessage> {
    messages
        .iter()
        .filter(|m| m.is_candidate_for(author_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(author_id: u64, content: &str, attachments: usize) -> ChannelMessage {
        ChannelMessage {
            id: 1,
            channel_id: 10,
            guild_id: Some(99),
            author_id,
            content: content.to_string(),
            attachment_urls: (0..attachments)
                .map(|i| format!("https://cdn.example/{i}.png"))
                .collect(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn candidate_requires_author_attachment_and_no_ignore() {
        assert!(message(7, "", 1).is_candidate_for(7));
        assert!(!message(7, "", 1).is_candidate_for(8));
        assert!(!message(7, "", 0).is_candidate_for(7));
        assert!(!message(7, "nice one *ignored", 1).is_candidate_for(7));
    }

    #[test]
    fn forced_rarity_parses_leading_token() {
        assert_eq!(message(7, "*epic", 1).forced_rarity(), Some(Rarity::Epic));
        assert_eq!(
            message(7, "*legendary finally!", 1).forced_rarity(),
            Some(Rarity::Legendary)
        );
        assert_eq!(message(7, "epic", 1).forced_rarity(), None);
        assert_eq!(message(7, "*ignored", 1).forced_rarity(), None);
        assert_eq!(message(7, "look *epic", 1).forced_rarity(), None);
    }

    #[test]
    fn jump_url_includes_guild() {
        let url = message(7, "", 1).jump_url();
        assert_eq!(url, "https://discord.com/channels/99/10/1");
    }
}
