//! Serenity-backed implementations of the platform seams.

use std::sync::Arc;

use async_trait::async_trait;
use serenity::builder::{CreateMessage, GetMessages};
use serenity::http::{Http, HttpError};
use serenity::model::prelude::*;
use tracing::{debug, error};

use alphapack_core::ChannelMessage;

use crate::coordinator::Responder;
use crate::fetcher::{FetchError, HistorySource};
use crate::typing::TypingPing;

/// Sends replies over the Discord REST API.
pub struct SerenityResponder {
    http: Arc<Http>,
}

impl SerenityResponder {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Responder for SerenityResponder {
    async fn send_message(&self, channel_id: u64, content: &str) {
        let builder = CreateMessage::new().content(content);
        if let Err(e) = ChannelId::new(channel_id)
            .send_message(&self.http, builder)
            .await
        {
            error!(channel_id, error = %e, "Failed to send message");
        }
    }

    async fn reply(&self, channel_id: u64, message_id: u64, content: &str) {
        let channel = ChannelId::new(channel_id);
        let builder = CreateMessage::new()
            .content(content)
            .reference_message(MessageReference::from((
                channel,
                MessageId::new(message_id),
            )));
        if let Err(e) = channel.send_message(&self.http, builder).await {
            error!(channel_id, message_id, error = %e, "Failed to send reply");
        }
    }
}

/// Broadcasts the typing indicator; failures are logged and ignored since
/// the indicator is cosmetic.
pub struct SerenityTyping {
    http: Arc<Http>,
}

impl SerenityTyping {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl TypingPing for SerenityTyping {
    async fn ping(&self, channel_id: u64) {
        if let Err(e) = ChannelId::new(channel_id).broadcast_typing(&self.http).await {
            debug!(channel_id, error = %e, "Typing ping failed");
        }
    }
}

/// Channel history pages straight from the Discord REST API.
pub struct SerenityHistorySource {
    http: Arc<Http>,
}

impl SerenityHistorySource {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl HistorySource for SerenityHistorySource {
    async fn page_before(
        &self,
        channel_id: u64,
        before: Option<u64>,
        limit: u8,
    ) -> Result<Vec<ChannelMessage>, FetchError> {
        let mut builder = GetMessages::new().limit(limit);
        if let Some(before) = before {
            builder = builder.before(MessageId::new(before));
        }

        match ChannelId::new(channel_id).messages(&self.http, builder).await {
            Ok(messages) => Ok(messages.iter().map(to_channel_message).collect()),
            Err(serenity::Error::Http(e)) if is_rate_limit(&e) => Err(FetchError::RateLimited),
            Err(e) => Err(FetchError::Platform(e.to_string())),
        }
    }
}

fn is_rate_limit(error: &HttpError) -> bool {
    matches!(
        error,
        HttpError::UnsuccessfulRequest(response) if response.status_code.as_u16() == 429
    )
}

/// Flatten a gateway message into the fields the pipeline cares about.
pub fn to_channel_message(message: &Message) -> ChannelMessage {
    ChannelMessage {
        id: message.id.get(),
        channel_id: message.channel_id.get(),
        guild_id: message.guild_id.map(|g| g.get()),
        author_id: message.author.id.get(),
        content: message.content.clone(),
        attachment_urls: message
            .attachments
            .iter()
            .map(|a| a.url.clone())
            .collect(),
        created_at: chrono::DateTime::from_timestamp(message.timestamp.unix_timestamp(), 0)
            .unwrap_or_else(chrono::Utc::now),
    }
}
