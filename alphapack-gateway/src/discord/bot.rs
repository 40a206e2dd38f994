//! Discord event handler: command parsing, target resolution, dispatch.

use std::sync::Arc;

use serenity::async_trait;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use tracing::{debug, error, info, warn};

use alphapack_core::Command;

use crate::coordinator::{ProcessingRequest, RequestCoordinator, RequestKind};
use crate::fetcher::MessageFetcher;
use crate::pipeline::OccurrenceDirection;
use crate::report::format_status;
use crate::state::AppState;

use super::send::SerenityHistorySource;

pub struct Bot {
    state: Arc<AppState>,
    coordinator: Arc<RequestCoordinator>,
    fetcher: Arc<MessageFetcher<SerenityHistorySource>>,
}

impl Bot {
    pub fn new(
        state: Arc<AppState>,
        coordinator: Arc<RequestCoordinator>,
        fetcher: Arc<MessageFetcher<SerenityHistorySource>>,
    ) -> Self {
        Self {
            state,
            coordinator,
            fetcher,
        }
    }

    /// Mentioned users, then members of mentioned roles, falling back to the
    /// requester when nobody is mentioned. Order is kept, duplicates dropped.
    async fn resolve_targets(&self, ctx: &Context, msg: &Message) -> Vec<u64> {
        let mut targets: Vec<u64> = Vec::new();

        for user in &msg.mentions {
            let id = user.id.get();
            if !targets.contains(&id) {
                targets.push(id);
            }
        }

        if !msg.mention_roles.is_empty()
            && let Some(guild_id) = msg.guild_id
        {
            match guild_id.members(&ctx.http, None, None).await {
                Ok(members) => {
                    for member in members {
                        if member.roles.iter().any(|r| msg.mention_roles.contains(r)) {
                            let id = member.user.id.get();
                            if !targets.contains(&id) {
                                targets.push(id);
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!(guild_id = guild_id.get(), error = %e, "Failed to list guild members");
                }
            }
        }

        if targets.is_empty() {
            targets.push(msg.author.id.get());
        }
        targets
    }

    async fn handle_command(&self, ctx: &Context, msg: &Message, command: Command) {
        let kind = match command {
            Command::Status => {
                let status = format_status(self.state.in_flight(), self.state.is_enabled());
                if let Err(e) = msg.reply(&ctx.http, status).await {
                    error!(error = %e, "Failed to send status reply");
                }
                return;
            }
            Command::Count => RequestKind::Count,
            Command::First(rarity) => RequestKind::Occurrence {
                rarity,
                direction: OccurrenceDirection::First,
            },
            Command::Last(rarity) => RequestKind::Occurrence {
                rarity,
                direction: OccurrenceDirection::Last,
            },
        };

        let channel_id = msg.channel_id.get();
        let history = match self.fetcher.fetch_all(channel_id).await {
            Ok(history) => Arc::new(history),
            Err(e) => {
                error!(channel_id, error = %e, "Failed to fetch channel history");
                if let Err(e) = msg
                    .reply(&ctx.http, "Failed to fetch channel history, try again later.")
                    .await
                {
                    error!(error = %e, "Failed to send fetch failure reply");
                }
                return;
            }
        };

        let request = ProcessingRequest {
            kind,
            channel_id,
            request_message_id: msg.id.get(),
            targets: self.resolve_targets(ctx, msg).await,
        };
        self.coordinator.dispatch(request, history).await;
    }
}

#[async_trait]
impl EventHandler for Bot {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("Discord bot connected as {}", ready.user.name);
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot || msg.guild_id.is_none() {
            return;
        }
        if !self.state.is_enabled() {
            return;
        }

        // Only watch channels named after pack openings.
        let fragment = &self.state.settings.discord.channel_name_fragment;
        match msg.channel_id.name(&ctx).await {
            Ok(name) if name.contains(fragment.as_str()) => {}
            Ok(_) => return,
            Err(e) => {
                debug!(channel_id = msg.channel_id.get(), error = %e, "Could not resolve channel name");
                return;
            }
        }

        let prefix = &self.state.settings.discord.command_prefix;
        let Some(parsed) = Command::parse(&msg.content, prefix) else {
            return;
        };

        match parsed {
            Ok(command) => {
                if let Err(e) = msg.react(&ctx.http, '✅').await {
                    warn!(error = %e, "Failed to acknowledge command");
                }
                self.handle_command(&ctx, &msg, command).await;
            }
            Err(e) => {
                if let Err(e) = msg.react(&ctx.http, '❌').await {
                    warn!(error = %e, "Failed to react to invalid command");
                }
                if let Err(e) = msg.reply(&ctx.http, e.to_string()).await {
                    error!(error = %e, "Failed to send usage reply");
                }
            }
        }
    }
}
