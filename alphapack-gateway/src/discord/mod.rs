mod bot;
mod send;

use std::sync::Arc;

use serenity::http::Http;
use serenity::prelude::*;
use tracing::info;

use alphapack_core::SignatureTable;

use crate::coordinator::RequestCoordinator;
use crate::fetcher::{MessageFetcher, RetryPolicy};
use crate::images::{HttpImageLoader, ImageError};
use crate::pipeline::{CountingPipeline, TierResolver};
use crate::state::AppState;
use crate::store::{CountStore, RarityCache};
use crate::typing::TypingManager;

pub use bot::Bot;
pub use send::{SerenityHistorySource, SerenityResponder, SerenityTyping};

/// Start the Discord bot (optional - returns Ok(None) if no token)
pub async fn start_discord_bot(
    token: Option<String>,
    state: Arc<AppState>,
    counts: Arc<dyn CountStore>,
    cache: Arc<dyn RarityCache>,
    signatures: Arc<SignatureTable>,
) -> Result<Option<Client>, DiscordError> {
    let token = match token {
        Some(t) if !t.is_empty() => t,
        _ => {
            info!("No DISCORD_BOT_TOKEN set, skipping Discord bot");
            return Ok(None);
        }
    };

    info!(
        calibration_version = signatures.version(),
        "Starting Discord bot..."
    );

    // Dedicated REST handle for background sends and typing pings; the
    // gateway client keeps its own.
    let http = Arc::new(Http::new(&token));

    let loader = Arc::new(HttpImageLoader::new(Arc::clone(&state.download_limiter))?);
    let resolver = Arc::new(TierResolver::new(cache, loader, signatures));
    let pipeline = Arc::new(CountingPipeline::new(resolver, counts));
    let typing = Arc::new(TypingManager::new(Arc::new(SerenityTyping::new(
        Arc::clone(&http),
    ))));
    let responder = Arc::new(SerenityResponder::new(Arc::clone(&http)));
    let coordinator = Arc::new(RequestCoordinator::new(
        Arc::clone(&state),
        pipeline,
        typing,
        responder,
    ));

    let retry = RetryPolicy {
        initial_delay: std::time::Duration::from_millis(
            state.settings.processing.fetch_retry_initial_ms,
        ),
        max_attempts: state.settings.processing.fetch_retry_max_attempts,
    };
    let fetcher = Arc::new(MessageFetcher::new(SerenityHistorySource::new(http), retry));

    let intents = GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT;

    let bot = Bot::new(state, coordinator, fetcher);

    let client = Client::builder(&token, intents)
        .event_handler(bot)
        .await
        .map_err(|e| DiscordError::ClientError(e.to_string()))?;

    Ok(Some(client))
}

/// Discord-related errors
#[derive(Debug, thiserror::Error)]
pub enum DiscordError {
    #[error("Failed to create Discord client: {0}")]
    ClientError(String),

    #[error("Failed to set up image loader: {0}")]
    ImageLoader(#[from] ImageError),
}
