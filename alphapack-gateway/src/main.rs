use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use alphapack_gateway::discord::start_discord_bot;
use alphapack_gateway::state::AppState;
use alphapack_gateway::store::{
    CountStore, NullCountStore, NullRarityCache, RarityCache, SqliteCountStore, SqliteRarityCache,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = alphapack_core::Config::load()?;

    // Initialize tracing; RUST_LOG overrides the configured level
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.settings.logging.level.clone().into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let signatures = Arc::new(config.signature_table()?);
    info!(
        calibration_version = signatures.version(),
        "Configuration loaded"
    );

    // Open the pack database; run degraded without persistence if it fails
    let (counts, cache): (Arc<dyn CountStore>, Arc<dyn RarityCache>) =
        match alphapack_db::PackDbPool::new().await {
            Ok(db) => {
                info!("Pack database initialized");
                (
                    Arc::new(SqliteCountStore::new(db.clone())),
                    Arc::new(SqliteRarityCache::new(db)),
                )
            }
            Err(e) => {
                warn!(error = %e, "Database unavailable, counts will not persist");
                (Arc::new(NullCountStore), Arc::new(NullRarityCache))
            }
        };

    let state = Arc::new(AppState::new(config.settings.clone()));

    // Get Discord token from secrets
    let discord_token = config.discord_bot_token().map(|s| s.to_string());

    match start_discord_bot(discord_token, state, counts, cache, signatures).await? {
        Some(mut client) => {
            info!("Discord bot started");
            client.start().await?;
        }
        None => {
            info!("Discord bot not started (set DISCORD_BOT_TOKEN to enable)");
        }
    }

    Ok(())
}
