//! Per-user counting and occurrence pipeline.
//!
//! One pipeline run owns its user's tally exclusively: the fan-out below is
//! across messages, never across tasks for the same (author, channel) pair.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use alphapack_core::{ChannelMessage, Rarity, SignatureTable, candidates_for};
use alphapack_db::UserCount;

use crate::classify::classify;
use crate::images::{ImageLoader, decode};
use crate::store::{CountStore, RarityCache};

/// Resolves one message to a reward tier.
///
/// Resolution order: explicit `*<tier>` override in the text, then the URL
/// cache, then download + decode + classify. Download or decode failures
/// resolve to `Unknown` so the batch keeps its one-count-per-message
/// invariant. `Unknown` results are never cached, so a recalibrated table
/// can reclassify them later.
pub struct TierResolver {
    cache: Arc<dyn RarityCache>,
    loader: Arc<dyn ImageLoader>,
    signatures: Arc<SignatureTable>,
}

impl TierResolver {
    pub fn new(
        cache: Arc<dyn RarityCache>,
        loader: Arc<dyn ImageLoader>,
        signatures: Arc<SignatureTable>,
    ) -> Self {
        Self {
            cache,
            loader,
            signatures,
        }
    }

    /// Resolve the tier for a single candidate message.
    pub async fn resolve(&self, message: &ChannelMessage) -> Rarity {
        if let Some(forced) = message.forced_rarity() {
            debug!(message_id = message.id, %forced, "Using forced tier override");
            return forced;
        }

        let Some(url) = message.primary_attachment() else {
            return Rarity::Unknown;
        };

        if let Some(cached) = self.cache.get(url).await {
            return cached;
        }

        let rarity = match self.loader.load(url).await.and_then(|bytes| decode(&bytes)) {
            Ok(img) => classify(&img, &self.signatures),
            Err(e) => {
                warn!(url, "Failed to load image, recording Unknown: {e}");
                return Rarity::Unknown;
            }
        };

        if rarity == Rarity::Unknown {
            info!(url, "Unknown rarity, no signature matched");
        } else {
            self.cache.set(url, rarity).await;
        }
        rarity
    }
}

/// Outcome of one counting run.
#[derive(Debug, Clone)]
pub struct CountOutcome {
    /// Full tally after the run, prior runs included.
    pub count: UserCount,
    /// Messages folded in by this run.
    pub newly_counted: usize,
    /// Whether the tally reached the store.
    pub persisted: bool,
}

/// Scan direction for occurrence lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OccurrenceDirection {
    First,
    Last,
}

/// Counting and occurrence runs for a single user over a fetched history.
pub struct CountingPipeline {
    resolver: Arc<TierResolver>,
    store: Arc<dyn CountStore>,
}

impl CountingPipeline {
    pub fn new(resolver: Arc<TierResolver>, store: Arc<dyn CountStore>) -> Self {
        Self { resolver, store }
    }

    /// Count rarities for one user in one channel.
    ///
    /// `messages` must be in chronological order (the fetcher guarantees
    /// this); the resume marker depends on that order being stable between
    /// runs. Re-running against an unchanged history counts nothing new.
    pub async fn count_user(
        &self,
        messages: &[ChannelMessage],
        author_id: u64,
        channel_id: u64,
    ) -> CountOutcome {
        let candidates = candidates_for(messages, author_id);

        let mut count = self
            .store
            .get(author_id, channel_id)
            .await
            .unwrap_or_else(|| UserCount::new(author_id, channel_id));

        let remaining: Vec<&ChannelMessage> = match count.last_counted_id {
            Some(last) => candidates.iter().filter(|m| m.id > last).copied().collect(),
            None => {
                // Rows persisted before the resume marker existed carry only
                // a total; skip that many candidates, then adopt the marker.
                let skip = count.total() as usize;
                for already in candidates.iter().take(skip) {
                    count.note_counted(already.id);
                }
                candidates.iter().skip(skip).copied().collect()
            }
        };

        info!(
            author_id,
            channel_id,
            candidates = candidates.len(),
            remaining = remaining.len(),
            "Counting rarities for user"
        );

        // Resolve remaining messages concurrently; the image loader's global
        // semaphore bounds the actual downloads. Increments funnel into one
        // mutex-guarded tally owned by this run.
        let tally = Arc::new(Mutex::new(count));
        let jobs = remaining.iter().map(|message| {
            let resolver = Arc::clone(&self.resolver);
            let tally = Arc::clone(&tally);
            async move {
                let rarity = resolver.resolve(message).await;
                let mut tally = tally.lock().await;
                tally.increment(rarity);
                tally.note_counted(message.id);
            }
        });
        futures::future::join_all(jobs).await;

        let count = tally.lock().await.clone();
        let persisted = self.store.set(&count).await;

        CountOutcome {
            count,
            newly_counted: remaining.len(),
            persisted,
        }
    }

    /// Find the first or last message of a user whose tier equals `rarity`.
    ///
    /// Returns `None` when the tier never occurred; that is an answer, not
    /// an error. The scan is sequential so it can stop at the first hit.
    pub async fn find_occurrence(
        &self,
        messages: &[ChannelMessage],
        author_id: u64,
        rarity: Rarity,
        direction: OccurrenceDirection,
    ) -> Option<ChannelMessage> {
        let candidates = candidates_for(messages, author_id);

        let ordered: Box<dyn Iterator<Item = &&ChannelMessage> + Send> = match direction {
            OccurrenceDirection::First => Box::new(candidates.iter()),
            OccurrenceDirection::Last => Box::new(candidates.iter().rev()),
        };

        for message in ordered {
            if self.resolver.resolve(message).await == rarity {
                return Some((*message).clone());
            }
        }
        None
    }
}
