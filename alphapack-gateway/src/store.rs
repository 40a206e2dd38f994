//! Store and cache seams between the pipeline and persistence.
//!
//! Both collaborators are deliberately forgiving: the cache never surfaces
//! an error (unavailability degrades to a miss), and count-store failures
//! at the trait boundary are explicit so the pipeline can log and continue
//! with in-memory results.

use async_trait::async_trait;
use tracing::warn;

use alphapack_core::Rarity;
use alphapack_db::{CacheRepository, CountRepository, PackDbPool, UserCount};

/// Persisted per-(author, channel) tallies.
#[async_trait]
pub trait CountStore: Send + Sync {
    async fn get(&self, author_id: u64, channel_id: u64) -> Option<UserCount>;
    /// Best-effort write; returns whether the tally was durably saved.
    async fn set(&self, count: &UserCount) -> bool;
}

/// Attachment URL -> rarity cache. Infallible to callers by contract.
#[async_trait]
pub trait RarityCache: Send + Sync {
    async fn get(&self, url: &str) -> Option<Rarity>;
    async fn set(&self, url: &str, rarity: Rarity);
}

/// SQLite-backed count store.
pub struct SqliteCountStore {
    db: PackDbPool,
}

impl SqliteCountStore {
    pub fn new(db: PackDbPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CountStore for SqliteCountStore {
    async fn get(&self, author_id: u64, channel_id: u64) -> Option<UserCount> {
        match CountRepository::get(self.db.pool(), author_id, channel_id).await {
            Ok(found) => found,
            Err(e) => {
                warn!(author_id, channel_id, "Count load failed, starting from zero: {e}");
                None
            }
        }
    }

    async fn set(&self, count: &UserCount) -> bool {
        match CountRepository::upsert(self.db.pool(), count).await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    author_id = count.author_id,
                    channel_id = count.channel_id,
                    "Count save failed, result stays in memory only: {e}"
                );
                false
            }
        }
    }
}

/// SQLite-backed rarity cache.
pub struct SqliteRarityCache {
    db: PackDbPool,
}

impl SqliteRarityCache {
    pub fn new(db: PackDbPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RarityCache for SqliteRarityCache {
    async fn get(&self, url: &str) -> Option<Rarity> {
        match CacheRepository::get(self.db.pool(), url).await {
            Ok(found) => found,
            Err(e) => {
                warn!(url, "Cache lookup failed, treating as miss: {e}");
                None
            }
        }
    }

    async fn set(&self, url: &str, rarity: Rarity) {
        if let Err(e) = CacheRepository::set(self.db.pool(), url, rarity).await {
            warn!(url, "Cache write failed, skipping: {e}");
        }
    }
}

/// Count store used when the database is unavailable: every run counts from
/// zero and nothing is saved.
pub struct NullCountStore;

#[async_trait]
impl CountStore for NullCountStore {
    async fn get(&self, _author_id: u64, _channel_id: u64) -> Option<UserCount> {
        None
    }

    async fn set(&self, _count: &UserCount) -> bool {
        false
    }
}

/// Cache used when the database is unavailable: everything is a miss.
pub struct NullRarityCache;

#[async_trait]
impl RarityCache for NullRarityCache {
    async fn get(&self, _url: &str) -> Option<Rarity> {
        None
    }

    async fn set(&self, _url: &str, _rarity: Rarity) {}
}
