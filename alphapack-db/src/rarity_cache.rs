//! Attachment URL -> rarity cache storage.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use alphapack_core::Rarity;

use crate::error::DbResult;

#[derive(Debug, sqlx::FromRow)]
struct CacheRow {
    rarity: String,
}

/// Repository for cached classifications
pub struct CacheRepository;

impl CacheRepository {
    /// Look up a cached rarity for an attachment URL.
    ///
    /// A stored value that no longer parses (e.g. after a tier rename) is
    /// treated as a miss rather than an error.
    pub async fn get(pool: &SqlitePool, url: &str) -> DbResult<Option<Rarity>> {
        let row = sqlx::query_as::<_, CacheRow>("SELECT rarity FROM rarity_cache WHERE url = ?")
            .bind(url)
            .fetch_optional(pool)
            .await?;

        Ok(row.and_then(|r| r.rarity.parse::<Rarity>().ok()))
    }

    /// Store (or overwrite) the rarity for an attachment URL.
    pub async fn set(pool: &SqlitePool, url: &str, rarity: Rarity) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO rarity_cache (url, rarity, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT (url) DO UPDATE SET rarity = excluded.rarity
            "#,
        )
        .bind(url)
        .bind(rarity.to_string())
        .bind(Utc::now().timestamp())
        .execute(pool)
        .await?;

        debug!(url, %rarity, "Cached classification");
        Ok(())
    }
}
