//! Per-(author, channel) rarity tally storage.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use alphapack_core::Rarity;

use crate::error::{DbError, DbResult};

/// In-memory rarity tally for one (author, channel) pair.
///
/// Counts are monotonically non-decreasing across runs; `last_counted_id` is
/// the newest message id already folded into the counts, letting a re-run
/// resume strictly after it. Rows written before the marker existed resume
/// by skipping `total()` messages instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCount {
    pub author_id: u64,
    pub channel_id: u64,
    counts: [u64; 6],
    pub last_counted_id: Option<u64>,
}

impl UserCount {
    /// Empty tally for a pair not yet in the store.
    pub fn new(author_id: u64, channel_id: u64) -> Self {
        Self {
            author_id,
            channel_id,
            counts: [0; 6],
            last_counted_id: None,
        }
    }

    fn slot(rarity: Rarity) -> usize {
        match rarity {
            Rarity::Common => 0,
            Rarity::Uncommon => 1,
            Rarity::Rare => 2,
            Rarity::Epic => 3,
            Rarity::Legendary => 4,
            Rarity::Unknown => 5,
        }
    }

    /// Count for one tier.
    pub fn count(&self, rarity: Rarity) -> u64 {
        self.counts[Self::slot(rarity)]
    }

    /// Sum across all tiers, Unknown included.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Increase one tier's count by 1.
    pub fn increment(&mut self, rarity: Rarity) {
        self.counts[Self::slot(rarity)] += 1;
    }

    /// Record that `message_id` has been folded into the counts, advancing
    /// the resume marker if it is newer.
    pub fn note_counted(&mut self, message_id: u64) {
        match self.last_counted_id {
            Some(last) if last >= message_id => {}
            _ => self.last_counted_id = Some(message_id),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CountRow {
    author_id: String,
    channel_id: String,
    common: i64,
    uncommon: i64,
    rare: i64,
    epic: i64,
    legendary: i64,
    unknown: i64,
    last_counted_id: Option<String>,
}

impl CountRow {
    fn into_user_count(self) -> DbResult<UserCount> {
        let author_id = parse_id(&self.author_id)?;
        let channel_id = parse_id(&self.channel_id)?;
        let last_counted_id = match self.last_counted_id {
            Some(raw) => Some(parse_id(&raw)?),
            None => None,
        };

        Ok(UserCount {
            author_id,
            channel_id,
            counts: [
                self.common as u64,
                self.uncommon as u64,
                self.rare as u64,
                self.epic as u64,
                self.legendary as u64,
                self.unknown as u64,
            ],
            last_counted_id,
        })
    }
}

fn parse_id(raw: &str) -> DbResult<u64> {
    raw.parse::<u64>()
        .map_err(|_| DbError::CorruptRow(format!("not a snowflake id: {raw}")))
}

fn to_timestamp(dt: DateTime<Utc>) -> i64 {
    dt.timestamp()
}

/// Repository for user count rows
pub struct CountRepository;

impl CountRepository {
    /// Get the tally for an (author, channel) pair, if one exists.
    pub async fn get(
        pool: &SqlitePool,
        author_id: u64,
        channel_id: u64,
    ) -> DbResult<Option<UserCount>> {
        let row = sqlx::query_as::<_, CountRow>(
            r#"
            SELECT author_id, channel_id, common, uncommon, rare, epic, legendary, unknown,
                   last_counted_id
            FROM user_counts
            WHERE author_id = ? AND channel_id = ?
            "#,
        )
        .bind(author_id.to_string())
        .bind(channel_id.to_string())
        .fetch_optional(pool)
        .await?;

        row.map(CountRow::into_user_count).transpose()
    }

    /// Insert or replace the tally for its (author, channel) pair.
    pub async fn upsert(pool: &SqlitePool, count: &UserCount) -> DbResult<()> {
        let now = to_timestamp(Utc::now());

        sqlx::query(
            r#"
            INSERT INTO user_counts
                (author_id, channel_id, common, uncommon, rare, epic, legendary, unknown,
                 last_counted_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (author_id, channel_id) DO UPDATE SET
                common = excluded.common,
                uncommon = excluded.uncommon,
                rare = excluded.rare,
                epic = excluded.epic,
                legendary = excluded.legendary,
                unknown = excluded.unknown,
                last_counted_id = excluded.last_counted_id,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(count.author_id.to_string())
        .bind(count.channel_id.to_string())
        .bind(count.count(Rarity::Common) as i64)
        .bind(count.count(Rarity::Uncommon) as i64)
        .bind(count.count(Rarity::Rare) as i64)
        .bind(count.count(Rarity::Epic) as i64)
        .bind(count.count(Rarity::Legendary) as i64)
        .bind(count.count(Rarity::Unknown) as i64)
        .bind(count.last_counted_id.map(|id| id.to_string()))
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

        debug!(
            author_id = count.author_id,
            channel_id = count.channel_id,
            total = count.total(),
            "Saved user counts"
        );
        Ok(())
    }
}
