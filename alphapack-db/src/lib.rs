//! alphapack-db: SQLite persistence for the pack-counting bot.
//!
//! This crate provides database operations for:
//! - Per-(author, channel) rarity tallies with a resume marker
//! - The attachment URL -> rarity classification cache

pub mod counts;
pub mod error;
pub mod pool;
pub mod rarity_cache;

// Re-export commonly used types
pub use counts::{CountRepository, UserCount};
pub use error::{DbError, DbResult};
pub use pool::PackDbPool;
pub use rarity_cache::CacheRepository;

// Re-export test helpers when running tests or when test-helpers feature is enabled
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
