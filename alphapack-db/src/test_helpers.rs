//! Test helpers for the pack database.

use crate::{
    error::{DbError, DbResult},
    pool::{PackDbPool, create_in_memory_pool},
};

/// Create an in-memory pack database for testing
pub async fn create_test_pool() -> DbResult<PackDbPool> {
    let pool = create_in_memory_pool(1).await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| DbError::Migration(e.to_string()))?;

    Ok(PackDbPool::from_pool(pool))
}
