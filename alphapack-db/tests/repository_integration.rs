//! Integration tests for the count and cache repositories on an in-memory
//! database.

use alphapack_core::Rarity;
use alphapack_db::{CacheRepository, CountRepository, UserCount, test_helpers};

#[tokio::test]
async fn counts_round_trip() {
    let db = test_helpers::create_test_pool().await.expect("test pool");

    assert_eq!(
        CountRepository::get(db.pool(), 11, 22).await.expect("get"),
        None
    );

    let mut count = UserCount::new(11, 22);
    count.increment(Rarity::Common);
    count.increment(Rarity::Common);
    count.increment(Rarity::Legendary);
    count.note_counted(987654321);

    CountRepository::upsert(db.pool(), &count).await.expect("upsert");

    let loaded = CountRepository::get(db.pool(), 11, 22)
        .await
        .expect("get")
        .expect("row exists");
    assert_eq!(loaded, count);
    assert_eq!(loaded.total(), 3);
    assert_eq!(loaded.last_counted_id, Some(987654321));
}

#[tokio::test]
async fn counts_upsert_overwrites() {
    let db = test_helpers::create_test_pool().await.expect("test pool");

    let mut count = UserCount::new(5, 6);
    count.increment(Rarity::Rare);
    CountRepository::upsert(db.pool(), &count).await.expect("first");

    count.increment(Rarity::Rare);
    count.increment(Rarity::Unknown);
    count.note_counted(42);
    CountRepository::upsert(db.pool(), &count).await.expect("second");

    let loaded = CountRepository::get(db.pool(), 5, 6)
        .await
        .expect("get")
        .expect("row exists");
    assert_eq!(loaded.count(Rarity::Rare), 2);
    assert_eq!(loaded.count(Rarity::Unknown), 1);
    assert_eq!(loaded.last_counted_id, Some(42));
}

#[tokio::test]
async fn counts_are_isolated_per_channel() {
    let db = test_helpers::create_test_pool().await.expect("test pool");

    let mut first = UserCount::new(7, 100);
    first.increment(Rarity::Epic);
    let mut second = UserCount::new(7, 200);
    second.increment(Rarity::Common);

    CountRepository::upsert(db.pool(), &first).await.expect("first");
    CountRepository::upsert(db.pool(), &second).await.expect("second");

    let loaded = CountRepository::get(db.pool(), 7, 100)
        .await
        .expect("get")
        .expect("row exists");
    assert_eq!(loaded.count(Rarity::Epic), 1);
    assert_eq!(loaded.count(Rarity::Common), 0);
}

#[tokio::test]
async fn cache_round_trip() {
    let db = test_helpers::create_test_pool().await.expect("test pool");
    let url = "https://cdn.example/pack1.png";

    assert_eq!(CacheRepository::get(db.pool(), url).await.expect("get"), None);

    CacheRepository::set(db.pool(), url, Rarity::Epic)
        .await
        .expect("set");
    assert_eq!(
        CacheRepository::get(db.pool(), url).await.expect("get"),
        Some(Rarity::Epic)
    );

    // Overwrite wins.
    CacheRepository::set(db.pool(), url, Rarity::Rare)
        .await
        .expect("set again");
    assert_eq!(
        CacheRepository::get(db.pool(), url).await.expect("get"),
        Some(Rarity::Rare)
    );
}
