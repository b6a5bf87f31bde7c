mod common;

use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, EntityTrait, PaginatorTrait};

use voidwatch_sync::entities::prelude::*;
use voidwatch_sync::models::market::{FetchOutcome, ItemStatistics, StatisticsEntry};
use voidwatch_sync::services::stats_store::{RunCounters, StatsStore};

use crate::common::setup_test_db;

fn entry(id: &str, datetime: &str, avg_price: f64) -> StatisticsEntry {
    StatisticsEntry {
        id: Some(id.to_string()),
        datetime: Some(datetime.to_string()),
        avg_price: Some(avg_price),
        min_price: Some(avg_price - 1.0),
        max_price: Some(avg_price + 1.0),
        volume: Some(5),
    }
}

fn fetched(url_name: &str, stats_48h: Vec<StatisticsEntry>, stats_90d: Vec<StatisticsEntry>) -> FetchOutcome {
    FetchOutcome::Fetched(ItemStatistics {
        url_name: url_name.to_string(),
        stats_48h,
        stats_90d,
    })
}

fn sample_result() -> FetchOutcome {
    fetched(
        "ash_prime_set",
        vec![
            entry("h1", "2025-07-16T10:00:00.000+00:00", 40.0),
            entry("h2", "2025-07-16T11:00:00.000+00:00", 42.0),
            entry("h3", "2025-07-16T12:00:00.000+00:00", 41.5),
        ],
        vec![
            entry("d1", "2025-07-14T00:00:00.000+00:00", 39.0),
            entry("d2", "2025-07-15T00:00:00.000+00:00", 40.5),
        ],
    )
}

#[tokio::test]
async fn test_second_run_only_skips() {
    let db = setup_test_db().await.expect("Failed to set up test DB");

    let mut first = StatsStore::new(db.clone());
    first.store(sample_result()).await;
    assert_eq!(
        first.counters(),
        RunCounters {
            available: 1,
            inserted: 5,
            skipped: 0,
            failed: 0,
        }
    );

    let mut second = StatsStore::new(db.clone());
    second.store(sample_result()).await;
    assert_eq!(
        second.counters(),
        RunCounters {
            available: 1,
            inserted: 0,
            skipped: 5,
            failed: 0,
        }
    );

    assert_eq!(ItemStats48h::find().count(&db).await.unwrap(), 3);
    assert_eq!(ItemStats90d::find().count(&db).await.unwrap(), 2);
}

#[tokio::test]
async fn test_duplicate_48h_key_stored_once() {
    let db = setup_test_db().await.expect("Failed to set up test DB");
    let mut store = StatsStore::new(db.clone());

    // Same (id, datetime) written twice, the second time with a different offset notation
    store
        .store(fetched(
            "ash_prime_set",
            vec![
                entry("h1", "2025-07-16T10:00:00.000+00:00", 40.0),
                entry("h1", "2025-07-16T12:00:00.000+02:00", 99.0),
            ],
            vec![],
        ))
        .await;

    let counters = store.counters();
    assert_eq!(counters.inserted, 1);
    assert_eq!(counters.skipped, 1);

    let rows = ItemStats48h::find().all(&db).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].datetime.with_timezone(&Utc),
        Utc.with_ymd_and_hms(2025, 7, 16, 10, 0, 0).unwrap()
    );
}

#[tokio::test]
async fn test_90d_dedup_by_url_name_and_day() {
    let db = setup_test_db().await.expect("Failed to set up test DB");
    let mut store = StatsStore::new(db.clone());

    // Different upstream ids, same item and day
    store
        .store(fetched(
            "ash_prime_set",
            vec![],
            vec![
                entry("d1", "2025-07-15T00:00:00.000+00:00", 40.0),
                entry("d9", "2025-07-15T00:00:00.000+00:00", 41.0),
            ],
        ))
        .await;
    store
        .store(fetched(
            "ember_prime_set",
            vec![],
            vec![entry("d1", "2025-07-15T00:00:00.000+00:00", 80.0)],
        ))
        .await;

    let counters = store.counters();
    assert_eq!(counters.available, 2);
    assert_eq!(counters.inserted, 2);
    assert_eq!(counters.skipped, 1);
    assert_eq!(ItemStats90d::find().count(&db).await.unwrap(), 2);
}

#[tokio::test]
async fn test_bad_rows_do_not_block_siblings() {
    let db = setup_test_db().await.expect("Failed to set up test DB");
    let mut store = StatsStore::new(db.clone());

    let mut no_id = entry("x", "2025-07-16T09:00:00.000+00:00", 1.0);
    no_id.id = None;

    store
        .store(fetched(
            "ash_prime_set",
            vec![
                entry("h1", "2025-07-16T10:00:00.000+00:00", 40.0),
                no_id,
                entry("h2", "not a timestamp", 40.0),
                entry("h3", "2025-07-16T12:00:00.000+00:00", 41.0),
            ],
            vec![entry("d1", "2025-07-15T00:00:00.000+00:00", 39.0)],
        ))
        .await;

    let counters = store.counters();
    assert_eq!(counters.inserted, 3);
    assert_eq!(counters.failed, 2);
    assert_eq!(ItemStats48h::find().count(&db).await.unwrap(), 2);
    assert_eq!(ItemStats90d::find().count(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn test_database_rejected_row_rolls_back_alone() {
    let db = setup_test_db().await.expect("Failed to set up test DB");
    db.execute_unprepared(
        "CREATE TRIGGER reject_h2 BEFORE INSERT ON item_stats_48h \
         WHEN NEW.id = 'h2' \
         BEGIN SELECT RAISE(ABORT, 'rejected by trigger'); END;",
    )
    .await
    .unwrap();

    let mut store = StatsStore::new(db.clone());
    store
        .store(fetched(
            "ash_prime_set",
            vec![
                entry("h1", "2025-07-16T10:00:00.000+00:00", 40.0),
                entry("h2", "2025-07-16T11:00:00.000+00:00", 40.5),
                entry("h3", "2025-07-16T12:00:00.000+00:00", 41.0),
            ],
            vec![entry("d1", "2025-07-15T00:00:00.000+00:00", 39.0)],
        ))
        .await;

    let counters = store.counters();
    assert_eq!(counters.available, 1);
    assert_eq!(counters.inserted, 3);
    assert_eq!(counters.skipped, 0);
    assert_eq!(counters.failed, 1);

    let ids: Vec<String> = ItemStats48h::find()
        .all(&db)
        .await
        .unwrap()
        .into_iter()
        .map(|row| row.id)
        .collect();
    assert_eq!(ids.len(), 2);
    assert!(!ids.contains(&"h2".to_string()));
    assert_eq!(ItemStats90d::find().count(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn test_missing_data_counts_as_skipped() {
    let db = setup_test_db().await.expect("Failed to set up test DB");
    let mut store = StatsStore::new(db.clone());

    store
        .store(FetchOutcome::NoData {
            url_name: "forma_blueprint".to_string(),
        })
        .await;
    store
        .store(FetchOutcome::Unavailable {
            url_name: "ash_prime_set".to_string(),
            attempts: 3,
        })
        .await;
    store.store(fetched("empty_set", vec![], vec![])).await;

    assert_eq!(
        store.counters(),
        RunCounters {
            available: 1,
            inserted: 0,
            skipped: 2,
            failed: 0,
        }
    );
    assert_eq!(ItemStats48h::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_prices_round_trip() {
    let db = setup_test_db().await.expect("Failed to set up test DB");
    let mut store = StatsStore::new(db.clone());
    let when = Utc::now() - Duration::hours(1);

    store
        .store(fetched(
            "ash_prime_set",
            vec![entry("h1", &when.to_rfc3339(), 40.5)],
            vec![],
        ))
        .await;

    let row = ItemStats48h::find().one(&db).await.unwrap().unwrap();
    assert_eq!(row.url_name, "ash_prime_set");
    assert_eq!(row.avg_price, Some(Decimal::new(405, 1)));
    assert_eq!(row.volume, Some(5));
}
