//! Time-series store for fetched item statistics
//!
//! Writes both statistics windows with conflict-tolerant inserts, so
//! re-running over overlapping data only produces skips. Each fetched result
//! is committed as one transaction; each row runs inside its own savepoint so
//! a single bad row cannot poison the rest of the result.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, QueryTrait, Set,
    Statement, TransactionTrait,
};
use tracing::{debug, error, info, warn};

use crate::entities::{item_stats_48h, item_stats_90d, prelude::*};
use crate::models::market::{FetchOutcome, ItemStatistics, StatisticsEntry};
use crate::services::dispatcher::OutcomeSink;

/// Per-run outcome counters; logged at the end of a run, never persisted
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunCounters {
    /// Items whose statistics were fetched
    pub available: usize,
    /// Rows newly written
    pub inserted: usize,
    /// Rows that already existed, plus items without fetched data
    pub skipped: usize,
    /// Rows rejected by validation or the database
    pub failed: usize,
}

impl std::fmt::Display for RunCounters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "available={}, inserted={}, skipped={}, failed={}",
            self.available, self.inserted, self.skipped, self.failed
        )
    }
}

/// Why a single row was not written
#[derive(Debug)]
pub enum RowError {
    Invalid(String),
    Database(DbErr),
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowError::Invalid(msg) => write!(f, "Invalid sample: {}", msg),
            RowError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for RowError {}

impl From<DbErr> for RowError {
    fn from(e: DbErr) -> Self {
        RowError::Database(e)
    }
}

/// Row tallies for one result, applied to the run counters after commit
#[derive(Debug, Default)]
struct ResultTally {
    inserted: usize,
    skipped: usize,
    failed: usize,
}

impl ResultTally {
    fn record(&mut self, result: Result<bool, RowError>, window: &str, url_name: &str) {
        match result {
            Ok(true) => self.inserted += 1,
            Ok(false) => self.skipped += 1,
            Err(e) => {
                self.failed += 1;
                warn!(url_name = %url_name, window = window, error = %e, "Insert failed");
            }
        }
    }
}

pub struct StatsStore {
    db: DatabaseConnection,
    counters: RunCounters,
}

impl StatsStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            counters: RunCounters::default(),
        }
    }

    pub fn counters(&self) -> RunCounters {
        self.counters
    }

    /// Count an item whose outcome never reached the store
    pub fn record_lost(&mut self, count: usize) {
        self.counters.skipped += count;
    }

    /// Persist one fetch outcome
    pub async fn store(&mut self, outcome: FetchOutcome) {
        match outcome {
            FetchOutcome::Fetched(stats) => {
                self.counters.available += 1;
                self.store_statistics(&stats).await;
            }
            FetchOutcome::NoData { url_name } => {
                debug!(url_name = %url_name, "No statistics available, skipping");
                self.counters.skipped += 1;
            }
            FetchOutcome::Unavailable { url_name, attempts } => {
                info!(url_name = %url_name, attempts = attempts, "Statistics unavailable, skipping");
                self.counters.skipped += 1;
            }
        }
    }

    async fn store_statistics(&mut self, stats: &ItemStatistics) {
        let attempted = stats.stats_48h.len() + stats.stats_90d.len();

        match write_statistics(&self.db, stats).await {
            Ok(tally) => {
                self.counters.inserted += tally.inserted;
                self.counters.skipped += tally.skipped;
                self.counters.failed += tally.failed;
                debug!(
                    url_name = %stats.url_name,
                    inserted = tally.inserted,
                    skipped = tally.skipped,
                    failed = tally.failed,
                    "Stored statistics"
                );
            }
            Err(e) => {
                // Nothing from this result was committed
                self.counters.failed += attempted;
                error!(url_name = %stats.url_name, error = %e, "Statistics transaction failed");
            }
        }
    }
}

#[async_trait]
impl OutcomeSink for StatsStore {
    async fn accept(&mut self, outcome: FetchOutcome) {
        self.store(outcome).await;
    }
}

/// Write both windows of one result in a single transaction
async fn write_statistics(
    db: &DatabaseConnection,
    stats: &ItemStatistics,
) -> Result<ResultTally, DbErr> {
    let txn = db.begin().await?;
    let mut tally = ResultTally::default();

    for entry in &stats.stats_48h {
        let result = insert_48h(&txn, &stats.url_name, entry).await;
        tally.record(result, "48h", &stats.url_name);
    }

    for entry in &stats.stats_90d {
        let result = insert_90d(&txn, &stats.url_name, entry).await;
        tally.record(result, "90d", &stats.url_name);
    }

    txn.commit().await?;
    Ok(tally)
}

async fn insert_48h(
    txn: &DatabaseTransaction,
    url_name: &str,
    entry: &StatisticsEntry,
) -> Result<bool, RowError> {
    let model = to_48h_model(url_name, entry).map_err(RowError::Invalid)?;

    let stmt = ItemStats48h::insert(model)
        .on_conflict(
            OnConflict::columns([item_stats_48h::Column::Id, item_stats_48h::Column::Datetime])
                .do_nothing()
                .to_owned(),
        )
        .build(txn.get_database_backend());

    insert_in_savepoint(txn, stmt).await
}

async fn insert_90d(
    txn: &DatabaseTransaction,
    url_name: &str,
    entry: &StatisticsEntry,
) -> Result<bool, RowError> {
    let model = to_90d_model(url_name, entry).map_err(RowError::Invalid)?;

    let stmt = ItemStats90d::insert(model)
        .on_conflict(
            OnConflict::columns([
                item_stats_90d::Column::UrlName,
                item_stats_90d::Column::Datetime,
            ])
            .do_nothing()
            .to_owned(),
        )
        .build(txn.get_database_backend());

    insert_in_savepoint(txn, stmt).await
}

/// Execute one conflict-tolerant insert; `Ok(false)` means the key existed
async fn insert_in_savepoint(
    txn: &DatabaseTransaction,
    stmt: Statement,
) -> Result<bool, RowError> {
    let savepoint = txn.begin().await?;

    match savepoint.execute(stmt).await {
        Ok(result) => {
            savepoint.commit().await?;
            Ok(result.rows_affected() > 0)
        }
        Err(e) => {
            savepoint.rollback().await?;
            Err(RowError::Database(e))
        }
    }
}

fn parse_datetime(entry: &StatisticsEntry) -> Result<DateTime<FixedOffset>, String> {
    let raw = entry
        .datetime
        .as_deref()
        .ok_or_else(|| "missing datetime".to_string())?;

    DateTime::parse_from_rfc3339(raw).map_err(|e| format!("bad datetime '{}': {}", raw, e))
}

fn to_decimal(value: Option<f64>) -> Result<Option<Decimal>, String> {
    value
        .map(|v| Decimal::from_f64(v).ok_or_else(|| format!("price {} out of range", v)))
        .transpose()
}

fn to_volume(value: Option<i64>) -> Result<Option<i32>, String> {
    value
        .map(|v| i32::try_from(v).map_err(|_| format!("volume {} out of range", v)))
        .transpose()
}

fn to_48h_model(
    url_name: &str,
    entry: &StatisticsEntry,
) -> Result<item_stats_48h::ActiveModel, String> {
    let id = entry.id.clone().ok_or_else(|| "missing id".to_string())?;
    let datetime = parse_datetime(entry)?.with_timezone(&Utc).fixed_offset();

    Ok(item_stats_48h::ActiveModel {
        id: Set(id),
        url_name: Set(url_name.to_string()),
        datetime: Set(datetime),
        avg_price: Set(to_decimal(entry.avg_price)?),
        min_price: Set(to_decimal(entry.min_price)?),
        max_price: Set(to_decimal(entry.max_price)?),
        volume: Set(to_volume(entry.volume)?),
    })
}

fn to_90d_model(
    url_name: &str,
    entry: &StatisticsEntry,
) -> Result<item_stats_90d::ActiveModel, String> {
    let id = entry.id.clone().ok_or_else(|| "missing id".to_string())?;
    // Calendar day as reported upstream
    let date: NaiveDate = parse_datetime(entry)?.date_naive();

    Ok(item_stats_90d::ActiveModel {
        id: Set(id),
        url_name: Set(url_name.to_string()),
        datetime: Set(date),
        avg_price: Set(to_decimal(entry.avg_price)?),
        min_price: Set(to_decimal(entry.min_price)?),
        max_price: Set(to_decimal(entry.max_price)?),
        volume: Set(to_volume(entry.volume)?),
    })
}
