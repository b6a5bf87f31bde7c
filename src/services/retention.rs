//! Retention pruning for the statistics windows
//!
//! - 48h table: rows older than 48 hours before the current instant
//! - 90d table: rows older than 90 days before the current date
//!
//! Pruning is housekeeping: failures are logged and reported as zero deleted.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};
use tracing::{error, info};

use crate::entities::{item_stats_48h, item_stats_90d, prelude::*};

pub const SHORT_WINDOW_HOURS: i64 = 48;
pub const LONG_WINDOW_DAYS: i64 = 90;

/// Rows removed by one pruning pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PruneStats {
    pub deleted_48h: u64,
    pub deleted_90d: u64,
}

/// Oldest instant kept in the 48h table
pub fn short_window_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::hours(SHORT_WINDOW_HOURS)
}

/// Oldest date kept in the 90d table
pub fn long_window_cutoff(today: NaiveDate) -> NaiveDate {
    today - Duration::days(LONG_WINDOW_DAYS)
}

/// Delete 48h rows strictly older than `now - 48h`
pub async fn prune_48h<C: ConnectionTrait>(db: &C, now: DateTime<Utc>) -> Result<u64, DbErr> {
    let cutoff = short_window_cutoff(now).fixed_offset();

    let result = ItemStats48h::delete_many()
        .filter(item_stats_48h::Column::Datetime.lt(cutoff))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

/// Delete 90d rows strictly older than `today - 90 days`
pub async fn prune_90d<C: ConnectionTrait>(db: &C, today: NaiveDate) -> Result<u64, DbErr> {
    let cutoff = long_window_cutoff(today);

    let result = ItemStats90d::delete_many()
        .filter(item_stats_90d::Column::Datetime.lt(cutoff))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

/// Prune both tables relative to the current clock, never failing
pub async fn prune_expired<C: ConnectionTrait>(db: &C) -> PruneStats {
    let now = Utc::now();

    let deleted_48h = match prune_48h(db, now).await {
        Ok(deleted) => deleted,
        Err(e) => {
            error!(error = %e, "Failed to delete old 48h statistics");
            0
        }
    };

    let deleted_90d = match prune_90d(db, now.date_naive()).await {
        Ok(deleted) => deleted,
        Err(e) => {
            error!(error = %e, "Failed to delete old 90d statistics");
            0
        }
    };

    info!(
        deleted_48h = deleted_48h,
        deleted_90d = deleted_90d,
        "Deleted {} rows from item_stats_48h and {} rows from item_stats_90d",
        deleted_48h,
        deleted_90d
    );

    PruneStats {
        deleted_48h,
        deleted_90d,
    }
}
