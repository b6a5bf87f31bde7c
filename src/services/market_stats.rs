//! Read side: per-item rankings over the stored statistics windows
//!
//! Windows of 24h and 48h read `item_stats_48h`; 168h, 336h, 720h and 2160h
//! read the day-granular `item_stats_90d`. Rows are loaded per window and
//! aggregated per item (mean of avg, min of min, max of max, summed volume).

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::entities::{item_stats_48h, item_stats_90d, prelude::*};
use crate::models::market_stats::{DisplayItem, MarketStatsResponse};
use crate::services::run_metadata;

/// Window lengths the rankings accept, in hours
pub const ALLOWED_WINDOW_HOURS: [i64; 6] = [24, 48, 168, 336, 720, 2160];

/// Mean prices above this are treated as listing noise in the price ranking
pub const PRICE_CEILING: i64 = 20_000;

#[derive(Debug)]
pub enum MarketStatsError {
    InvalidWindow(i64),
    Database(DbErr),
}

impl std::fmt::Display for MarketStatsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketStatsError::InvalidWindow(hours) => write!(
                f,
                "Invalid window of {} hours, allowed: 24, 48, 168, 336, 720 or 2160",
                hours
            ),
            MarketStatsError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for MarketStatsError {}

impl From<DbErr> for MarketStatsError {
    fn from(e: DbErr) -> Self {
        MarketStatsError::Database(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsTable {
    /// `item_stats_48h`
    Short,
    /// `item_stats_90d`
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsWindow {
    pub hours: i64,
    pub table: StatsTable,
}

impl StatsWindow {
    pub fn from_hours(hours: i64) -> Result<Self, MarketStatsError> {
        let table = match hours {
            24 | 48 => StatsTable::Short,
            168 | 336 | 720 | 2160 => StatsTable::Long,
            _ => return Err(MarketStatsError::InvalidWindow(hours)),
        };

        Ok(Self { hours, table })
    }

    /// Oldest instant inside the window
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::hours(self.hours)
    }

    /// Oldest day whose midnight falls inside the window
    pub fn first_day(&self, now: DateTime<Utc>) -> NaiveDate {
        let cutoff = self.cutoff(now);
        let day = cutoff.date_naive();

        if cutoff.time() == NaiveTime::MIN {
            day
        } else {
            day + Duration::days(1)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ranking {
    /// Highest mean price, outliers above `PRICE_CEILING` dropped
    TopPerformers,
    /// Highest summed volume
    TopSellers,
    /// Highest summed volume
    MostTraded,
}

/// One stored row, reduced to what the rankings need
#[derive(Debug, Clone)]
struct WindowSample {
    url_name: String,
    at: DateTime<Utc>,
    avg_price: Option<Decimal>,
    min_price: Option<Decimal>,
    max_price: Option<Decimal>,
    volume: Option<i32>,
}

#[derive(Debug)]
struct ItemAccumulator {
    latest: DateTime<Utc>,
    avg_sum: Decimal,
    avg_count: u32,
    min_price: Option<Decimal>,
    max_price: Option<Decimal>,
    volume: Option<i64>,
}

impl ItemAccumulator {
    fn new(at: DateTime<Utc>) -> Self {
        Self {
            latest: at,
            avg_sum: Decimal::ZERO,
            avg_count: 0,
            min_price: None,
            max_price: None,
            volume: None,
        }
    }

    fn add(&mut self, sample: &WindowSample) {
        self.latest = self.latest.max(sample.at);

        if let Some(avg) = sample.avg_price {
            self.avg_sum = self.avg_sum.saturating_add(avg);
            self.avg_count += 1;
        }
        if let Some(min) = sample.min_price {
            self.min_price = Some(self.min_price.map_or(min, |m| m.min(min)));
        }
        if let Some(max) = sample.max_price {
            self.max_price = Some(self.max_price.map_or(max, |m| m.max(max)));
        }
        if let Some(volume) = sample.volume {
            self.volume = Some(self.volume.unwrap_or(0) + i64::from(volume));
        }
    }

    fn finish(self, url_name: String) -> DisplayItem {
        let avg_price = if self.avg_count == 0 {
            None
        } else {
            self.avg_sum
                .checked_div(Decimal::from(self.avg_count))
                .map(|mean| mean.round_dp(2))
        };

        DisplayItem {
            url_name,
            latest: self.latest,
            avg_price,
            min_price: self.min_price,
            max_price: self.max_price,
            volume: self.volume,
        }
    }
}

fn aggregate(samples: Vec<WindowSample>) -> Vec<DisplayItem> {
    let mut items: BTreeMap<String, ItemAccumulator> = BTreeMap::new();

    for sample in samples {
        items
            .entry(sample.url_name.clone())
            .or_insert_with(|| ItemAccumulator::new(sample.at))
            .add(&sample);
    }

    items
        .into_iter()
        .map(|(url_name, acc)| acc.finish(url_name))
        .collect()
}

/// Descending, missing values last, then by name for a stable order
fn desc_nulls_last<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Order aggregated items for one ranking and keep the first `limit`
pub fn rank(items: &[DisplayItem], ranking: Ranking, limit: usize) -> Vec<DisplayItem> {
    let mut ranked: Vec<DisplayItem> = match ranking {
        Ranking::TopPerformers => {
            let ceiling = Decimal::from(PRICE_CEILING);
            items
                .iter()
                .filter(|item| item.avg_price.is_some_and(|avg| avg <= ceiling))
                .cloned()
                .collect()
        }
        Ranking::TopSellers | Ranking::MostTraded => items.to_vec(),
    };

    ranked.sort_by(|a, b| {
        let primary = match ranking {
            Ranking::TopPerformers => desc_nulls_last(a.avg_price, b.avg_price),
            Ranking::TopSellers | Ranking::MostTraded => desc_nulls_last(a.volume, b.volume),
        };
        primary.then_with(|| a.url_name.cmp(&b.url_name))
    });

    ranked.truncate(limit);
    ranked
}

/// Load and aggregate every item with samples inside `window`
pub async fn window_items<C: ConnectionTrait>(
    db: &C,
    window: StatsWindow,
    now: DateTime<Utc>,
) -> Result<Vec<DisplayItem>, DbErr> {
    let samples: Vec<WindowSample> = match window.table {
        StatsTable::Short => ItemStats48h::find()
            .filter(item_stats_48h::Column::Datetime.gte(window.cutoff(now).fixed_offset()))
            .all(db)
            .await?
            .into_iter()
            .map(|row| WindowSample {
                url_name: row.url_name,
                at: row.datetime.with_timezone(&Utc),
                avg_price: row.avg_price,
                min_price: row.min_price,
                max_price: row.max_price,
                volume: row.volume,
            })
            .collect(),
        StatsTable::Long => ItemStats90d::find()
            .filter(item_stats_90d::Column::Datetime.gte(window.first_day(now)))
            .all(db)
            .await?
            .into_iter()
            .map(|row| WindowSample {
                url_name: row.url_name,
                at: row.datetime.and_time(NaiveTime::MIN).and_utc(),
                avg_price: row.avg_price,
                min_price: row.min_price,
                max_price: row.max_price,
                volume: row.volume,
            })
            .collect(),
    };

    Ok(aggregate(samples))
}

/// One ranking over one window
pub async fn ranked_items<C: ConnectionTrait>(
    db: &C,
    hours: i64,
    ranking: Ranking,
    limit: usize,
) -> Result<Vec<DisplayItem>, MarketStatsError> {
    let window = StatsWindow::from_hours(hours)?;
    let items = window_items(db, window, Utc::now()).await?;
    Ok(rank(&items, ranking, limit))
}

/// All three rankings for one window plus the last-updated marker
pub async fn market_overview<C: ConnectionTrait>(
    db: &C,
    hours: i64,
    limit: usize,
) -> Result<MarketStatsResponse, MarketStatsError> {
    let window = StatsWindow::from_hours(hours)?;
    let items = window_items(db, window, Utc::now()).await?;

    let last_updated = match run_metadata::last_updated_display(db).await {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read last_updated");
            None
        }
    };

    Ok(MarketStatsResponse {
        hours,
        last_updated,
        top_performers: rank(&items, Ranking::TopPerformers, limit),
        top_sellers: rank(&items, Ranking::TopSellers, limit),
        most_traded: rank(&items, Ranking::MostTraded, limit),
    })
}
