//! Statistics sync run
//!
//! One run, in order:
//! 1. Bootstrap tables (migrations, all `IF NOT EXISTS`)
//! 2. Refresh `item_info` from warframestat.us
//! 3. Refresh the item catalog from warframe.market
//! 4. Fetch and store statistics for every tracked item (skipped on dry run)
//! 5. Prune both statistics windows
//! 6. Record the `last_updated` timestamp
//!
//! Each phase logs its own failures; only a failed bootstrap stops the
//! sequence. Nothing is propagated to the caller, and every exit path ends
//! with the runtime line.

use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::config::{ConfigError, SyncConfig};
use crate::services::catalog_api::{self, CatalogApiService, ItemInfoStats};
use crate::services::dispatcher::{BatchDispatcher, DispatchSummary};
use crate::services::item_catalog;
use crate::services::api_error::ApiError;
use crate::services::market_api::{MarketApiService, StatisticsSource};
use crate::services::retention::{self, PruneStats};
use crate::services::run_metadata;
use crate::services::stats_store::{RunCounters, StatsStore};

/// What one run did; mirrors what is logged
#[derive(Debug, Default, Clone)]
pub struct RunReport {
    pub bootstrapped: bool,
    pub item_info: Option<ItemInfoStats>,
    pub items_inserted: Option<u64>,
    /// `None` when the statistics phase did not run
    pub dispatch: Option<DispatchSummary>,
    pub counters: RunCounters,
    pub pruned: PruneStats,
    pub last_updated_recorded: bool,
    /// Wall time of the whole run, set once the runtime line is logged
    pub runtime: Option<Duration>,
}

pub struct StatsSyncJob {
    config: SyncConfig,
    market: MarketApiService,
    catalog: CatalogApiService,
    source: Arc<dyn StatisticsSource>,
}

impl StatsSyncJob {
    pub fn new(config: SyncConfig) -> Result<Self, ApiError> {
        let market = MarketApiService::new(&config)?;
        let catalog = CatalogApiService::new(&config)?;
        let source: Arc<dyn StatisticsSource> = Arc::new(market.clone());

        Ok(Self {
            config,
            market,
            catalog,
            source,
        })
    }

    /// Replace the statistics fetcher
    pub fn with_source(mut self, source: Arc<dyn StatisticsSource>) -> Self {
        self.source = source;
        self
    }

    /// Connect, run every phase, close the connection
    pub async fn run(&self, dry_run: bool) -> RunReport {
        let started = Instant::now();
        let mut report = self.connect_and_run(dry_run).await;
        report.runtime = Some(log_runtime(started.elapsed()));
        report
    }

    async fn connect_and_run(&self, dry_run: bool) -> RunReport {
        match Database::connect(&self.config.database_url).await {
            Ok(db) => {
                let report = self.run_with_connection(&db, dry_run).await;
                if let Err(e) = db.close().await {
                    warn!(error = %e, "Failed to close database connection");
                }
                report
            }
            Err(e) => {
                error!(error = %e, "Failed to connect to database");
                RunReport::default()
            }
        }
    }

    /// Run every phase against an open connection
    pub async fn run_with_connection(&self, db: &DatabaseConnection, dry_run: bool) -> RunReport {
        let mut report = RunReport::default();

        if let Err(e) = self.run_phases(db, dry_run, &mut report).await {
            error!(error = %e, "General error in statistics sync run");
        }

        report
    }

    async fn run_phases(
        &self,
        db: &DatabaseConnection,
        dry_run: bool,
        report: &mut RunReport,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        migration::Migrator::up(db, None).await?;
        report.bootstrapped = true;

        report.item_info = self.sync_item_info(db).await;
        report.items_inserted = self.refresh_items(db).await;

        if dry_run {
            info!("Statistics sync skipped (dry run)");
        } else {
            match self.sync_statistics(db).await {
                Ok((dispatch, counters)) => {
                    report.dispatch = Some(dispatch);
                    report.counters = counters;
                }
                Err(e) => error!(error = %e, "Statistics sync failed"),
            }
        }

        report.pruned = retention::prune_expired(db).await;

        match run_metadata::record_last_updated(db).await {
            Ok(_) => report.last_updated_recorded = true,
            Err(e) => error!(error = %e, "Failed to update last_updated timestamp"),
        }

        Ok(())
    }

    async fn sync_item_info(&self, db: &DatabaseConnection) -> Option<ItemInfoStats> {
        let items = match self.catalog.fetch_all_items().await {
            Ok(items) if !items.is_empty() => items,
            Ok(_) => {
                warn!("No catalog items to sync");
                return None;
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch item catalog");
                return None;
            }
        };

        match catalog_api::store_item_info(db, items).await {
            Ok(stats) => Some(stats),
            Err(e) => {
                error!(error = %e, "Failed to sync item_info table");
                None
            }
        }
    }

    async fn refresh_items(&self, db: &DatabaseConnection) -> Option<u64> {
        info!(url = %self.market.base_url(), "Starting item sync");

        let items = match self.market.fetch_items().await {
            Ok(items) if !items.is_empty() => items,
            Ok(_) => {
                warn!("Market returned no items, keeping stored catalog");
                return None;
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch market items, keeping stored catalog");
                return None;
            }
        };

        match item_catalog::store_items(db, &items).await {
            Ok(inserted) => Some(inserted),
            Err(e) => {
                error!(error = %e, "Failed to store market items");
                None
            }
        }
    }

    async fn sync_statistics(
        &self,
        db: &DatabaseConnection,
    ) -> Result<(DispatchSummary, RunCounters), Box<dyn std::error::Error + Send + Sync>> {
        let url_names = item_catalog::tracked_url_names(db).await?;
        info!(items = url_names.len(), "Fetching statistics");

        let dispatcher = BatchDispatcher::from_config(&self.config);
        let mut store = StatsStore::new(db.clone());

        let dispatch = dispatcher
            .run(Arc::clone(&self.source), &url_names, &mut store)
            .await;
        store.record_lost(dispatch.lost);

        let counters = store.counters();
        info!(
            available = counters.available,
            inserted = counters.inserted,
            skipped = counters.skipped,
            failed = counters.failed,
            "API sync complete: {}",
            counters
        );

        Ok((dispatch, counters))
    }
}

/// Build the job from a loaded config and run it once
pub async fn run_once(config: Result<SyncConfig, ConfigError>, dry_run: bool) -> RunReport {
    let started = Instant::now();

    let mut report = match config {
        Ok(config) => match StatsSyncJob::new(config) {
            Ok(job) => job.connect_and_run(dry_run).await,
            Err(e) => {
                error!(error = %e, "Failed to initialize API clients");
                RunReport::default()
            }
        },
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            RunReport::default()
        }
    };

    report.runtime = Some(log_runtime(started.elapsed()));
    report
}

fn log_runtime(elapsed: Duration) -> Duration {
    let secs = elapsed.as_secs_f64();

    if secs < 60.0 {
        info!("Runtime: {:.2} seconds", secs);
    } else {
        info!("Runtime: {:.2} minutes", secs / 60.0);
    }

    info!("---------------------------------------------------------------------------");
    elapsed
}
