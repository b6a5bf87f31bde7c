//! Batch dispatcher for statistics fetches
//!
//! Splits the item list into fixed-size batches. Each batch runs fully in
//! parallel on its own task group; results are handed to the sink one at a
//! time as they complete, and the next batch starts only after the whole
//! batch has finished and the inter-batch delay has elapsed.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::config::SyncConfig;
use crate::models::market::FetchOutcome;
use crate::services::market_api::StatisticsSource;

/// Receives fetch outcomes sequentially, in completion order within a batch
#[async_trait]
pub trait OutcomeSink: Send {
    async fn accept(&mut self, outcome: FetchOutcome);
}

/// Totals from one dispatch run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DispatchSummary {
    pub batches: usize,
    pub dispatched: usize,
    /// Worker tasks that panicked or were cancelled; their outcome is lost
    pub lost: usize,
}

#[derive(Debug, Clone)]
pub struct BatchDispatcher {
    batch_size: usize,
    batch_delay: Duration,
}

impl BatchDispatcher {
    pub fn new(batch_size: usize, batch_delay: Duration) -> Self {
        Self {
            batch_size: batch_size.max(1),
            batch_delay,
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.batch_size, config.batch_delay)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Drive `source` over every name, feeding each outcome to `sink`
    pub async fn run(
        &self,
        source: Arc<dyn StatisticsSource>,
        url_names: &[String],
        sink: &mut dyn OutcomeSink,
    ) -> DispatchSummary {
        let mut summary = DispatchSummary::default();
        let total_batches = url_names.len().div_ceil(self.batch_size);

        for (index, batch) in url_names.chunks(self.batch_size).enumerate() {
            let mut workers = JoinSet::new();

            for url_name in batch {
                let source = Arc::clone(&source);
                let url_name = url_name.clone();
                workers.spawn(async move { source.fetch_statistics(&url_name).await });
            }
            summary.dispatched += batch.len();

            while let Some(joined) = workers.join_next().await {
                match joined {
                    Ok(outcome) => sink.accept(outcome).await,
                    Err(e) => {
                        error!(error = %e, batch = index + 1, "Statistics worker failed");
                        summary.lost += 1;
                    }
                }
            }

            summary.batches += 1;
            debug!(batch = index + 1, total_batches = total_batches, "Batch complete");

            if (index + 1) % 100 == 0 {
                info!(
                    "Progress: {}/{} batches | {} items dispatched",
                    index + 1,
                    total_batches,
                    summary.dispatched
                );
            }

            if !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }
        }

        summary
    }
}
