//! warframe.market API client
//!
//! Fetches the tradable item list and per-item price statistics. Statistics
//! requests are retried with a fixed delay; HTTP 429 is logged separately
//! from other failures but waits out the same delay.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::SyncConfig;
use crate::models::market::{
    FetchOutcome, ItemStatistics, ItemsResponse, MarketItem, StatisticsResponse,
};
use crate::services::api_error::ApiError;

/// Anything that can produce statistics for an item by its url name.
///
/// Implementations own their retry policy and never fail: exhausted
/// attempts surface as `FetchOutcome::Unavailable`.
#[async_trait]
pub trait StatisticsSource: Send + Sync {
    async fn fetch_statistics(&self, url_name: &str) -> FetchOutcome;
}

#[derive(Clone)]
pub struct MarketApiService {
    client: Client,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl MarketApiService {
    pub fn new(config: &SyncConfig) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self {
            client,
            base_url: config.market_api_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries.max(1),
            retry_delay: config.retry_delay,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch every tradable item
    pub async fn fetch_items(&self) -> Result<Vec<MarketItem>, ApiError> {
        let url = format!("{}/items", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }

        let data: ItemsResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;

        Ok(data.payload.items)
    }

    /// One statistics request, no retry
    async fn request_statistics(
        &self,
        url_name: &str,
    ) -> Result<StatisticsResponse, ApiError> {
        let url = format!("{}/items/{}/statistics", self.base_url, url_name);

        let response = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ApiError::RateLimited);
        }
        if !status.is_success() {
            return Err(ApiError::Status(status));
        }

        response
            .json::<StatisticsResponse>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Fetch statistics for one item, retrying up to `max_retries` attempts
    pub async fn fetch_statistics_with_retry(&self, url_name: &str) -> FetchOutcome {
        if url_name.is_empty() {
            warn!("Refusing to fetch statistics for an empty url name");
            return FetchOutcome::Unavailable {
                url_name: String::new(),
                attempts: 0,
            };
        }

        for attempt in 1..=self.max_retries {
            match self.request_statistics(url_name).await {
                Ok(response) => return classify_response(url_name, response),
                Err(ApiError::RateLimited) => {
                    warn!(
                        url_name = %url_name,
                        attempt = attempt,
                        max_attempts = self.max_retries,
                        "429 Too Many Requests"
                    );
                }
                Err(e) => {
                    warn!(
                        url_name = %url_name,
                        attempt = attempt,
                        max_attempts = self.max_retries,
                        error = %e,
                        "Statistics request failed"
                    );
                }
            }

            if attempt < self.max_retries {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        warn!(
            url_name = %url_name,
            attempts = self.max_retries,
            "Giving up on statistics after max attempts"
        );

        FetchOutcome::Unavailable {
            url_name: url_name.to_string(),
            attempts: self.max_retries,
        }
    }
}

#[async_trait]
impl StatisticsSource for MarketApiService {
    async fn fetch_statistics(&self, url_name: &str) -> FetchOutcome {
        self.fetch_statistics_with_retry(url_name).await
    }
}

/// Map a decoded response to `Fetched` or `NoData`
fn classify_response(url_name: &str, response: StatisticsResponse) -> FetchOutcome {
    let closed = response
        .payload
        .and_then(|payload| payload.statistics_closed)
        .filter(|closed| !closed.is_empty());

    match closed {
        Some(closed) => {
            let stats = ItemStatistics {
                url_name: url_name.to_string(),
                stats_48h: closed.hours_48.unwrap_or_default(),
                stats_90d: closed.days_90.unwrap_or_default(),
            };
            debug!(
                url_name = %url_name,
                samples_48h = stats.stats_48h.len(),
                samples_90d = stats.stats_90d.len(),
                "Fetched statistics"
            );
            FetchOutcome::Fetched(stats)
        }
        None => {
            debug!(url_name = %url_name, "No statistics section in response");
            FetchOutcome::NoData {
                url_name: url_name.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_missing_section_as_no_data() {
        let outcome = classify_response("ash_prime_set", StatisticsResponse::default());
        assert!(matches!(outcome, FetchOutcome::NoData { .. }));
        assert_eq!(outcome.url_name(), "ash_prime_set");
    }

    #[test]
    fn test_classify_partial_section_as_fetched() {
        let response: StatisticsResponse = serde_json::from_str(
            r#"{"payload": {"statistics_closed": {"90days": [{"id": "d1"}]}}}"#,
        )
        .unwrap();

        match classify_response("ash_prime_set", response) {
            FetchOutcome::Fetched(stats) => {
                assert!(stats.stats_48h.is_empty());
                assert_eq!(stats.stats_90d.len(), 1);
            }
            other => panic!("expected Fetched, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_url_name_is_unavailable_without_request() {
        let config = SyncConfig::new("sqlite::memory:");
        let service = MarketApiService::new(&config).unwrap();

        let outcome = service.fetch_statistics_with_retry("").await;
        assert!(matches!(
            outcome,
            FetchOutcome::Unavailable { attempts: 0, .. }
        ));
    }
}
