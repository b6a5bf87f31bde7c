use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const DEFAULT_WINDOW_HOURS: i64 = 24;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

/// Query parameters for GET /api/stats
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarketStatsQuery {
    pub hours: Option<i64>,
    pub limit: Option<u64>,
}

impl MarketStatsQuery {
    pub fn hours(&self) -> i64 {
        self.hours.unwrap_or(DEFAULT_WINDOW_HOURS)
    }

    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(limit) = self.limit {
            if limit < 1 || limit > MAX_LIMIT {
                return Err(format!(
                    "limit must be between 1 and {}, got: {}",
                    MAX_LIMIT, limit
                ));
            }
        }

        Ok(())
    }
}

/// One item aggregated over a window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayItem {
    pub url_name: String,
    /// Newest sample in the window
    pub latest: DateTime<Utc>,
    pub avg_price: Option<Decimal>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub volume: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketStatsResponse {
    pub hours: i64,
    pub last_updated: Option<String>,
    pub top_performers: Vec<DisplayItem>,
    pub top_sellers: Vec<DisplayItem>,
    pub most_traded: Vec<DisplayItem>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
