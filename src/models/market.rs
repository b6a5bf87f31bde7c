use serde::{Deserialize, Serialize};

/// `GET /items` envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemsResponse {
    pub payload: ItemsPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemsPayload {
    pub items: Vec<MarketItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketItem {
    pub id: String,
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub url_name: Option<String>,
    #[serde(default)]
    pub thumb: Option<String>,
}

/// `GET /items/{url_name}/statistics` envelope
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatisticsResponse {
    #[serde(default)]
    pub payload: Option<StatisticsPayload>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatisticsPayload {
    #[serde(default)]
    pub statistics_closed: Option<StatisticsClosed>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatisticsClosed {
    #[serde(rename = "48hours", default)]
    pub hours_48: Option<Vec<StatisticsEntry>>,
    #[serde(rename = "90days", default)]
    pub days_90: Option<Vec<StatisticsEntry>>,
}

impl StatisticsClosed {
    /// True when neither window was present in the response
    pub fn is_empty(&self) -> bool {
        self.hours_48.is_none() && self.days_90.is_none()
    }
}

/// One point of a statistics window.
///
/// Every field is optional upstream; missing keys are rejected per row by the
/// store rather than failing the whole response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatisticsEntry {
    #[serde(default)]
    pub id: Option<String>,
    /// RFC 3339 timestamp, e.g. `2025-07-16T13:00:00.000+00:00`
    #[serde(default)]
    pub datetime: Option<String>,
    #[serde(default)]
    pub avg_price: Option<f64>,
    #[serde(default)]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub max_price: Option<f64>,
    #[serde(default)]
    pub volume: Option<i64>,
}

/// Statistics fetched for a single item, both windows
#[derive(Debug, Clone, Default)]
pub struct ItemStatistics {
    pub url_name: String,
    pub stats_48h: Vec<StatisticsEntry>,
    pub stats_90d: Vec<StatisticsEntry>,
}

/// Terminal result of fetching one item's statistics
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Fetched(ItemStatistics),
    /// Upstream answered but had no statistics section
    NoData { url_name: String },
    /// All attempts failed
    Unavailable { url_name: String, attempts: u32 },
}

impl FetchOutcome {
    pub fn url_name(&self) -> &str {
        match self {
            FetchOutcome::Fetched(stats) => &stats.url_name,
            FetchOutcome::NoData { url_name } => url_name,
            FetchOutcome::Unavailable { url_name, .. } => url_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistics_response_parses_both_windows() {
        let body = r#"{
            "payload": {
                "statistics_closed": {
                    "48hours": [
                        {"id": "a1", "datetime": "2025-07-16T13:00:00.000+00:00",
                         "avg_price": 12.5, "min_price": 10, "max_price": 15, "volume": 7,
                         "open_price": 11, "closed_price": 14}
                    ],
                    "90days": []
                }
            }
        }"#;

        let response: StatisticsResponse = serde_json::from_str(body).unwrap();
        let closed = response.payload.unwrap().statistics_closed.unwrap();
        let hours = closed.hours_48.unwrap();

        assert_eq!(hours.len(), 1);
        assert_eq!(hours[0].id.as_deref(), Some("a1"));
        assert_eq!(hours[0].volume, Some(7));
        assert_eq!(closed.days_90.map(|d| d.len()), Some(0));
    }

    #[test]
    fn test_empty_statistics_section_is_empty() {
        let response: StatisticsResponse =
            serde_json::from_str(r#"{"payload": {"statistics_closed": {}}}"#).unwrap();
        let closed = response.payload.unwrap().statistics_closed.unwrap();
        assert!(closed.is_empty());

        let response: StatisticsResponse = serde_json::from_str(r#"{"payload": {}}"#).unwrap();
        assert!(response.payload.unwrap().statistics_closed.is_none());
    }

    #[test]
    fn test_items_response_tolerates_missing_fields() {
        let body = r#"{"payload": {"items": [{"id": "x", "url_name": "ash_prime_set"}]}}"#;
        let response: ItemsResponse = serde_json::from_str(body).unwrap();

        assert_eq!(response.payload.items.len(), 1);
        assert_eq!(response.payload.items[0].url_name.as_deref(), Some("ash_prime_set"));
        assert!(response.payload.items[0].thumb.is_none());
    }
}
