#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use voidwatch_sync::config::SyncConfig;

/// Set up an in-memory database with the production schema
pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    // A second pooled connection would see a different in-memory database
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// Canned answer for one statistics route
#[derive(Clone, Debug)]
pub enum StubStatistics {
    Body(Value),
    Status(u16),
}

#[derive(Default)]
struct StubState {
    items: Vec<Value>,
    catalog: Vec<Value>,
    statistics: HashMap<String, StubStatistics>,
    hits: Mutex<HashMap<String, usize>>,
}

/// Local stand-in for both upstream APIs
pub struct StubUpstream {
    pub base_url: String,
    state: Arc<StubState>,
}

impl StubUpstream {
    /// Total statistics requests received, across all items
    pub fn statistics_requests(&self) -> usize {
        self.state.hits.lock().unwrap().values().sum()
    }

    pub fn hits_for(&self, url_name: &str) -> usize {
        self.state
            .hits
            .lock()
            .unwrap()
            .get(url_name)
            .copied()
            .unwrap_or(0)
    }

    pub fn market_url(&self) -> String {
        format!("{}/v1", self.base_url)
    }

    pub fn catalog_url(&self) -> String {
        format!("{}/catalog/items", self.base_url)
    }

    /// Config pointing at this stub with fast retries and no batch delay
    pub fn config(&self) -> SyncConfig {
        let mut config = SyncConfig::new("sqlite::memory:");
        config.market_api_url = self.market_url();
        config.catalog_api_url = self.catalog_url();
        config.retry_delay = Duration::from_millis(10);
        config.request_timeout = Duration::from_secs(5);
        config.batch_delay = Duration::ZERO;
        config
    }
}

#[derive(Default)]
pub struct StubBuilder {
    state: StubState,
}

impl StubBuilder {
    pub fn item(mut self, id: &str, url_name: &str) -> Self {
        self.state.items.push(json!({
            "id": id,
            "item_name": url_name.replace('_', " "),
            "url_name": url_name,
            "thumb": format!("items/images/en/thumbs/{}.png", url_name),
        }));
        self
    }

    pub fn catalog_entry(mut self, entry: Value) -> Self {
        self.state.catalog.push(entry);
        self
    }

    pub fn statistics(mut self, url_name: &str, response: StubStatistics) -> Self {
        self.state.statistics.insert(url_name.to_string(), response);
        self
    }

    pub async fn spawn(self) -> StubUpstream {
        let state = Arc::new(self.state);

        let app = Router::new()
            .route("/v1/items", get(list_items))
            .route("/v1/items/{url_name}/statistics", get(item_statistics))
            .route("/catalog/items", get(list_catalog))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind stub listener");
        let addr = listener.local_addr().expect("Stub has no local address");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        StubUpstream {
            base_url: format!("http://{}", addr),
            state,
        }
    }
}

async fn list_items(State(state): State<Arc<StubState>>) -> Json<Value> {
    Json(json!({ "payload": { "items": state.items } }))
}

async fn list_catalog(State(state): State<Arc<StubState>>) -> Json<Value> {
    Json(Value::Array(state.catalog.clone()))
}

async fn item_statistics(
    State(state): State<Arc<StubState>>,
    Path(url_name): Path<String>,
) -> Response {
    *state
        .hits
        .lock()
        .unwrap()
        .entry(url_name.clone())
        .or_insert(0) += 1;

    match state.statistics.get(&url_name) {
        Some(StubStatistics::Body(body)) => Json(body.clone()).into_response(),
        Some(StubStatistics::Status(code)) => StatusCode::from_u16(*code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Upstream statistics entry at `datetime`
pub fn sample(id: &str, datetime: DateTime<Utc>, avg_price: f64, volume: i64) -> Value {
    json!({
        "id": id,
        "datetime": datetime.to_rfc3339(),
        "avg_price": avg_price,
        "min_price": avg_price - 1.0,
        "max_price": avg_price + 1.0,
        "volume": volume,
    })
}

/// Full statistics response body
pub fn statistics_body(hours_48: Vec<Value>, days_90: Vec<Value>) -> Value {
    json!({
        "payload": {
            "statistics_closed": {
                "48hours": hours_48,
                "90days": days_90,
            }
        }
    })
}
