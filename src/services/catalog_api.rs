//! warframestat.us catalog client
//!
//! The catalog returns a flat array of heterogeneous objects. Instead of
//! deriving table columns from whatever keys show up, every object carrying a
//! `uniqueName` is kept whole as a JSON document in `item_info`.

use chrono::Utc;
use reqwest::Client;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ConnectionTrait, DbErr, EntityTrait, Set};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::config::SyncConfig;
use crate::entities::{item_info, prelude::*};
use crate::services::api_error::ApiError;

const UNIQUE_NAME_FIELD: &str = "uniqueName";
const NAME_FIELD: &str = "name";
const UPSERT_CHUNK_SIZE: usize = 500;

#[derive(Clone)]
pub struct CatalogApiService {
    client: Client,
    url: String,
}

/// Result of one item_info upsert pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ItemInfoStats {
    pub received: usize,
    pub stored: usize,
    /// Objects without a usable `uniqueName`
    pub skipped: usize,
}

impl CatalogApiService {
    pub fn new(config: &SyncConfig) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self {
            client,
            url: config.catalog_api_url.clone(),
        })
    }

    /// Fetch every catalog object as raw JSON
    pub async fn fetch_all_items(&self) -> Result<Vec<Value>, ApiError> {
        info!(url = %self.url, "Fetching item catalog");

        let response = self
            .client
            .get(&self.url)
            .header("accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }

        let items: Vec<Value> = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;

        info!(count = items.len(), "Fetched item catalog");
        Ok(items)
    }
}

/// Key catalog objects by `uniqueName`; later duplicates win
fn documents_by_unique_name(items: Vec<Value>) -> (BTreeMap<String, Value>, usize) {
    let mut documents = BTreeMap::new();
    let mut skipped = 0;

    for item in items {
        let unique_name = item
            .get(UNIQUE_NAME_FIELD)
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        match unique_name {
            Some(name) => {
                documents.insert(name, item);
            }
            None => skipped += 1,
        }
    }

    (documents, skipped)
}

/// Upsert catalog documents into `item_info`
pub async fn store_item_info<C: ConnectionTrait>(
    db: &C,
    items: Vec<Value>,
) -> Result<ItemInfoStats, DbErr> {
    let received = items.len();
    let (documents, skipped) = documents_by_unique_name(items);
    let now = Utc::now().fixed_offset();

    let models: Vec<item_info::ActiveModel> = documents
        .into_iter()
        .map(|(unique_name, data)| item_info::ActiveModel {
            unique_name: Set(unique_name),
            name: Set(data.get(NAME_FIELD).and_then(Value::as_str).map(str::to_string)),
            data: Set(data),
            updated_at: Set(now),
        })
        .collect();
    let stored = models.len();

    for chunk in models.chunks(UPSERT_CHUNK_SIZE) {
        ItemInfo::insert_many(chunk.to_vec())
            .on_conflict(
                OnConflict::column(item_info::Column::UniqueName)
                    .update_columns([
                        item_info::Column::Name,
                        item_info::Column::Data,
                        item_info::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;
    }

    if skipped > 0 {
        warn!(skipped = skipped, "Catalog objects without uniqueName were skipped");
    }
    info!(stored = stored, "item_info table updated");

    Ok(ItemInfoStats {
        received,
        stored,
        skipped,
    })
}
