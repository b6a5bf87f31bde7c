//! Item catalog persistence
//!
//! Known items are never rewritten: the market catalog only ever adds ids.

use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, Set};
use tracing::info;

use crate::entities::{items, prelude::*};
use crate::models::market::MarketItem;

/// Rows per insert statement, well below the postgres bind limit
const INSERT_CHUNK_SIZE: usize = 500;

/// Insert items whose id is not stored yet. Returns the number of new rows.
pub async fn store_items<C: ConnectionTrait>(db: &C, market_items: &[MarketItem]) -> Result<u64, DbErr> {
    let mut inserted = 0;

    for chunk in market_items.chunks(INSERT_CHUNK_SIZE) {
        let models = chunk.iter().map(|item| items::ActiveModel {
            id: Set(item.id.clone()),
            item_name: Set(item.item_name.clone()),
            url_name: Set(item.url_name.clone()),
            thumb: Set(item.thumb.clone()),
        });

        inserted += Items::insert_many(models)
            .on_conflict(
                OnConflict::column(items::Column::Id)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;
    }

    info!(
        received = market_items.len(),
        inserted = inserted,
        "Item catalog refreshed"
    );

    Ok(inserted)
}

/// Url names of every stored item that has one, in stable order
pub async fn tracked_url_names<C: ConnectionTrait>(db: &C) -> Result<Vec<String>, DbErr> {
    let records = Items::find()
        .filter(items::Column::UrlName.is_not_null())
        .order_by_asc(items::Column::UrlName)
        .all(db)
        .await?;

    Ok(records
        .into_iter()
        .filter_map(|item| item.url_name)
        .filter(|name| !name.is_empty())
        .collect())
}
