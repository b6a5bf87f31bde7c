//! SeaORM Entity for the 48-hour statistics window

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "item_stats_48h")]
pub struct Model {
    /// Upstream statistics entry id
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,
    #[sea_orm(column_type = "Text")]
    pub url_name: String,
    /// Sample timestamp, normalized to UTC
    #[sea_orm(primary_key, auto_increment = false)]
    pub datetime: DateTimeWithTimeZone,
    #[sea_orm(column_type = "Decimal(None)", nullable)]
    pub avg_price: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(None)", nullable)]
    pub min_price: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(None)", nullable)]
    pub max_price: Option<Decimal>,
    pub volume: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
