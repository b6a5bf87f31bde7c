// src/lib.rs

use sea_orm::DatabaseConnection;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
}

pub mod config;

pub mod entities {
    pub mod prelude;
    pub mod item_info;
    pub mod item_stats_48h;
    pub mod item_stats_90d;
    pub mod items;
    pub mod metadata;
}

pub mod services {
    pub mod api_error;
    pub mod market_api;
    pub mod catalog_api;
    pub mod dispatcher;
    pub mod stats_store;
    pub mod retention;
    pub mod item_catalog;
    pub mod run_metadata;
    pub mod market_stats;
}

pub mod models;
pub mod jobs;
pub mod handlers;
