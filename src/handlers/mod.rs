use axum::{Router, routing::get};

use crate::AppState;

pub mod market;

/// Routes served by the stats API
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/stats", get(market::get_market_stats))
        .route("/health", get(market::health))
        .with_state(state)
}
