use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    models::market_stats::{ErrorResponse, MarketStatsQuery, MarketStatsResponse},
    services::market_stats::{self, MarketStatsError},
};

/// Handler for GET /api/stats
/// Top performers, top sellers and most traded items over one window
pub async fn get_market_stats(
    State(state): State<AppState>,
    Query(query): Query<MarketStatsQuery>,
) -> Result<Json<MarketStatsResponse>, (StatusCode, Json<ErrorResponse>)> {
    if let Err(e) = query.validate() {
        return Err((StatusCode::BAD_REQUEST, Json(ErrorResponse { error: e })));
    }

    tracing::info!(
        "Fetching market stats (hours: {}, limit: {})",
        query.hours(),
        query.limit()
    );

    let limit = query.limit() as usize;

    market_stats::market_overview(&state.db, query.hours(), limit)
        .await
        .map(Json)
        .map_err(|e| {
            let status = match &e {
                MarketStatsError::InvalidWindow(_) => StatusCode::BAD_REQUEST,
                MarketStatsError::Database(_) => {
                    tracing::error!("Database error while ranking items: {}", e);
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            (status, Json(ErrorResponse { error: e.to_string() }))
        })
}

pub async fn health() -> &'static str {
    "ok"
}
