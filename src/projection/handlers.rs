use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::{info, instrument};

use crate::{
    error::ApiError,
    projection::engine::{project, ProjectionResult, DEFAULT_HORIZON_HOURS},
    state::AppState,
};

/// Days of history fetched to feed a projection.
const HISTORY_DAYS: u32 = 30;

#[derive(Debug, Deserialize)]
pub struct PredictQuery {
    #[serde(default = "default_hours")]
    pub hours: u32,
    pub currency: Option<String>,
}
fn default_hours() -> u32 {
    DEFAULT_HORIZON_HOURS
}

pub fn projection_routes() -> Router<AppState> {
    Router::new().route("/api/predict/:coin_id", get(predict_price))
}

#[instrument(skip(state))]
pub async fn predict_price(
    State(state): State<AppState>,
    Path(coin_id): Path<String>,
    query: Result<Query<PredictQuery>, QueryRejection>,
) -> Result<Json<ProjectionResult>, ApiError> {
    let Query(q) = query?;
    let currency = state.currency_or_default(q.currency);
    let history = state
        .market
        .coin_history(&coin_id, HISTORY_DAYS, &currency)
        .await
        .map_err(ApiError::upstream("coin history"))?;

    let res = project(&coin_id, &history, q.hours, OffsetDateTime::now_utc())?;
    info!(
        coin_id = %res.coin_id,
        trend = ?res.trend,
        confidence = res.confidence,
        "projection computed"
    );
    Ok(Json(res))
}
