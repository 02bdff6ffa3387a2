use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use crate::{error::ApiError, market::PriceSample, state::AppState};

const DEFAULT_COINS: &str = "bitcoin,ethereum,cardano,polkadot,chainlink";

#[derive(Debug, Deserialize)]
pub struct MarketQuery {
    #[serde(default = "default_coins")]
    pub coins: String,
    pub currency: Option<String>,
}
fn default_coins() -> String {
    DEFAULT_COINS.to_string()
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_days")]
    pub days: u32,
    pub currency: Option<String>,
}
fn default_days() -> u32 {
    30
}

pub fn market_routes() -> Router<AppState> {
    Router::new()
        .route("/api/market", get(get_market))
        .route("/api/coin/:coin_id/history", get(get_coin_history))
        .route("/api/trending", get(get_trending))
        .route("/api/supported-currencies", get(get_supported_currencies))
}

#[instrument(skip(state))]
pub async fn get_market(
    State(state): State<AppState>,
    query: Result<Query<MarketQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(q) = query?;
    let currency = state.currency_or_default(q.currency);
    let data = state
        .market
        .markets(&q.coins, &currency)
        .await
        .map_err(ApiError::upstream("market data"))?;
    Ok(Json(data))
}

#[instrument(skip(state))]
pub async fn get_coin_history(
    State(state): State<AppState>,
    Path(coin_id): Path<String>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<Vec<PriceSample>>, ApiError> {
    let Query(q) = query?;
    let currency = state.currency_or_default(q.currency);
    let history = state
        .market
        .coin_history(&coin_id, q.days, &currency)
        .await
        .map_err(ApiError::upstream("coin history"))?;
    Ok(Json(history))
}

#[instrument(skip(state))]
pub async fn get_trending(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let data = state
        .market
        .trending()
        .await
        .map_err(ApiError::upstream("trending coins"))?;
    Ok(Json(data))
}

#[instrument(skip(state))]
pub async fn get_supported_currencies(
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let data = state
        .market
        .supported_currencies()
        .await
        .map_err(ApiError::upstream("supported currencies"))?;
    Ok(Json(data))
}
