use crate::state::AppState;
use axum::Router;

pub mod client;
pub mod handlers;

pub use client::{CoinGeckoClient, MarketData, PriceSample, UpstreamError};

pub fn router() -> Router<AppState> {
    handlers::market_routes()
}
