use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use time::{macros::format_description, OffsetDateTime};
use tracing::debug;

use crate::config::MarketConfig;

const API_KEY_HEADER: &str = "x-cg-demo-api-key";

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("market data request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("market data returned status {0}")]
    Status(StatusCode),
    #[error("market data response was invalid: {0}")]
    Decode(String),
}

/// One point of a coin's price history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub timestamp: i64, // epoch milliseconds
    pub date: String,   // "YYYY-MM-DD HH:MM", UTC
    pub price: f64,
    #[serde(default)]
    pub volume: f64,
}

/// Upstream market data collaborator.
#[async_trait]
pub trait MarketData: Send + Sync {
    async fn markets(&self, coins: &str, currency: &str) -> Result<Value, UpstreamError>;
    async fn coin_history(
        &self,
        coin_id: &str,
        days: u32,
        currency: &str,
    ) -> Result<Vec<PriceSample>, UpstreamError>;
    async fn supported_currencies(&self) -> Result<Value, UpstreamError>;
    async fn trending(&self) -> Result<Value, UpstreamError>;
}

#[derive(Debug, Deserialize)]
struct MarketChart {
    prices: Vec<(f64, f64)>,
    #[serde(default)]
    total_volumes: Vec<(f64, f64)>,
}

/// CoinGecko REST client.
#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    base_url: Url,
    api_key: Option<String>,
    http: Client,
}

impl CoinGeckoClient {
    pub fn new(cfg: &MarketConfig) -> anyhow::Result<Self> {
        let base_url = Url::parse(&cfg.base_url)?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("market base url {} cannot be a base", cfg.base_url);
        }
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            base_url,
            api_key: cfg.api_key.clone(),
            http,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<T, UpstreamError> {
        let url = self.endpoint(segments);
        let mut req = self.http.get(url.clone()).query(query);
        if let Some(key) = &self.api_key {
            req = req.header(API_KEY_HEADER, key);
        }
        let res = req.send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status));
        }
        let body = res
            .json::<T>()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))?;
        debug!(url = %url, %status, "market data fetched");
        Ok(body)
    }
}

#[async_trait]
impl MarketData for CoinGeckoClient {
    async fn markets(&self, coins: &str, currency: &str) -> Result<Value, UpstreamError> {
        self.get_json(
            &["coins", "markets"],
            &[
                ("vs_currency", currency),
                ("ids", coins),
                ("order", "market_cap_desc"),
                ("per_page", "50"),
                ("page", "1"),
                ("sparkline", "true"),
                ("price_change_percentage", "1h,24h,7d"),
            ],
        )
        .await
    }

    async fn coin_history(
        &self,
        coin_id: &str,
        days: u32,
        currency: &str,
    ) -> Result<Vec<PriceSample>, UpstreamError> {
        let days = days.to_string();
        let chart: MarketChart = self
            .get_json(
                &["coins", coin_id, "market_chart"],
                &[("vs_currency", currency), ("days", &days)],
            )
            .await?;
        Ok(samples_from_chart(chart))
    }

    async fn supported_currencies(&self) -> Result<Value, UpstreamError> {
        self.get_json(&["simple", "supported_vs_currencies"], &[])
            .await
    }

    async fn trending(&self) -> Result<Value, UpstreamError> {
        self.get_json(&["search", "trending"], &[]).await
    }
}

/// Zip prices with volumes by index; a missing volume reads as 0.
fn samples_from_chart(chart: MarketChart) -> Vec<PriceSample> {
    chart
        .prices
        .iter()
        .enumerate()
        .map(|(i, &(ts, price))| {
            let timestamp = ts as i64;
            PriceSample {
                timestamp,
                date: format_ms(timestamp),
                price,
                volume: chart.total_volumes.get(i).map(|v| v.1).unwrap_or(0.0),
            }
        })
        .collect()
}

fn format_ms(ms: i64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(ms as i128 * 1_000_000)
        .ok()
        .and_then(|dt| {
            dt.format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
                .ok()
        })
        .unwrap_or_default()
}
