use std::sync::Arc;

use tracing::info;

use crate::{
    auth::{
        repo::{InMemoryUserStore, UserStore},
        repo_types::SeedUser,
    },
    config::AppConfig,
    market::{CoinGeckoClient, MarketData},
    portfolio::PortfolioStore,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub market: Arc<dyn MarketData>,
    pub portfolios: PortfolioStore,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let seed = if config.seed_demo_users {
            SeedUser::demo_accounts()
        } else {
            Vec::new()
        };
        let users = Arc::new(InMemoryUserStore::with_users(&seed)?) as Arc<dyn UserStore>;
        info!(accounts = seed.len(), "credential store seeded");

        let market = Arc::new(CoinGeckoClient::new(&config.market)?) as Arc<dyn MarketData>;

        Ok(Self::from_parts(config, users, market))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        market: Arc<dyn MarketData>,
    ) -> Self {
        Self {
            config,
            users,
            market,
            portfolios: PortfolioStore::default(),
        }
    }

    pub fn currency_or_default(&self, currency: Option<String>) -> String {
        currency
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| self.config.market.default_currency.clone())
    }
}

#[cfg(test)]
impl AppState {
    /// Seeded demo accounts and a canned market data source. Coin ids drive the
    /// fake history: `broken` fails upstream, `shortcoin` has 10 samples,
    /// `flatcoin` is constant at 100, anything else rises 1% per hour.
    pub fn fake() -> Self {
        use crate::market::{PriceSample, UpstreamError};
        use async_trait::async_trait;
        use serde_json::{json, Value};

        struct FakeMarket;

        #[async_trait]
        impl MarketData for FakeMarket {
            async fn markets(&self, coins: &str, currency: &str) -> Result<Value, UpstreamError> {
                Ok(json!({ "ids": coins, "vs_currency": currency }))
            }

            async fn coin_history(
                &self,
                coin_id: &str,
                _days: u32,
                _currency: &str,
            ) -> Result<Vec<PriceSample>, UpstreamError> {
                let (len, flat) = match coin_id {
                    "broken" => return Err(UpstreamError::Decode("missing prices".into())),
                    "shortcoin" => (10, false),
                    "flatcoin" => (48, true),
                    _ => (48, false),
                };
                Ok((0..len)
                    .map(|i| PriceSample {
                        timestamp: 1_700_000_000_000 + i as i64 * 3_600_000,
                        date: String::new(),
                        price: if flat { 100.0 } else { 100.0 * 1.01f64.powi(i) },
                        volume: 1_000.0,
                    })
                    .collect())
            }

            async fn supported_currencies(&self) -> Result<Value, UpstreamError> {
                Ok(json!(["usd", "eur"]))
            }

            async fn trending(&self) -> Result<Value, UpstreamError> {
                Ok(json!({ "coins": [] }))
            }
        }

        let config = Arc::new(AppConfig {
            jwt: crate::config::JwtConfig {
                secret: "test".into(),
                ttl_minutes: 30,
                default_ttl_minutes: 15,
            },
            market: crate::config::MarketConfig {
                base_url: "http://fake.local".into(),
                api_key: None,
                timeout_secs: 1,
                default_currency: "usd".into(),
            },
            seed_demo_users: true,
        });
        let users = Arc::new(
            InMemoryUserStore::with_users(&SeedUser::demo_accounts()).expect("seed store"),
        ) as Arc<dyn UserStore>;

        Self::from_parts(config, users, Arc::new(FakeMarket))
    }
}
