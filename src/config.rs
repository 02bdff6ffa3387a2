use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: i64,
    pub default_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarketConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub default_currency: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub jwt: JwtConfig,
    pub market: MarketConfig,
    pub seed_demo_users: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            ttl_minutes: env_parse("JWT_TTL_MINUTES").unwrap_or(30),
            default_ttl_minutes: env_parse("JWT_DEFAULT_TTL_MINUTES").unwrap_or(15),
        };
        let market = MarketConfig {
            base_url: std::env::var("COINGECKO_BASE_URL")
                .unwrap_or_else(|_| "https://api.coingecko.com/api/v3".into()),
            api_key: std::env::var("COINGECKO_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            timeout_secs: env_parse("MARKET_TIMEOUT_SECS").unwrap_or(15),
            default_currency: std::env::var("MARKET_DEFAULT_CURRENCY")
                .unwrap_or_else(|_| "usd".into()),
        };
        let seed_demo_users = env_parse("SEED_DEMO_USERS").unwrap_or(true);
        Ok(Self {
            jwt,
            market,
            seed_demo_users,
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}
