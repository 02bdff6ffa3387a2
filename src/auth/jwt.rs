use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::{config::JwtConfig, state::AppState};

/// JWT payload. `sub` is the user's email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and validates HS256 bearer tokens. Stateless: there is no revocation list.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    default_ttl: Duration,
}

impl FromRef<AppState> for TokenService {
    fn from_ref(state: &AppState) -> Self {
        Self::from_config(&state.config.jwt)
    }
}

impl TokenService {
    pub fn new(secret: &[u8], default_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            default_ttl,
        }
    }

    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self::new(
            cfg.secret.as_bytes(),
            Duration::minutes(cfg.default_ttl_minutes),
        )
    }

    /// Sign `{sub, exp = now + ttl}`. Without a ttl the configured default applies.
    pub fn issue(&self, subject: &str, ttl: Option<Duration>) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + ttl.unwrap_or(self.default_ttl);
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(sub = %subject, exp = claims.exp, "jwt signed");
        Ok(token)
    }

    /// Returns the subject claim, or `None` for a malformed, forged or expired token.
    pub fn verify(&self, token: &str) -> Option<String> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        let data = decode::<Claims>(token, &self.decoding, &validation).ok()?;
        if data.claims.sub.is_empty() {
            return None;
        }
        // jsonwebtoken only rejects `exp < now`; a token is dead from its exp second on.
        if data.claims.exp <= OffsetDateTime::now_utc().unix_timestamp() {
            return None;
        }
        debug!(sub = %data.claims.sub, "jwt verified");
        Some(data.claims.sub)
    }
}
