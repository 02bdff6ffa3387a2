use std::sync::Arc;

use axum::extract::FromRef;
use time::Duration;
use tracing::debug;

use crate::{
    auth::{
        dto::{AuthResponse, PublicUser},
        jwt::TokenService,
        repo::UserStore,
    },
    state::AppState,
};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    // Unknown email and wrong password share this variant.
    #[error("Incorrect email or password")]
    InvalidCredentials,
    #[error("Email already registered")]
    DuplicateEmail,
    #[error("Password must be at least 6 characters long")]
    WeakPassword,
    #[error("Could not validate credentials")]
    Unauthenticated,
    #[error("Inactive user")]
    InactiveAccount,
    #[error("internal auth error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Orchestrates login, registration and token identification over a
/// [`UserStore`] and a [`TokenService`].
#[derive(Clone)]
pub struct AuthGateway {
    store: Arc<dyn UserStore>,
    tokens: TokenService,
    session_ttl: Duration,
}

impl FromRef<AppState> for AuthGateway {
    fn from_ref(state: &AppState) -> Self {
        Self::new(
            state.users.clone(),
            TokenService::from_ref(state),
            Duration::minutes(state.config.jwt.ttl_minutes),
        )
    }
}

impl AuthGateway {
    pub fn new(store: Arc<dyn UserStore>, tokens: TokenService, session_ttl: Duration) -> Self {
        Self {
            store,
            tokens,
            session_ttl,
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        let user = self
            .store
            .verify(email, password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        self.session_for(user.into())
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<AuthResponse, AuthError> {
        if self.store.find(email).await.is_some() {
            return Err(AuthError::DuplicateEmail);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }
        let user = self.store.create(email, password, full_name).await?;
        debug!(user_id = %user.id, "user created");
        self.session_for(user.into())
    }

    pub async fn identify(&self, token: &str) -> Result<PublicUser, AuthError> {
        let email = self.tokens.verify(token).ok_or(AuthError::Unauthenticated)?;
        let user = self
            .store
            .find(&email)
            .await
            .ok_or(AuthError::Unauthenticated)?;
        if !user.is_active {
            return Err(AuthError::InactiveAccount);
        }
        Ok(user.into())
    }

    fn session_for(&self, user: PublicUser) -> Result<AuthResponse, AuthError> {
        let access_token = self.tokens.issue(&user.email, Some(self.session_ttl))?;
        Ok(AuthResponse {
            access_token,
            token_type: "bearer".into(),
            expires_in: self.session_ttl.whole_seconds(),
            user,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{repo::InMemoryUserStore, repo_types::SeedUser};

    fn gateway_with(seed: Vec<SeedUser>) -> AuthGateway {
        let store = InMemoryUserStore::with_users(&seed).expect("seed store");
        AuthGateway::new(
            Arc::new(store),
            TokenService::new(b"test-secret", Duration::minutes(15)),
            Duration::minutes(30),
        )
    }

    fn gateway() -> AuthGateway {
        gateway_with(SeedUser::demo_accounts())
    }

    #[tokio::test]
    async fn login_with_seeded_demo_account() {
        let gw = gateway();
        let res = gw.login("demo@crypto.com", "demo123").await.expect("login");
        assert_eq!(res.user.email, "demo@crypto.com");
        assert_eq!(res.user.full_name, "Demo User");
        assert!(res.user.is_active);
        assert_eq!(res.expires_in, 30 * 60);
        assert_eq!(res.token_type, "bearer");
    }

    #[tokio::test]
    async fn login_failures_collapse_to_invalid_credentials() {
        let gw = gateway();
        let wrong_pw = gw.login("demo@crypto.com", "nope").await.unwrap_err();
        let no_user = gw.login("ghost@crypto.com", "demo123").await.unwrap_err();
        assert!(matches!(wrong_pw, AuthError::InvalidCredentials));
        assert!(matches!(no_user, AuthError::InvalidCredentials));
        assert_eq!(wrong_pw.to_string(), no_user.to_string());
    }

    #[tokio::test]
    async fn registered_token_identifies_new_user() {
        let gw = gateway();
        let res = gw
            .register("fresh@example.com", "secret1", "Fresh Face")
            .await
            .expect("register");
        assert_eq!(res.user.id, "3");
        assert_eq!(
            gw.tokens.verify(&res.access_token).as_deref(),
            Some("fresh@example.com")
        );
        let me = gw.identify(&res.access_token).await.expect("identify");
        assert_eq!(me.email, "fresh@example.com");
        assert_eq!(me.full_name, "Fresh Face");
    }

    #[tokio::test]
    async fn register_duplicate_email_fails_regardless_of_input() {
        let gw = gateway();
        for (pw, name) in [("demo123", "Demo User"), ("x", ""), ("long-enough", "Other")] {
            let err = gw.register("demo@crypto.com", pw, name).await.unwrap_err();
            assert!(matches!(err, AuthError::DuplicateEmail));
        }
    }

    #[tokio::test]
    async fn register_short_password_is_weak() {
        let gw = gateway();
        let err = gw
            .register("unique@example.com", "12345", "Short")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::WeakPassword));
        assert!(gw.register("unique@example.com", "123456", "Ok").await.is_ok());
    }

    #[tokio::test]
    async fn identify_rejects_expired_token() {
        let gw = gateway();
        let token = gw
            .tokens
            .issue("demo@crypto.com", Some(Duration::seconds(-1)))
            .unwrap();
        assert!(matches!(
            gw.identify(&token).await.unwrap_err(),
            AuthError::Unauthenticated
        ));
    }

    #[tokio::test]
    async fn identify_rejects_unknown_subject() {
        let gw = gateway();
        let token = gw.tokens.issue("ghost@crypto.com", None).unwrap();
        assert!(matches!(
            gw.identify(&token).await.unwrap_err(),
            AuthError::Unauthenticated
        ));
        assert!(matches!(
            gw.identify("garbage").await.unwrap_err(),
            AuthError::Unauthenticated
        ));
    }

    #[tokio::test]
    async fn identify_rejects_inactive_account() {
        let mut seed = SeedUser::demo_accounts();
        seed.push(SeedUser {
            email: "sleepy@example.com".into(),
            password: "zzzzzz".into(),
            full_name: "Sleepy".into(),
            is_active: false,
        });
        let gw = gateway_with(seed);
        let res = gw.login("sleepy@example.com", "zzzzzz").await.expect("login");
        assert!(matches!(
            gw.identify(&res.access_token).await.unwrap_err(),
            AuthError::InactiveAccount
        ));
    }
}
