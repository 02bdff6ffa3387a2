use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::auth::{
    password::{hash_password, verify_password},
    repo_types::{SeedUser, User},
    AuthError,
};

/// Credential store keyed by email.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user by email.
    async fn find(&self, email: &str) -> Option<User>;

    /// Create a new user with a hashed password. Fails with `DuplicateEmail`
    /// when the email is already present.
    async fn create(&self, email: &str, password: &str, full_name: &str)
        -> Result<User, AuthError>;

    /// Return the user when the password matches the stored hash.
    async fn verify(&self, email: &str, password: &str) -> Result<Option<User>, AuthError>;
}

#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserStore {
    /// Build a store pre-populated with fixture accounts. Ids follow insertion order.
    pub fn with_users(seed: &[SeedUser]) -> anyhow::Result<Self> {
        let mut users = HashMap::with_capacity(seed.len());
        for s in seed {
            if users.contains_key(&s.email) {
                anyhow::bail!("duplicate seed account {}", s.email);
            }
            let user = User {
                id: (users.len() + 1).to_string(),
                email: s.email.clone(),
                password_hash: hash_password(&s.password)?,
                full_name: s.full_name.clone(),
                is_active: s.is_active,
            };
            users.insert(user.email.clone(), user);
        }
        Ok(Self {
            users: RwLock::new(users),
        })
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find(&self, email: &str) -> Option<User> {
        self.users.read().await.get(email).cloned()
    }

    async fn create(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<User, AuthError> {
        let password_hash = hash_password(password)?;

        // Id assignment and insert share one write guard; records are never
        // removed, so count + 1 stays unique.
        let mut users = self.users.write().await;
        if users.contains_key(email) {
            return Err(AuthError::DuplicateEmail);
        }
        let user = User {
            id: (users.len() + 1).to_string(),
            email: email.to_string(),
            password_hash,
            full_name: full_name.to_string(),
            is_active: true,
        };
        users.insert(user.email.clone(), user.clone());
        Ok(user)
    }

    async fn verify(&self, email: &str, password: &str) -> Result<Option<User>, AuthError> {
        let Some(user) = self.find(email).await else {
            return Ok(None);
        };
        if verify_password(password, &user.password_hash)? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }
}
