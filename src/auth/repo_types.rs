use serde::{Deserialize, Serialize};

/// User record held by the credential store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,        // sequential id, "1", "2", ...
    pub email: String,     // unique key
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    pub full_name: String,
    pub is_active: bool,
}

/// Fixture account inserted at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedUser {
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl SeedUser {
    pub fn demo_accounts() -> Vec<SeedUser> {
        vec![
            SeedUser {
                email: "demo@crypto.com".into(),
                password: "demo123".into(),
                full_name: "Demo User".into(),
                is_active: true,
            },
            SeedUser {
                email: "user@example.com".into(),
                password: "password123".into(),
                full_name: "John Doe".into(),
                is_active: true,
            },
        ]
    }
}
