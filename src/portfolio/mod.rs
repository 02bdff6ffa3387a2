use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::state::AppState;

/// Portfolio documents keyed by `user_id`, stored as received.
#[derive(Clone, Default)]
pub struct PortfolioStore {
    inner: Arc<RwLock<HashMap<String, Value>>>,
}

impl PortfolioStore {
    pub async fn save(&self, doc: Value) -> String {
        let user_id = doc
            .get("user_id")
            .and_then(Value::as_str)
            .unwrap_or("default")
            .to_string();
        self.inner.write().await.insert(user_id.clone(), doc);
        user_id
    }

    pub async fn get(&self, user_id: &str) -> Option<Value> {
        self.inner.read().await.get(user_id).cloned()
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/portfolio", post(save_portfolio))
        .route("/api/portfolio/:user_id", get(get_portfolio))
}

#[instrument(skip(state, doc))]
pub async fn save_portfolio(State(state): State<AppState>, Json(doc): Json<Value>) -> Json<Value> {
    let user_id = state.portfolios.save(doc.clone()).await;
    info!(%user_id, "portfolio saved");
    Json(json!({ "message": "Portfolio saved successfully", "portfolio": doc }))
}

#[instrument(skip(state))]
pub async fn get_portfolio(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<Value> {
    let doc = state
        .portfolios
        .get(&user_id)
        .await
        .unwrap_or_else(|| json!({ "holdings": [], "total_value": 0, "total_change": 0 }));
    Json(doc)
}
