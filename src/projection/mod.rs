use crate::state::AppState;
use axum::Router;

pub mod engine;
pub mod handlers;

pub use engine::ProjectionError;

pub fn router() -> Router<AppState> {
    handlers::projection_routes()
}
