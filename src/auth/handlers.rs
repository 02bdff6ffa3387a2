use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest},
        extractors::CurrentUser,
        services::AuthGateway,
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(get_me))
}

#[instrument(skip(gateway, body))]
pub async fn register(
    State(gateway): State<AuthGateway>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(mut payload) = body?;
    payload.email = payload.email.trim().to_lowercase();

    let res = gateway
        .register(&payload.email, &payload.password, payload.full_name.trim())
        .await?;

    info!(user_id = %res.user.id, email = %res.user.email, "user registered");
    Ok(Json(res))
}

#[instrument(skip(gateway, body))]
pub async fn login(
    State(gateway): State<AuthGateway>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(mut payload) = body?;
    payload.email = payload.email.trim().to_lowercase();

    let res = gateway.login(&payload.email, &payload.password).await?;

    info!(user_id = %res.user.id, email = %res.user.email, "user logged in");
    Ok(Json(res))
}

#[instrument(skip_all)]
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<PublicUser> {
    Json(user)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::{app::build_app, state::AppState};

    async fn send(app: axum::Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn me(token: &str) -> Request<Body> {
        Request::builder()
            .uri("/api/auth/me")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn login_then_me() {
        let app = build_app(AppState::fake());
        let (status, body) = send(
            app.clone(),
            post_json(
                "/api/auth/login",
                json!({"email": " Demo@Crypto.com ", "password": "demo123"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["token_type"], "bearer");
        assert_eq!(body["expires_in"], 1800);
        assert_eq!(body["user"]["is_active"], true);
        assert!(body["user"].get("password_hash").is_none());

        let token = body["access_token"].as_str().unwrap();
        let (status, body) = send(app, me(token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "demo@crypto.com");
        assert_eq!(body["full_name"], "Demo User");
    }

    #[tokio::test]
    async fn login_bad_password_is_401() {
        let app = build_app(AppState::fake());
        let (status, body) = send(
            app,
            post_json(
                "/api/auth/login",
                json!({"email": "demo@crypto.com", "password": "wrong"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "Incorrect email or password");
    }

    #[tokio::test]
    async fn register_flow_and_conflicts() {
        let app = build_app(AppState::fake());
        let (status, body) = send(
            app.clone(),
            post_json(
                "/api/auth/register",
                json!({"email": "new@example.com", "password": "hunter22", "full_name": "New"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["id"], "3");

        let (status, body) = send(
            app.clone(),
            post_json(
                "/api/auth/register",
                json!({"email": "new@example.com", "password": "hunter22", "full_name": "Again"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Email already registered");

        let (status, body) = send(
            app,
            post_json(
                "/api/auth/register",
                json!({"email": "other@example.com", "password": "abc", "full_name": "Weak"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Password must be at least 6 characters long");
    }

    #[tokio::test]
    async fn register_missing_field_is_json_error() {
        let app = build_app(AppState::fake());
        let (status, body) = send(
            app,
            post_json("/api/auth/register", json!({"email": "a@b.co", "password": "hunter22"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].as_str().unwrap().contains("full_name"));
    }

    #[tokio::test]
    async fn me_without_token_is_401() {
        let app = build_app(AppState::fake());
        let req = Request::builder()
            .uri("/api/auth/me")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(app.clone(), req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(app, me("not-a-token")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
