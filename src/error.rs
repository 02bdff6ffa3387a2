use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::{auth::AuthError, market::UpstreamError, projection::ProjectionError};

/// Every failure a handler can return, mapped onto a transport status in `into_response`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Projection(#[from] ProjectionError),
    #[error("{}", .0.body_text())]
    Query(#[from] QueryRejection),
    #[error("{}", .0.body_text())]
    Body(#[from] JsonRejection),
    #[error("Failed to fetch {what}")]
    Upstream {
        what: &'static str,
        #[source]
        source: UpstreamError,
    },
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl ApiError {
    pub fn upstream(what: &'static str) -> impl FnOnce(UpstreamError) -> Self {
        move |source| Self::Upstream { what, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Auth(e) => match e {
                AuthError::InvalidCredentials | AuthError::Unauthenticated => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::DuplicateEmail
                | AuthError::WeakPassword
                | AuthError::InactiveAccount => StatusCode::BAD_REQUEST,
                AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Projection(_) => StatusCode::BAD_REQUEST,
            Self::Query(r) => r.status(),
            Self::Body(r) => r.status(),
            Self::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            Self::Auth(AuthError::Internal(e)) => {
                error!(error = %e, "auth internal error");
                "Internal server error".to_string()
            }
            Self::Upstream { what, source } => {
                error!(error = %source, what, "upstream market data failure");
                self.to_string()
            }
            other => other.to_string(),
        };

        let mut res = (status, Json(ErrorBody { detail })).into_response();
        if matches!(self, Self::Auth(AuthError::Unauthenticated)) {
            res.headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        res
    }
}
