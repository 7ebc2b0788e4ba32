use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::auth::error::AuthError;

/// Transport-level view of an [`AuthError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classified {
    pub status: StatusCode,
    pub code: &'static str,
    pub detail: &'static str,
}

/// The single place where auth error kinds become HTTP statuses.
pub fn classify(err: &AuthError) -> Classified {
    let (status, code, detail) = match err {
        AuthError::InvalidCredentials => (
            StatusCode::UNAUTHORIZED,
            "INVALID_CREDENTIALS",
            "Invalid email or password",
        ),
        AuthError::TokenInvalid(_) => (
            StatusCode::UNAUTHORIZED,
            "TOKEN_INVALID",
            "Could not validate credentials",
        ),
        AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED", "Token has expired"),
        AuthError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN", "Not enough permissions"),
        AuthError::Internal(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "Internal server error",
        ),
    };
    Classified { status, code, detail }
}

/// Handler error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "code": "BAD_REQUEST", "detail": msg })),
            )
                .into_response(),
            ApiError::Auth(err) => {
                if let AuthError::Internal(e) = &err {
                    error!(error = ?e, "internal auth failure");
                }
                let c = classify(&err);
                let mut res = (c.status, Json(json!({ "code": c.code, "detail": c.detail }))).into_response();
                if c.status == StatusCode::UNAUTHORIZED {
                    res.headers_mut()
                        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                }
                res
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
