use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RefreshRequest, WhoAmI},
        extractors::{AdminUser, CurrentUser, MaybeUser},
    },
    error::{ApiError, ApiResult},
    state::AppState,
};

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(get_me))
        .route("/auth/whoami", get(whoami))
        .route("/admin/me", get(get_admin))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::BadRequest("Invalid email".into()));
    }
    if payload.password.is_empty() {
        return Err(ApiError::BadRequest("Email and password are required".into()));
    }

    let result = state
        .auth
        .login(&payload.email, &payload.password, OffsetDateTime::now_utc())
        .await?;
    Ok(Json(result.into()))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> ApiResult<Json<AuthResponse>> {
    if payload.refresh_token.trim().is_empty() {
        return Err(ApiError::BadRequest("Refresh token is required".into()));
    }
    let result = state
        .auth
        .refresh(payload.refresh_token.trim(), OffsetDateTime::now_utc())
        .await?;
    Ok(Json(result.into()))
}

#[instrument(skip_all)]
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<PublicUser> {
    Json(user.into())
}

#[instrument(skip_all)]
pub async fn whoami(MaybeUser(user): MaybeUser) -> Json<WhoAmI> {
    Json(WhoAmI {
        authenticated: user.is_some(),
        user: user.map(Into::into),
    })
}

#[instrument(skip_all)]
pub async fn get_admin(AdminUser(user): AdminUser) -> Json<PublicUser> {
    info!(user_id = %user.id, "admin access");
    Json(user.into())
}
