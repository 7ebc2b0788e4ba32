use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use time::OffsetDateTime;
use tracing::warn;

use super::error::AuthError;
use super::repo_types::User;
use super::services::AuthService;
use crate::error::ApiError;

/// Request-time enforcement over [`AuthService`].
#[derive(Clone)]
pub struct AccessGate {
    auth: Arc<AuthService>,
}

impl AccessGate {
    pub fn new(auth: Arc<AuthService>) -> Self {
        Self { auth }
    }

    /// Requires a valid `Bearer <token>` header value.
    pub async fn authenticate(&self, header: Option<&str>, now: OffsetDateTime) -> Result<User, AuthError> {
        let header = header.ok_or_else(|| AuthError::invalid_token("missing Authorization header"))?;
        let token = bearer_token(header)?;
        self.auth.verify(token, now).await
    }

    /// Like [`Self::authenticate`], but a missing header means anonymous.
    pub async fn authenticate_optional(
        &self,
        header: Option<&str>,
        now: OffsetDateTime,
    ) -> Result<Option<User>, AuthError> {
        match header {
            None => Ok(None),
            Some(h) => self.authenticate(Some(h), now).await.map(Some),
        }
    }
}

/// Admin check. Only meaningful on a user that was already authenticated.
pub fn require_admin(user: User) -> Result<User, AuthError> {
    if !user.is_admin {
        warn!(user_id = %user.id, "admin required");
        return Err(AuthError::Forbidden);
    }
    Ok(user)
}

fn bearer_token(header: &str) -> Result<&str, AuthError> {
    let (scheme, token) = header
        .split_once(' ')
        .ok_or_else(|| AuthError::invalid_token("invalid auth scheme"))?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::invalid_token("invalid auth scheme"));
    }
    let token = token.trim();
    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(AuthError::invalid_token("malformed bearer token"));
    }
    Ok(token)
}

/// Non-UTF-8 header values count as present but malformed.
fn authorization(parts: &Parts) -> Result<Option<&str>, AuthError> {
    match parts.headers.get(AUTHORIZATION) {
        None => Ok(None),
        Some(v) => v
            .to_str()
            .map(Some)
            .map_err(|_| AuthError::invalid_token("invalid Authorization header")),
    }
}

/// Authenticated user; rejects the request otherwise.
pub struct CurrentUser(pub User);

/// Authenticated user if a bearer token was sent, `None` for anonymous callers.
pub struct MaybeUser(pub Option<User>);

/// Authenticated admin user.
pub struct AdminUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    Arc<AuthService>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let gate = AccessGate::new(Arc::<AuthService>::from_ref(state));
        let header = authorization(parts)?;
        let user = gate.authenticate(header, OffsetDateTime::now_utc()).await?;
        Ok(CurrentUser(user))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
    Arc<AuthService>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let gate = AccessGate::new(Arc::<AuthService>::from_ref(state));
        let header = authorization(parts)?;
        let user = gate.authenticate_optional(header, OffsetDateTime::now_utc()).await?;
        Ok(MaybeUser(user))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    Arc<AuthService>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        Ok(AdminUser(require_admin(user)?))
    }
}
