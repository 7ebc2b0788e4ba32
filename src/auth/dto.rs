use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::User;
use super::services::AuthResult;

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Response returned after login or refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: PublicUser,
}

impl From<AuthResult> for AuthResponse {
    fn from(r: AuthResult) -> Self {
        Self {
            access_token: r.access_token,
            refresh_token: r.refresh_token,
            user: r.user.into(),
        }
    }
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub is_admin: bool,
    pub is_active: bool,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            is_admin: u.is_admin,
            is_active: u.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<PublicUser>,
}
