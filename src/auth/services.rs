use std::sync::Arc;

use anyhow::Context;
use time::OffsetDateTime;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::claims::TokenKind;
use super::error::AuthError;
use super::jwt::TokenService;
use super::password::{PasswordService, DUMMY_HASH};
use super::repo::UserDirectory;
use super::repo_types::User;

/// Token pair plus the user it was minted for.
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

/// Login, refresh and verification over a user directory.
///
/// Every call is independent; the only shared state is the read-only signing
/// key inside [`TokenService`]. The current time is always passed in.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserDirectory>,
    passwords: PasswordService,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserDirectory>, passwords: PasswordService, tokens: TokenService) -> Self {
        Self {
            users,
            passwords,
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    #[instrument(skip(self, password, now))]
    pub async fn login(&self, email: &str, password: &str, now: OffsetDateTime) -> Result<AuthResult, AuthError> {
        let email = email.trim().to_lowercase();

        let Some(user) = self.users.find_by_email(&email).await? else {
            self.check_password(password, DUMMY_HASH).await?;
            warn!(email = %email, "login unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.check_password(password, &user.password_hash).await? {
            warn!(email = %email, user_id = %user.id, "login invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        if !user.is_active {
            warn!(user_id = %user.id, "login on inactive account");
            return Err(AuthError::InvalidCredentials);
        }

        let result = self.issue_pair(user, now)?;
        info!(user_id = %result.user.id, is_admin = result.user.is_admin, "user logged in");
        Ok(result)
    }

    /// Mints a fresh pair from a refresh token. The presented refresh token
    /// stays usable until its own expiry.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str, now: OffsetDateTime) -> Result<AuthResult, AuthError> {
        let user_id = self.tokens.validate(refresh_token, TokenKind::Refresh, now)?;
        let user = self.active_user(user_id).await?;
        let result = self.issue_pair(user, now)?;
        info!(user_id = %result.user.id, "tokens refreshed");
        Ok(result)
    }

    #[instrument(skip_all)]
    pub async fn verify(&self, access_token: &str, now: OffsetDateTime) -> Result<User, AuthError> {
        let user_id = self.tokens.validate(access_token, TokenKind::Access, now)?;
        self.active_user(user_id).await
    }

    async fn active_user(&self, user_id: Uuid) -> Result<User, AuthError> {
        match self.users.find_by_id(user_id).await? {
            Some(user) if user.is_active => {
                debug!(user_id = %user.id, "user resolved");
                Ok(user)
            }
            Some(_) => {
                warn!(user_id = %user_id, "token for inactive user");
                Err(AuthError::InvalidCredentials)
            }
            None => {
                warn!(user_id = %user_id, "token for unknown user");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    async fn check_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let passwords = self.passwords.clone();
        let password = password.to_owned();
        let hash = hash.to_owned();
        let ok = tokio::task::spawn_blocking(move || passwords.verify(&password, &hash))
            .await
            .context("password verification task")?;
        Ok(ok)
    }

    fn issue_pair(&self, user: User, now: OffsetDateTime) -> Result<AuthResult, AuthError> {
        let access_token = self
            .tokens
            .issue(user.id, TokenKind::Access, now)
            .context("sign access token")?;
        let refresh_token = self
            .tokens
            .issue(user.id, TokenKind::Refresh, now)
            .context("sign refresh token")?;
        Ok(AuthResult {
            access_token,
            refresh_token,
            user,
        })
    }
}
