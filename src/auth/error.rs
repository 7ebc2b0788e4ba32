/// Failure kinds raised by the auth core. Every one of them is terminal for
/// the current call.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Wrong email/password, or the user is absent or inactive.
    #[error("invalid email or password")]
    InvalidCredentials,
    /// Malformed token, bad signature, wrong kind or missing bearer scheme.
    #[error("invalid token: {0}")]
    TokenInvalid(String),
    /// Signature verified but the token is past its expiry.
    #[error("token has expired")]
    TokenExpired,
    /// Authenticated, but the role does not allow the operation.
    #[error("not enough permissions")]
    Forbidden,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub(crate) fn invalid_token(reason: impl Into<String>) -> Self {
        Self::TokenInvalid(reason.into())
    }
}
