use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::{error, warn};

/// Well-formed argon2id hash with the default cost parameters that no password
/// matches. Checked against when a login names an unknown email so that path
/// costs the same as a wrong password.
pub const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Argon2id password hashing with a fresh random salt per hash.
#[derive(Clone, Default)]
pub struct PasswordService {
    argon2: Argon2<'static>,
    #[cfg(test)]
    pub(crate) verify_calls: std::sync::Arc<std::sync::atomic::AtomicUsize>,
}

impl PasswordService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hash(&self, plain: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                anyhow::anyhow!(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    /// Returns `false` on mismatch and on a hash that does not parse.
    pub fn verify(&self, plain: &str, hash: &str) -> bool {
        #[cfg(test)]
        self.verify_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        let parsed = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "argon2 parse hash error");
                return false;
            }
        };
        self.argon2
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok()
    }
}
