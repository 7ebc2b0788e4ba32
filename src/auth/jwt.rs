use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::{Claims, TokenKind};
use super::error::AuthError;
use crate::config::JwtConfig;

/// Upper bound for either TTL, roughly a century.
const MAX_TTL_SECONDS: i64 = 100 * 365 * 24 * 60 * 60;

/// Signs and validates access/refresh JWTs.
///
/// The key material is fixed at construction and never changes for the life
/// of the process. Building a new service from a different secret invalidates
/// every token issued by the old one.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(cfg: &JwtConfig) -> anyhow::Result<Self> {
        anyhow::ensure!(!cfg.secret.is_empty(), "jwt secret must not be empty");
        anyhow::ensure!(
            cfg.access_ttl_seconds > 0 && cfg.access_ttl_seconds < cfg.refresh_ttl_seconds,
            "access token ttl must be positive and shorter than refresh token ttl"
        );
        anyhow::ensure!(
            cfg.refresh_ttl_seconds <= MAX_TTL_SECONDS,
            "refresh token ttl must not exceed {MAX_TTL_SECONDS} seconds"
        );
        Ok(Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            access_ttl: Duration::seconds(cfg.access_ttl_seconds),
            refresh_ttl: Duration::seconds(cfg.refresh_ttl_seconds),
        })
    }

    pub fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    pub fn issue(&self, user_id: Uuid, kind: TokenKind, now: OffsetDateTime) -> anyhow::Result<String> {
        let exp = now
            .checked_add(self.ttl(kind))
            .ok_or_else(|| anyhow::anyhow!("token expiry out of range"))?;
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id = %user_id, kind = ?kind, "jwt signed");
        Ok(token)
    }

    /// Validates `token` as a token of `expected` kind at instant `now` and
    /// returns its subject.
    ///
    /// Signature and kind are checked before the time window, so a tampered or
    /// wrong-kind token is reported as invalid even when it has also expired.
    pub fn validate(
        &self,
        token: &str,
        expected: TokenKind,
        now: OffsetDateTime,
    ) -> Result<Uuid, AuthError> {
        // expiry is judged against `now` below, not the wall clock
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));

        let claims = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| AuthError::invalid_token(e.to_string()))?
            .claims;

        if claims.kind != expected {
            return Err(AuthError::invalid_token(format!(
                "expected {:?} token, got {:?}",
                expected, claims.kind
            )));
        }

        let now = now.unix_timestamp();
        if now < claims.iat {
            return Err(AuthError::invalid_token("token used before its issue time"));
        }
        if now >= claims.exp {
            return Err(AuthError::TokenExpired);
        }

        debug!(user_id = %claims.sub, kind = ?claims.kind, "jwt verified");
        Ok(claims.sub)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn jwt_config(secret: &str) -> JwtConfig {
        JwtConfig {
            secret: secret.into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            access_ttl_seconds: 300,
            refresh_ttl_seconds: 3600,
        }
    }

    fn make_tokens() -> TokenService {
        TokenService::new(&jwt_config("dev-secret")).expect("token service")
    }

    fn segments(token: &str) -> Vec<String> {
        token.split('.').map(str::to_string).collect()
    }

    #[test]
    fn issue_and_validate_each_kind() {
        let tokens = make_tokens();
        let now = OffsetDateTime::now_utc();
        for kind in [TokenKind::Access, TokenKind::Refresh] {
            let user_id = Uuid::new_v4();
            let token = tokens.issue(user_id, kind, now).expect("sign");
            assert_eq!(tokens.validate(&token, kind, now).expect("validate"), user_id);
        }
    }

    #[test]
    fn rejects_short_access_or_inverted_ttls() {
        let mut cfg = jwt_config("dev-secret");
        cfg.access_ttl_seconds = cfg.refresh_ttl_seconds;
        assert!(TokenService::new(&cfg).is_err());

        assert!(TokenService::new(&jwt_config("")).is_err());
    }

    #[test]
    fn rejects_ttl_beyond_a_century() {
        let mut cfg = jwt_config("dev-secret");
        cfg.refresh_ttl_seconds = i64::MAX;
        assert!(TokenService::new(&cfg).is_err());

        cfg.refresh_ttl_seconds = MAX_TTL_SECONDS;
        assert!(TokenService::new(&cfg).is_ok());
    }

    #[test]
    fn issue_near_the_end_of_time_errors_instead_of_panicking() {
        let tokens = make_tokens();
        let end = time::PrimitiveDateTime::MAX.assume_utc();
        assert!(tokens.issue(Uuid::new_v4(), TokenKind::Refresh, end).is_err());
        assert!(tokens.issue(Uuid::new_v4(), TokenKind::Access, end).is_err());
    }

    #[test]
    fn expires_exactly_at_exp() {
        let tokens = make_tokens();
        let now = OffsetDateTime::now_utc();
        let token = tokens.issue(Uuid::new_v4(), TokenKind::Access, now).expect("sign");

        let just_before = now + tokens.ttl(TokenKind::Access) - Duration::seconds(1);
        assert!(tokens.validate(&token, TokenKind::Access, just_before).is_ok());

        let at_exp = now + tokens.ttl(TokenKind::Access);
        let err = tokens.validate(&token, TokenKind::Access, at_exp).unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));

        let much_later = now + Duration::days(30);
        let err = tokens.validate(&token, TokenKind::Access, much_later).unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
    }

    #[test]
    fn wrong_kind_is_invalid_regardless_of_time() {
        let tokens = make_tokens();
        let now = OffsetDateTime::now_utc();
        let access = tokens.issue(Uuid::new_v4(), TokenKind::Access, now).expect("sign");

        for at in [now, now + Duration::days(365)] {
            let err = tokens.validate(&access, TokenKind::Refresh, at).unwrap_err();
            assert!(matches!(err, AuthError::TokenInvalid(_)), "got {err:?}");
        }

        let refresh = tokens.issue(Uuid::new_v4(), TokenKind::Refresh, now).expect("sign");
        let err = tokens.validate(&refresh, TokenKind::Access, now).unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid(_)));
    }

    #[test]
    fn not_valid_before_issue_time() {
        let tokens = make_tokens();
        let now = OffsetDateTime::now_utc();
        let token = tokens.issue(Uuid::new_v4(), TokenKind::Access, now).expect("sign");
        let err = tokens
            .validate(&token, TokenKind::Access, now - Duration::seconds(10))
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid(_)));
    }

    #[test]
    fn spliced_payload_with_future_expiry_is_invalid() {
        let tokens = make_tokens();
        let now = OffsetDateTime::now_utc();
        let victim = Uuid::new_v4();
        let original = tokens.issue(victim, TokenKind::Access, now).expect("sign");
        // a later-issued token for another subject carries a later exp
        let later = tokens
            .issue(Uuid::new_v4(), TokenKind::Access, now + Duration::days(1))
            .expect("sign");

        let orig = segments(&original);
        let other = segments(&later);
        let forged = format!("{}.{}.{}", orig[0], other[1], orig[2]);

        let at = now + Duration::days(1);
        let err = tokens.validate(&forged, TokenKind::Access, at).unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid(_)), "got {err:?}");
    }

    #[test]
    fn tampered_expired_token_reports_invalid_not_expired() {
        let tokens = make_tokens();
        let past = OffsetDateTime::now_utc() - Duration::days(10);
        let a = tokens.issue(Uuid::new_v4(), TokenKind::Access, past).expect("sign");
        let b = tokens.issue(Uuid::new_v4(), TokenKind::Access, past).expect("sign");
        let (a, b) = (segments(&a), segments(&b));
        let forged = format!("{}.{}.{}", a[0], b[1], a[2]);

        let err = tokens
            .validate(&forged, TokenKind::Access, OffsetDateTime::now_utc())
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid(_)), "got {err:?}");
    }

    #[test]
    fn flipped_signature_byte_is_invalid() {
        let tokens = make_tokens();
        let now = OffsetDateTime::now_utc();
        let token = tokens.issue(Uuid::new_v4(), TokenKind::Refresh, now).expect("sign");
        let parts = segments(&token);

        let mut sig: Vec<char> = parts[2].chars().collect();
        sig[0] = if sig[0] == 'A' { 'B' } else { 'A' };
        let sig: String = sig.into_iter().collect();
        let forged = format!("{}.{}.{}", parts[0], parts[1], sig);

        let err = tokens.validate(&forged, TokenKind::Refresh, now).unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid(_)));
    }

    #[test]
    fn other_secret_or_audience_is_invalid() {
        let now = OffsetDateTime::now_utc();
        let good = make_tokens();
        let token = good.issue(Uuid::new_v4(), TokenKind::Access, now).expect("sign");

        let rotated = TokenService::new(&jwt_config("rotated-secret")).expect("token service");
        assert!(matches!(
            rotated.validate(&token, TokenKind::Access, now),
            Err(AuthError::TokenInvalid(_))
        ));

        let mut cfg = jwt_config("dev-secret");
        cfg.audience = "someone-else".into();
        let other_aud = TokenService::new(&cfg).expect("token service");
        assert!(matches!(
            other_aud.validate(&token, TokenKind::Access, now),
            Err(AuthError::TokenInvalid(_))
        ));
    }

    #[test]
    fn garbage_is_invalid() {
        let tokens = make_tokens();
        let now = OffsetDateTime::now_utc();
        for raw in ["", "abc", "a.b.c", "not.a.jwt.at.all"] {
            assert!(matches!(
                tokens.validate(raw, TokenKind::Access, now),
                Err(AuthError::TokenInvalid(_))
            ));
        }
    }
}
