use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub access_ttl_seconds: i64,
    pub refresh_ttl_seconds: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let secret = std::env::var("JWT_SECRET")?;
        anyhow::ensure!(!secret.trim().is_empty(), "JWT_SECRET must not be empty");

        let jwt = JwtConfig {
            secret,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "shelter".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "shelter-clients".into()),
            access_ttl_seconds: env_seconds("JWT_ACCESS_TTL_SECONDS", 60 * 5)?,
            refresh_ttl_seconds: env_seconds("JWT_REFRESH_TTL_SECONDS", 60 * 60 * 24 * 7)?,
        };
        Ok(Self { database_url, jwt })
    }
}

fn env_seconds(key: &str, default: i64) -> anyhow::Result<i64> {
    parse_seconds(key, std::env::var(key).ok(), default)
}

/// Unset falls back to `default`; anything set must be a positive integer.
fn parse_seconds(key: &str, raw: Option<String>, default: i64) -> anyhow::Result<i64> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    let seconds: i64 = raw
        .trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("{key} must be an integer number of seconds, got {raw:?}: {e}"))?;
    anyhow::ensure!(seconds > 0, "{key} must be positive, got {seconds}");
    Ok(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_ttl_uses_default() {
        assert_eq!(parse_seconds("JWT_ACCESS_TTL_SECONDS", None, 300).unwrap(), 300);
    }

    #[test]
    fn set_ttl_is_parsed() {
        let got = parse_seconds("JWT_ACCESS_TTL_SECONDS", Some(" 900 ".into()), 300).unwrap();
        assert_eq!(got, 900);
    }

    #[test]
    fn bad_ttl_fails_instead_of_falling_back() {
        for raw in ["5m", "", "abc", "0", "-30", "99999999999999999999"] {
            let err = parse_seconds("JWT_REFRESH_TTL_SECONDS", Some(raw.into()), 604_800).unwrap_err();
            assert!(err.to_string().contains("JWT_REFRESH_TTL_SECONDS"), "{raw}: {err}");
        }
    }
}
