use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::User;

// Matches the `users_email_key` index on lower(email).
const FIND_BY_EMAIL: &str = r#"
    SELECT id, email, name, password_hash, is_active, is_admin, created_at
    FROM users
    WHERE lower(email) = lower($1)
"#;

/// Read-only view of the user store the auth core depends on.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
}

#[derive(Clone)]
pub struct PgUserDirectory {
    db: PgPool,
}

impl PgUserDirectory {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a new user with an already hashed password.
    pub async fn create(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, password_hash, is_admin, is_active)
            VALUES ($1, $2, $3, $4, TRUE)
            RETURNING id, email, name, password_hash, is_active, is_admin, created_at
            "#,
        )
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .bind(is_admin)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(FIND_BY_EMAIL)
            .bind(email)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash, is_active, is_admin, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }
}
