use std::sync::Arc;

use anyhow::Context;
use axum::extract::FromRef;
use sqlx::postgres::PgPoolOptions;

use crate::auth::{
    jwt::TokenService, password::PasswordService, repo::PgUserDirectory, services::AuthService,
};
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
}

impl AppState {
    /// Connects to the database, applies migrations and wires the auth core.
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;

        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run migrations")?;

        let tokens = TokenService::new(&config.jwt)?;
        let users = Arc::new(PgUserDirectory::new(db));
        let auth = AuthService::new(users, PasswordService::new(), tokens);

        Ok(Self::from_parts(Arc::new(auth)))
    }

    pub fn from_parts(auth: Arc<AuthService>) -> Self {
        Self { auth }
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}
