//! Provisions an active admin account.
//!
//! Usage: `create-admin <email> <name> <password>`

use anyhow::Context;
use shelter::auth::{
    handlers::is_valid_email,
    password::PasswordService,
    repo::{PgUserDirectory, UserDirectory},
};
use shelter::config::AppConfig;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    shelter::init_tracing();

    let mut args = std::env::args().skip(1);
    let (Some(email), Some(name), Some(password)) = (args.next(), args.next(), args.next()) else {
        anyhow::bail!("usage: create-admin <email> <name> <password>");
    };
    let email = email.trim().to_lowercase();
    anyhow::ensure!(is_valid_email(&email), "invalid email: {email}");
    anyhow::ensure!(!name.trim().is_empty(), "name must not be empty");
    anyhow::ensure!(password.len() >= 8, "password too short");

    let config = AppConfig::from_env()?;
    let db = PgPoolOptions::new()
        .max_connections(1)
        .connect(&config.database_url)
        .await
        .context("connect to database")?;
    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .context("run migrations")?;

    let users = PgUserDirectory::new(db);
    if users.find_by_email(&email).await?.is_some() {
        anyhow::bail!("user with email {email} already exists");
    }

    let hash = PasswordService::new().hash(&password)?;
    let user = users.create(&email, name.trim(), &hash, true).await?;

    info!(user_id = %user.id, email = %user.email, "admin user created");
    Ok(())
}
