use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,                   // unique user ID
    pub email: String,              // lowercase, unique
    pub name: String,               // display name
    #[serde(skip_serializing)]
    pub password_hash: String,      // Argon2 hash, not exposed in JSON
    pub is_active: bool,            // inactive users cannot authenticate
    pub is_admin: bool,             // gates admin-only operations
    pub created_at: OffsetDateTime, // creation timestamp
}
