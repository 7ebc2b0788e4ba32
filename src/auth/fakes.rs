use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::jwt::{tests::jwt_config, TokenService};
use super::password::PasswordService;
use super::repo::UserDirectory;
use super::repo_types::User;
use super::services::AuthService;

/// In-memory user store for tests.
#[derive(Clone, Default)]
pub struct MemoryDirectory {
    users: Arc<Mutex<Vec<User>>>,
}

impl MemoryDirectory {
    pub fn insert(&self, email: &str, password: &str, is_active: bool, is_admin: bool) -> User {
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_lowercase(),
            name: "Test User".into(),
            password_hash: PasswordService::new().hash(password).expect("hash"),
            is_active,
            is_admin,
            created_at: OffsetDateTime::now_utc(),
        };
        self.users.lock().unwrap().push(user.clone());
        user
    }

    pub fn set_active(&self, id: Uuid, active: bool) {
        let mut users = self.users.lock().unwrap();
        if let Some(u) = users.iter_mut().find(|u| u.id == id) {
            u.is_active = active;
        }
    }

    pub fn remove(&self, id: Uuid) {
        self.users.lock().unwrap().retain(|u| u.id != id);
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.email.eq_ignore_ascii_case(email)).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }
}

/// Directory whose backing store is down.
pub struct BrokenDirectory;

#[async_trait]
impl UserDirectory for BrokenDirectory {
    async fn find_by_email(&self, _email: &str) -> anyhow::Result<Option<User>> {
        anyhow::bail!("connection refused")
    }

    async fn find_by_id(&self, _id: Uuid) -> anyhow::Result<Option<User>> {
        anyhow::bail!("connection refused")
    }
}

pub fn auth_service(users: Arc<dyn UserDirectory>) -> AuthService {
    let tokens = TokenService::new(&jwt_config("dev-secret")).expect("token service");
    AuthService::new(users, PasswordService::new(), tokens)
}
