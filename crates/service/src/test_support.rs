//! Scoped store fixture for tests.
//!
//! Every fixture owns its own collection. `teardown` empties it with
//! `delete_all` and removes the backing file, so cases never share state.

use std::{path::PathBuf, sync::Arc};

use models::User;

use crate::errors::ServiceError;
use crate::storage::{JsonUserRepository, UserRepository};
use crate::user_service::UserService;

pub struct UserFixture {
    repo: Arc<JsonUserRepository>,
    file: Option<PathBuf>,
}

impl UserFixture {
    /// File-backed collection in a fresh temp file.
    pub async fn setup() -> Result<Self, ServiceError> {
        let file = std::env::temp_dir().join(format!("user_fixture_{}.json", uuid::Uuid::new_v4()));
        let repo = JsonUserRepository::open(&file).await?;
        Ok(Self { repo: Arc::new(repo), file: Some(file) })
    }

    pub fn in_memory() -> Self {
        Self { repo: Arc::new(JsonUserRepository::in_memory()), file: None }
    }

    pub fn repository(&self) -> Arc<dyn UserRepository> {
        self.repo.clone()
    }

    pub fn service(&self) -> UserService<dyn UserRepository> {
        UserService::new(self.repository())
    }

    /// Write users straight to the store, bypassing the service.
    pub async fn seed(&self, users: Vec<User>) -> Result<Vec<User>, ServiceError> {
        self.repo.save_all(users).await
    }

    pub async fn teardown(self) -> Result<(), ServiceError> {
        self.repo.delete_all().await?;
        if let Some(file) = self.file {
            tokio::fs::remove_file(&file).await.map_err(ServiceError::storage)?;
        }
        Ok(())
    }
}

/// Two users sharing names but not ids.
pub fn sample_users() -> Vec<User> {
    vec![
        User::with_id("001", "First 1", "Last 2"),
        User::with_id("002", "First 1", "Last 2"),
    ]
}
