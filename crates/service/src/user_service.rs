use std::sync::Arc;

use models::User;
use tracing::{debug, info, instrument};

use crate::errors::ServiceError;
use crate::storage::{UserRepository, UserStream};

/// Business rules for the `users` collection.
///
/// Holds no state besides the shared repository handle, so one instance
/// serves every request. Absence is `Ok(None)` / `Ok(false)`, never an error.
pub struct UserService<R: UserRepository + ?Sized> {
    repo: Arc<R>,
}

impl<R: UserRepository + ?Sized> UserService<R> {
    pub fn new(repo: Arc<R>) -> Self { Self { repo } }

    pub fn repository(&self) -> &Arc<R> { &self.repo }

    /// Persist a new user. Any id on the input is discarded so the store
    /// always assigns a fresh one; no duplicate detection.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use models::User;
    /// use service::{JsonUserRepository, UserService};
    /// let svc = UserService::new(Arc::new(JsonUserRepository::in_memory()));
    /// let created = tokio_test::block_on(svc.create_user(User::new("Kullapat", "T"))).unwrap();
    /// assert!(created.id.is_some());
    /// assert_eq!(created.first_name, "Kullapat");
    /// ```
    #[instrument(skip(self, user))]
    pub async fn create_user(&self, user: User) -> Result<User, ServiceError> {
        let created = self.repo.save(User { id: None, ..user }).await?;
        info!(user_id = created.id.as_deref().unwrap_or_default(), "user_created");
        Ok(created)
    }

    /// Every stored user, pulled lazily from the store. Order is whatever the
    /// store yields; each call starts a new pass.
    pub fn get_users(&self) -> UserStream {
        self.repo.find_all()
    }

    #[instrument(skip(self))]
    pub async fn get_user_by_id(&self, id: &str) -> Result<Option<User>, ServiceError> {
        self.repo.find_by_id(id).await
    }

    /// Replace first and last name of an existing user, keeping its id.
    /// Missing users are not created.
    ///
    /// Lookup and save are two separate store calls with nothing held in
    /// between: concurrent updates of one id are last-write-wins.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use models::User;
    /// use service::{JsonUserRepository, UserRepository, UserService};
    /// let repo = Arc::new(JsonUserRepository::in_memory());
    /// let svc = UserService::new(repo.clone());
    /// tokio_test::block_on(repo.save(User::with_id("002", "First 1", "Last 2"))).unwrap();
    /// let updated = tokio_test::block_on(svc.update_user("002", User::new("Kullapat", "T"))).unwrap();
    /// assert_eq!(updated, Some(User::with_id("002", "Kullapat", "T")));
    /// let missing = tokio_test::block_on(svc.update_user("404", User::new("X", "Y"))).unwrap();
    /// assert!(missing.is_none());
    /// ```
    #[instrument(skip(self, patch))]
    pub async fn update_user(&self, id: &str, patch: User) -> Result<Option<User>, ServiceError> {
        let Some(existing) = self.repo.find_by_id(id).await? else {
            debug!("update skipped, user not found");
            return Ok(None);
        };
        let updated = self.repo.save(existing.merged_with(&patch)).await?;
        info!("user_updated");
        Ok(Some(updated))
    }

    /// Delete the user stored under `id`. Returns `false` when there was none.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: &str) -> Result<bool, ServiceError> {
        let Some(existing) = self.repo.find_by_id(id).await? else {
            debug!("delete skipped, user not found");
            return Ok(false);
        };
        self.repo.delete(&existing).await?;
        info!("user_deleted");
        Ok(true)
    }
}
