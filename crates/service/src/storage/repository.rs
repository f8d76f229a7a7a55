use async_trait::async_trait;
use futures_util::stream::BoxStream;
use models::User;

use crate::errors::ServiceError;

/// Lazily produced sequence of users; each item is pulled on demand.
pub type UserStream = BoxStream<'static, Result<User, ServiceError>>;

/// Document-store contract for the `users` collection.
///
/// At most one record per id. No transactions and no concurrency token:
/// a `save` always overwrites whatever is stored under the id.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create when `user.id` is unset (a fresh id is assigned), otherwise
    /// create-or-overwrite the record at that id. Returns the stored record.
    async fn save(&self, user: User) -> Result<User, ServiceError>;

    /// Save each user in order.
    async fn save_all(&self, users: Vec<User>) -> Result<Vec<User>, ServiceError> {
        let mut saved = Vec::with_capacity(users.len());
        for user in users {
            saved.push(self.save(user).await?);
        }
        Ok(saved)
    }

    /// Every stored user. Nothing is read until the stream is polled.
    fn find_all(&self) -> UserStream;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, ServiceError>;

    /// Remove the record this document was loaded from.
    /// A document without an id is rejected; an already-removed one is a no-op.
    async fn delete(&self, user: &User) -> Result<(), ServiceError>;

    async fn delete_all(&self) -> Result<(), ServiceError>;
}

/// Repositories that stand in for an unreachable store.
pub mod mock {
    use super::*;
    use futures_util::stream::{self, StreamExt};

    /// Fails every call with `ServiceError::Storage`, like a store whose
    /// connection pool cannot reach the server.
    #[derive(Debug, Default, Clone)]
    pub struct UnavailableUserRepository;

    fn unavailable() -> ServiceError {
        ServiceError::Storage("document store unavailable".into())
    }

    #[async_trait]
    impl UserRepository for UnavailableUserRepository {
        async fn save(&self, _user: User) -> Result<User, ServiceError> {
            Err(unavailable())
        }

        fn find_all(&self) -> UserStream {
            stream::once(async { Err(unavailable()) }).boxed()
        }

        async fn find_by_id(&self, _id: &str) -> Result<Option<User>, ServiceError> {
            Err(unavailable())
        }

        async fn delete(&self, _user: &User) -> Result<(), ServiceError> {
            Err(unavailable())
        }

        async fn delete_all(&self) -> Result<(), ServiceError> {
            Err(unavailable())
        }
    }

    /// Serves reads from `inner` but fails every write, e.g. a replica
    /// that lost its primary between the lookup and the save.
    pub struct ReadOnlyUserRepository<R> {
        pub inner: R,
    }

    #[async_trait]
    impl<R: UserRepository> UserRepository for ReadOnlyUserRepository<R> {
        async fn save(&self, _user: User) -> Result<User, ServiceError> {
            Err(unavailable())
        }

        fn find_all(&self) -> UserStream {
            self.inner.find_all()
        }

        async fn find_by_id(&self, id: &str) -> Result<Option<User>, ServiceError> {
            self.inner.find_by_id(id).await
        }

        async fn delete(&self, _user: &User) -> Result<(), ServiceError> {
            Err(unavailable())
        }

        async fn delete_all(&self) -> Result<(), ServiceError> {
            Err(unavailable())
        }
    }
}
