use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use models::{User, UserDocument};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::storage::json_map_store::JsonMapStore;
use crate::storage::repository::{UserRepository, UserStream};

/// `users` collection kept as `_id -> document` in a [`JsonMapStore`].
#[derive(Clone)]
pub struct JsonUserRepository {
    store: Arc<JsonMapStore<String, UserDocument>>,
}

impl JsonUserRepository {
    /// Open (or create) the collection file at `path`.
    pub async fn open<P: Into<PathBuf>>(path: P) -> Result<Self, ServiceError> {
        let store = JsonMapStore::new(path).await?;
        Ok(Self { store })
    }

    pub fn in_memory() -> Self {
        Self { store: JsonMapStore::in_memory() }
    }

    pub async fn count(&self) -> usize {
        self.store.len().await
    }

    fn new_id() -> String {
        Uuid::new_v4().simple().to_string()
    }
}

#[async_trait]
impl UserRepository for JsonUserRepository {
    async fn save(&self, user: User) -> Result<User, ServiceError> {
        let id = match user.id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => Self::new_id(),
        };
        let doc = UserDocument::from_user(id.clone(), user);
        self.store.insert(id, doc.clone()).await?;
        Ok(doc.into())
    }

    fn find_all(&self) -> UserStream {
        let store = Arc::clone(&self.store);
        // Keys are snapshotted on first poll; documents are fetched one per poll.
        // A key removed after the snapshot is skipped.
        stream::once(async move {
            let keys = store.keys().await;
            (store, keys)
        })
        .flat_map(|(store, keys)| {
            stream::iter(keys).filter_map(move |id| {
                let store = Arc::clone(&store);
                async move { store.get(&id).await.map(|doc| Ok(User::from(doc))) }
            })
        })
        .boxed()
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, ServiceError> {
        Ok(self.store.get(&id.to_string()).await.map(User::from))
    }

    async fn delete(&self, user: &User) -> Result<(), ServiceError> {
        let id = user
            .id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ServiceError::Validation("cannot delete a user without id".into()))?;
        self.store.remove(&id.to_string()).await?;
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), ServiceError> {
        self.store.clear().await
    }
}
