use std::{collections::HashMap, hash::Hash, path::{Path, PathBuf}, sync::Arc};
use tokio::{fs, sync::RwLock};
use tracing::debug;

use crate::errors::ServiceError;

/// Generic key-value map store, optionally persisted to a JSON file.
///
/// Reads are served from memory. When a path is configured every mutation
/// is applied to a copy of the map, the copy is written to disk (temp file +
/// rename), and only then swapped in. A failed write leaves memory untouched.
/// The write guard is held across the disk write, so writers are serialised
/// and the file always ends up with the latest state.
pub struct JsonMapStore<K, V> {
    inner: Arc<RwLock<HashMap<K, V>>>,
    file_path: Option<Arc<PathBuf>>,
}

impl<K, V> JsonMapStore<K, V>
where
    K: Eq + Hash + serde::Serialize + serde::de::DeserializeOwned + Clone + Send + Sync + 'static,
    V: serde::Serialize + serde::de::DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Initialize the store from a path. Creates the file with an empty map if missing.
    /// An unreadable or corrupt file is an error rather than an empty store.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(ServiceError::storage)?;
            }
        }

        let map: HashMap<K, V> = match fs::read(&file_path).await {
            Ok(bytes) if bytes.is_empty() => HashMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                ServiceError::Storage(format!("corrupt store file {}: {e}", file_path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let empty: HashMap<K, V> = HashMap::new();
                let data = serde_json::to_vec(&empty).map_err(ServiceError::storage)?;
                write_atomically(&file_path, &data).await?;
                empty
            }
            Err(e) => return Err(ServiceError::storage(e)),
        };
        debug!(path = %file_path.display(), entries = map.len(), "json map store loaded");

        Ok(Arc::new(Self {
            inner: Arc::new(RwLock::new(map)),
            file_path: Some(Arc::new(file_path)),
        }))
    }

    /// A store that lives only as long as the process.
    pub fn in_memory() -> Arc<Self> {
        Arc::new(Self { inner: Arc::new(RwLock::new(HashMap::new())), file_path: None })
    }

    /// Apply `mutate` and make it durable before it becomes visible.
    ///
    /// Runs on a detached task: if the caller is dropped mid-write the write
    /// still completes and is committed to memory.
    async fn commit<R, F>(&self, mutate: F) -> Result<R, ServiceError>
    where
        F: FnOnce(&mut HashMap<K, V>) -> R + Send + 'static,
        R: Send + 'static,
    {
        let Some(path) = self.file_path.clone() else {
            let mut map = self.inner.write().await;
            return Ok(mutate(&mut *map));
        };
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let mut map = inner.write().await;
            let mut candidate = map.clone();
            let out = mutate(&mut candidate);
            let data = serde_json::to_vec(&candidate).map_err(ServiceError::storage)?;
            write_atomically(&path, &data).await?;
            *map = candidate;
            Ok(out)
        });
        task.await
            .map_err(|e| ServiceError::Storage(format!("persist task failed: {e}")))?
    }

    /// Snapshot of all keys, in map order.
    pub async fn keys(&self) -> Vec<K> {
        let map = self.inner.read().await;
        map.keys().cloned().collect()
    }

    /// Get value by key.
    pub async fn get(&self, key: &K) -> Option<V> {
        let map = self.inner.read().await;
        map.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Insert or update a value by key and persist.
    pub async fn insert(&self, key: K, value: V) -> Result<(), ServiceError> {
        self.commit(move |map| {
            map.insert(key, value);
        })
        .await
    }

    /// Remove a key and persist; returns whether it existed.
    /// Removing an absent key does not touch the file.
    pub async fn remove(&self, key: &K) -> Result<bool, ServiceError> {
        if !self.inner.read().await.contains_key(key) {
            return Ok(false);
        }
        let key = key.clone();
        self.commit(move |map| map.remove(&key).is_some()).await
    }

    /// Drop every entry and persist the empty map.
    pub async fn clear(&self) -> Result<(), ServiceError> {
        self.commit(|map| map.clear()).await
    }
}

async fn write_atomically(path: &Path, data: &[u8]) -> Result<(), ServiceError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, data).await.map_err(ServiceError::storage)?;
    fs::rename(&tmp, path).await.map_err(ServiceError::storage)?;
    Ok(())
}
