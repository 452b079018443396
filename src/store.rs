use crate::errors::ServiceError;
use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Trait for whole-collection storage backends. A collection is always loaded
/// and replaced in full; there is no per-record access.
#[async_trait]
pub trait CollectionStore<T>: Send + Sync {
    async fn load(&self) -> Result<Vec<T>>;
    async fn replace(&self, records: &[T]) -> Result<()>;
}

/// JSON file backend. The document is a single named collection, e.g.
/// `{"accounts": [...]}`, rewritten wholesale on every replace.
pub struct JsonFileStore<T> {
    name: &'static str,
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonFileStore<T> {
    pub fn new(name: &'static str, path: PathBuf) -> Self {
        Self {
            name,
            path,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<T> CollectionStore<T> for JsonFileStore<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    async fn load(&self) -> Result<Vec<T>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            // A missing file is an empty collection, not an error
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let document: serde_json::Value = serde_json::from_slice(&bytes)?;
        match document.get(self.name) {
            Some(records) => Ok(serde_json::from_value(records.clone())?),
            None => Ok(Vec::new()),
        }
    }

    async fn replace(&self, records: &[T]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut document = serde_json::Map::new();
        document.insert(self.name.to_owned(), serde_json::to_value(records)?);

        let bytes = serde_json::to_vec_pretty(&document)?;
        tokio::fs::write(&self.path, bytes).await?;

        Ok(())
    }
}

/// In-memory backend (fast, no persistence needed in tests)
pub struct InMemoryStore<T> {
    records: Arc<RwLock<Vec<T>>>,
}

impl<T> InMemoryStore<T> {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

#[async_trait]
impl<T> CollectionStore<T> for InMemoryStore<T>
where
    T: Clone + Send + Sync,
{
    async fn load(&self) -> Result<Vec<T>> {
        let records = self.records.read().await;
        Ok(records.clone())
    }

    async fn replace(&self, records: &[T]) -> Result<()> {
        let mut guard = self.records.write().await;
        *guard = records.to_vec();
        Ok(())
    }
}

/// Handle over a stored collection that serializes every read-modify-write
/// cycle. Concurrent mutations of the same collection cannot interleave their
/// load and replace phases, which is what rules out lost updates when two
/// requests touch the same records.
pub struct Collection<T> {
    store: Arc<dyn CollectionStore<T>>,
    lock: Arc<Mutex<()>>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            lock: self.lock.clone(),
        }
    }
}

impl<T> Collection<T> {
    pub fn new(store: Arc<dyn CollectionStore<T>>) -> Self {
        Self {
            store,
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Consistent snapshot of the full collection.
    pub async fn snapshot(&self) -> Result<Vec<T>, ServiceError> {
        let _guard = self.lock.lock().await;
        self.store.load().await.map_err(ServiceError::Internal)
    }

    /// Load the collection, apply `mutate`, and persist the result, all
    /// under the collection lock. If `mutate` fails, nothing is written, so
    /// a rejected operation leaves no partial state behind.
    pub async fn update<R, F>(&self, mutate: F) -> Result<R, ServiceError>
    where
        F: FnOnce(&mut Vec<T>) -> Result<R, ServiceError>,
    {
        let _guard = self.lock.lock().await;

        let mut records = self.store.load().await.map_err(ServiceError::Internal)?;
        let out = mutate(&mut records)?;
        self.store
            .replace(&records)
            .await
            .map_err(ServiceError::Internal)?;

        Ok(out)
    }
}
