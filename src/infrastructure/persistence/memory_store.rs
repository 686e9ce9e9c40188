//! In-process object store

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::ObjectStore;
use crate::shared::errors::PersistenceError;

#[derive(Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
    read_only: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects every write, for exercising the write-failure path
    pub fn read_only() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            read_only: true,
        }
    }

    pub async fn insert(&self, name: &str, bytes: Vec<u8>) {
        self.objects.write().await.insert(name.to_string(), bytes);
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.objects.read().await.contains_key(name)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn read(&self, name: &str) -> Result<Vec<u8>, PersistenceError> {
        self.objects
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| PersistenceError::NotFound(name.to_string()))
    }

    async fn write(&self, name: &str, bytes: &[u8]) -> Result<(), PersistenceError> {
        if self.read_only {
            return Err(PersistenceError::Write {
                name: name.to_string(),
                reason: "store is read-only".to_string(),
            });
        }
        self.objects
            .write()
            .await
            .insert(name.to_string(), bytes.to_vec());
        Ok(())
    }
}
