//! Objects as files in a local directory

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::ObjectStore;
use crate::shared::errors::PersistenceError;

pub struct FileStore {
    directory: PathBuf,
}

impl FileStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path(&self, name: &str) -> PathBuf {
        self.directory.join(name)
    }
}

#[async_trait]
impl ObjectStore for FileStore {
    async fn read(&self, name: &str) -> Result<Vec<u8>, PersistenceError> {
        fs::read(self.path(name)).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => PersistenceError::NotFound(name.to_string()),
            _ => PersistenceError::Read {
                name: name.to_string(),
                reason: e.to_string(),
            },
        })
    }

    async fn write(&self, name: &str, bytes: &[u8]) -> Result<(), PersistenceError> {
        let write_err = |e: std::io::Error| PersistenceError::Write {
            name: name.to_string(),
            reason: e.to_string(),
        };

        fs::create_dir_all(&self.directory).await.map_err(write_err)?;

        // replace the previous document only once the new one is complete
        let target = self.path(name);
        let partial = self.path(&format!("{}.partial", name));
        fs::write(&partial, bytes).await.map_err(write_err)?;
        fs::rename(&partial, &target).await.map_err(write_err)?;
        Ok(())
    }
}
