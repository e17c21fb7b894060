//! File-backed implementation of the [`StateStore`] trait.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

use super::{error::PersistenceError, traits::StateStore};

/// Stores each document as a pretty-printed JSON file under a state
/// directory. Writes go through a sibling temp file followed by a rename, so
/// a crash mid-write never leaves a truncated document behind.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Creates the store, creating the state directory if needed.
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, PersistenceError> {
        if name.is_empty() || name.contains(std::path::is_separator) {
            return Err(PersistenceError::InvalidInput(format!(
                "Invalid document name: {name:?}"
            )));
        }
        Ok(self.dir.join(name))
    }
}

#[async_trait]
impl StateStore for JsonFileStore {
    #[tracing::instrument(skip(self), level = "debug")]
    async fn load_document<T: DeserializeOwned + Send + Sync + 'static>(
        &self,
        name: &str,
    ) -> Result<Option<T>, PersistenceError> {
        let path = self.path_for(name)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    #[tracing::instrument(skip(self, value), level = "debug")]
    async fn save_document<T: Serialize + Send + Sync + 'static>(
        &self,
        name: &str,
        value: &T,
    ) -> Result<(), PersistenceError> {
        let path = self.path_for(name)?;
        let bytes = serde_json::to_vec_pretty(value)?;

        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}
