//! This module contains the state management interface for seekwatch.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Serialize, de::DeserializeOwned};

use super::error::PersistenceError;

/// A store of named JSON documents.
///
/// Each document (product history, cooldown ledger, daily counters) is read
/// once at startup and rewritten wholesale on every mutation. Callers must
/// serialize writers through whatever lock guards the in-memory structure the
/// document reflects.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Loads a JSON document by name, `None` when it does not exist yet.
    async fn load_document<T: DeserializeOwned + Send + Sync + 'static>(
        &self,
        name: &str,
    ) -> Result<Option<T>, PersistenceError>;

    /// Rewrites a JSON document atomically.
    async fn save_document<T: Serialize + Send + Sync + 'static>(
        &self,
        name: &str,
        value: &T,
    ) -> Result<(), PersistenceError>;
}
