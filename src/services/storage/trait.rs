use crate::config::StorageConfig;
use crate::error::{Result, ToggleError};
use serde_json::Value;
use std::sync::Arc;

/// Asynchronous key-value backend holding JSON values
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns `None` when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Removing an absent key succeeds.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Factory function to create the configured storage backend
pub fn create_store(config: &StorageConfig) -> Result<Arc<dyn KeyValueStore>> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(super::memory::MemoryStore::new())),
        "file" => Ok(Arc::new(super::file::FileStore::open(&config.path)?)),
        other => Err(ToggleError::Internal(format!(
            "Unknown storage backend: {}",
            other
        ))),
    }
}
