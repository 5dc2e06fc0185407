use crate::error::{Result, ToggleError};
use crate::debug_if_enabled;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::info;

use super::r#trait::KeyValueStore;

/// Store persisted as one JSON object file. Every mutation rewrites the file atomically
/// on the blocking pool; writes are serialized by the entries lock.
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, Value>>,
}

impl FileStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let entries: BTreeMap<String, Value> = if path.exists() {
            let bytes = fs::read(&path)?;
            if bytes.iter().all(|b| b.is_ascii_whitespace()) {
                BTreeMap::new()
            } else {
                serde_json::from_slice(&bytes).map_err(|e| {
                    ToggleError::Storage(format!("Corrupt state file {:?}: {}", path, e))
                })?
            }
        } else {
            BTreeMap::new()
        };

        info!("File store opened at {:?} ({} entries)", path, entries.len());

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Applies `change` to a copy and commits it only after the file write succeeds.
    async fn mutate(&self, change: impl FnOnce(&mut BTreeMap<String, Value>) + Send) -> Result<()> {
        let mut entries = self.entries.lock().await;
        let mut next = entries.clone();
        change(&mut next);

        let path = self.path.clone();
        let next = tokio::task::spawn_blocking(move || write_atomically(&path, &next).map(|()| next))
            .await
            .map_err(|e| ToggleError::Internal(format!("State file writer failed: {}", e)))?
            .map_err(|e| ToggleError::Storage(format!("Failed to write {:?}: {}", self.path, e)))?;

        *entries = next;
        Ok(())
    }
}

fn write_atomically(path: &Path, entries: &BTreeMap<String, Value>) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp = path.with_extension("tmp");
    let mut file = fs::File::create(&tmp)?;
    serde_json::to_writer_pretty(&mut file, entries).map_err(std::io::Error::other)?;
    file.write_all(b"\n")?;
    file.sync_all()?;

    fs::rename(tmp, path)
}

#[async_trait::async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        debug_if_enabled!("FileStore: set {}", key);
        self.mutate(|entries| {
            entries.insert(key.to_string(), value);
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        if !self.entries.lock().await.contains_key(key) {
            return Ok(());
        }
        debug_if_enabled!("FileStore: remove {}", key);
        self.mutate(|entries| {
            entries.remove(key);
        })
        .await
    }
}
