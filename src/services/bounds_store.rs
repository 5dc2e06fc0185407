use crate::error::Result;
use crate::events::{SavedBounds, WindowId};
use crate::services::storage::KeyValueStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Pre-preset geometry plus the preset currently applied over it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreRecord {
    pub bounds: SavedBounds,
    pub preset_id: String,
    /// Capture time, milliseconds since the Unix epoch
    pub stored_at: u64,
}

/// Per-window state of the toggle machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowPresetState {
    Normal,
    PresetApplied(RestoreRecord),
}

impl WindowPresetState {
    pub fn record(&self) -> Option<&RestoreRecord> {
        match self {
            WindowPresetState::Normal => None,
            WindowPresetState::PresetApplied(record) => Some(record),
        }
    }

    #[cfg(test)]
    pub fn into_record(self) -> Option<RestoreRecord> {
        match self {
            WindowPresetState::Normal => None,
            WindowPresetState::PresetApplied(record) => Some(record),
        }
    }

    pub fn preset_id(&self) -> Option<&str> {
        self.record().map(|record| record.preset_id.as_str())
    }

    #[cfg(test)]
    pub fn is_normal(&self) -> bool {
        matches!(self, WindowPresetState::Normal)
    }
}

pub fn restore_key(window_id: WindowId) -> String {
    format!("restoreBounds:{}", window_id)
}

/// Typed view of restore records over a key-value backend
#[derive(Clone)]
pub struct BoundsStore {
    store: Arc<dyn KeyValueStore>,
}

impl BoundsStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// A record that no longer decodes counts as `Normal`; the next apply overwrites it.
    pub async fn state(&self, window_id: WindowId) -> Result<WindowPresetState> {
        let key = restore_key(window_id);
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(WindowPresetState::Normal);
        };

        match serde_json::from_value::<RestoreRecord>(raw) {
            Ok(record) => Ok(WindowPresetState::PresetApplied(record)),
            Err(e) => {
                warn!("Ignoring undecodable restore record {}: {}", key, e);
                Ok(WindowPresetState::Normal)
            }
        }
    }

    pub async fn save(&self, window_id: WindowId, record: &RestoreRecord) -> Result<()> {
        let value = serde_json::to_value(record)?;
        self.store.set(&restore_key(window_id), value).await
    }

    pub async fn clear(&self, window_id: WindowId) -> Result<()> {
        self.store.remove(&restore_key(window_id)).await
    }
}
