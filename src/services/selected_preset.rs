use crate::debug_if_enabled;
use crate::error::Result;
use crate::services::preset_registry::{PresetRegistry, DEFAULT_PRESET_ID};
use crate::services::storage::KeyValueStore;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

pub const SELECTED_PRESET_KEY: &str = "selectedPreset";

/// Last preset the user explicitly picked, independent of any window.
///
/// Nothing is written until the first explicit choice; reads fall back to the
/// default preset whenever the stored value is missing or no longer in the catalog.
#[derive(Clone)]
pub struct SelectedPreset {
    store: Arc<dyn KeyValueStore>,
}

impl SelectedPreset {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self) -> Result<&'static str> {
        let stored = self.store.get(SELECTED_PRESET_KEY).await?;
        let preset = stored
            .as_ref()
            .and_then(Value::as_str)
            .and_then(PresetRegistry::lookup);

        match preset {
            Some(preset) => Ok(preset.id),
            None => {
                debug_if_enabled!("Selected preset {:?} unusable, using default", stored);
                Ok(DEFAULT_PRESET_ID)
            }
        }
    }

    /// Unknown ids are ignored, not rejected.
    pub async fn set(&self, preset_id: &str) -> Result<()> {
        if !PresetRegistry::is_known(preset_id) {
            debug_if_enabled!("Ignoring unknown preset selection '{}'", preset_id);
            return Ok(());
        }

        self.store
            .set(SELECTED_PRESET_KEY, Value::String(preset_id.to_string()))
            .await?;
        info!("Selected preset set to {}", preset_id);
        Ok(())
    }
}
