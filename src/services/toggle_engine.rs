use crate::config::BadgeConfig;
use crate::debug_if_enabled;
use crate::error::Result;
use crate::events::{SavedBounds, WindowId, WindowState, WindowUpdate};
use crate::services::badge::{Badge, BadgeIndicator};
use crate::services::bounds_store::{BoundsStore, RestoreRecord, WindowPresetState};
use crate::services::preset_registry::{Preset, PresetRegistry};
use crate::services::selected_preset::SelectedPreset;
use crate::services::window_control::WindowControl;
use crate::utils::now_ms;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Result of one toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Applied(&'static Preset),
    Restored,
}

/// Decides per window whether to apply a preset or restore the captured bounds.
///
/// State lives entirely in the bounds store: a window with a restore record is
/// preset-applied, any other window is normal. Operations on the same window are
/// serialized through a per-window async mutex; different windows never contend.
pub struct WindowToggleEngine {
    bounds: BoundsStore,
    selected: SelectedPreset,
    windows: Arc<dyn WindowControl>,
    badge: Arc<dyn BadgeIndicator>,
    badge_colors: BadgeConfig,
    window_locks: DashMap<WindowId, Arc<Mutex<()>>>,
}

impl WindowToggleEngine {
    pub fn new(
        bounds: BoundsStore,
        selected: SelectedPreset,
        windows: Arc<dyn WindowControl>,
        badge: Arc<dyn BadgeIndicator>,
        badge_colors: BadgeConfig,
    ) -> Self {
        info!("Initializing WindowToggleEngine");
        Self {
            bounds,
            selected,
            windows,
            badge,
            badge_colors,
            window_locks: DashMap::new(),
        }
    }

    pub fn selected_preset(&self) -> &SelectedPreset {
        &self.selected
    }

    pub async fn window_state(&self, window_id: WindowId) -> Result<WindowPresetState> {
        self.bounds.state(window_id).await
    }

    /// Applies `preset_id` (default preset if unknown), capturing bounds only on first use.
    pub async fn apply_preset(&self, window_id: WindowId, preset_id: &str) -> Result<&'static Preset> {
        let lock = self.window_lock(window_id);
        let _guard = lock.lock().await;
        self.apply_preset_locked(window_id, preset_id).await
    }

    /// Restores a preset-applied window, otherwise applies the selected preset.
    pub async fn toggle_window(&self, window_id: WindowId) -> Result<ToggleOutcome> {
        let lock = self.window_lock(window_id);
        let _guard = lock.lock().await;

        match self.bounds.state(window_id).await? {
            WindowPresetState::PresetApplied(record) => {
                self.finish_restore(window_id, &record).await?;
                Ok(ToggleOutcome::Restored)
            }
            WindowPresetState::Normal => {
                let preset_id = self.selected.get().await?;
                let preset = self.apply_preset_locked(window_id, preset_id).await?;
                Ok(ToggleOutcome::Applied(preset))
            }
        }
    }

    /// Restores and forgets the record if there is one. Returns whether anything happened.
    pub async fn restore_if_applied(&self, window_id: WindowId) -> Result<bool> {
        let lock = self.window_lock(window_id);
        let _guard = lock.lock().await;

        match self.bounds.state(window_id).await? {
            WindowPresetState::PresetApplied(record) => {
                self.finish_restore(window_id, &record).await?;
                Ok(true)
            }
            WindowPresetState::Normal => {
                debug_if_enabled!("Window {} has nothing to restore", window_id);
                Ok(false)
            }
        }
    }

    /// Fail-safe reset to normal: drops the record and clears the badge.
    pub async fn reset_window(&self, window_id: WindowId) -> Result<()> {
        let lock = self.window_lock(window_id);
        let _guard = lock.lock().await;

        self.bounds.clear(window_id).await?;
        self.update_badge(window_id, None).await;
        warn!("Window {} reset to normal", window_id);
        Ok(())
    }

    /// Drops everything kept for a closed window.
    pub async fn forget_window(&self, window_id: WindowId) -> Result<()> {
        let lock = self.window_lock(window_id);
        let result = {
            let _guard = lock.lock().await;
            self.bounds.clear(window_id).await
        };
        self.window_locks.remove(&window_id);
        result
    }

    fn window_lock(&self, window_id: WindowId) -> Arc<Mutex<()>> {
        self.window_locks.entry(window_id).or_default().clone()
    }

    async fn apply_preset_locked(&self, window_id: WindowId, preset_id: &str) -> Result<&'static Preset> {
        let preset = PresetRegistry::resolve(preset_id);
        if preset.id != preset_id {
            warn!("Unknown preset '{}', falling back to {}", preset_id, preset.id);
        }

        // Capture once: a window already under a preset keeps its original bounds.
        let (bounds, stored_at) = match self.bounds.state(window_id).await? {
            WindowPresetState::PresetApplied(record) => (record.bounds, record.stored_at),
            WindowPresetState::Normal => {
                let live = self.windows.get(window_id).await?;
                debug_if_enabled!("Capturing bounds of {}", live);
                (SavedBounds::capture(&live), now_ms())
            }
        };

        let record = RestoreRecord {
            bounds,
            preset_id: preset.id.to_string(),
            stored_at,
        };
        self.bounds.save(window_id, &record).await?;

        self.ensure_normal_state(window_id).await?;
        self.windows
            .update(
                window_id,
                WindowUpdate::default()
                    .with_position(Some(bounds.left), Some(bounds.top))
                    .with_size(Some(preset.width as i32), Some(preset.height as i32))
                    .focused(),
            )
            .await?;

        self.update_badge(window_id, Some(preset)).await;
        info!("Applied preset {} to window {}", preset.id, window_id);
        Ok(preset)
    }

    /// Puts `bounds` back on the window. Does not touch the bounds store.
    async fn restore_window(&self, window_id: WindowId, bounds: &SavedBounds) -> Result<()> {
        self.ensure_normal_state(window_id).await?;

        self.windows
            .update(
                window_id,
                WindowUpdate::state(WindowState::Normal)
                    .with_position(Some(bounds.left), Some(bounds.top))
                    .with_size(bounds.width, bounds.height)
                    .focused(),
            )
            .await?;

        if let Some(state) = bounds.non_normal_state() {
            // Geometry is already back; a refused state must not undo that.
            if let Err(e) = self.windows.update(window_id, WindowUpdate::state(state)).await {
                debug_if_enabled!("Could not restore state {} on window {}: {}", state, window_id, e);
            }
        }

        info!("Restored window {}", window_id);
        Ok(())
    }

    async fn finish_restore(&self, window_id: WindowId, record: &RestoreRecord) -> Result<()> {
        self.restore_window(window_id, &record.bounds).await?;
        self.bounds.clear(window_id).await?;
        self.update_badge(window_id, None).await;
        Ok(())
    }

    /// Bounds cannot be applied to a maximized, minimized or fullscreen window.
    async fn ensure_normal_state(&self, window_id: WindowId) -> Result<()> {
        let window = self.windows.get(window_id).await?;
        if !window.is_normal() {
            self.windows
                .update(window_id, WindowUpdate::state(WindowState::Normal))
                .await?;
        }
        Ok(())
    }

    async fn update_badge(&self, window_id: WindowId, preset: Option<&Preset>) {
        let badge = Badge::for_preset(preset, &self.badge_colors);
        if let Err(e) = self.paint_badge(window_id, &badge).await {
            debug_if_enabled!("Badge update for window {} failed: {}", window_id, e);
        }
    }

    async fn paint_badge(&self, window_id: WindowId, badge: &Badge) -> Result<()> {
        self.badge.set_text(window_id, &badge.text).await?;
        self.badge.set_background_color(window_id, &badge.color).await
    }
}
