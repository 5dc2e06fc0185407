use crate::debug_if_enabled;
use crate::error::{Result, ToggleError};
use crate::events::{WindowId, WindowSnapshot, WindowState, WindowUpdate};
use crate::toggle_error;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

use super::r#trait::WindowControl;

/// In-memory window manager used by the host and by tests.
///
/// Mirrors the browser's rules that matter to the toggle engine: bounds can only be
/// changed while the window ends up `normal`, and some states can be refused outright.
pub struct EmulatedWindows {
    windows: DashMap<WindowId, WindowSnapshot>,
    disallowed_states: RwLock<HashSet<WindowState>>,
    failing_updates: AtomicUsize,
    update_log: Mutex<Vec<(WindowId, WindowUpdate)>>,
}

impl Default for EmulatedWindows {
    fn default() -> Self {
        Self::new()
    }
}

impl EmulatedWindows {
    pub fn new() -> Self {
        Self {
            windows: DashMap::new(),
            disallowed_states: RwLock::new(HashSet::new()),
            failing_updates: AtomicUsize::new(0),
            update_log: Mutex::new(Vec::new()),
        }
    }

    pub fn with_windows(windows: impl IntoIterator<Item = WindowSnapshot>) -> Self {
        let emulated = Self::new();
        for window in windows {
            emulated.insert(window);
        }
        emulated
    }

    pub fn insert(&self, window: WindowSnapshot) {
        info!("Emulated {} opened", window);
        self.windows.insert(window.id, window);
    }

    pub fn remove(&self, window_id: WindowId) -> Option<WindowSnapshot> {
        self.windows.remove(&window_id).map(|(_, window)| window)
    }

    pub fn snapshot(&self, window_id: WindowId) -> Option<WindowSnapshot> {
        self.windows.get(&window_id).map(|entry| *entry.value())
    }

    pub fn disallow_state(&self, state: WindowState) {
        self.disallowed_states.write().insert(state);
    }

    /// The next `count` update calls fail before touching any window.
    #[cfg(test)]
    pub fn fail_next_updates(&self, count: usize) {
        self.failing_updates.store(count, Ordering::SeqCst);
    }

    #[cfg(test)]
    pub fn update_log(&self) -> Vec<(WindowId, WindowUpdate)> {
        self.update_log.lock().clone()
    }

    fn take_injected_failure(&self) -> bool {
        self.failing_updates
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait::async_trait]
impl WindowControl for EmulatedWindows {
    async fn get(&self, window_id: WindowId) -> Result<WindowSnapshot> {
        match self.snapshot(window_id) {
            Some(window) => Ok(window),
            None => ToggleError::window_not_found(window_id),
        }
    }

    async fn update(&self, window_id: WindowId, update: WindowUpdate) -> Result<WindowSnapshot> {
        self.update_log.lock().push((window_id, update));

        if self.take_injected_failure() {
            return Err(toggle_error!(internal, "update of window {} rejected by platform", window_id));
        }

        let mut entry = match self.windows.get_mut(&window_id) {
            Some(entry) => entry,
            None => return ToggleError::window_not_found(window_id),
        };
        let window = entry.value_mut();

        if let Some(state) = update.state {
            if self.disallowed_states.read().contains(&state) {
                return Err(toggle_error!(
                    window_state,
                    "state '{}' is not allowed for window {}",
                    state,
                    window_id
                ));
            }
        }

        let target_state = update.state.or(window.state);
        if update.touches_geometry() && target_state != Some(WindowState::Normal) {
            return Err(toggle_error!(
                window_state,
                "cannot change bounds of window {} while {}",
                window_id,
                target_state.map(|s| s.as_str()).unwrap_or("in an unknown state")
            ));
        }

        window.left = update.left.or(window.left);
        window.top = update.top.or(window.top);
        window.width = update.width.or(window.width);
        window.height = update.height.or(window.height);
        window.state = target_state;
        if let Some(focused) = update.focused {
            window.focused = focused;
        }

        debug_if_enabled!("Emulated {} after {:?}", window, update);
        Ok(*window)
    }
}
