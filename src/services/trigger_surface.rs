use crate::debug_if_enabled;
use crate::events::{TriggerEvent, WindowId};
use crate::services::context_menu::{setup_context_menus, ContextMenuHost, MenuAction};
use crate::services::toggle_engine::{ToggleOutcome, WindowToggleEngine};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::oneshot::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

struct Lane {
    events: mpsc::UnboundedSender<TriggerEvent>,
    done: oneshot::Receiver<()>,
}

/// Entry point for every platform event. Never propagates errors: each handler
/// degrades to a consistent state and logs what went wrong.
pub struct TriggerSurface {
    engine: Arc<WindowToggleEngine>,
    menus: Arc<dyn ContextMenuHost>,
}

impl TriggerSurface {
    pub fn new(engine: Arc<WindowToggleEngine>, menus: Arc<dyn ContextMenuHost>) -> Self {
        Self { engine, menus }
    }

    /// Dispatches events until the channel closes, then waits for in-flight tasks.
    ///
    /// Each window gets its own lane task that handles its events in arrival
    /// order; window-less events share one lane. Lanes run in parallel.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<TriggerEvent>) {
        info!("TriggerSurface started");
        let mut tasks = JoinSet::new();
        let mut lanes: HashMap<Option<WindowId>, Lane> = HashMap::new();
        // Closed lanes that may still be draining, keyed by window
        let mut retiring: HashMap<Option<WindowId>, oneshot::Receiver<()>> = HashMap::new();

        while let Some(event) = events.recv().await {
            let key = event.window_id();
            let closes_lane = matches!(event, TriggerEvent::WindowRemoved(_));

            let lane = lanes.entry(key).or_insert_with(|| {
                let (tx, rx) = mpsc::unbounded_channel();
                let (done_tx, done_rx) = oneshot::channel();
                let predecessor = retiring.remove(&key);
                tasks.spawn(Arc::clone(&self).drain_lane(rx, predecessor, done_tx));
                Lane { events: tx, done: done_rx }
            });

            if let Err(mpsc::error::SendError(event)) = lane.events.send(event) {
                error!("Event lane for {:?} is gone, dropping {}", key, event);
                lanes.remove(&key);
            } else if closes_lane {
                if let Some(lane) = lanes.remove(&key) {
                    retiring.retain(|_, done| matches!(done.try_recv(), Err(TryRecvError::Empty)));
                    retiring.insert(key, lane.done);
                }
            }

            // Reap finished lanes so the set does not grow with the session.
            while let Some(finished) = tasks.try_join_next() {
                if let Err(e) = finished {
                    error!("Trigger task panicked: {}", e);
                }
            }
        }

        drop(lanes);
        while let Some(finished) = tasks.join_next().await {
            if let Err(e) = finished {
                error!("Trigger task panicked: {}", e);
            }
        }
        info!("TriggerSurface stopped");
    }

    /// Handles one lane's events in order, after the previous lane for the same window is done.
    async fn drain_lane(
        self: Arc<Self>,
        mut events: mpsc::UnboundedReceiver<TriggerEvent>,
        predecessor: Option<oneshot::Receiver<()>>,
        _done: oneshot::Sender<()>,
    ) {
        if let Some(predecessor) = predecessor {
            // Resolves with an error once the previous lane drops its sender.
            let _ = predecessor.await;
        }
        while let Some(event) = events.recv().await {
            self.handle(event).await;
        }
    }

    pub async fn handle(&self, event: TriggerEvent) {
        debug_if_enabled!("Handling {}", event);

        match event {
            TriggerEvent::ActionClicked { window_id } => self.on_action_clicked(window_id).await,
            TriggerEvent::MenuClicked {
                menu_item_id,
                window_id,
            } => self.on_menu_clicked(&menu_item_id, window_id).await,
            TriggerEvent::WindowRemoved(window_id) => self.on_window_removed(window_id).await,
            TriggerEvent::Installed | TriggerEvent::Startup => self.rebuild_menus().await,
        }
    }

    async fn on_action_clicked(&self, window_id: Option<WindowId>) {
        let Some(window_id) = window_id else {
            debug_if_enabled!("Action click without a window, ignoring");
            return;
        };

        match self.engine.toggle_window(window_id).await {
            Ok(ToggleOutcome::Applied(preset)) => {
                info!("Window {} toggled to {}", window_id, preset.id)
            }
            Ok(ToggleOutcome::Restored) => info!("Window {} toggled back", window_id),
            Err(e) => {
                error!("Toggle failed for window {}: {}", window_id, e);
                if let Err(e) = self.engine.reset_window(window_id).await {
                    warn!("Fail-safe reset of window {} failed: {}", window_id, e);
                }
            }
        }
    }

    async fn on_menu_clicked(&self, menu_item_id: &str, window_id: Option<WindowId>) {
        let Some(window_id) = window_id else {
            debug_if_enabled!("Menu '{}' clicked without a window, ignoring", menu_item_id);
            return;
        };
        let Some(action) = MenuAction::from_menu_id(menu_item_id) else {
            debug_if_enabled!("Menu item '{}' has no action", menu_item_id);
            return;
        };

        let result = match action {
            MenuAction::ApplyPreset(preset) => {
                match self.engine.selected_preset().set(preset.id).await {
                    Ok(()) => self.engine.apply_preset(window_id, preset.id).await.map(|_| ()),
                    Err(e) => Err(e),
                }
            }
            MenuAction::Restore => self.engine.restore_if_applied(window_id).await.map(|_| ()),
        };

        if let Err(e) = result {
            error!("Context menu action '{}' failed for window {}: {}", menu_item_id, window_id, e);
        }
    }

    async fn on_window_removed(&self, window_id: WindowId) {
        if let Err(e) = self.engine.forget_window(window_id).await {
            debug_if_enabled!("Cleanup for closed window {} failed: {}", window_id, e);
        }
    }

    async fn rebuild_menus(&self) {
        if let Err(e) = setup_context_menus(self.menus.as_ref()).await {
            error!("Context menu init failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BadgeConfig;
    use crate::events::{WindowSnapshot, WindowState};
    use crate::services::badge::EmulatedBadge;
    use crate::services::bounds_store::BoundsStore;
    use crate::services::context_menu::EmulatedContextMenu;
    use crate::services::selected_preset::{SelectedPreset, SELECTED_PRESET_KEY};
    use crate::services::storage::{KeyValueStore, MemoryStore};
    use crate::services::window_control::EmulatedWindows;
    use serde_json::json;

    struct Harness {
        surface: Arc<TriggerSurface>,
        store: Arc<MemoryStore>,
        windows: Arc<EmulatedWindows>,
        badge: Arc<EmulatedBadge>,
        menus: Arc<EmulatedContextMenu>,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryStore::new());
        let windows = Arc::new(EmulatedWindows::with_windows([
            WindowSnapshot::new(WindowId(1), 100, 100, 1280, 800),
            WindowSnapshot::new(WindowId(2), 50, 60, 1024, 768).with_state(WindowState::Maximized),
        ]));
        let badge = Arc::new(EmulatedBadge::new());
        let menus = Arc::new(EmulatedContextMenu::new());
        let engine = Arc::new(WindowToggleEngine::new(
            BoundsStore::new(store.clone()),
            SelectedPreset::new(store.clone()),
            windows.clone(),
            badge.clone(),
            BadgeConfig::default(),
        ));
        Harness {
            surface: Arc::new(TriggerSurface::new(engine, menus.clone())),
            store,
            windows,
            badge,
            menus,
        }
    }

    #[tokio::test]
    async fn install_then_startup_builds_one_menu() {
        let h = harness();
        h.surface.handle(TriggerEvent::Installed).await;
        h.surface.handle(TriggerEvent::Startup).await;

        let ids: Vec<String> = h.menus.items().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, ["preset-mobile", "preset-tablet", "sep-1", "restore"]);
    }

    #[tokio::test]
    async fn preset_menu_selects_and_applies_even_when_applied() {
        let h = harness();
        h.surface.handle(TriggerEvent::action_clicked(WindowId(1))).await;
        h.surface.handle(TriggerEvent::menu_clicked("preset-tablet", WindowId(1))).await;

        assert_eq!(h.store.get(SELECTED_PRESET_KEY).await.unwrap(), Some(json!("tablet")));
        let window = h.windows.snapshot(WindowId(1)).unwrap();
        assert_eq!((window.width, window.height), (Some(768), Some(1024)));
        assert_eq!(h.badge.badge(WindowId(1)).text, "T");

        // Restore goes back to the geometry from before the first preset.
        h.surface.handle(TriggerEvent::menu_clicked("restore", WindowId(1))).await;
        let window = h.windows.snapshot(WindowId(1)).unwrap();
        assert_eq!((window.width, window.height), (Some(1280), Some(800)));
        assert!(!h.store.contains_key("restoreBounds:1"));
    }

    #[tokio::test]
    async fn selected_preset_drives_later_toggles() {
        let h = harness();
        h.surface.handle(TriggerEvent::menu_clicked("preset-tablet", WindowId(1))).await;
        h.surface.handle(TriggerEvent::action_clicked(WindowId(2))).await;

        let window = h.windows.snapshot(WindowId(2)).unwrap();
        assert_eq!((window.width, window.height), (Some(768), Some(1024)));
    }

    #[tokio::test]
    async fn restore_menu_without_record_does_nothing() {
        let h = harness();
        h.surface.handle(TriggerEvent::menu_clicked("restore", WindowId(1))).await;
        h.surface.handle(TriggerEvent::menu_clicked("sep-1", WindowId(1))).await;
        assert!(h.windows.update_log().is_empty());
    }

    #[tokio::test]
    async fn window_close_removes_record() {
        let h = harness();
        h.surface.handle(TriggerEvent::action_clicked(WindowId(2))).await;
        assert!(h.store.contains_key("restoreBounds:2"));

        h.windows.remove(WindowId(2));
        h.surface.handle(TriggerEvent::WindowRemoved(WindowId(2))).await;
        assert!(!h.store.contains_key("restoreBounds:2"));
    }

    #[tokio::test]
    async fn failed_toggle_resets_window() {
        let h = harness();
        h.windows.fail_next_updates(1);
        h.surface.handle(TriggerEvent::action_clicked(WindowId(1))).await;

        assert!(!h.store.contains_key("restoreBounds:1"));
        assert!(!h.badge.badge(WindowId(1)).is_active());
        assert_eq!(h.badge.badge(WindowId(1)).color, "#000000");
    }

    #[tokio::test]
    async fn failed_restore_also_resets_window() {
        let h = harness();
        h.surface.handle(TriggerEvent::action_clicked(WindowId(1))).await;
        assert!(h.badge.badge(WindowId(1)).is_active());

        h.windows.fail_next_updates(1);
        h.surface.handle(TriggerEvent::action_clicked(WindowId(1))).await;
        assert!(!h.store.contains_key("restoreBounds:1"));
        assert!(!h.badge.badge(WindowId(1)).is_active());
    }

    #[tokio::test]
    async fn toggle_on_vanished_window_leaves_no_record() {
        let h = harness();
        h.surface.handle(TriggerEvent::action_clicked(WindowId(42))).await;
        assert_eq!(h.store.len(), 0);
    }

    #[tokio::test]
    async fn click_without_window_is_ignored() {
        let h = harness();
        h.surface
            .handle(TriggerEvent::ActionClicked { window_id: None })
            .await;
        assert!(h.windows.update_log().is_empty());
    }

    #[tokio::test]
    async fn run_drains_queued_events() {
        let h = harness();
        let (tx, rx) = mpsc::channel(16);
        let runner = tokio::spawn(h.surface.clone().run(rx));

        tx.send(TriggerEvent::Installed).await.unwrap();
        tx.send(TriggerEvent::action_clicked(WindowId(1))).await.unwrap();
        drop(tx);
        runner.await.unwrap();

        assert_eq!(h.menus.items().len(), 4);
        assert!(h.store.contains_key("restoreBounds:1"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn run_keeps_event_order_per_window() {
        for _ in 0..200 {
            let h = harness();
            let (tx, rx) = mpsc::channel(16);
            let runner = tokio::spawn(h.surface.clone().run(rx));

            tx.send(TriggerEvent::action_clicked(WindowId(1))).await.unwrap();
            tx.send(TriggerEvent::menu_clicked("restore", WindowId(1))).await.unwrap();
            tx.send(TriggerEvent::action_clicked(WindowId(2))).await.unwrap();
            tx.send(TriggerEvent::menu_clicked("preset-tablet", WindowId(2))).await.unwrap();
            tx.send(TriggerEvent::menu_clicked("restore", WindowId(2))).await.unwrap();
            tx.send(TriggerEvent::action_clicked(WindowId(2))).await.unwrap();
            drop(tx);
            runner.await.unwrap();

            assert!(!h.store.contains_key("restoreBounds:1"));
            let first = h.windows.snapshot(WindowId(1)).unwrap();
            assert_eq!((first.width, first.height), (Some(1280), Some(800)));

            // Window 2 ends under the tablet preset picked from its own menu.
            let second = h.windows.snapshot(WindowId(2)).unwrap();
            assert_eq!((second.width, second.height), (Some(768), Some(1024)));
            let record = h.store.get("restoreBounds:2").await.unwrap().unwrap();
            assert_eq!(record["presetId"], json!("tablet"));
            assert_eq!(record["bounds"]["state"], json!("maximized"));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn run_reopens_lane_after_window_removed() {
        let h = harness();
        let (tx, rx) = mpsc::channel(16);
        let runner = tokio::spawn(h.surface.clone().run(rx));

        tx.send(TriggerEvent::action_clicked(WindowId(1))).await.unwrap();
        tx.send(TriggerEvent::WindowRemoved(WindowId(1))).await.unwrap();
        tx.send(TriggerEvent::action_clicked(WindowId(1))).await.unwrap();
        drop(tx);
        runner.await.unwrap();

        // The window still exists in the emulator, so the last click applies again.
        assert!(h.store.contains_key("restoreBounds:1"));
    }
}
