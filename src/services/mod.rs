pub mod badge;
pub mod bounds_store;
pub mod context_menu;
pub mod preset_registry;
pub mod selected_preset;
pub mod storage;
pub mod toggle_engine;
pub mod trigger_surface;
pub mod window_control;

pub use badge::{BadgeIndicator, EmulatedBadge};
pub use bounds_store::BoundsStore;
pub use context_menu::{ContextMenuHost, EmulatedContextMenu};
pub use selected_preset::SelectedPreset;
pub use storage::create_store;
pub use toggle_engine::WindowToggleEngine;
pub use trigger_surface::TriggerSurface;
pub use window_control::{EmulatedWindows, WindowControl};
