pub mod trigger;
pub mod window;

pub use trigger::TriggerEvent;
pub use window::{SavedBounds, WindowId, WindowSnapshot, WindowState, WindowUpdate};
