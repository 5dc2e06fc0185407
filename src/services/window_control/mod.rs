//! Window-control service: responsibility and boundaries
//!
//! This module only reads and applies window geometry/state. It MUST NOT decide
//! whether a preset is applied or restored; that belongs to WindowToggleEngine.

mod emulated;
mod r#trait;

pub use self::emulated::EmulatedWindows;
pub use self::r#trait::WindowControl;
