use crate::events::WindowId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToggleError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Key-value backend unavailable or write rejected.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Display state transition disallowed by the platform or window type.
    #[error("Window state error: {0}")]
    WindowState(String),

    #[error("Window {0} not found")]
    WindowNotFound(WindowId),

    /// Badge indicator unsupported or rejected.
    #[error("Badge error: {0}")]
    Badge(String),

    #[error("Context menu error: {0}")]
    Menu(String),

    #[error("Invalid host command: {0}")]
    InvalidCommand(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToggleError {
    pub fn window_not_found<T>(window_id: WindowId) -> Result<T> {
        Err(ToggleError::WindowNotFound(window_id))
    }
}

pub type Result<T> = std::result::Result<T, ToggleError>;

// Shorthand constructors for the string-carrying variants
#[macro_export]
macro_rules! toggle_error {
    (storage, $($arg:tt)*) => {
        $crate::error::ToggleError::Storage(format!($($arg)*))
    };
    (window_state, $($arg:tt)*) => {
        $crate::error::ToggleError::WindowState(format!($($arg)*))
    };
    (badge, $($arg:tt)*) => {
        $crate::error::ToggleError::Badge(format!($($arg)*))
    };
    (menu, $($arg:tt)*) => {
        $crate::error::ToggleError::Menu(format!($($arg)*))
    };
    (invalid_command, $($arg:tt)*) => {
        $crate::error::ToggleError::InvalidCommand(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::ToggleError::Internal(format!($($arg)*))
    };
}
