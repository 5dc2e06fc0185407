use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Browser window identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub i32);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for WindowId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(WindowId)
    }
}

/// Display state of a window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowState {
    Normal,
    Maximized,
    Minimized,
    Fullscreen,
}

impl WindowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowState::Normal => "normal",
            WindowState::Maximized => "maximized",
            WindowState::Minimized => "minimized",
            WindowState::Fullscreen => "fullscreen",
        }
    }
}

impl fmt::Display for WindowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WindowState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(WindowState::Normal),
            "maximized" => Ok(WindowState::Maximized),
            "minimized" => Ok(WindowState::Minimized),
            "fullscreen" => Ok(WindowState::Fullscreen),
            other => Err(format!("unknown window state '{}'", other)),
        }
    }
}

/// Live geometry reported by the window-control API. Any axis may be unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSnapshot {
    pub id: WindowId,
    pub left: Option<i32>,
    pub top: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub state: Option<WindowState>,
    pub focused: bool,
}

impl WindowSnapshot {
    pub fn new(id: WindowId, left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            id,
            left: Some(left),
            top: Some(top),
            width: Some(width),
            height: Some(height),
            state: Some(WindowState::Normal),
            focused: false,
        }
    }

    pub fn with_state(mut self, state: WindowState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn is_normal(&self) -> bool {
        self.state == Some(WindowState::Normal)
    }
}

impl fmt::Display for WindowSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn axis(v: Option<i32>) -> String {
            v.map(|v| v.to_string()).unwrap_or_else(|| "?".to_string())
        }
        write!(
            f,
            "window {} at ({}, {}) {}x{} [{}{}]",
            self.id,
            axis(self.left),
            axis(self.top),
            axis(self.width),
            axis(self.height),
            self.state.map(|s| s.as_str()).unwrap_or("unknown"),
            if self.focused { ", focused" } else { "" },
        )
    }
}

/// Partial update; `None` fields leave the platform's current value untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowUpdate {
    pub left: Option<i32>,
    pub top: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub state: Option<WindowState>,
    pub focused: Option<bool>,
}

impl WindowUpdate {
    pub fn state(state: WindowState) -> Self {
        Self {
            state: Some(state),
            ..Self::default()
        }
    }

    pub fn with_position(mut self, left: Option<i32>, top: Option<i32>) -> Self {
        self.left = left;
        self.top = top;
        self
    }

    pub fn with_size(mut self, width: Option<i32>, height: Option<i32>) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn focused(mut self) -> Self {
        self.focused = Some(true);
        self
    }

    pub fn touches_geometry(&self) -> bool {
        self.left.is_some() || self.top.is_some() || self.width.is_some() || self.height.is_some()
    }
}

/// Window geometry captured before a preset was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedBounds {
    pub left: i32,
    pub top: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<WindowState>,
}

impl SavedBounds {
    /// Unknown position collapses to 0; unknown size stays absent.
    pub fn capture(window: &WindowSnapshot) -> Self {
        Self {
            left: window.left.unwrap_or(0),
            top: window.top.unwrap_or(0),
            width: window.width,
            height: window.height,
            state: window.state,
        }
    }

    /// State that needs a second update after geometry is back in place
    pub fn non_normal_state(&self) -> Option<WindowState> {
        self.state.filter(|state| *state != WindowState::Normal)
    }
}
