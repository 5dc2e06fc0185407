use super::window::WindowId;
use std::fmt;

/// Platform event delivered to the trigger surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerEvent {
    /// Primary action clicked. The originating tab may carry no window.
    ActionClicked { window_id: Option<WindowId> },
    /// Context menu item clicked
    MenuClicked {
        menu_item_id: String,
        window_id: Option<WindowId>,
    },
    WindowRemoved(WindowId),
    Installed,
    Startup,
}

impl TriggerEvent {
    /// Window the event targets, `None` for window-less events.
    pub fn window_id(&self) -> Option<WindowId> {
        match self {
            TriggerEvent::ActionClicked { window_id } | TriggerEvent::MenuClicked { window_id, .. } => *window_id,
            TriggerEvent::WindowRemoved(window_id) => Some(*window_id),
            TriggerEvent::Installed | TriggerEvent::Startup => None,
        }
    }

    #[cfg(test)]
    pub fn action_clicked(window_id: WindowId) -> Self {
        TriggerEvent::ActionClicked {
            window_id: Some(window_id),
        }
    }

    #[cfg(test)]
    pub fn menu_clicked(menu_item_id: impl Into<String>, window_id: WindowId) -> Self {
        TriggerEvent::MenuClicked {
            menu_item_id: menu_item_id.into(),
            window_id: Some(window_id),
        }
    }
}

impl fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerEvent::ActionClicked { window_id: Some(id) } => write!(f, "action click on window {}", id),
            TriggerEvent::ActionClicked { window_id: None } => write!(f, "action click without window"),
            TriggerEvent::MenuClicked {
                menu_item_id,
                window_id,
            } => match window_id {
                Some(id) => write!(f, "menu '{}' on window {}", menu_item_id, id),
                None => write!(f, "menu '{}' without window", menu_item_id),
            },
            TriggerEvent::WindowRemoved(id) => write!(f, "window {} removed", id),
            TriggerEvent::Installed => write!(f, "installed"),
            TriggerEvent::Startup => write!(f, "startup"),
        }
    }
}
