use crate::config::BadgeConfig;
use crate::error::Result;
use crate::events::WindowId;
use crate::services::preset_registry::Preset;
use crate::toggle_error;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Per-window label on the action icon
#[async_trait::async_trait]
pub trait BadgeIndicator: Send + Sync {
    async fn set_text(&self, window_id: WindowId, text: &str) -> Result<()>;
    async fn set_background_color(&self, window_id: WindowId, color: &str) -> Result<()>;
}

/// Derived badge appearance; never persisted
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Badge {
    pub text: String,
    pub color: String,
}

impl Badge {
    pub fn for_preset(preset: Option<&Preset>, colors: &BadgeConfig) -> Self {
        match preset {
            Some(preset) if !preset.badge_text.is_empty() => Self {
                text: preset.badge_text.to_string(),
                color: colors.active_color.clone(),
            },
            _ => Self::cleared(colors),
        }
    }

    pub fn cleared(colors: &BadgeConfig) -> Self {
        Self {
            text: String::new(),
            color: colors.inactive_color.clone(),
        }
    }

    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        !self.text.is_empty()
    }
}

/// Records badges in memory; can be switched to "unsupported" to emulate older hosts.
pub struct EmulatedBadge {
    badges: DashMap<WindowId, Badge>,
    unsupported: AtomicBool,
}

impl Default for EmulatedBadge {
    fn default() -> Self {
        Self::new()
    }
}

impl EmulatedBadge {
    pub fn new() -> Self {
        Self {
            badges: DashMap::new(),
            unsupported: AtomicBool::new(false),
        }
    }

    #[cfg(test)]
    pub fn set_unsupported(&self, unsupported: bool) {
        self.unsupported.store(unsupported, Ordering::Relaxed);
    }

    pub fn badge(&self, window_id: WindowId) -> Badge {
        self.badges
            .get(&window_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    fn check_supported(&self) -> Result<()> {
        if self.unsupported.load(Ordering::Relaxed) {
            Err(toggle_error!(badge, "badge API unsupported"))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl BadgeIndicator for EmulatedBadge {
    async fn set_text(&self, window_id: WindowId, text: &str) -> Result<()> {
        self.check_supported()?;
        self.badges.entry(window_id).or_default().text = text.to_string();
        Ok(())
    }

    async fn set_background_color(&self, window_id: WindowId, color: &str) -> Result<()> {
        self.check_supported()?;
        self.badges.entry(window_id).or_default().color = color.to_string();
        Ok(())
    }
}
