use crate::events::{WindowId, WindowSnapshot, WindowState};
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub badge: BadgeConfig,
    #[serde(default)]
    pub emulation: EmulationConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// "memory" or "file"
    pub backend: String,
    pub path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BadgeConfig {
    pub active_color: String,
    pub inactive_color: String,
}

/// Emulated platform the host runs against
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct EmulationConfig {
    pub windows: Vec<EmulatedWindowConfig>,
    /// States the emulated platform refuses to enter
    pub disallowed_states: Vec<WindowState>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmulatedWindowConfig {
    pub id: i32,
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
    #[serde(default = "default_window_state")]
    pub state: WindowState,
}

fn default_window_state() -> WindowState {
    WindowState::Normal
}

impl EmulatedWindowConfig {
    pub fn to_snapshot(&self) -> WindowSnapshot {
        WindowSnapshot::new(WindowId(self.id), self.left, self.top, self.width, self.height)
            .with_state(self.state)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            path: "viewport-toggle-state.json".to_string(),
        }
    }
}

impl Default for BadgeConfig {
    fn default() -> Self {
        Self {
            active_color: "#2563eb".to_string(),
            inactive_color: "#000000".to_string(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::new()
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("VPT_").split("__"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Failed to load configuration from {:?}", config_path))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Invalid log level: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "compact" | "full" => {}
            _ => anyhow::bail!("Invalid log format: {}", self.logging.format),
        }

        match self.storage.backend.as_str() {
            "memory" => {}
            "file" => {
                if self.storage.path.trim().is_empty() {
                    anyhow::bail!("storage.path must be set for the file backend");
                }
            }
            _ => anyhow::bail!("Invalid storage backend: {}", self.storage.backend),
        }

        for (name, color) in [
            ("badge.active_color", &self.badge.active_color),
            ("badge.inactive_color", &self.badge.inactive_color),
        ] {
            if !is_hex_color(color) {
                anyhow::bail!("{} is not a #rgb or #rrggbb color: {}", name, color);
            }
        }

        let mut seen = std::collections::HashSet::new();
        for window in &self.emulation.windows {
            if window.width <= 0 || window.height <= 0 {
                anyhow::bail!("Emulated window {} must have a positive size", window.id);
            }
            if !seen.insert(window.id) {
                anyhow::bail!("Emulated window {} is declared twice", window.id);
            }
        }

        if self.emulation.disallowed_states.contains(&WindowState::Normal) {
            anyhow::bail!("The normal window state cannot be disallowed");
        }

        Ok(())
    }
}

fn is_hex_color(value: &str) -> bool {
    match value.strip_prefix('#') {
        Some(hex) => (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::providers::Serialized;

    #[test]
    fn test_default_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.storage.backend, "memory");
        assert_eq!(config.badge.active_color, "#2563eb");
    }

    #[test]
    fn test_rejects_invalid_values() {
        let mut config = Config::default();
        config.storage.backend = "sqlite".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.badge.inactive_color = "black".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.storage.backend = "file".to_string();
        config.storage.path = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.emulation.disallowed_states = vec![WindowState::Normal];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_duplicate_or_empty_windows() {
        let window = EmulatedWindowConfig {
            id: 1,
            left: 0,
            top: 0,
            width: 800,
            height: 600,
            state: WindowState::Normal,
        };

        let mut config = Config::default();
        config.emulation.windows = vec![window.clone(), window.clone()];
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.emulation.windows = vec![EmulatedWindowConfig { width: 0, ..window }];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_sections_merge_over_defaults() {
        let toml = r#"
            [storage]
            backend = "file"
            path = "/tmp/state.json"

            [[emulation.windows]]
            id = 3
            left = 10
            top = 20
            width = 1280
            height = 800
            state = "maximized"
        "#;

        let config: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::string(toml))
            .extract()
            .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.storage.path, "/tmp/state.json");
        let snapshot = config.emulation.windows[0].to_snapshot();
        assert_eq!(snapshot.id, WindowId(3));
        assert_eq!(snapshot.state, Some(WindowState::Maximized));
    }
}
