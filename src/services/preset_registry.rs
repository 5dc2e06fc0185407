use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Device viewport emulated by resizing the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub id: &'static str,
    pub width: u32,
    pub height: u32,
    pub badge_text: &'static str,
    pub title: &'static str,
}

pub const DEFAULT_PRESET_ID: &str = "mobile";

/// Catalog in menu order. New presets only need an entry here.
pub static PRESETS: &[Preset] = &[
    Preset {
        id: "mobile",
        width: 390,
        height: 844,
        badge_text: "M",
        title: "Mobile (390×844)",
    },
    Preset {
        id: "tablet",
        width: 768,
        height: 1024,
        badge_text: "T",
        title: "Tablet (768×1024)",
    },
];

static PRESET_INDEX: Lazy<HashMap<&'static str, &'static Preset>> =
    Lazy::new(|| PRESETS.iter().map(|preset| (preset.id, preset)).collect());

/// Read-only lookup over the static preset catalog
pub struct PresetRegistry;

impl PresetRegistry {
    pub fn lookup(id: &str) -> Option<&'static Preset> {
        PRESET_INDEX.get(id).copied()
    }

    pub fn is_known(id: &str) -> bool {
        PRESET_INDEX.contains_key(id)
    }

    pub fn default_preset() -> &'static Preset {
        // The default id is part of the catalog literal above.
        PRESET_INDEX
            .get(DEFAULT_PRESET_ID)
            .copied()
            .unwrap_or(&PRESETS[0])
    }

    /// Like `lookup`, but falls back to the default preset for unknown ids.
    pub fn resolve(id: &str) -> &'static Preset {
        Self::lookup(id).unwrap_or_else(Self::default_preset)
    }

    pub fn all() -> &'static [Preset] {
        PRESETS
    }
}
