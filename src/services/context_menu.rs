use crate::error::Result;
use crate::services::preset_registry::{Preset, PresetRegistry};
use crate::toggle_error;
use parking_lot::Mutex;
use tracing::info;

pub const MENU_ID_SEPARATOR: &str = "sep-1";
pub const MENU_ID_RESTORE: &str = "restore";
const PRESET_MENU_PREFIX: &str = "preset-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuContext {
    /// Right-click menu of the extension's action icon
    Action,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItemKind {
    Normal,
    Separator,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub id: String,
    pub title: Option<String>,
    pub kind: MenuItemKind,
    pub contexts: Vec<MenuContext>,
}

impl MenuItem {
    fn normal(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: Some(title.into()),
            kind: MenuItemKind::Normal,
            contexts: vec![MenuContext::Action],
        }
    }

    fn separator(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            kind: MenuItemKind::Separator,
            contexts: vec![MenuContext::Action],
        }
    }
}

/// What a clicked menu item asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    ApplyPreset(&'static Preset),
    Restore,
}

impl MenuAction {
    /// Separators and unknown ids map to `None`.
    pub fn from_menu_id(menu_item_id: &str) -> Option<Self> {
        if menu_item_id == MENU_ID_RESTORE {
            return Some(MenuAction::Restore);
        }
        menu_item_id
            .strip_prefix(PRESET_MENU_PREFIX)
            .and_then(PresetRegistry::lookup)
            .map(MenuAction::ApplyPreset)
    }
}

pub fn preset_menu_id(preset: &Preset) -> String {
    format!("{}{}", PRESET_MENU_PREFIX, preset.id)
}

/// One item per preset, a separator, then restore
pub fn menu_items() -> Vec<MenuItem> {
    let mut items: Vec<MenuItem> = PresetRegistry::all()
        .iter()
        .map(|preset| MenuItem::normal(preset_menu_id(preset), preset.title))
        .collect();
    items.push(MenuItem::separator(MENU_ID_SEPARATOR));
    items.push(MenuItem::normal(MENU_ID_RESTORE, "Restore previous size"));
    items
}

/// Context-menu registry of the host browser
#[async_trait::async_trait]
pub trait ContextMenuHost: Send + Sync {
    async fn remove_all(&self) -> Result<()>;

    /// Fails if an item with the same id is already registered.
    async fn create(&self, item: MenuItem) -> Result<()>;
}

/// Rebuilds the menu from scratch. Safe to call on every install and startup.
pub async fn setup_context_menus(host: &dyn ContextMenuHost) -> Result<()> {
    host.remove_all().await?;

    let items = menu_items();
    let count = items.len();
    for item in items {
        host.create(item).await?;
    }

    info!("Context menu built with {} items", count);
    Ok(())
}

/// In-memory registry with the browser's duplicate-id rule
#[derive(Default)]
pub struct EmulatedContextMenu {
    items: Mutex<Vec<MenuItem>>,
}

impl EmulatedContextMenu {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn items(&self) -> Vec<MenuItem> {
        self.items.lock().clone()
    }
}

#[async_trait::async_trait]
impl ContextMenuHost for EmulatedContextMenu {
    async fn remove_all(&self) -> Result<()> {
        self.items.lock().clear();
        Ok(())
    }

    async fn create(&self, item: MenuItem) -> Result<()> {
        match (item.kind, item.title.as_deref()) {
            (MenuItemKind::Normal, None | Some("")) => {
                return Err(toggle_error!(menu, "menu item '{}' needs a title", item.id));
            }
            (MenuItemKind::Separator, Some(_)) => {
                return Err(toggle_error!(menu, "separator '{}' cannot have a title", item.id));
            }
            _ => {}
        }
        if item.contexts.is_empty() {
            return Err(toggle_error!(menu, "menu item '{}' has no contexts", item.id));
        }

        let mut items = self.items.lock();
        if items.iter().any(|existing| existing.id == item.id) {
            return Err(toggle_error!(menu, "duplicate menu item id '{}'", item.id));
        }
        items.push(item);
        Ok(())
    }
}
