#![allow(missing_docs)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Nested menu entry as written in catalog files.
///
/// This is the serde-facing shape; [`Catalog::build`](super::Catalog::build)
/// validates it and resolves each entry to a single [`ItemAction`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemDef {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_menu: Option<Vec<MenuItemDef>>,
}

/// Handle addressing one menu inside a built [`Catalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MenuId(pub(crate) usize);

impl MenuId {
    /// The main menu every session starts at.
    pub const ROOT: MenuId = MenuId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// Which informational response a reserved keyword resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoKind {
    /// Show the current prepaid balance.
    Balance,
    /// Acknowledge a service request with the item text.
    Notice,
}

/// What selecting an item does, fixed at catalog build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemAction {
    /// Enter the referenced sub-menu.
    Descend(MenuId),
    /// Debit the price and deliver the bundle.
    Purchase(u64),
    /// Return to the previous menu.
    Back,
    /// Display an informational message.
    Info(InfoKind),
}

/// A single selectable entry of a menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub id: String,
    pub text: String,
    pub action: ItemAction,
}

impl MenuItem {
    /// Price for transactional items, `None` otherwise.
    pub fn price(&self) -> Option<u64> {
        match self.action {
            ItemAction::Purchase(price) => Some(price),
            _ => None,
        }
    }
}

/// Ordered list of selectable items shown at one navigation depth.
///
/// The position within the list is the user-facing selector, starting at 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Menu {
    pub(crate) items: Vec<MenuItem>,
}

impl Menu {
    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    /// Look up an item by its selector index.
    pub fn item(&self, index: usize) -> Option<&MenuItem> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Immutable menu tree, flattened into id-addressed menus at build time.
///
/// A catalog is constructed once at startup and outlives every session that
/// navigates it.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub(crate) menus: Vec<Menu>,
    pub(crate) loaded_at: DateTime<Utc>,
}

impl Catalog {
    /// The main menu.
    pub fn root(&self) -> &Menu {
        self.menu(MenuId::ROOT)
    }

    /// Resolve a menu handle.
    ///
    /// Ids are only issued by the catalog builder, so a handle taken from
    /// this catalog always resolves. Panics when handed an id minted by a
    /// different catalog.
    pub fn menu(&self, id: MenuId) -> &Menu {
        &self.menus[id.0]
    }

    pub fn menu_count(&self) -> usize {
        self.menus.len()
    }

    /// When this catalog was built.
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}
