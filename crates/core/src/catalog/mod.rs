//! Static menu catalog: the fixed tree of selectable items.

/// Catalog construction, validation, and file loading.
pub mod loader;
mod models;

pub use loader::{load_catalog_file, CatalogError, BACK_KEYWORD};
pub use models::{Catalog, InfoKind, ItemAction, Menu, MenuId, MenuItem, MenuItemDef};
