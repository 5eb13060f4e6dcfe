//! Catalog construction, validation, and file loading.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use chrono::Utc;
use once_cell::sync::Lazy;
use thiserror::Error;
use tracing::debug;

use super::models::{Catalog, InfoKind, ItemAction, Menu, MenuId, MenuItem, MenuItemDef};

/// Item text handled as plain back-navigation.
pub const BACK_KEYWORD: &str = "Back";

/// Reserved item texts resolved to informational actions.
const INFO_KEYWORDS: &[(&str, InfoKind)] = &[
    ("Balance", InfoKind::Balance),
    ("Okoa SMS", InfoKind::Notice),
];

/// Violations detected while building a catalog.
///
/// These are construction-time defects of the catalog data, not runtime
/// conditions; a built catalog can always classify every selection.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// A menu definition contained no entries.
    #[error("menu under '{parent}' has no items")]
    EmptyMenu {
        /// Id of the item owning the menu, or `(root)`.
        parent: String,
    },
    /// Two sibling items share an id.
    #[error("duplicate item id '{id}' under '{parent}'")]
    DuplicateItemId {
        /// Id of the item owning the menu, or `(root)`.
        parent: String,
        /// The repeated id.
        id: String,
    },
    /// An item resolves to no action at all.
    #[error("item '{id}' ('{text}') has no sub-menu, price, or reserved keyword")]
    NoAction {
        /// Id of the offending item.
        id: String,
        /// Display text of the offending item.
        text: String,
    },
}

/// Bundle menu shipped with the simulator, mirroring a prepaid deal sheet.
const BUILTIN_CATALOG: &str = r#"[
  { "id": "0", "text": "Sh 20=Kredo 110, 3hrs", "price": 20 },
  { "id": "1", "text": "Minutes", "subMenu": [
      { "id": "1-0", "text": "Sh 20 (Surprise Offers)", "price": 20 },
      { "id": "1-1", "text": "Sh 20 (30 Mins, 3hrs)", "price": 20 },
      { "id": "1-2", "text": "Sh 20 (15 Mins + 20 SMS)", "price": 20 },
      { "id": "1-3", "text": "Sh 30 (Kredo 90, Midnight)", "price": 30 },
      { "id": "1-4", "text": "Sh 20 (Kredo 50, Midnight)", "price": 20 },
      { "id": "1-5", "text": "Back" }
  ]},
  { "id": "2", "text": "SMS Deals", "subMenu": [
      { "id": "2-0", "text": "Sh 10 (15 Mins, 1 hr)", "price": 10 },
      { "id": "2-1", "text": "Sh 20 (unlimited SMS daily)", "price": 20 },
      { "id": "2-2", "text": "Sh 30 (100 SMS, 24 hours)", "price": 30 },
      { "id": "2-3", "text": "Okoa SMS" },
      { "id": "2-4", "text": "Unlimited SMS(Sh100)", "price": 100 },
      { "id": "2-5", "text": "Back" }
  ]},
  { "id": "3", "text": "Balance" }
]"#;

static BUILTIN: Lazy<Catalog> = Lazy::new(|| {
    let defs: Vec<MenuItemDef> =
        serde_json::from_str(BUILTIN_CATALOG).expect("failed to parse builtin catalog");
    Catalog::build(defs).expect("failed to validate builtin catalog")
});

impl Catalog {
    /// The embedded default catalog.
    pub fn builtin() -> &'static Catalog {
        &BUILTIN
    }

    /// Validate nested definitions and flatten them into an addressable
    /// catalog.
    ///
    /// Every item must resolve to exactly one action. When a definition
    /// carries more than one candidate, the fixed priority is sub-menu,
    /// then price, then reserved keyword.
    pub fn build(defs: Vec<MenuItemDef>) -> Result<Self, CatalogError> {
        let mut menus = vec![Menu::default()];
        build_menu(&mut menus, MenuId::ROOT, "(root)", defs)?;
        Ok(Catalog {
            menus,
            loaded_at: Utc::now(),
        })
    }
}

fn build_menu(
    menus: &mut Vec<Menu>,
    slot: MenuId,
    parent: &str,
    defs: Vec<MenuItemDef>,
) -> Result<(), CatalogError> {
    if defs.is_empty() {
        return Err(CatalogError::EmptyMenu {
            parent: parent.to_string(),
        });
    }

    let mut items: Vec<MenuItem> = Vec::with_capacity(defs.len());
    for def in defs {
        if items.iter().any(|existing| existing.id == def.id) {
            return Err(CatalogError::DuplicateItemId {
                parent: parent.to_string(),
                id: def.id,
            });
        }
        let action = match def.sub_menu {
            Some(children) => {
                let child = MenuId(menus.len());
                menus.push(Menu::default());
                build_menu(menus, child, &def.id, children)?;
                ItemAction::Descend(child)
            }
            None => classify_leaf(&def)?,
        };
        items.push(MenuItem {
            id: def.id,
            text: def.text,
            action,
        });
    }

    menus[slot.index()] = Menu { items };
    Ok(())
}

fn classify_leaf(def: &MenuItemDef) -> Result<ItemAction, CatalogError> {
    if let Some(price) = def.price {
        return Ok(ItemAction::Purchase(price));
    }
    if def.text == BACK_KEYWORD {
        return Ok(ItemAction::Back);
    }
    match INFO_KEYWORDS.iter().find(|(keyword, _)| *keyword == def.text) {
        Some((_, kind)) => Ok(ItemAction::Info(*kind)),
        None => Err(CatalogError::NoAction {
            id: def.id.clone(),
            text: def.text.clone(),
        }),
    }
}

/// Load and validate a catalog from a JSON file of nested definitions.
pub fn load_catalog_file(path: impl AsRef<Path>) -> Result<Catalog> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let defs: Vec<MenuItemDef> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    let catalog = Catalog::build(defs)
        .with_context(|| format!("invalid catalog in {}", path.display()))?;
    debug!(menus = catalog.menu_count(), path = %path.display(), "Catalog loaded");
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(id: &str, text: &str, price: Option<u64>) -> MenuItemDef {
        MenuItemDef {
            id: id.to_string(),
            text: text.to_string(),
            price,
            sub_menu: None,
        }
    }

    #[test]
    fn builtin_catalog_builds() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.menu_count(), 3);
        assert_eq!(catalog.root().len(), 4);

        let minutes = catalog.root().item(1).expect("minutes entry");
        let ItemAction::Descend(sub) = minutes.action else {
            panic!("expected sub-menu, got {:?}", minutes.action);
        };
        assert_eq!(catalog.menu(sub).len(), 6);

        let balance = catalog.root().item(3).expect("balance entry");
        assert_eq!(balance.action, ItemAction::Info(InfoKind::Balance));
        assert_eq!(catalog.root().item(0).and_then(MenuItem::price), Some(20));
    }

    #[test]
    fn back_and_notice_keywords_classify() {
        let catalog = Catalog::builtin();
        let sms = catalog.root().item(2).expect("sms deals entry");
        let ItemAction::Descend(sub) = sms.action else {
            panic!("expected sub-menu");
        };
        let menu = catalog.menu(sub);
        assert_eq!(menu.item(3).map(|item| item.action), Some(ItemAction::Info(InfoKind::Notice)));
        assert_eq!(menu.item(5).map(|item| item.action), Some(ItemAction::Back));
    }

    #[test]
    fn rejects_duplicate_sibling_id() {
        let err = Catalog::build(vec![
            leaf("0", "Sh 10 bundle", Some(10)),
            leaf("0", "Sh 20 bundle", Some(20)),
        ])
        .expect_err("duplicate ids must not build");
        assert_eq!(
            err,
            CatalogError::DuplicateItemId {
                parent: "(root)".to_string(),
                id: "0".to_string(),
            }
        );
    }

    #[test]
    fn rejects_item_without_action() {
        let err = Catalog::build(vec![leaf("0", "Mystery", None)])
            .expect_err("actionless items must not build");
        assert!(matches!(err, CatalogError::NoAction { ref id, .. } if id == "0"));
    }

    #[test]
    fn rejects_empty_sub_menu() {
        let def = MenuItemDef {
            id: "0".to_string(),
            text: "Empty".to_string(),
            price: None,
            sub_menu: Some(Vec::new()),
        };
        let err = Catalog::build(vec![def]).expect_err("empty menus must not build");
        assert_eq!(
            err,
            CatalogError::EmptyMenu {
                parent: "0".to_string(),
            }
        );
    }

    #[test]
    fn sub_menu_wins_over_price() {
        let def = MenuItemDef {
            id: "0".to_string(),
            text: "Both".to_string(),
            price: Some(50),
            sub_menu: Some(vec![leaf("0-0", "Sh 10 bundle", Some(10))]),
        };
        let catalog = Catalog::build(vec![def]).expect("conflicting item builds as sub-menu");
        let item = catalog.root().item(0).expect("entry");
        assert!(matches!(item.action, ItemAction::Descend(_)));
        assert_eq!(item.price(), None);
    }

    #[test]
    fn loads_catalog_from_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("catalog.json");
        fs::write(
            &path,
            r#"[
                { "id": "0", "text": "Sh 5 (5 Mins)", "price": 5 },
                { "id": "1", "text": "Balance" }
            ]"#,
        )?;

        let catalog = load_catalog_file(&path)?;
        assert_eq!(catalog.root().len(), 2);
        assert_eq!(catalog.root().item(0).and_then(MenuItem::price), Some(5));
        Ok(())
    }

    #[test]
    fn file_with_invalid_data_is_refused() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("catalog.json");
        fs::write(&path, r#"[{ "id": "0", "text": "Mystery" }]"#)?;

        let err = load_catalog_file(&path).expect_err("invalid catalog must not load");
        assert!(err.to_string().contains("invalid catalog"));
        Ok(())
    }
}
