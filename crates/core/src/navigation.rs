//! Menu position tracking and selection resolution.

use thiserror::Error;
use tracing::debug;

use crate::catalog::{Catalog, ItemAction, MenuId, MenuItem};

/// Rejected selector input.
///
/// Covers both non-numeric input and indexes outside the active menu; the
/// caller keeps the session open and re-prompts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavError {
    /// The selector named no entry of the active menu.
    #[error("invalid selection '{input}'")]
    InvalidSelection {
        /// The selector as entered.
        input: String,
    },
}

/// What a selection resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum NavOutcome {
    /// The current menu changed; the display should show it.
    Navigated(MenuId),
    /// A priced item was chosen; the caller settles payment.
    PurchaseRequested(MenuItem),
    /// An informational item was chosen.
    InfoRequested(MenuItem),
    /// Back was requested at the root; there is nothing to pop.
    SessionShouldClose,
}

/// Tracks the active menu and the trail of ancestor menus.
///
/// The engine holds handles into a [`Catalog`] owned by the caller; the
/// catalog outlives any session. The history stack is empty exactly when the
/// current menu is the root.
#[derive(Debug, Clone)]
pub struct NavigationEngine {
    current: MenuId,
    history: Vec<MenuId>,
}

impl Default for NavigationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationEngine {
    /// Engine positioned at the root menu.
    pub fn new() -> Self {
        Self {
            current: MenuId::ROOT,
            history: Vec::new(),
        }
    }

    /// Menu the user is currently looking at.
    pub fn current(&self) -> MenuId {
        self.current
    }

    /// Number of ancestor menus on the back stack.
    pub fn depth(&self) -> usize {
        self.history.len()
    }

    /// True when the current menu is the root menu.
    pub fn at_root(&self) -> bool {
        self.history.is_empty()
    }

    /// Return to the root menu and clear the trail.
    pub fn reset(&mut self) {
        self.current = MenuId::ROOT;
        self.history.clear();
    }

    /// Parse a raw selector and resolve it against the active menu.
    ///
    /// Input that does not parse as an index is rejected the same way as an
    /// out-of-range index.
    pub fn select_raw(&mut self, catalog: &Catalog, raw: &str) -> Result<NavOutcome, NavError> {
        let index = raw.trim().parse::<usize>().map_err(|_| NavError::InvalidSelection {
            input: raw.to_string(),
        })?;
        self.select_by_index(catalog, index)
            .map_err(|_| NavError::InvalidSelection {
                input: raw.to_string(),
            })
    }

    /// Resolve a selection by index against the active menu.
    pub fn select_by_index(
        &mut self,
        catalog: &Catalog,
        index: usize,
    ) -> Result<NavOutcome, NavError> {
        let menu = catalog.menu(self.current);
        let item = menu.item(index).ok_or_else(|| NavError::InvalidSelection {
            input: index.to_string(),
        })?;

        match item.action {
            ItemAction::Descend(child) => {
                self.history.push(self.current);
                self.current = child;
                debug!(menu = child.index(), depth = self.history.len(), "Descended into sub-menu");
                Ok(NavOutcome::Navigated(child))
            }
            ItemAction::Purchase(_) => Ok(NavOutcome::PurchaseRequested(item.clone())),
            ItemAction::Back => Ok(self.go_back()),
            ItemAction::Info(_) => Ok(NavOutcome::InfoRequested(item.clone())),
        }
    }

    /// Pop one level off the trail, or signal that the session should close
    /// when already at the root.
    pub fn go_back(&mut self) -> NavOutcome {
        match self.history.pop() {
            Some(previous) => {
                self.current = previous;
                debug!(menu = previous.index(), depth = self.history.len(), "Went back");
                NavOutcome::Navigated(previous)
            }
            None => NavOutcome::SessionShouldClose,
        }
    }
}
