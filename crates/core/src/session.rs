//! Session orchestration.
//!
//! Ties the navigation engine to the balance ledger and reports each input's
//! outcome as a discrete event for the presentation layer to render. State
//! transitions never perform I/O.

use tracing::{debug, info};

use crate::{
    catalog::{Catalog, MenuId, MenuItem},
    ledger::{BalanceLedger, InsufficientFunds, InvalidAmount},
    navigation::{NavError, NavOutcome, NavigationEngine},
};

/// Lifecycle of one open-to-closed menu interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No menu has been opened yet.
    Closed,
    /// A menu is showing and accepting selections.
    AtMenu,
    /// The menu closed; a new session may be opened.
    Ended,
}

/// Outcome reported after each input, consumed by the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The display should show this menu.
    Navigated(MenuId),
    /// The purchase was debited and the session closed.
    PurchaseSucceeded {
        /// The bundle that was bought.
        item: MenuItem,
        /// Balance after the debit.
        balance: u64,
    },
    /// Not enough funds; the menu stays open for another pick.
    PurchaseFailed {
        /// The bundle that could not be paid for.
        item: MenuItem,
        /// Balance, unchanged.
        balance: u64,
    },
    /// Informational display; the session closed.
    InfoShown {
        /// The informational item that was selected.
        item: MenuItem,
        /// Balance at display time.
        balance: u64,
    },
    /// The input was rejected; nothing changed.
    SelectionRejected {
        /// Human-readable cause.
        reason: String,
    },
    /// The session is over.
    SessionEnded,
}

/// Drives menu sessions for a single subscriber line.
///
/// Navigation state is reset on every [`open`](Self::open); the ledger
/// persists across sessions because the balance belongs to the subscriber,
/// not to the session.
#[derive(Debug)]
pub struct SessionController {
    state: SessionState,
    nav: NavigationEngine,
    ledger: BalanceLedger,
}

impl SessionController {
    /// Controller for a line starting at the given balance, with no session
    /// open.
    pub fn new(initial_balance: u64) -> Self {
        Self {
            state: SessionState::Closed,
            nav: NavigationEngine::new(),
            ledger: BalanceLedger::new(initial_balance),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Subscriber balance, readable in any state.
    pub fn balance(&self) -> u64 {
        self.ledger.current()
    }

    /// Menu currently showing, when a session is open.
    pub fn current_menu(&self) -> Option<MenuId> {
        match self.state {
            SessionState::AtMenu => Some(self.nav.current()),
            _ => None,
        }
    }

    /// Open a fresh session at the root menu.
    ///
    /// Allowed from any state; dialing while a menu is already showing
    /// restarts from the root with a cleared history.
    pub fn open(&mut self) -> SessionEvent {
        self.nav.reset();
        self.state = SessionState::AtMenu;
        info!("Session opened");
        SessionEvent::Navigated(MenuId::ROOT)
    }

    /// Top up the subscriber balance.
    ///
    /// Valid between and during sessions; the new balance is visible to the
    /// next debit immediately.
    pub fn credit(&mut self, amount: u64) -> Result<u64, InvalidAmount> {
        self.ledger.credit(amount)
    }

    /// Apply a raw selector to the active menu.
    pub fn select(&mut self, catalog: &Catalog, raw: &str) -> SessionEvent {
        if self.state != SessionState::AtMenu {
            return SessionEvent::SelectionRejected {
                reason: "no open session".to_string(),
            };
        }

        match self.nav.select_raw(catalog, raw) {
            Ok(NavOutcome::Navigated(menu)) => SessionEvent::Navigated(menu),
            Ok(NavOutcome::PurchaseRequested(item)) => self.settle_purchase(item),
            Ok(NavOutcome::InfoRequested(item)) => {
                self.state = SessionState::Ended;
                info!(item = %item.id, "Info shown, session ended");
                SessionEvent::InfoShown {
                    item,
                    balance: self.ledger.current(),
                }
            }
            Ok(NavOutcome::SessionShouldClose) => {
                self.state = SessionState::Ended;
                SessionEvent::SessionEnded
            }
            Err(NavError::InvalidSelection { input }) => {
                debug!(input = %input, "Selection rejected");
                SessionEvent::SelectionRejected {
                    reason: format!("invalid selection '{input}'"),
                }
            }
        }
    }

    /// Step one menu back, or end the session when already at the root.
    pub fn cancel(&mut self) -> SessionEvent {
        if self.state != SessionState::AtMenu {
            return SessionEvent::SessionEnded;
        }

        match self.nav.go_back() {
            NavOutcome::Navigated(menu) => SessionEvent::Navigated(menu),
            _ => {
                self.state = SessionState::Ended;
                debug!("Cancelled from root, session ended");
                SessionEvent::SessionEnded
            }
        }
    }

    fn settle_purchase(&mut self, item: MenuItem) -> SessionEvent {
        let price = item.price().unwrap_or_default();
        match self.ledger.try_debit(price) {
            Ok(balance) => {
                self.state = SessionState::Ended;
                info!(item = %item.id, price, balance, "Purchase succeeded");
                SessionEvent::PurchaseSucceeded { item, balance }
            }
            Err(InsufficientFunds { available, .. }) => {
                info!(item = %item.id, price, available, "Purchase refused, insufficient funds");
                SessionEvent::PurchaseFailed {
                    item,
                    balance: available,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> &'static Catalog {
        Catalog::builtin()
    }

    #[test]
    fn purchase_with_sufficient_funds_ends_session() {
        let mut session = SessionController::new(0);
        session.credit(20).expect("credit");
        session.open();

        // root index 0 is a price-20 bundle
        let event = session.select(catalog(), "0");
        assert!(matches!(event, SessionEvent::PurchaseSucceeded { balance: 0, .. }));
        assert_eq!(session.balance(), 0);
        assert_eq!(session.state(), SessionState::Ended);
        assert_eq!(session.current_menu(), None);
    }

    #[test]
    fn purchase_without_funds_keeps_session_open() {
        let mut session = SessionController::new(10);
        session.open();

        let event = session.select(catalog(), "0");
        assert!(matches!(event, SessionEvent::PurchaseFailed { balance: 10, .. }));
        assert_eq!(session.balance(), 10);
        assert_eq!(session.state(), SessionState::AtMenu);
    }

    #[test]
    fn failed_purchase_allows_another_pick() {
        let mut session = SessionController::new(10);
        session.open();

        assert!(matches!(
            session.select(catalog(), "0"),
            SessionEvent::PurchaseFailed { .. }
        ));

        // root index 2 descends into SMS deals; index 0 there costs Sh 10
        assert!(matches!(
            session.select(catalog(), "2"),
            SessionEvent::Navigated(_)
        ));
        let event = session.select(catalog(), "0");
        assert!(matches!(event, SessionEvent::PurchaseSucceeded { balance: 0, .. }));
    }

    #[test]
    fn balance_info_ends_session() {
        let mut session = SessionController::new(35);
        session.open();

        let event = session.select(catalog(), "3");
        let SessionEvent::InfoShown { balance, .. } = event else {
            panic!("expected info event, got {event:?}");
        };
        assert_eq!(balance, 35);
        assert_eq!(session.state(), SessionState::Ended);
    }

    #[test]
    fn back_then_cancel_from_root_ends_session() {
        let mut session = SessionController::new(0);
        session.open();

        assert!(matches!(
            session.select(catalog(), "1"),
            SessionEvent::Navigated(_)
        ));
        // Back entry of the minutes menu
        assert_eq!(
            session.select(catalog(), "5"),
            SessionEvent::Navigated(MenuId::ROOT)
        );
        assert_eq!(session.state(), SessionState::AtMenu);

        assert_eq!(session.cancel(), SessionEvent::SessionEnded);
        assert_eq!(session.state(), SessionState::Ended);
    }

    #[test]
    fn cancel_inside_sub_menu_steps_back() {
        let mut session = SessionController::new(0);
        session.open();
        session.select(catalog(), "2");

        assert_eq!(session.cancel(), SessionEvent::Navigated(MenuId::ROOT));
        assert_eq!(session.state(), SessionState::AtMenu);
    }

    #[test]
    fn invalid_selection_leaves_everything_unchanged() {
        let mut session = SessionController::new(10);
        session.open();
        session.select(catalog(), "1");
        let menu = session.current_menu();

        let event = session.select(catalog(), "nine");
        assert!(matches!(event, SessionEvent::SelectionRejected { .. }));
        assert_eq!(session.current_menu(), menu);
        assert_eq!(session.balance(), 10);
        assert_eq!(session.state(), SessionState::AtMenu);
    }

    #[test]
    fn select_without_open_session_is_rejected() {
        let mut session = SessionController::new(50);
        let event = session.select(catalog(), "0");
        assert!(matches!(event, SessionEvent::SelectionRejected { .. }));
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(session.balance(), 50);
    }

    #[test]
    fn balance_survives_across_sessions() {
        let mut session = SessionController::new(0);
        session.credit(40).expect("credit");

        session.open();
        assert!(matches!(
            session.select(catalog(), "0"),
            SessionEvent::PurchaseSucceeded { balance: 20, .. }
        ));
        assert_eq!(session.state(), SessionState::Ended);

        // the remaining Sh 20 is still there for the next session
        session.open();
        assert_eq!(session.state(), SessionState::AtMenu);
        assert!(matches!(
            session.select(catalog(), "0"),
            SessionEvent::PurchaseSucceeded { balance: 0, .. }
        ));
    }

    #[test]
    fn reopen_while_at_menu_restarts_from_root() {
        let mut session = SessionController::new(0);
        session.open();
        session.select(catalog(), "1");
        assert_ne!(session.current_menu(), Some(MenuId::ROOT));

        assert_eq!(session.open(), SessionEvent::Navigated(MenuId::ROOT));
        assert_eq!(session.current_menu(), Some(MenuId::ROOT));
        // history was cleared, so cancel ends the session instead of popping
        assert_eq!(session.cancel(), SessionEvent::SessionEnded);
    }

    #[test]
    fn credit_during_open_session_is_visible_to_debit() {
        let mut session = SessionController::new(0);
        session.open();
        assert!(matches!(
            session.select(catalog(), "0"),
            SessionEvent::PurchaseFailed { .. }
        ));

        session.credit(20).expect("credit");
        assert!(matches!(
            session.select(catalog(), "0"),
            SessionEvent::PurchaseSucceeded { balance: 0, .. }
        ));
    }
}
