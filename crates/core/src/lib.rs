#![warn(clippy::all, missing_docs)]

//! Core domain logic for the ussdsim prepaid menu simulator.
//!
//! This crate hosts the menu catalog, the navigation and purchase state
//! machine, the balance ledger, and configuration handling used by the
//! terminal UI and any future frontends.

pub mod catalog;
pub mod config;
pub mod ledger;
pub mod navigation;
pub mod session;

pub use catalog::{Catalog, InfoKind, ItemAction, Menu, MenuId, MenuItem};
pub use config::AppConfig;
pub use ledger::{BalanceLedger, InsufficientFunds, InvalidAmount};
pub use navigation::{NavError, NavOutcome, NavigationEngine};
pub use session::{SessionController, SessionEvent, SessionState};
