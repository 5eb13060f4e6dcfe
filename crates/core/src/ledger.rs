//! Prepaid balance bookkeeping.

use thiserror::Error;
use tracing::debug;

/// Rejected credit input: amounts must be positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("credit amount must be positive")]
pub struct InvalidAmount;

/// A debit was refused because it would overdraw the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("insufficient funds: need {requested}, have {available}")]
pub struct InsufficientFunds {
    /// Amount the debit asked for.
    pub requested: u64,
    /// Balance at the time of the attempt.
    pub available: u64,
}

/// The subscriber's prepaid funds, in the smallest currency unit.
///
/// The balance belongs to the line, not to a menu session, and survives any
/// number of session open/close cycles. It only changes through
/// [`credit`](Self::credit) and [`try_debit`](Self::try_debit) and can never
/// go negative.
#[derive(Debug, Clone, Default)]
pub struct BalanceLedger {
    balance: u64,
}

impl BalanceLedger {
    /// Ledger starting at the given balance.
    pub fn new(initial: u64) -> Self {
        Self { balance: initial }
    }

    /// Current balance, side-effect free.
    pub fn current(&self) -> u64 {
        self.balance
    }

    /// Add funds and return the new balance. There is no upper bound.
    pub fn credit(&mut self, amount: u64) -> Result<u64, InvalidAmount> {
        if amount == 0 {
            return Err(InvalidAmount);
        }
        self.balance = self.balance.saturating_add(amount);
        debug!(amount, balance = self.balance, "Account credited");
        Ok(self.balance)
    }

    /// Subtract funds when sufficient and return the new balance; otherwise
    /// leave the balance untouched.
    pub fn try_debit(&mut self, amount: u64) -> Result<u64, InsufficientFunds> {
        if amount > self.balance {
            return Err(InsufficientFunds {
                requested: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        debug!(amount, balance = self.balance, "Account debited");
        Ok(self.balance)
    }
}
