//! External collaborators of the registry: the authority oracle and the
//! value-transfer ledger.
//!
//! The registry only issues instructions through these traits; settlement
//! itself happens elsewhere. The in-memory implementations back the
//! gateway binary and the tests.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::Principal;

/// Decides which accounts may create pools.
pub trait AuthorityOracle: fmt::Debug + Send + Sync {
    /// Returns `true` if `who` is a verified pool creator.
    fn is_authority(&self, who: &Principal) -> bool;
}

/// A value-transfer instruction issued by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Amount moved.
    pub amount: u128,
    /// Paying account.
    pub from: Principal,
    /// Receiving account.
    pub to: Principal,
}

/// Error returned when the ledger refuses a transfer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("ledger rejected transfer of {amount} from {from}: {reason}")]
pub struct LedgerError {
    /// Amount of the refused transfer.
    pub amount: u128,
    /// Paying account of the refused transfer.
    pub from: Principal,
    /// Ledger-specific reason.
    pub reason: String,
}

/// Value-transfer ledger and the contract's simulated reserve.
///
/// `credit_reserve`/`debit_reserve` model pool money entering and leaving
/// the contract. The reserve is advisory: it is signed and may go negative
/// when yield is paid beyond what was deposited.
pub trait Ledger: fmt::Debug + Send + Sync {
    /// Executes a transfer between two accounts.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the transfer cannot be settled.
    fn transfer(&mut self, transfer: &Transfer) -> Result<(), LedgerError>;

    /// Adds `amount` to the contract reserve.
    fn credit_reserve(&mut self, amount: u128);

    /// Removes `amount` from the contract reserve.
    fn debit_reserve(&mut self, amount: u128);

    /// Current contract reserve.
    fn reserve(&self) -> i128;

    /// Recently settled transfers, oldest first. Implementations may drop
    /// older entries.
    fn transfers(&self) -> &[Transfer];
}

/// Fixed set of verified authorities.
#[derive(Debug, Clone, Default)]
pub struct AuthoritySet {
    members: HashSet<Principal>,
}

impl AuthoritySet {
    /// Creates a set from the given identities.
    #[must_use]
    pub fn new(members: impl IntoIterator<Item = Principal>) -> Self {
        Self {
            members: members.into_iter().collect(),
        }
    }

    /// Number of authorities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if there are no authorities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl AuthorityOracle for AuthoritySet {
    fn is_authority(&self, who: &Principal) -> bool {
        self.members.contains(who)
    }
}

/// Transfers kept by [`InMemoryLedger::new`].
pub const DEFAULT_TRANSFER_HISTORY: usize = 1024;

/// Ledger that accepts every transfer and keeps the most recent ones.
#[derive(Debug, Clone)]
pub struct InMemoryLedger {
    transfers: Vec<Transfer>,
    history: usize,
    reserve: i128,
}

impl InMemoryLedger {
    /// Creates an empty ledger with a zero reserve that remembers the last
    /// [`DEFAULT_TRANSFER_HISTORY`] transfers.
    #[must_use]
    pub fn new() -> Self {
        Self::with_history(DEFAULT_TRANSFER_HISTORY)
    }

    /// Creates an empty ledger that remembers the last `history` transfers
    /// (at least one).
    #[must_use]
    pub fn with_history(history: usize) -> Self {
        let history = history.max(1);
        Self {
            transfers: Vec::with_capacity(history.min(DEFAULT_TRANSFER_HISTORY)),
            history,
            reserve: 0,
        }
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger for InMemoryLedger {
    fn transfer(&mut self, transfer: &Transfer) -> Result<(), LedgerError> {
        if self.transfers.len() >= self.history {
            self.transfers.remove(0);
        }
        self.transfers.push(transfer.clone());
        Ok(())
    }

    fn credit_reserve(&mut self, amount: u128) {
        self.reserve = self.reserve.saturating_add_unsigned(amount);
    }

    fn debit_reserve(&mut self, amount: u128) {
        self.reserve = self.reserve.saturating_sub_unsigned(amount);
    }

    fn reserve(&self) -> i128 {
        self.reserve
    }

    fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }
}
