//! # Treasury
//!
//! The payout backend. The engine decides what is owed and records it in the
//! escrow; a [`Treasury`] moves the funds. Payouts are made with no license
//! lock held, so an implementation may call back into the engine.

use std::sync::Arc;

use dashmap::{DashMap, DashSet};
use lce_core::{Address, Amount, LicenseId};
use thiserror::Error;

/// Why a treasury refused a payout.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreasuryError {
    /// The payee cannot receive funds.
    #[error("payee {payee} rejected the transfer: {reason}")]
    Rejected {
        /// Intended recipient.
        payee: Address,
        /// Backend-specific reason.
        reason: String,
    },

    /// Crediting the payee would overflow its balance.
    #[error("balance of {payee} would overflow")]
    BalanceOverflow {
        /// Intended recipient.
        payee: Address,
    },
}

/// Pays escrowed funds out to license parties.
pub trait Treasury: Send + Sync {
    /// Pay `amount` to `payee` on behalf of `license_id`.
    ///
    /// # Errors
    ///
    /// Returns a [`TreasuryError`] if the payee cannot be credited. The
    /// engine then leaves the tranche in escrow.
    fn pay(&self, license_id: LicenseId, payee: Address, amount: Amount) -> Result<(), TreasuryError>;
}

impl<T: Treasury + ?Sized> Treasury for Arc<T> {
    fn pay(&self, license_id: LicenseId, payee: Address, amount: Amount) -> Result<(), TreasuryError> {
        (**self).pay(license_id, payee, amount)
    }
}

/// Balances kept in memory. Payees can be frozen to simulate a recipient
/// that refuses funds.
#[derive(Debug, Default)]
pub struct InMemoryTreasury {
    balances: DashMap<Address, Amount>,
    frozen: DashSet<Address>,
}

impl InMemoryTreasury {
    /// Create an empty treasury.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total paid to `address` so far.
    pub fn balance_of(&self, address: &Address) -> Amount {
        self.balances
            .get(address)
            .map(|b| *b)
            .unwrap_or(Amount::ZERO)
    }

    /// Refuse all further payouts to `address`.
    pub fn freeze(&self, address: Address) {
        self.frozen.insert(address);
    }

    /// Accept payouts to `address` again.
    pub fn unfreeze(&self, address: &Address) {
        self.frozen.remove(address);
    }
}

impl Treasury for InMemoryTreasury {
    fn pay(&self, _license_id: LicenseId, payee: Address, amount: Amount) -> Result<(), TreasuryError> {
        if self.frozen.contains(&payee) {
            return Err(TreasuryError::Rejected {
                payee,
                reason: "payee is frozen".to_string(),
            });
        }
        let mut balance = self.balances.entry(payee).or_insert(Amount::ZERO);
        *balance = balance
            .checked_add(amount)
            .ok_or(TreasuryError::BalanceOverflow { payee })?;
        Ok(())
    }
}
