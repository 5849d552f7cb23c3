//! # Token Ledger Collaborator
//!
//! The engine never holds balances itself; it instructs a token ledger to
//! move them. [`TokenLedger`] is that seam. Any error the ledger returns
//! aborts the operation that issued the call and is passed through as-is.
//!
//! [`MemoryLedger`] is a small, serializable reference ledger: plain
//! balances, allowances granted to the custody account, and the custody
//! account's own balance. Tests use it directly; the node persists one as
//! its devnet ledger.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::config::Amount;
use crate::error::TransferError;

/// Moves tokens between external accounts and the custody account.
pub trait TokenLedger {
    /// Pulls `amount` from `from` into custody. Requires `from` to have
    /// approved the custody account.
    fn transfer_in(&mut self, from: &Address, amount: Amount) -> Result<(), TransferError>;

    /// Pays `amount` out of custody to `to`.
    fn transfer_out(&mut self, to: &Address, amount: Amount) -> Result<(), TransferError>;

    /// Current balance of `address`.
    fn balance_of(&self, address: &Address) -> Amount;
}

/// In-memory token ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryLedger {
    /// The custody account's own address.
    custody: Address,
    balances: BTreeMap<Address, Amount>,
    /// Amounts each owner has approved the custody account to pull.
    allowances: BTreeMap<Address, Amount>,
}

impl MemoryLedger {
    /// An empty ledger whose custody account is `custody`.
    pub fn new(custody: Address) -> Self {
        Self {
            custody,
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
        }
    }

    /// The custody account's address.
    pub fn custody_address(&self) -> Address {
        self.custody
    }

    /// Tokens currently held by the custody account.
    pub fn custody_balance(&self) -> Amount {
        self.balance_of(&self.custody)
    }

    /// Creates `amount` out of thin air for `to`. Test and devnet seeding only.
    pub fn mint(&mut self, to: Address, amount: Amount) {
        let balance = self.balances.entry(to).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    /// Sets the amount `owner` allows the custody account to pull.
    pub fn approve(&mut self, owner: Address, amount: Amount) {
        self.allowances.insert(owner, amount);
    }

    /// Remaining allowance of `owner` towards the custody account.
    pub fn allowance(&self, owner: &Address) -> Amount {
        self.allowances.get(owner).copied().unwrap_or(0)
    }

    fn debit(&mut self, account: &Address, amount: Amount) -> Result<(), TransferError> {
        let available = self.balance_of(account);
        if available < amount {
            return Err(TransferError::InsufficientBalance {
                account: *account,
                available,
                requested: amount,
            });
        }
        self.balances.insert(*account, available - amount);
        Ok(())
    }

    fn credit(&mut self, account: &Address, amount: Amount) -> Result<(), TransferError> {
        let balance = self.balances.entry(*account).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| TransferError::Rejected(format!("balance overflow for {account}")))?;
        Ok(())
    }
}

impl TokenLedger for MemoryLedger {
    fn transfer_in(&mut self, from: &Address, amount: Amount) -> Result<(), TransferError> {
        let approved = self.allowance(from);
        if approved < amount {
            return Err(TransferError::InsufficientAllowance {
                owner: *from,
                approved,
                requested: amount,
            });
        }
        self.debit(from, amount)?;
        let custody = self.custody;
        self.credit(&custody, amount)?;
        self.allowances.insert(*from, approved - amount);
        Ok(())
    }

    fn transfer_out(&mut self, to: &Address, amount: Amount) -> Result<(), TransferError> {
        let custody = self.custody;
        self.debit(&custody, amount)?;
        self.credit(to, amount)
    }

    fn balance_of(&self, address: &Address) -> Amount {
        self.balances.get(address).copied().unwrap_or(0)
    }
}
