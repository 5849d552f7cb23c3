//! # Wallet Registry
//!
//! One [`WalletRecord`] per address. A record is created the first time an
//! address is touched (usually by enrollment), mutated by withdrawals,
//! reward credits and migration, and never removed: a migrated-away record
//! is zeroed and flagged but stays in the table as history.
//!
//! The registry is a leaf component. It stores fields; the rules that move
//! them live in [`crate::engine`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::config::Amount;

/// Vesting, reward and registration state of a single address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletRecord {
    /// Team tokens still custodied for this wallet. Decremented by team
    /// withdrawals; unrelated to rewards.
    pub holding_amount: Amount,
    /// Snapshot taken at enrollment. The base of every team tranche.
    pub holding_amount_at_whitelist_time: Amount,
    /// Lifetime rewards credited.
    pub total_rewards_amount: Amount,
    /// Rewards credited and not yet claimed.
    pub current_rewards_amount: Amount,
    /// Lifetime rewards claimed.
    pub rewards_withdrawn: Amount,
    /// Vesting clock origin. Set once, carried across migration.
    pub added_to_whitelist_at: Option<DateTime<Utc>>,
    /// Team tranches already claimed, in `0..=5`.
    pub team_withdrawal_count: u8,
    /// Time of the last successful reward credit.
    pub last_rewards_update_at: Option<DateTime<Utc>>,
    /// Subject to the team vesting schedule.
    pub is_team_wallet: bool,
    /// Eligible to participate.
    pub is_whitelisted: bool,
    /// On the deny list.
    pub is_blacklisted: bool,
}

impl WalletRecord {
    /// Whitelisted and not blacklisted.
    pub fn is_eligible(&self) -> bool {
        self.is_whitelisted && !self.is_blacklisted
    }

    /// `total == current + withdrawn` for the reward fields.
    pub fn rewards_balanced(&self) -> bool {
        self.current_rewards_amount
            .checked_add(self.rewards_withdrawn)
            .map_or(false, |sum| sum == self.total_rewards_amount)
    }

    /// `true` once the address has ever been enrolled.
    pub fn was_enrolled(&self) -> bool {
        self.added_to_whitelist_at.is_some()
    }
}

/// Address-keyed table of wallet records.
///
/// Backed by a `BTreeMap` so iteration order (and therefore aggregator
/// output and persisted layouts) is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletRegistry {
    records: BTreeMap<Address, WalletRecord>,
}

impl WalletRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The record for `address`, if one exists.
    pub fn get(&self, address: &Address) -> Option<&WalletRecord> {
        self.records.get(address)
    }

    /// Mutable access to an existing record.
    pub fn get_mut(&mut self, address: &Address) -> Option<&mut WalletRecord> {
        self.records.get_mut(address)
    }

    /// The record for `address`, created empty if absent.
    pub fn entry(&mut self, address: Address) -> &mut WalletRecord {
        self.records.entry(address).or_default()
    }

    /// Replaces (or creates) the record for `address`.
    pub fn insert(&mut self, address: Address, record: WalletRecord) {
        self.records.insert(address, record);
    }

    /// Physically removes a record.
    ///
    /// Only used to undo the creation of a record by an operation whose
    /// external transfer failed; live records are never deleted.
    pub(crate) fn remove(&mut self, address: &Address) {
        self.records.remove(address);
    }

    /// Whether a record exists for `address`.
    pub fn contains(&self, address: &Address) -> bool {
        self.records.contains_key(address)
    }

    /// Number of records, including retired ones.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// `true` when no record exists.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in address order.
    pub fn iter(&self) -> impl Iterator<Item = (&Address, &WalletRecord)> {
        self.records.iter()
    }

    /// Records that may currently receive rewards.
    pub fn eligible(&self) -> impl Iterator<Item = (&Address, &WalletRecord)> {
        self.records.iter().filter(|(_, r)| r.is_eligible())
    }

    /// Sum of `holding_amount` over team wallets.
    pub fn total_team_holdings(&self) -> Amount {
        self.records
            .values()
            .filter(|r| r.is_team_wallet)
            .fold(0, |acc: Amount, r| acc.saturating_add(r.holding_amount))
    }
}
