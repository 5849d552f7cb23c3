//! # Reward Aggregator
//!
//! The weekly off-chain job that feeds [`credit_batch`]. Given a balance
//! snapshot and a weekly emission, each wallet receives
//!
//! ```text
//! floor(emission * balance / total_balance)
//! ```
//!
//! Truncation means the allocations never sum past the emission; whatever
//! the division drops is reported as `undistributed`. The plan is then cut
//! into address-ordered chunks no larger than the engine's batch limit.
//!
//! [`credit_batch`]: crate::engine::CustodyEngine::credit_batch

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::Address;
use crate::config::{Amount, Tokenomics};
use crate::ledger::TokenLedger;
use crate::registry::WalletRegistry;

/// Reasons a reward plan cannot be computed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AggregationError {
    /// The weekly emission is above the per-wallet weekly cap.
    #[error("emission {emission} exceeds the weekly cap {cap}")]
    EmissionAboveCap {
        /// Requested emission.
        emission: Amount,
        /// Configured weekly cap.
        cap: Amount,
    },

    /// No wallet in the snapshot holds a positive balance.
    #[error("balance snapshot is empty")]
    EmptySnapshot,

    /// A product or sum did not fit in 128 bits.
    #[error("arithmetic overflow while computing allocations")]
    Overflow,
}

/// Balances of the wallets taking part in one distribution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    balances: BTreeMap<Address, Amount>,
}

impl BalanceSnapshot {
    /// An empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `balance` for `wallet`. Zero balances are ignored.
    pub fn insert(&mut self, wallet: Address, balance: Amount) {
        if balance > 0 {
            self.balances.insert(wallet, balance);
        }
    }

    /// Number of wallets with a positive balance.
    pub fn len(&self) -> usize {
        self.balances.len()
    }

    /// `true` when no wallet holds anything.
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    /// Sum of all balances, `None` on overflow.
    pub fn total(&self) -> Option<Amount> {
        self.balances
            .values()
            .try_fold(0 as Amount, |acc, b| acc.checked_add(*b))
    }
}

impl FromIterator<(Address, Amount)> for BalanceSnapshot {
    fn from_iter<I: IntoIterator<Item = (Address, Amount)>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for (wallet, balance) in iter {
            snapshot.insert(wallet, balance);
        }
        snapshot
    }
}

/// Snapshot of every eligible wallet's ledger balance.
pub fn eligible_snapshot<L: TokenLedger>(registry: &WalletRegistry, ledger: &L) -> BalanceSnapshot {
    registry
        .eligible()
        .map(|(wallet, _)| (*wallet, ledger.balance_of(wallet)))
        .collect()
}

/// Per-wallet allocations of one weekly emission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardPlan {
    /// Non-zero allocations in address order.
    pub allocations: BTreeMap<Address, Amount>,
    /// The emission the plan was computed for.
    pub emission: Amount,
    /// Sum of the allocations.
    pub total: Amount,
    /// `emission - total`, lost to truncation.
    pub undistributed: Amount,
}

impl RewardPlan {
    /// Splits the plan into `(wallets, amounts)` chunks of at most `max`
    /// items, ready for `credit_batch`.
    pub fn batches(&self, max: usize) -> Vec<(Vec<Address>, Vec<Amount>)> {
        let entries: Vec<(Address, Amount)> =
            self.allocations.iter().map(|(w, a)| (*w, *a)).collect();
        entries
            .chunks(max.max(1))
            .map(|chunk| -> (Vec<Address>, Vec<Amount>) { chunk.iter().copied().unzip() })
            .collect()
    }
}

/// Computes the proportional allocation of `emission` over `snapshot`.
pub fn compute_plan(
    snapshot: &BalanceSnapshot,
    emission: Amount,
    tokenomics: &Tokenomics,
) -> Result<RewardPlan, AggregationError> {
    if emission > tokenomics.weekly_emission_cap {
        return Err(AggregationError::EmissionAboveCap {
            emission,
            cap: tokenomics.weekly_emission_cap,
        });
    }
    if snapshot.is_empty() {
        return Err(AggregationError::EmptySnapshot);
    }
    let total_balance = snapshot.total().ok_or(AggregationError::Overflow)?;

    let mut allocations = BTreeMap::new();
    let mut total: Amount = 0;
    for (wallet, balance) in &snapshot.balances {
        let share = emission
            .checked_mul(*balance)
            .ok_or(AggregationError::Overflow)?
            / total_balance;
        if share == 0 {
            continue;
        }
        total = total.checked_add(share).ok_or(AggregationError::Overflow)?;
        allocations.insert(*wallet, share);
    }

    tracing::debug!(
        wallets = allocations.len(),
        total = %total,
        undistributed = %(emission - total),
        "reward plan computed"
    );
    Ok(RewardPlan {
        allocations,
        emission,
        total,
        undistributed: emission - total,
    })
}
