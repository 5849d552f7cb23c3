//! # Reward Credit Outcomes
//!
//! A reward batch never fails because of one bad item. Each item runs the
//! checks below in order; the first one that fails becomes that item's
//! [`CreditRejection`] and the pipeline moves on:
//!
//! 1. `NotWhitelisted` — unknown or not whitelisted.
//! 2. `Blacklisted`
//! 3. `TooSoon` — credited less than seven days ago.
//! 4. `SingleWalletExceedsWeeklyCap`
//! 5. `PoolExhausted` — amount above what the reward pool holds.
//! 6. `SupplyExhausted` — lifetime credits would pass the reward supply cap.
//!
//! Only after an item passes every check is it applied, so an item's
//! outcome never depends on items after it.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::address::Address;
use crate::config::{reward_cooldown, Amount, Tokenomics};
use crate::pools::FundingPool;
use crate::registry::WalletRecord;

/// Why a single batch item was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CreditRejection {
    /// The wallet is unknown or not whitelisted.
    NotWhitelisted,
    /// The wallet is blacklisted.
    Blacklisted,
    /// The wallet's cooldown has not elapsed.
    TooSoon,
    /// The amount is above the weekly per-wallet cap.
    SingleWalletExceedsWeeklyCap,
    /// The reward pool does not hold the amount.
    PoolExhausted,
    /// Crediting would pass the lifetime reward supply.
    SupplyExhausted,
}

impl fmt::Display for CreditRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CreditRejection::NotWhitelisted => "wallet not whitelisted",
            CreditRejection::Blacklisted => "wallet blacklisted",
            CreditRejection::TooSoon => "reward cooldown not elapsed",
            CreditRejection::SingleWalletExceedsWeeklyCap => "amount exceeds weekly cap",
            CreditRejection::PoolExhausted => "reward pool exhausted",
            CreditRejection::SupplyExhausted => "reward supply exhausted",
        };
        f.write_str(s)
    }
}

/// Runs the per-item checks for crediting `amount` to `record` at `now`.
///
/// `record` is `None` for an address the registry has never seen.
pub fn check_credit(
    record: Option<&WalletRecord>,
    reward_pool: &FundingPool,
    tokenomics: &Tokenomics,
    amount: Amount,
    now: DateTime<Utc>,
) -> Result<(), CreditRejection> {
    let record = match record {
        Some(r) if r.is_whitelisted => r,
        _ => return Err(CreditRejection::NotWhitelisted),
    };
    if record.is_blacklisted {
        return Err(CreditRejection::Blacklisted);
    }
    if let Some(last) = record.last_rewards_update_at {
        if now < last + reward_cooldown() {
            return Err(CreditRejection::TooSoon);
        }
    }
    if amount > tokenomics.weekly_emission_cap {
        return Err(CreditRejection::SingleWalletExceedsWeeklyCap);
    }
    if amount > reward_pool.in_custody() {
        return Err(CreditRejection::PoolExhausted);
    }
    match reward_pool.distributed_total.checked_add(amount) {
        Some(total) if total <= tokenomics.reward_supply_cap => Ok(()),
        _ => Err(CreditRejection::SupplyExhausted),
    }
}

/// Outcome of one submitted item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditOutcome {
    /// The wallet named by the item.
    pub wallet: Address,
    /// The amount named by the item.
    pub amount: Amount,
    /// `Ok` if credited, otherwise the reason it was skipped.
    pub result: Result<(), CreditRejection>,
}

impl CreditOutcome {
    /// `true` if the item was credited.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-item outcomes of an accepted batch, in submission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Identifier tying the report to its emitted events.
    pub batch_id: Uuid,
    /// Timestamp the batch was applied at.
    pub applied_at: DateTime<Utc>,
    /// One outcome per submitted item.
    pub outcomes: Vec<CreditOutcome>,
}

impl BatchReport {
    /// Number of items credited.
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Number of items skipped.
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Sum of the credited amounts.
    pub fn credited_total(&self) -> Amount {
        self.outcomes
            .iter()
            .filter(|o| o.is_success())
            .fold(0, |acc: Amount, o| acc.saturating_add(o.amount))
    }

    /// Wallets that were skipped, with their reasons. The aggregator
    /// resubmits these in a later batch.
    pub fn rejected(&self) -> impl Iterator<Item = (Address, CreditRejection)> + '_ {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.err().map(|reason| (o.wallet, reason)))
    }
}
