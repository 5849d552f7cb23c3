//! Events appended to the engine's log after an operation succeeds.
//!
//! A failed operation emits nothing. Batch calls emit one event per item:
//! [`CustodyEvent::RewardCredited`] or [`CustodyEvent::RewardCreditFailed`].
//!
//! Events serialize as `{ "type": ..., "data": { ... } }`. Internally
//! tagged enums cannot read back `u128` fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::address::Address;
use crate::config::Amount;
use crate::pools::PoolKind;
use crate::rewards::CreditRejection;

/// Something observable that happened inside the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum CustodyEvent {
    /// A wallet was enrolled.
    WalletEnrolled {
        wallet: Address,
        is_team: bool,
        snapshot_amount: Amount,
        at: DateTime<Utc>,
    },
    /// A wallet's whitelist flag changed.
    WhitelistUpdated { wallet: Address, whitelisted: bool },
    /// A wallet's blacklist flag changed.
    BlacklistUpdated { wallet: Address, blacklisted: bool },
    /// A pool received funding.
    PoolFunded {
        pool: PoolKind,
        from: Address,
        amount: Amount,
        funded_total: Amount,
    },
    /// Undistributed tokens were sent to the burn address.
    PoolBurned { pool: PoolKind, amount: Amount },
    /// The growth schedule released its annual amount.
    GrowthReleased {
        to: Address,
        amount: Amount,
        remaining: Amount,
    },
    /// A team wallet claimed one or more tranches.
    TeamTokensReleased {
        wallet: Address,
        amount: Amount,
        tranches: u8,
        withdrawal_count: u8,
    },
    /// A reward credit was applied.
    RewardCredited {
        batch_id: Uuid,
        wallet: Address,
        amount: Amount,
    },
    /// A reward credit was skipped.
    RewardCreditFailed {
        batch_id: Uuid,
        wallet: Address,
        amount: Amount,
        reason: CreditRejection,
    },
    /// A wallet claimed its credited rewards.
    RewardsWithdrawn { wallet: Address, amount: Amount },
    /// Team vesting moved from one address to another.
    TeamWalletMigrated {
        from: Address,
        to: Address,
        holding_amount: Amount,
    },
    /// The maximum batch size changed.
    MaxBatchSizeUpdated { max_batch_size: usize },
}

impl CustodyEvent {
    /// Short stable name, used as a log field.
    pub fn name(&self) -> &'static str {
        match self {
            CustodyEvent::WalletEnrolled { .. } => "wallet_enrolled",
            CustodyEvent::WhitelistUpdated { .. } => "whitelist_updated",
            CustodyEvent::BlacklistUpdated { .. } => "blacklist_updated",
            CustodyEvent::PoolFunded { .. } => "pool_funded",
            CustodyEvent::PoolBurned { .. } => "pool_burned",
            CustodyEvent::GrowthReleased { .. } => "growth_released",
            CustodyEvent::TeamTokensReleased { .. } => "team_tokens_released",
            CustodyEvent::RewardCredited { .. } => "reward_credited",
            CustodyEvent::RewardCreditFailed { .. } => "reward_credit_failed",
            CustodyEvent::RewardsWithdrawn { .. } => "rewards_withdrawn",
            CustodyEvent::TeamWalletMigrated { .. } => "team_wallet_migrated",
            CustodyEvent::MaxBatchSizeUpdated { .. } => "max_batch_size_updated",
        }
    }
}
