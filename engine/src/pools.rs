//! # Funding Pools
//!
//! Three independent custody buckets, one per release schedule. Each pool
//! is funded monotonically up to a cap and drained by its schedule:
//!
//! ```text
//! 0 <= withdrawn <= funded <= cap        in_custody = funded - withdrawn
//! ```
//!
//! `funding_started_at` is set by the first successful funding and never
//! moves again. The growth pool additionally tracks the time of its last
//! release; the reward pool tracks how much has been credited to wallets.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{Amount, Tokenomics};
use crate::error::{CustodyError, StateError};

/// Which pool an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolKind {
    /// Long-horizon fixed-rate release.
    Growth,
    /// Cliff plus annual tranches per team wallet.
    Team,
    /// Weekly proportional rewards.
    Reward,
}

impl PoolKind {
    /// All pools, in a fixed order.
    pub const ALL: [PoolKind; 3] = [PoolKind::Growth, PoolKind::Team, PoolKind::Reward];

    /// The pool's cumulative funding cap under `tokenomics`.
    pub fn cap(self, tokenomics: &Tokenomics) -> Amount {
        match self {
            PoolKind::Growth => tokenomics.growth_cap,
            PoolKind::Team => tokenomics.team_cap,
            PoolKind::Reward => tokenomics.reward_pool_cap,
        }
    }
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolKind::Growth => write!(f, "growth"),
            PoolKind::Team => write!(f, "team"),
            PoolKind::Reward => write!(f, "reward"),
        }
    }
}

impl std::str::FromStr for PoolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "growth" => Ok(PoolKind::Growth),
            "team" => Ok(PoolKind::Team),
            "reward" | "rewards" => Ok(PoolKind::Reward),
            other => Err(format!("unknown pool: {other}")),
        }
    }
}

/// Counters and timestamps of a single pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingPool {
    /// Which pool this is.
    pub kind: PoolKind,
    /// Cumulative funding cap.
    pub cap: Amount,
    /// Cumulative amount funded. Never decreases.
    pub funded: Amount,
    /// Cumulative amount that has left custody. Never decreases.
    pub withdrawn: Amount,
    /// Set by the first successful funding, then immutable.
    pub funding_started_at: Option<DateTime<Utc>>,
    /// Growth only: time of the last release (initially the first funding).
    pub last_withdrawal_at: Option<DateTime<Utc>>,
    /// Reward only: cumulative rewards credited across all wallets.
    pub distributed_total: Amount,
    /// Cumulative amount sent to the burn address. Included in `withdrawn`.
    pub burned: Amount,
}

impl FundingPool {
    /// A pool that has never been funded.
    pub fn new(kind: PoolKind, cap: Amount) -> Self {
        Self {
            kind,
            cap,
            funded: 0,
            withdrawn: 0,
            funding_started_at: None,
            last_withdrawal_at: None,
            distributed_total: 0,
            burned: 0,
        }
    }

    /// `true` once the first funding has succeeded.
    pub fn funding_started(&self) -> bool {
        self.funding_started_at.is_some()
    }

    /// Tokens funded into this pool that have not left custody.
    pub fn in_custody(&self) -> Amount {
        self.funded.saturating_sub(self.withdrawn)
    }

    /// Room left under the cap.
    pub fn remaining_capacity(&self) -> Amount {
        self.cap.saturating_sub(self.funded)
    }

    /// Reward only: credited to wallets but not yet claimed.
    pub fn outstanding_credits(&self) -> Amount {
        let claimed = self.withdrawn.saturating_sub(self.burned);
        self.distributed_total.saturating_sub(claimed)
    }

    /// Amount the owner may remove through `withdraw_to_burn`.
    ///
    /// For the reward pool, credited-but-unclaimed rewards belong to wallets
    /// and are excluded.
    pub fn burnable(&self) -> Amount {
        match self.kind {
            PoolKind::Reward => self.in_custody().saturating_sub(self.outstanding_credits()),
            PoolKind::Growth | PoolKind::Team => self.in_custody(),
        }
    }

    /// Records a funding of `amount` at `now`. Fails if the cap would be
    /// exceeded; the first funding starts the pool's clock.
    pub fn record_funding(
        &mut self,
        amount: Amount,
        now: DateTime<Utc>,
    ) -> Result<(), CustodyError> {
        let new_funded = self
            .funded
            .checked_add(amount)
            .ok_or(CustodyError::ArithmeticOverflow)?;
        if new_funded > self.cap {
            return Err(StateError::CapExceeded {
                pool: self.kind,
                cap: self.cap,
                funded: self.funded,
                requested: amount,
            }
            .into());
        }
        self.funded = new_funded;
        if self.funding_started_at.is_none() {
            self.funding_started_at = Some(now);
            if self.kind == PoolKind::Growth {
                self.last_withdrawal_at = Some(now);
            }
        }
        Ok(())
    }

    /// Records `amount` leaving custody. Fails if the pool holds less.
    pub fn record_withdrawal(&mut self, amount: Amount) -> Result<(), CustodyError> {
        let available = self.in_custody();
        if amount > available {
            return Err(StateError::InsufficientPoolBalance {
                pool: self.kind,
                available,
                requested: amount,
            }
            .into());
        }
        self.withdrawn = self
            .withdrawn
            .checked_add(amount)
            .ok_or(CustodyError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Records `amount` sent to the burn address. Bounded by
    /// [`burnable`](Self::burnable) rather than the raw custody figure.
    pub fn record_burn(&mut self, amount: Amount) -> Result<(), CustodyError> {
        let available = self.burnable();
        if amount > available {
            return Err(StateError::InsufficientPoolBalance {
                pool: self.kind,
                available,
                requested: amount,
            }
            .into());
        }
        self.record_withdrawal(amount)?;
        self.burned = self
            .burned
            .checked_add(amount)
            .ok_or(CustodyError::ArithmeticOverflow)?;
        Ok(())
    }
}

/// The three pools, addressed by [`PoolKind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSet {
    growth: FundingPool,
    team: FundingPool,
    reward: FundingPool,
}

impl PoolSet {
    /// Unfunded pools with caps taken from `tokenomics`.
    pub fn new(tokenomics: &Tokenomics) -> Self {
        Self {
            growth: FundingPool::new(PoolKind::Growth, PoolKind::Growth.cap(tokenomics)),
            team: FundingPool::new(PoolKind::Team, PoolKind::Team.cap(tokenomics)),
            reward: FundingPool::new(PoolKind::Reward, PoolKind::Reward.cap(tokenomics)),
        }
    }

    /// Shared access to one pool.
    pub fn get(&self, kind: PoolKind) -> &FundingPool {
        match kind {
            PoolKind::Growth => &self.growth,
            PoolKind::Team => &self.team,
            PoolKind::Reward => &self.reward,
        }
    }

    /// Mutable access to one pool.
    pub fn get_mut(&mut self, kind: PoolKind) -> &mut FundingPool {
        match kind {
            PoolKind::Growth => &mut self.growth,
            PoolKind::Team => &mut self.team,
            PoolKind::Reward => &mut self.reward,
        }
    }

    /// Iterates the pools in [`PoolKind::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = &FundingPool> {
        [&self.growth, &self.team, &self.reward].into_iter()
    }
}
