//! # Protocol Constants & Tokenomics
//!
//! Every cap, interval and rate the engine enforces lives here. The
//! constants describe the canonical deployment; [`Tokenomics`] carries the
//! subset that a deployment may choose differently (caps and rates), fixed
//! for the lifetime of a [`CustodyState`](crate::state::CustodyState).

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Token amount in the smallest unit. No floating point anywhere.
pub type Amount = u128;

// ---------------------------------------------------------------------------
// Growth Pool
// ---------------------------------------------------------------------------

/// Cumulative funding cap for the growth pool.
pub const GROWTH_POOL_CAP: Amount = 2_400_000_000;

/// Number of years the growth pool is meant to last at the fixed rate.
pub const GROWTH_RELEASE_YEARS: Amount = 20;

/// Fixed amount released per growth withdrawal. A flat figure, not a share
/// of whatever remains.
pub const GROWTH_ANNUAL_RELEASE: Amount = GROWTH_POOL_CAP / GROWTH_RELEASE_YEARS;

// ---------------------------------------------------------------------------
// Team Pool
// ---------------------------------------------------------------------------

/// Cumulative funding cap for the team pool. Also the upper bound for a
/// single team wallet's enrollment snapshot.
pub const TEAM_POOL_CAP: Amount = 1_200_000_000;

/// Number of equal annual tranches after the cliff.
pub const TEAM_TRANCHE_COUNT: u8 = 5;

// ---------------------------------------------------------------------------
// Reward Pool
// ---------------------------------------------------------------------------

/// Cumulative funding cap for the reward pool.
pub const REWARD_POOL_CAP: Amount = 3_600_000_000;

/// Upper bound on rewards ever credited across all wallets.
pub const REWARD_SUPPLY_CAP: Amount = 3_600_000_000;

/// Largest amount a single wallet may be credited in one weekly update.
/// The reward supply spread over ten years of weeks, truncated.
pub const WEEKLY_REWARD_EMISSION_CAP: Amount = REWARD_SUPPLY_CAP / 520;

/// Default ceiling on the number of items in one `credit_batch` call.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 200;

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

/// Days in a vesting year. Calendar drift is deliberately ignored.
pub const DAYS_PER_VESTING_YEAR: i64 = 365;

/// Years between team enrollment and the first claimable tranche.
pub const TEAM_CLIFF_YEARS: i64 = 4;

/// Minimum spacing between two reward credits for the same wallet.
pub const REWARD_COOLDOWN_DAYS: i64 = 7;

/// One vesting year as a `chrono::Duration`.
pub fn vesting_year() -> Duration {
    Duration::days(DAYS_PER_VESTING_YEAR)
}

/// Time from enrollment until the first team tranche unlocks.
pub fn team_cliff() -> Duration {
    Duration::days(DAYS_PER_VESTING_YEAR * TEAM_CLIFF_YEARS)
}

/// Cooldown between reward credits.
pub fn reward_cooldown() -> Duration {
    Duration::days(REWARD_COOLDOWN_DAYS)
}

// ---------------------------------------------------------------------------
// Tokenomics
// ---------------------------------------------------------------------------

/// Per-deployment caps and rates.
///
/// Fixed when the state is created. Tests use small figures to reach cap
/// boundaries quickly; production uses [`Tokenomics::default`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tokenomics {
    /// Funding cap of the growth pool.
    pub growth_cap: Amount,
    /// Amount released per growth withdrawal.
    pub growth_annual_release: Amount,
    /// Funding cap of the team pool and the ceiling of a team snapshot.
    pub team_cap: Amount,
    /// Funding cap of the reward pool.
    pub reward_pool_cap: Amount,
    /// Ceiling on cumulative credited rewards.
    pub reward_supply_cap: Amount,
    /// Ceiling on a single wallet's weekly credit.
    pub weekly_emission_cap: Amount,
}

impl Default for Tokenomics {
    fn default() -> Self {
        Self {
            growth_cap: GROWTH_POOL_CAP,
            growth_annual_release: GROWTH_ANNUAL_RELEASE,
            team_cap: TEAM_POOL_CAP,
            reward_pool_cap: REWARD_POOL_CAP,
            reward_supply_cap: REWARD_SUPPLY_CAP,
            weekly_emission_cap: WEEKLY_REWARD_EMISSION_CAP,
        }
    }
}

impl Tokenomics {
    /// Checks that the parameters describe a usable deployment.
    ///
    /// Returns a short description of the first problem found.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.growth_cap == 0 || self.team_cap == 0 || self.reward_pool_cap == 0 {
            return Err("pool caps must be non-zero");
        }
        if self.growth_annual_release == 0 || self.growth_annual_release > self.growth_cap {
            return Err("growth annual release must be in (0, growth cap]");
        }
        if self.reward_supply_cap == 0 {
            return Err("reward supply cap must be non-zero");
        }
        if self.weekly_emission_cap == 0 || self.weekly_emission_cap > self.reward_supply_cap {
            return Err("weekly emission cap must be in (0, reward supply cap]");
        }
        Ok(())
    }
}
