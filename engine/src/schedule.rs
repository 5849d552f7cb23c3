//! # Release Schedules
//!
//! Pure arithmetic for the two time-driven schedules. Nothing here touches
//! state; the engine asks "what may be released now" and applies the answer.
//!
//! ## Growth
//!
//! ```text
//! NotFunded ──fund──▶ Funded ──(365 days)──▶ release min(annual, in_custody) ──▶ … ──▶ Exhausted
//! ```
//!
//! ## Team
//!
//! Each wallet's clock starts at its own enrollment. Nothing unlocks for
//! four vesting years; then one tranche of `snapshot / 5` unlocks at the
//! cliff and one more at each following anniversary, five in total. A call
//! releases every unlocked, unclaimed tranche at once. The fifth tranche
//! releases whatever holding remains, so integer division never strands
//! dust.

use chrono::{DateTime, Duration, Utc};

use crate::config::{team_cliff, vesting_year, Amount, TEAM_TRANCHE_COUNT};
use crate::error::StateError;
use crate::pools::{FundingPool, PoolKind};
use crate::registry::WalletRecord;

/// Whole vesting years in `elapsed`, zero for negative spans.
fn whole_years(elapsed: Duration) -> i64 {
    if elapsed <= Duration::zero() {
        return 0;
    }
    elapsed.num_seconds() / vesting_year().num_seconds()
}

// ---------------------------------------------------------------------------
// Growth
// ---------------------------------------------------------------------------

/// Amount the growth pool may release at `now`.
///
/// # Errors
///
/// - [`StateError::NotStarted`] before the first funding.
/// - [`StateError::TooEarly`] within a year of the previous release (or of
///   the first funding).
/// - [`StateError::Exhausted`] when nothing remains in custody.
pub fn growth_release(
    pool: &FundingPool,
    annual_release: Amount,
    now: DateTime<Utc>,
) -> Result<Amount, StateError> {
    let last = match (pool.funding_started(), pool.last_withdrawal_at) {
        (true, Some(last)) => last,
        _ => return Err(StateError::NotStarted(PoolKind::Growth)),
    };

    let available_at = last + vesting_year();
    if now < available_at {
        return Err(StateError::TooEarly { available_at });
    }

    let in_custody = pool.in_custody();
    if in_custody == 0 {
        return Err(StateError::Exhausted(PoolKind::Growth));
    }

    Ok(annual_release.min(in_custody))
}

// ---------------------------------------------------------------------------
// Team
// ---------------------------------------------------------------------------

/// A team release computed for one wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamRelease {
    /// Tranches released by this call.
    pub tranches: u8,
    /// Tokens released by this call.
    pub amount: Amount,
    /// The wallet's withdrawal count after this call.
    pub new_withdrawal_count: u8,
}

/// Tranches unlocked by a wallet enrolled at `enrolled_at`, as of `now`.
///
/// Zero before the cliff, then one plus each whole year past it, capped at
/// [`TEAM_TRANCHE_COUNT`].
pub fn unlocked_tranches(enrolled_at: DateTime<Utc>, now: DateTime<Utc>) -> u8 {
    let elapsed = now.signed_duration_since(enrolled_at);
    if elapsed < team_cliff() {
        return 0;
    }
    let past_cliff = whole_years(elapsed - team_cliff());
    let unlocked = past_cliff.saturating_add(1).min(i64::from(TEAM_TRANCHE_COUNT));
    // Bounded by TEAM_TRANCHE_COUNT above.
    unlocked as u8
}

/// Computes what `record` may claim at `now`.
///
/// Flag checks (whitelist, blacklist, team membership) are the caller's
/// job; this only looks at the clock and the holding.
///
/// # Errors
///
/// - [`StateError::NotWhitelisted`] if the wallet was never enrolled.
/// - [`StateError::TooEarly`] before the cliff, or when no new tranche has
///   unlocked since the last claim.
/// - [`StateError::NothingToWithdraw`] when every tranche has been claimed.
pub fn team_release(record: &WalletRecord, now: DateTime<Utc>) -> Result<TeamRelease, StateError> {
    let enrolled_at = record
        .added_to_whitelist_at
        .ok_or(StateError::NotWhitelisted)?;

    let cliff_at = enrolled_at + team_cliff();
    if now < cliff_at {
        return Err(StateError::TooEarly {
            available_at: cliff_at,
        });
    }

    let claimed = record.team_withdrawal_count;
    if record.holding_amount == 0 || claimed >= TEAM_TRANCHE_COUNT {
        return Err(StateError::NothingToWithdraw);
    }

    let unlocked = unlocked_tranches(enrolled_at, now);
    if unlocked <= claimed {
        return Err(StateError::TooEarly {
            available_at: cliff_at + vesting_year() * i32::from(claimed),
        });
    }

    let tranches = unlocked - claimed;
    let amount = if unlocked == TEAM_TRANCHE_COUNT {
        record.holding_amount
    } else {
        let tranche = record.holding_amount_at_whitelist_time / Amount::from(TEAM_TRANCHE_COUNT);
        tranche
            .saturating_mul(Amount::from(tranches))
            .min(record.holding_amount)
    };

    Ok(TeamRelease {
        tranches,
        amount,
        new_withdrawal_count: unlocked,
    })
}

/// Whole vesting years since the team pool started, zero if unfunded.
pub fn team_vesting_year(team_pool: &FundingPool, now: DateTime<Utc>) -> u32 {
    match team_pool.funding_started_at {
        Some(start) => u32::try_from(whole_years(now.signed_duration_since(start))).unwrap_or(u32::MAX),
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn years(n: i32) -> Duration {
        vesting_year() * n
    }

    fn team_record(snapshot: Amount) -> WalletRecord {
        WalletRecord {
            holding_amount: snapshot,
            holding_amount_at_whitelist_time: snapshot,
            added_to_whitelist_at: Some(t0()),
            is_team_wallet: true,
            is_whitelisted: true,
            ..Default::default()
        }
    }

    fn funded_growth(amount: Amount) -> FundingPool {
        let mut pool = FundingPool::new(PoolKind::Growth, amount);
        pool.record_funding(amount, t0()).unwrap();
        pool
    }

    #[test]
    fn growth_requires_funding() {
        let pool = FundingPool::new(PoolKind::Growth, 100);
        assert_eq!(
            growth_release(&pool, 10, t0()),
            Err(StateError::NotStarted(PoolKind::Growth))
        );
    }

    #[test]
    fn growth_waits_a_full_year_inclusive() {
        let pool = funded_growth(1_000);
        let at = t0() + years(1);
        assert_eq!(
            growth_release(&pool, 100, at - Duration::seconds(1)),
            Err(StateError::TooEarly { available_at: at })
        );
        assert_eq!(growth_release(&pool, 100, at), Ok(100));
    }

    #[test]
    fn growth_final_tranche_is_short() {
        let mut pool = funded_growth(250);
        pool.record_withdrawal(200).unwrap();
        assert_eq!(growth_release(&pool, 100, t0() + years(3)), Ok(50));
        pool.record_withdrawal(50).unwrap();
        assert_eq!(
            growth_release(&pool, 100, t0() + years(4)),
            Err(StateError::Exhausted(PoolKind::Growth))
        );
    }

    #[test]
    fn tranches_unlock_at_cliff_then_yearly() {
        assert_eq!(unlocked_tranches(t0(), t0()), 0);
        assert_eq!(unlocked_tranches(t0(), t0() + years(4) - Duration::seconds(1)), 0);
        assert_eq!(unlocked_tranches(t0(), t0() + years(4)), 1);
        assert_eq!(unlocked_tranches(t0(), t0() + years(5) - Duration::seconds(1)), 1);
        assert_eq!(unlocked_tranches(t0(), t0() + years(5)), 2);
        assert_eq!(unlocked_tranches(t0(), t0() + years(8)), 5);
        assert_eq!(unlocked_tranches(t0(), t0() + years(30)), 5);
    }

    #[test]
    fn team_before_cliff_is_too_early() {
        let r = team_record(1_000_000);
        let result = team_release(&r, t0() + years(3));
        assert_eq!(
            result,
            Err(StateError::TooEarly {
                available_at: t0() + years(4)
            })
        );
    }

    #[test]
    fn team_first_tranche_is_one_fifth() {
        let r = team_record(1_000_000);
        let rel = team_release(&r, t0() + years(4)).unwrap();
        assert_eq!(rel.amount, 200_000);
        assert_eq!(rel.tranches, 1);
        assert_eq!(rel.new_withdrawal_count, 1);
    }

    #[test]
    fn team_catches_up_missed_tranches() {
        let r = team_record(1_000_000);
        let rel = team_release(&r, t0() + years(6)).unwrap();
        assert_eq!(rel.tranches, 3);
        assert_eq!(rel.amount, 600_000);
    }

    #[test]
    fn team_second_claim_same_year_is_too_early() {
        let mut r = team_record(1_000_000);
        r.holding_amount = 800_000;
        r.team_withdrawal_count = 1;
        let result = team_release(&r, t0() + years(4) + Duration::days(200));
        assert_eq!(
            result,
            Err(StateError::TooEarly {
                available_at: t0() + years(5)
            })
        );
    }

    #[test]
    fn team_last_tranche_sweeps_remainder() {
        let mut r = team_record(1_000_003);
        r.holding_amount = 1_000_003 - 4 * 200_000;
        r.team_withdrawal_count = 4;
        let rel = team_release(&r, t0() + years(8)).unwrap();
        assert_eq!(rel.amount, 200_003);
        assert_eq!(rel.new_withdrawal_count, 5);
    }

    #[test]
    fn team_fully_claimed_has_nothing() {
        let mut r = team_record(1_000_000);
        r.holding_amount = 0;
        r.team_withdrawal_count = 5;
        assert_eq!(
            team_release(&r, t0() + years(9)),
            Err(StateError::NothingToWithdraw)
        );
    }

    #[test]
    fn vesting_year_counts_from_team_funding() {
        let mut pool = FundingPool::new(PoolKind::Team, 100);
        assert_eq!(team_vesting_year(&pool, t0()), 0);
        pool.record_funding(10, t0()).unwrap();
        assert_eq!(team_vesting_year(&pool, t0() + Duration::days(364)), 0);
        assert_eq!(team_vesting_year(&pool, t0() + years(2)), 2);
    }
}
