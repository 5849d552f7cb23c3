//! Growth pool release.

use tracing::info;

use super::{CallContext, CustodyEngine};
use crate::authority::{Authority, Role};
use crate::config::Amount;
use crate::error::CustodyError;
use crate::events::CustodyEvent;
use crate::ledger::TokenLedger;
use crate::pools::PoolKind;
use crate::schedule;

impl<L: TokenLedger, A: Authority> CustodyEngine<L, A> {
    /// Releases the annual growth amount to the calling owner.
    ///
    /// Pays `min(annual_release, in_custody)` and restarts the one-year
    /// wait from `ctx.now`. Returns the amount released.
    ///
    /// # Errors
    ///
    /// [`StateError::NotStarted`](crate::error::StateError::NotStarted),
    /// [`StateError::TooEarly`](crate::error::StateError::TooEarly) or
    /// [`StateError::Exhausted`](crate::error::StateError::Exhausted), see
    /// [`schedule::growth_release`].
    pub fn withdraw_growth(&mut self, ctx: &CallContext) -> Result<Amount, CustodyError> {
        self.require(ctx, Role::Owner)?;

        let annual = self.state.tokenomics.growth_annual_release;
        let amount = schedule::growth_release(self.state.pools.get(PoolKind::Growth), annual, ctx.now)?;

        let checkpoint = self.checkpoint(&[], Some(PoolKind::Growth));
        let pool = self.state.pools.get_mut(PoolKind::Growth);
        pool.record_withdrawal(amount)?;
        pool.last_withdrawal_at = Some(ctx.now);
        let remaining = pool.in_custody();

        let to = ctx.caller;
        self.settle(checkpoint, |ledger| ledger.transfer_out(&to, amount))?;

        info!(%to, amount = %amount, remaining = %remaining, "growth tokens released");
        self.emit(CustodyEvent::GrowthReleased {
            to,
            amount,
            remaining,
        });
        Ok(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::authority::RoleTable;
    use crate::config::{vesting_year, Tokenomics};
    use crate::error::StateError;
    use crate::ledger::MemoryLedger;
    use crate::state::CustodyState;
    use chrono::{DateTime, Duration, Utc};

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn owner() -> Address {
        Address::from_low_u64(1)
    }

    fn funded_engine(cap: Amount, annual: Amount) -> CustodyEngine<MemoryLedger, RoleTable> {
        let tokenomics = Tokenomics {
            growth_cap: cap,
            growth_annual_release: annual,
            ..Tokenomics::default()
        };
        let mut ledger = MemoryLedger::new(Address::from_low_u64(999));
        ledger.mint(owner(), cap);
        ledger.approve(owner(), cap);
        let mut e = CustodyEngine::new(
            CustodyState::new(tokenomics).unwrap(),
            ledger,
            RoleTable::new(owner()),
        );
        e.fund(&CallContext::new(owner(), t0()), PoolKind::Growth, cap)
            .unwrap();
        e
    }

    #[test]
    fn unfunded_pool_not_started() {
        let mut e = CustodyEngine::new(
            CustodyState::default(),
            MemoryLedger::new(Address::from_low_u64(999)),
            RoleTable::new(owner()),
        );
        assert_eq!(
            e.withdraw_growth(&CallContext::new(owner(), t0())),
            Err(CustodyError::State(StateError::NotStarted(PoolKind::Growth)))
        );
    }

    #[test]
    fn release_waits_a_year_from_funding() {
        let mut e = funded_engine(1_000, 100);
        let early = CallContext::new(owner(), t0() + Duration::days(364));
        assert!(matches!(
            e.withdraw_growth(&early),
            Err(CustodyError::State(StateError::TooEarly { .. }))
        ));
        let on_time = CallContext::new(owner(), t0() + vesting_year());
        assert_eq!(e.withdraw_growth(&on_time), Ok(100));
        assert_eq!(e.ledger().balance_of(&owner()), 100);
        assert_eq!(e.pool(PoolKind::Growth).last_withdrawal_at, Some(on_time.now));
    }

    #[test]
    fn short_final_tranche_then_exhausted() {
        let mut e = funded_engine(250, 100);
        let mut released = Vec::new();
        for year in 1..=3 {
            let ctx = CallContext::new(owner(), t0() + vesting_year() * year);
            released.push(e.withdraw_growth(&ctx).unwrap());
        }
        assert_eq!(released, vec![100, 100, 50]);
        let ctx = CallContext::new(owner(), t0() + vesting_year() * 4);
        assert_eq!(
            e.withdraw_growth(&ctx),
            Err(CustodyError::State(StateError::Exhausted(PoolKind::Growth)))
        );
    }

    #[test]
    fn failed_payout_keeps_clock() {
        let mut e = funded_engine(1_000, 100);
        // Drain custody so the ledger refuses the payout.
        let custody = e.ledger().custody_address();
        let held = e.ledger().custody_balance();
        e.ledger_mut().transfer_out(&Address::from_low_u64(77), held).unwrap();
        assert_eq!(e.ledger().balance_of(&custody), 0);

        let ctx = CallContext::new(owner(), t0() + vesting_year());
        assert!(matches!(
            e.withdraw_growth(&ctx),
            Err(CustodyError::Transfer(_))
        ));
        let pool = e.pool(PoolKind::Growth);
        assert_eq!(pool.withdrawn, 0);
        assert_eq!(pool.last_withdrawal_at, Some(t0()));
    }
}
