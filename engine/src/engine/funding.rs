//! Pool funding and the burn escape hatch.

use tracing::info;

use super::{CallContext, CustodyEngine};
use crate::address::BURN_ADDRESS;
use crate::authority::{Authority, Role};
use crate::config::Amount;
use crate::error::{CustodyError, ValidationError};
use crate::events::CustodyEvent;
use crate::ledger::TokenLedger;
use crate::pools::PoolKind;

impl<L: TokenLedger, A: Authority> CustodyEngine<L, A> {
    /// Pulls `amount` from the caller into `pool`. Owner only.
    ///
    /// The first successful funding of a pool starts its clock.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::InvalidAmount`] for a zero amount.
    /// - [`StateError::CapExceeded`](crate::error::StateError::CapExceeded)
    ///   if cumulative funding would pass the cap.
    /// - [`CustodyError::Transfer`] if the ledger cannot pull the tokens.
    pub fn fund(
        &mut self,
        ctx: &CallContext,
        pool: PoolKind,
        amount: Amount,
    ) -> Result<(), CustodyError> {
        self.require(ctx, Role::Owner)?;
        if amount == 0 {
            return Err(ValidationError::InvalidAmount.into());
        }

        let checkpoint = self.checkpoint(&[], Some(pool));
        self.state.pools.get_mut(pool).record_funding(amount, ctx.now)?;

        let from = ctx.caller;
        self.settle(checkpoint, |ledger| ledger.transfer_in(&from, amount))?;

        let funded_total = self.state.pools.get(pool).funded;
        info!(%pool, amount = %amount, funded_total = %funded_total, "pool funded");
        self.emit(CustodyEvent::PoolFunded {
            pool,
            from,
            amount,
            funded_total,
        });
        Ok(())
    }

    /// Sends custodied, undistributed tokens of `pool` to the burn address.
    /// Owner only.
    ///
    /// For the reward pool, credited-but-unclaimed rewards cannot be burned.
    pub fn withdraw_to_burn(
        &mut self,
        ctx: &CallContext,
        pool: PoolKind,
        amount: Amount,
    ) -> Result<(), CustodyError> {
        self.require(ctx, Role::Owner)?;
        if amount == 0 {
            return Err(ValidationError::InvalidAmount.into());
        }

        let checkpoint = self.checkpoint(&[], Some(pool));
        self.state.pools.get_mut(pool).record_burn(amount)?;
        self.settle(checkpoint, |ledger| ledger.transfer_out(&BURN_ADDRESS, amount))?;

        info!(%pool, amount = %amount, "pool tokens burned");
        self.emit(CustodyEvent::PoolBurned { pool, amount });
        Ok(())
    }
}
