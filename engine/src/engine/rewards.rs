//! Reward crediting and claiming.

use tracing::{debug, info};
use uuid::Uuid;

use super::{CallContext, CustodyEngine};
use crate::address::Address;
use crate::authority::{Authority, Role};
use crate::config::Amount;
use crate::error::{CustodyError, ValidationError};
use crate::events::CustodyEvent;
use crate::ledger::TokenLedger;
use crate::pools::PoolKind;
use crate::rewards::{check_credit, BatchReport, CreditOutcome, CreditRejection};

impl<L: TokenLedger, A: Authority> CustodyEngine<L, A> {
    /// Credits one wallet. Same pipeline as a one-item batch.
    pub fn credit_single(
        &mut self,
        ctx: &CallContext,
        wallet: Address,
        amount: Amount,
    ) -> Result<BatchReport, CustodyError> {
        self.credit_batch(ctx, &[wallet], &[amount])
    }

    /// Credits `amounts[i]` to `wallets[i]` for every item that passes its
    /// own checks. Rewards updater only.
    ///
    /// Structural problems fail the whole call before anything is applied:
    /// mismatched lengths, more items than the configured maximum, a zero
    /// amount or the zero address. Everything else is decided per item and
    /// reported in the returned [`BatchReport`]; a skipped item never undoes
    /// an earlier credit.
    pub fn credit_batch(
        &mut self,
        ctx: &CallContext,
        wallets: &[Address],
        amounts: &[Amount],
    ) -> Result<BatchReport, CustodyError> {
        self.require(ctx, Role::RewardsUpdater)?;
        if wallets.len() != amounts.len() {
            return Err(ValidationError::ArrayLengthMismatch {
                wallets: wallets.len(),
                amounts: amounts.len(),
            }
            .into());
        }
        if wallets.len() > self.state.max_batch_size {
            return Err(ValidationError::BatchTooLarge {
                size: wallets.len(),
                max: self.state.max_batch_size,
            }
            .into());
        }
        if amounts.iter().any(|a| *a == 0) {
            return Err(ValidationError::InvalidAmount.into());
        }
        if wallets.iter().any(Address::is_zero) {
            return Err(ValidationError::ZeroAddress.into());
        }

        let batch_id = Uuid::new_v4();
        let mut outcomes = Vec::with_capacity(wallets.len());
        for (&wallet, &amount) in wallets.iter().zip(amounts) {
            let result = self.apply_credit(ctx, wallet, amount);
            let event = match result {
                Ok(()) => CustodyEvent::RewardCredited {
                    batch_id,
                    wallet,
                    amount,
                },
                Err(reason) => {
                    debug!(%batch_id, %wallet, %reason, "reward credit skipped");
                    CustodyEvent::RewardCreditFailed {
                        batch_id,
                        wallet,
                        amount,
                        reason,
                    }
                }
            };
            self.emit(event);
            outcomes.push(CreditOutcome {
                wallet,
                amount,
                result,
            });
        }

        let report = BatchReport {
            batch_id,
            applied_at: ctx.now,
            outcomes,
        };
        info!(
            %batch_id,
            items = wallets.len(),
            succeeded = report.succeeded(),
            failed = report.failed(),
            credited = %report.credited_total(),
            "reward batch applied"
        );
        Ok(report)
    }

    /// Checks one item and, if it passes, applies it.
    fn apply_credit(
        &mut self,
        ctx: &CallContext,
        wallet: Address,
        amount: Amount,
    ) -> Result<(), CreditRejection> {
        let pool = self.state.pools.get(PoolKind::Reward);
        check_credit(
            self.state.registry.get(&wallet),
            pool,
            &self.state.tokenomics,
            amount,
            ctx.now,
        )?;

        // All sums below are bounded by the reward supply cap checked above.
        let distributed = pool
            .distributed_total
            .checked_add(amount)
            .ok_or(CreditRejection::SupplyExhausted)?;
        let record = self.state.registry.entry(wallet);
        let total = record
            .total_rewards_amount
            .checked_add(amount)
            .ok_or(CreditRejection::SupplyExhausted)?;
        let current = record
            .current_rewards_amount
            .checked_add(amount)
            .ok_or(CreditRejection::SupplyExhausted)?;

        record.total_rewards_amount = total;
        record.current_rewards_amount = current;
        record.last_rewards_update_at = Some(ctx.now);
        self.state.pools.get_mut(PoolKind::Reward).distributed_total = distributed;
        Ok(())
    }

    /// Pays the caller everything credited and not yet claimed.
    ///
    /// With nothing to claim this returns `Ok(0)` without touching state or
    /// emitting an event, so it is safe to call repeatedly. Credited rewards
    /// stay claimable after the wallet is blacklisted or migrated away.
    ///
    /// # Errors
    ///
    /// The reward pool's error if custody cannot cover the claim, or the
    /// ledger's error if the payout fails.
    pub fn withdraw_rewards(&mut self, ctx: &CallContext) -> Result<Amount, CustodyError> {
        let wallet = ctx.caller;
        let amount = self
            .state
            .registry
            .get(&wallet)
            .map_or(0, |r| r.current_rewards_amount);
        if amount == 0 {
            debug!(%wallet, "no rewards to withdraw");
            return Ok(0);
        }

        let checkpoint = self.checkpoint(&[wallet], Some(PoolKind::Reward));
        self.state
            .pools
            .get_mut(PoolKind::Reward)
            .record_withdrawal(amount)?;
        let record = self.state.registry.entry(wallet);
        record.rewards_withdrawn = record
            .rewards_withdrawn
            .checked_add(amount)
            .ok_or(CustodyError::ArithmeticOverflow)?;
        record.current_rewards_amount = 0;

        self.settle(checkpoint, |ledger| ledger.transfer_out(&wallet, amount))?;

        info!(%wallet, amount = %amount, "rewards withdrawn");
        self.emit(CustodyEvent::RewardsWithdrawn { wallet, amount });
        Ok(amount)
    }
}
