//! Team vesting claims.

use tracing::info;

use super::{CallContext, CustodyEngine};
use crate::authority::Authority;
use crate::config::Amount;
use crate::error::{CustodyError, StateError};
use crate::events::CustodyEvent;
use crate::ledger::TokenLedger;
use crate::pools::PoolKind;
use crate::schedule;

impl<L: TokenLedger, A: Authority> CustodyEngine<L, A> {
    /// Pays the caller every team tranche unlocked and not yet claimed.
    ///
    /// The caller is the team wallet itself. Returns the amount released.
    ///
    /// # Errors
    ///
    /// In order: [`StateError::NotStarted`] if the team pool is unfunded;
    /// [`StateError::NotWhitelisted`] / [`StateError::Blacklisted`];
    /// [`StateError::NotTeamWallet`]; [`StateError::TooEarly`] before the
    /// cliff; [`StateError::NothingToWithdraw`] once fully claimed;
    /// [`StateError::TooEarly`] when no new tranche has unlocked; and
    /// [`StateError::InsufficientPoolBalance`] if the pool holds less than
    /// the release.
    pub fn withdraw_team_tokens(&mut self, ctx: &CallContext) -> Result<Amount, CustodyError> {
        if !self.state.pools.get(PoolKind::Team).funding_started() {
            return Err(StateError::NotStarted(PoolKind::Team).into());
        }

        let wallet = ctx.caller;
        let record = self
            .state
            .registry
            .get(&wallet)
            .ok_or(StateError::NotWhitelisted)?;
        if !record.is_whitelisted {
            return Err(StateError::NotWhitelisted.into());
        }
        if record.is_blacklisted {
            return Err(StateError::Blacklisted.into());
        }
        if !record.is_team_wallet {
            return Err(StateError::NotTeamWallet.into());
        }
        let release = schedule::team_release(record, ctx.now)?;

        let checkpoint = self.checkpoint(&[wallet], Some(PoolKind::Team));
        self.state
            .pools
            .get_mut(PoolKind::Team)
            .record_withdrawal(release.amount)?;
        let record = self.state.registry.entry(wallet);
        record.holding_amount = record
            .holding_amount
            .checked_sub(release.amount)
            .ok_or(CustodyError::ArithmeticOverflow)?;
        record.team_withdrawal_count = release.new_withdrawal_count;

        self.settle(checkpoint, |ledger| ledger.transfer_out(&wallet, release.amount))?;

        info!(
            %wallet,
            amount = %release.amount,
            tranches = release.tranches,
            withdrawal_count = release.new_withdrawal_count,
            "team tokens released"
        );
        self.emit(CustodyEvent::TeamTokensReleased {
            wallet,
            amount: release.amount,
            tranches: release.tranches,
            withdrawal_count: release.new_withdrawal_count,
        });
        Ok(release.amount)
    }
}
