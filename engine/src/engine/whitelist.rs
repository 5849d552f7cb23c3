//! Enrollment and the allow/deny lists.

use tracing::info;

use super::{CallContext, CustodyEngine};
use crate::address::Address;
use crate::authority::Authority;
use crate::config::Amount;
use crate::error::{CustodyError, StateError, ValidationError};
use crate::events::CustodyEvent;
use crate::ledger::TokenLedger;

impl<L: TokenLedger, A: Authority> CustodyEngine<L, A> {
    /// Enrolls `wallet`, starting its vesting clock at `ctx.now`.
    ///
    /// Team wallets take `snapshot_amount` as their vesting base; it must be
    /// in `(0, team_cap]`. For other wallets the snapshot is ignored and
    /// recorded as zero.
    ///
    /// # Errors
    ///
    /// - [`StateError::AlreadyRegistered`] if the wallet is whitelisted or
    ///   was enrolled before.
    /// - [`StateError::Blacklisted`] if the wallet is on the deny list.
    /// - [`ValidationError::InvalidAmount`] for a team snapshot out of range.
    pub fn enroll(
        &mut self,
        ctx: &CallContext,
        wallet: Address,
        is_team: bool,
        snapshot_amount: Amount,
    ) -> Result<(), CustodyError> {
        self.require_registrar(ctx)?;
        if wallet.is_zero() {
            return Err(ValidationError::ZeroAddress.into());
        }

        if let Some(existing) = self.state.registry.get(&wallet) {
            if existing.is_whitelisted {
                return Err(StateError::AlreadyRegistered.into());
            }
            if existing.is_blacklisted {
                return Err(StateError::Blacklisted.into());
            }
            if existing.was_enrolled() {
                return Err(StateError::AlreadyRegistered.into());
            }
        }

        let snapshot = if is_team {
            if snapshot_amount == 0 || snapshot_amount > self.state.tokenomics.team_cap {
                return Err(ValidationError::InvalidAmount.into());
            }
            snapshot_amount
        } else {
            0
        };

        let record = self.state.registry.entry(wallet);
        record.holding_amount = snapshot;
        record.holding_amount_at_whitelist_time = snapshot;
        record.added_to_whitelist_at = Some(ctx.now);
        record.is_whitelisted = true;
        record.is_team_wallet = is_team;

        info!(%wallet, is_team, snapshot = %snapshot, "wallet enrolled");
        self.emit(CustodyEvent::WalletEnrolled {
            wallet,
            is_team,
            snapshot_amount: snapshot,
            at: ctx.now,
        });
        Ok(())
    }

    /// Sets or clears the whitelist flag.
    ///
    /// Whitelisting an address that was never enrolled starts its clock at
    /// `ctx.now`; an existing clock is never moved.
    ///
    /// # Errors
    ///
    /// - [`StateError::AlreadyRegistered`] when setting a flag already set.
    /// - [`StateError::NotWhitelisted`] when clearing a flag already clear.
    pub fn set_whitelisted(
        &mut self,
        ctx: &CallContext,
        wallet: Address,
        whitelisted: bool,
    ) -> Result<(), CustodyError> {
        self.require_registrar(ctx)?;
        if wallet.is_zero() {
            return Err(ValidationError::ZeroAddress.into());
        }

        let current = self
            .state
            .registry
            .get(&wallet)
            .map_or(false, |r| r.is_whitelisted);
        match (current, whitelisted) {
            (true, true) => return Err(StateError::AlreadyRegistered.into()),
            (false, false) => return Err(StateError::NotWhitelisted.into()),
            _ => {}
        }

        let record = self.state.registry.entry(wallet);
        record.is_whitelisted = whitelisted;
        if whitelisted && record.added_to_whitelist_at.is_none() {
            record.added_to_whitelist_at = Some(ctx.now);
        }

        info!(%wallet, whitelisted, "whitelist updated");
        self.emit(CustodyEvent::WhitelistUpdated {
            wallet,
            whitelisted,
        });
        Ok(())
    }

    /// Sets or clears the deny-list flag. Setting it also clears the
    /// whitelist flag in the same call.
    pub fn set_blacklisted(
        &mut self,
        ctx: &CallContext,
        wallet: Address,
        blacklisted: bool,
    ) -> Result<(), CustodyError> {
        self.require_registrar(ctx)?;
        if wallet.is_zero() {
            return Err(ValidationError::ZeroAddress.into());
        }

        let record = self.state.registry.entry(wallet);
        record.is_blacklisted = blacklisted;
        if blacklisted {
            record.is_whitelisted = false;
        }

        info!(%wallet, blacklisted, "blacklist updated");
        self.emit(CustodyEvent::BlacklistUpdated {
            wallet,
            blacklisted,
        });
        Ok(())
    }
}
