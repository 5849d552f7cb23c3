//! Team wallet migration.
//!
//! Moves vesting progress from one address to another. Reward bookkeeping
//! does not move: credited, claimed and claimable rewards stay with the old
//! address.

use tracing::info;

use super::{CallContext, CustodyEngine};
use crate::address::Address;
use crate::authority::{Authority, Role};
use crate::error::{CustodyError, MigrationConflict, StateError};
use crate::events::CustodyEvent;
use crate::ledger::TokenLedger;
use crate::pools::PoolKind;

impl<L: TokenLedger, A: Authority> CustodyEngine<L, A> {
    /// Moves the team vesting position of `from` to `to`. Owner only.
    ///
    /// `to` inherits the holding, the snapshot, the enrollment time and the
    /// claimed tranche count, so its schedule continues exactly where `from`
    /// left off. `from` is zeroed, loses its team and whitelist flags and is
    /// blacklisted.
    ///
    /// # Errors
    ///
    /// [`StateError::MigrationRejected`] naming the first failed
    /// precondition.
    pub fn migrate_team_wallet(
        &mut self,
        ctx: &CallContext,
        from: Address,
        to: Address,
    ) -> Result<(), CustodyError> {
        self.require(ctx, Role::Owner)?;
        self.check_migration(from, to)
            .map_err(StateError::MigrationRejected)?;

        let source = self.state.registry.entry(from);
        let holding_amount = source.holding_amount;
        let snapshot = source.holding_amount_at_whitelist_time;
        let enrolled_at = source.added_to_whitelist_at;
        let claimed = source.team_withdrawal_count;

        source.holding_amount = 0;
        source.holding_amount_at_whitelist_time = 0;
        source.team_withdrawal_count = 0;
        source.is_whitelisted = false;
        source.is_team_wallet = false;
        source.is_blacklisted = true;

        let dest = self.state.registry.entry(to);
        dest.holding_amount = holding_amount;
        dest.holding_amount_at_whitelist_time = snapshot;
        dest.added_to_whitelist_at = enrolled_at;
        dest.team_withdrawal_count = claimed;
        dest.is_whitelisted = true;
        dest.is_team_wallet = true;
        dest.is_blacklisted = false;

        info!(%from, %to, holding_amount = %holding_amount, "team wallet migrated");
        self.emit(CustodyEvent::TeamWalletMigrated {
            from,
            to,
            holding_amount,
        });
        Ok(())
    }

    fn check_migration(&self, from: Address, to: Address) -> Result<(), MigrationConflict> {
        if !self.state.pools.get(PoolKind::Team).funding_started() {
            return Err(MigrationConflict::TeamPoolNotFunded);
        }

        let source = self
            .state
            .registry
            .get(&from)
            .ok_or(MigrationConflict::SourceNotTeamWallet)?;
        if !source.is_team_wallet {
            return Err(MigrationConflict::SourceNotTeamWallet);
        }
        if !source.is_whitelisted {
            return Err(MigrationConflict::SourceNotWhitelisted);
        }
        if source.is_blacklisted {
            return Err(MigrationConflict::SourceBlacklisted);
        }

        if to.is_zero() {
            return Err(MigrationConflict::DestinationZero);
        }
        if to == from {
            return Err(MigrationConflict::SameAddress);
        }
        if let Some(dest) = self.state.registry.get(&to) {
            if dest.is_whitelisted {
                return Err(MigrationConflict::DestinationWhitelisted);
            }
            if dest.is_team_wallet {
                return Err(MigrationConflict::DestinationTeamWallet);
            }
            if dest.is_blacklisted {
                return Err(MigrationConflict::DestinationBlacklisted);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::RoleTable;
    use crate::config::vesting_year;
    use crate::ledger::MemoryLedger;
    use crate::state::CustodyState;
    use chrono::{DateTime, Utc};

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn addr(n: u64) -> Address {
        Address::from_low_u64(n)
    }

    fn as_owner() -> CallContext {
        CallContext::new(addr(1), t0())
    }

    fn engine(fund_team: bool) -> CustodyEngine<MemoryLedger, RoleTable> {
        let mut ledger = MemoryLedger::new(addr(999));
        ledger.mint(addr(1), 5_000_000);
        ledger.approve(addr(1), 5_000_000);
        let mut e = CustodyEngine::new(CustodyState::default(), ledger, RoleTable::new(addr(1)));
        if fund_team {
            e.fund(&as_owner(), PoolKind::Team, 5_000_000).unwrap();
        }
        e.enroll(&as_owner(), addr(10), true, 1_000_000).unwrap();
        e.drain_events();
        e
    }

    fn rejected(conflict: MigrationConflict) -> Result<(), CustodyError> {
        Err(CustodyError::State(StateError::MigrationRejected(conflict)))
    }

    #[test]
    fn requires_funded_team_pool() {
        let mut e = engine(false);
        assert_eq!(
            e.migrate_team_wallet(&as_owner(), addr(10), addr(11)),
            rejected(MigrationConflict::TeamPoolNotFunded)
        );
    }

    #[test]
    fn source_conditions() {
        let mut e = engine(true);
        e.enroll(&as_owner(), addr(20), false, 0).unwrap();
        assert_eq!(
            e.migrate_team_wallet(&as_owner(), addr(20), addr(11)),
            rejected(MigrationConflict::SourceNotTeamWallet)
        );
        assert_eq!(
            e.migrate_team_wallet(&as_owner(), addr(30), addr(11)),
            rejected(MigrationConflict::SourceNotTeamWallet)
        );
        e.set_whitelisted(&as_owner(), addr(10), false).unwrap();
        assert_eq!(
            e.migrate_team_wallet(&as_owner(), addr(10), addr(11)),
            rejected(MigrationConflict::SourceNotWhitelisted)
        );
    }

    #[test]
    fn destination_conditions() {
        let mut e = engine(true);
        assert_eq!(
            e.migrate_team_wallet(&as_owner(), addr(10), Address::ZERO),
            rejected(MigrationConflict::DestinationZero)
        );
        assert_eq!(
            e.migrate_team_wallet(&as_owner(), addr(10), addr(10)),
            rejected(MigrationConflict::SameAddress)
        );
        e.enroll(&as_owner(), addr(11), false, 0).unwrap();
        assert_eq!(
            e.migrate_team_wallet(&as_owner(), addr(10), addr(11)),
            rejected(MigrationConflict::DestinationWhitelisted)
        );
        e.enroll(&as_owner(), addr(13), true, 10).unwrap();
        e.set_whitelisted(&as_owner(), addr(13), false).unwrap();
        assert_eq!(
            e.migrate_team_wallet(&as_owner(), addr(10), addr(13)),
            rejected(MigrationConflict::DestinationTeamWallet)
        );
        e.set_blacklisted(&as_owner(), addr(12), true).unwrap();
        assert_eq!(
            e.migrate_team_wallet(&as_owner(), addr(10), addr(12)),
            rejected(MigrationConflict::DestinationBlacklisted)
        );
    }

    #[test]
    fn vesting_continues_on_new_address() {
        let mut e = engine(true);
        let year4 = CallContext::new(addr(10), t0() + vesting_year() * 4);
        e.withdraw_team_tokens(&year4).unwrap();

        e.migrate_team_wallet(&as_owner(), addr(10), addr(11)).unwrap();
        let new = e.wallet(&addr(11)).unwrap();
        assert_eq!(new.holding_amount, 800_000);
        assert_eq!(new.team_withdrawal_count, 1);
        assert_eq!(new.added_to_whitelist_at, Some(t0()));

        let old = e.wallet(&addr(10)).unwrap();
        assert!(old.is_blacklisted && !old.is_whitelisted && !old.is_team_wallet);
        assert_eq!(old.holding_amount, 0);

        let year5 = CallContext::new(addr(11), t0() + vesting_year() * 5);
        assert_eq!(e.withdraw_team_tokens(&year5), Ok(200_000));
        assert!(e.withdraw_team_tokens(&CallContext::new(addr(10), year5.now)).is_err());
    }

    #[test]
    fn non_owner_cannot_migrate() {
        let mut e = engine(true);
        let ctx = CallContext::new(addr(10), t0());
        assert!(matches!(
            e.migrate_team_wallet(&ctx, addr(10), addr(11)),
            Err(CustodyError::Unauthorized { role: Role::Owner, .. })
        ));
    }
}
