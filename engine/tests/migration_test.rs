//! Integration tests for team wallet migration.

use chrono::{DateTime, Utc};
use custody_engine::config::vesting_year;
use custody_engine::error::MigrationConflict;
use custody_engine::{
    Address, CallContext, CustodyEngine, CustodyError, CustodyEvent, CustodyState, MemoryLedger,
    PoolKind, RoleTable, StateError, TokenLedger,
};

fn t0() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn addr(n: u64) -> Address {
    Address::from_low_u64(n)
}

const OWNER: u64 = 1;
const UPDATER: u64 = 3;
const OLD: u64 = 40;
const NEW: u64 = 41;

fn as_owner() -> CallContext {
    CallContext::new(addr(OWNER), t0())
}

/// Team and reward pools funded, `OLD` enrolled as a team wallet and
/// credited some rewards.
fn setup() -> CustodyEngine<MemoryLedger, RoleTable> {
    let mut roles = RoleTable::new(addr(OWNER));
    roles.grant_rewards_updater(&addr(OWNER), addr(UPDATER)).unwrap();
    let mut ledger = MemoryLedger::new(addr(0xc0de));
    ledger.mint(addr(OWNER), 20_000_000);
    ledger.approve(addr(OWNER), 20_000_000);

    let mut e = CustodyEngine::new(CustodyState::default(), ledger, roles);
    e.fund(&as_owner(), PoolKind::Team, 10_000_000).unwrap();
    e.fund(&as_owner(), PoolKind::Reward, 10_000_000).unwrap();
    e.enroll(&as_owner(), addr(OLD), true, 1_000_000).unwrap();
    e.credit_single(&CallContext::new(addr(UPDATER), t0()), addr(OLD), 5_000)
        .unwrap();
    e.drain_events();
    e
}

#[test]
fn migration_moves_vesting_but_not_rewards() {
    let mut e = setup();
    let before = e.wallet(&addr(OLD)).unwrap().clone();

    e.migrate_team_wallet(&as_owner(), addr(OLD), addr(NEW))
        .unwrap();

    let new = e.wallet(&addr(NEW)).unwrap();
    assert_eq!(new.holding_amount, before.holding_amount);
    assert_eq!(new.holding_amount_at_whitelist_time, 1_000_000);
    assert_eq!(new.added_to_whitelist_at, before.added_to_whitelist_at);
    assert_eq!(new.team_withdrawal_count, before.team_withdrawal_count);
    assert!(new.is_team_wallet && new.is_whitelisted && !new.is_blacklisted);
    assert_eq!(new.total_rewards_amount, 0);
    assert_eq!(new.current_rewards_amount, 0);

    let old = e.wallet(&addr(OLD)).unwrap();
    assert_eq!(old.total_rewards_amount, before.total_rewards_amount);
    assert_eq!(old.current_rewards_amount, before.current_rewards_amount);
    assert_eq!(old.rewards_withdrawn, before.rewards_withdrawn);
    assert!(!old.is_team_wallet);
    assert!(!old.is_whitelisted);
    assert!(old.is_blacklisted);
    assert_eq!(old.holding_amount, 0);
    assert_eq!(old.holding_amount_at_whitelist_time, 0);
    assert_eq!(old.team_withdrawal_count, 0);

    assert_eq!(
        e.drain_events(),
        vec![CustodyEvent::TeamWalletMigrated {
            from: addr(OLD),
            to: addr(NEW),
            holding_amount: 1_000_000,
        }]
    );
}

#[test]
fn new_address_vests_on_the_original_clock() {
    let mut e = setup();
    e.migrate_team_wallet(&as_owner(), addr(OLD), addr(NEW))
        .unwrap();

    let at_cliff = CallContext::new(addr(NEW), t0() + vesting_year() * 4);
    assert_eq!(e.withdraw_team_tokens(&at_cliff), Ok(200_000));
    assert_eq!(e.ledger().balance_of(&addr(NEW)), 200_000);

    let old_claim = CallContext::new(addr(OLD), at_cliff.now);
    assert_eq!(
        e.withdraw_team_tokens(&old_claim),
        Err(CustodyError::State(StateError::NotWhitelisted))
    );
}

#[test]
fn old_address_cannot_be_migrated_twice() {
    let mut e = setup();
    e.migrate_team_wallet(&as_owner(), addr(OLD), addr(NEW))
        .unwrap();
    assert_eq!(
        e.migrate_team_wallet(&as_owner(), addr(OLD), addr(42)),
        Err(CustodyError::State(StateError::MigrationRejected(
            MigrationConflict::SourceNotTeamWallet
        )))
    );
    assert_eq!(
        e.migrate_team_wallet(&as_owner(), addr(NEW), addr(OLD)),
        Err(CustodyError::State(StateError::MigrationRejected(
            MigrationConflict::DestinationBlacklisted
        )))
    );
}

#[test]
fn failed_migration_changes_nothing() {
    let mut e = setup();
    e.enroll(&as_owner(), addr(NEW), false, 0).unwrap();
    let before = e.state().clone();
    e.drain_events();

    assert!(e
        .migrate_team_wallet(&as_owner(), addr(OLD), addr(NEW))
        .is_err());
    assert_eq!(e.state(), &before);
    assert!(e.events().is_empty());
}

#[test]
fn old_address_claims_rewards_left_behind() {
    let mut e = setup();
    e.migrate_team_wallet(&as_owner(), addr(OLD), addr(NEW))
        .unwrap();
    e.drain_events();

    let old = CallContext::new(addr(OLD), t0());
    assert_eq!(e.withdraw_rewards(&old), Ok(5_000));
    assert_eq!(e.ledger().balance_of(&addr(OLD)), 5_000);
    assert_eq!(
        e.drain_events(),
        vec![CustodyEvent::RewardsWithdrawn {
            wallet: addr(OLD),
            amount: 5_000,
        }]
    );

    let record = e.wallet(&addr(OLD)).unwrap();
    assert!(record.is_blacklisted);
    assert!(record.rewards_balanced());
    assert_eq!(e.withdraw_rewards(&CallContext::new(addr(NEW), t0())), Ok(0));
}
