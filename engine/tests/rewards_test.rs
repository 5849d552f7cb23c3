//! Integration tests for the reward pipeline: batch isolation, claiming,
//! and the aggregator feeding batches into the engine.

use chrono::{DateTime, Duration, Utc};
use custody_engine::aggregator::{compute_plan, eligible_snapshot};
use custody_engine::config::WEEKLY_REWARD_EMISSION_CAP;
use custody_engine::{
    Address, Amount, CallContext, CreditRejection, CustodyEngine, CustodyError, CustodyEvent,
    CustodyState, MemoryLedger, PoolKind, RoleTable, StateError, TokenLedger,
};

fn t0() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-03-02T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn addr(n: u64) -> Address {
    Address::from_low_u64(n)
}

const OWNER: u64 = 1;
const UPDATER: u64 = 3;

fn as_owner() -> CallContext {
    CallContext::new(addr(OWNER), t0())
}

fn as_updater(offset: Duration) -> CallContext {
    CallContext::new(addr(UPDATER), t0() + offset)
}

/// Reward pool funded with `pool`, wallets `whitelisted` enrolled.
fn setup(pool: Amount, whitelisted: &[u64]) -> CustodyEngine<MemoryLedger, RoleTable> {
    let mut roles = RoleTable::new(addr(OWNER));
    roles.grant_rewards_updater(&addr(OWNER), addr(UPDATER)).unwrap();
    let mut ledger = MemoryLedger::new(addr(0xc0de));
    ledger.mint(addr(OWNER), pool);
    ledger.approve(addr(OWNER), pool);

    let mut e = CustodyEngine::new(CustodyState::default(), ledger, roles);
    e.fund(&as_owner(), PoolKind::Reward, pool).unwrap();
    for n in whitelisted {
        e.enroll(&as_owner(), addr(*n), false, 0).unwrap();
    }
    e.drain_events();
    e
}

#[test]
fn batch_isolates_failing_items() {
    let mut e = setup(10_000_000, &[10]);
    let report = e
        .credit_batch(
            &as_updater(Duration::zero()),
            &[addr(10), addr(11), addr(12)],
            &[1_000, 2_000, 3_000],
        )
        .unwrap();

    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 2);
    assert_eq!(
        report.rejected().collect::<Vec<_>>(),
        vec![
            (addr(11), CreditRejection::NotWhitelisted),
            (addr(12), CreditRejection::NotWhitelisted),
        ]
    );

    let events = e.drain_events();
    let successes = events
        .iter()
        .filter(|ev| matches!(ev, CustodyEvent::RewardCredited { .. }))
        .count();
    let failures: Vec<_> = events
        .iter()
        .filter_map(|ev| match ev {
            CustodyEvent::RewardCreditFailed { reason, batch_id, .. } => {
                assert_eq!(*batch_id, report.batch_id);
                Some(*reason)
            }
            _ => None,
        })
        .collect();
    assert_eq!(successes, 1);
    assert_eq!(failures, vec![CreditRejection::NotWhitelisted; 2]);

    assert_eq!(e.wallet(&addr(10)).unwrap().current_rewards_amount, 1_000);
    assert!(e.wallet(&addr(11)).is_none());
    assert_eq!(e.reward_distributed_total(), 1_000);
}

#[test]
fn custody_check_is_per_item_and_claims_are_bounded() {
    let mut e = setup(1_500, &[10, 11, 12]);
    let report = e
        .credit_batch(
            &as_updater(Duration::zero()),
            &[addr(10), addr(11), addr(12)],
            &[1_000, 1_000, 400],
        )
        .unwrap();
    assert_eq!(report.succeeded(), 3);
    assert_eq!(e.reward_distributed_total(), 2_400);

    // Claims draw real custody, so the pool can never pay out more than it holds.
    assert_eq!(e.withdraw_rewards(&CallContext::new(addr(10), t0())), Ok(1_000));
    assert!(matches!(
        e.withdraw_rewards(&CallContext::new(addr(11), t0())),
        Err(CustodyError::State(StateError::InsufficientPoolBalance { available: 500, .. }))
    ));
    assert_eq!(e.wallet(&addr(11)).unwrap().current_rewards_amount, 1_000);
    assert_eq!(e.withdraw_rewards(&CallContext::new(addr(12), t0())), Ok(400));
    assert_eq!(e.pool(PoolKind::Reward).burnable(), 0);
}

#[test]
fn single_credit_above_custody_is_pool_exhausted() {
    let mut e = setup(500, &[10]);
    let report = e
        .credit_single(&as_updater(Duration::zero()), addr(10), 501)
        .unwrap();
    assert_eq!(report.outcomes[0].result, Err(CreditRejection::PoolExhausted));
    assert_eq!(e.wallet(&addr(10)).unwrap().total_rewards_amount, 0);
}

#[test]
fn weekly_cap_applies_per_wallet() {
    let mut e = setup(100_000_000, &[10]);
    let report = e
        .credit_single(
            &as_updater(Duration::zero()),
            addr(10),
            WEEKLY_REWARD_EMISSION_CAP + 1,
        )
        .unwrap();
    assert_eq!(
        report.outcomes[0].result,
        Err(CreditRejection::SingleWalletExceedsWeeklyCap)
    );
    let report = e
        .credit_single(&as_updater(Duration::zero()), addr(10), WEEKLY_REWARD_EMISSION_CAP)
        .unwrap();
    assert!(report.outcomes[0].is_success());
}

#[test]
fn claim_then_repeat_claims_are_no_ops() {
    let mut e = setup(10_000, &[10]);
    e.credit_single(&as_updater(Duration::zero()), addr(10), 700)
        .unwrap();
    e.drain_events();

    let wallet = CallContext::new(addr(10), t0() + Duration::hours(1));
    assert_eq!(e.withdraw_rewards(&wallet), Ok(700));
    assert_eq!(e.ledger().balance_of(&addr(10)), 700);
    assert_eq!(e.drain_events().len(), 1);

    let snapshot = e.state().clone();
    for _ in 0..5 {
        assert_eq!(e.withdraw_rewards(&wallet), Ok(0));
    }
    assert_eq!(e.state(), &snapshot);
    assert!(e.events().is_empty());

    let record = e.wallet(&addr(10)).unwrap();
    assert_eq!(record.total_rewards_amount, 700);
    assert!(record.rewards_balanced());
}

#[test]
fn credited_rewards_cannot_be_burned() {
    let mut e = setup(1_000, &[10]);
    e.credit_single(&as_updater(Duration::zero()), addr(10), 600)
        .unwrap();
    assert!(e.withdraw_to_burn(&as_owner(), PoolKind::Reward, 401).is_err());
    e.withdraw_to_burn(&as_owner(), PoolKind::Reward, 400).unwrap();
    assert_eq!(
        e.withdraw_rewards(&CallContext::new(addr(10), t0())),
        Ok(600)
    );
    assert_eq!(e.pool(PoolKind::Reward).in_custody(), 0);
}

#[test]
fn aggregator_plan_feeds_chunked_batches() {
    let holders: [u64; 5] = [10, 11, 12, 13, 14];
    let mut e = setup(50_000_000, &holders);
    for (i, n) in holders.iter().enumerate() {
        e.ledger_mut().mint(addr(*n), (i as Amount + 1) * 1_000);
    }
    e.set_max_batch_size(&as_owner(), 2).unwrap();

    let snapshot = eligible_snapshot(&e.state().registry, e.ledger());
    assert_eq!(snapshot.len(), holders.len());
    let plan = compute_plan(&snapshot, WEEKLY_REWARD_EMISSION_CAP, e.tokenomics()).unwrap();
    assert!(plan.total <= WEEKLY_REWARD_EMISSION_CAP);

    let batches = plan.batches(e.max_batch_size());
    assert_eq!(batches.len(), 3);
    for (wallets, amounts) in &batches {
        let report = e
            .credit_batch(&as_updater(Duration::zero()), wallets, amounts)
            .unwrap();
        assert_eq!(report.failed(), 0);
    }
    assert_eq!(e.reward_distributed_total(), plan.total);

    // Six days on the wallets are still cooling down; at seven they are not.
    let too_soon = plan.batches(2);
    let report = e
        .credit_batch(&as_updater(Duration::days(6)), &too_soon[0].0, &too_soon[0].1)
        .unwrap();
    assert!(report
        .outcomes
        .iter()
        .all(|o| o.result == Err(CreditRejection::TooSoon)));
    let report = e
        .credit_batch(&as_updater(Duration::days(7)), &too_soon[0].0, &too_soon[0].1)
        .unwrap();
    assert_eq!(report.succeeded(), 2);
}
