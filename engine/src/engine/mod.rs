//! # Custody Engine
//!
//! [`CustodyEngine`] owns the store object and the two collaborators and
//! exposes every public operation. The operations are grouped by component:
//!
//! ```text
//! whitelist.rs  — enroll, set_whitelisted, set_blacklisted
//! funding.rs    — fund, withdraw_to_burn
//! growth.rs     — withdraw_growth
//! team.rs       — withdraw_team_tokens
//! rewards.rs    — credit_single, credit_batch, withdraw_rewards
//! migration.rs  — migrate_team_wallet
//! ```
//!
//! Every operation that moves tokens follows the same shape: check the
//! caller's capability, validate, check state, take a [`Checkpoint`] of the
//! records about to change, apply the effects, and only then call the
//! token ledger. If the ledger refuses, the checkpoint is restored and the
//! ledger's error is returned unchanged. Events are appended last, so a
//! failed call leaves no trace.

mod funding;
mod growth;
mod migration;
mod rewards;
mod team;
mod whitelist;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::address::Address;
use crate::authority::{Authority, Role};
use crate::config::{Amount, Tokenomics};
use crate::error::{CustodyError, TransferError, ValidationError};
use crate::events::CustodyEvent;
use crate::ledger::TokenLedger;
use crate::pools::{FundingPool, PoolKind};
use crate::registry::WalletRecord;
use crate::schedule;
use crate::state::CustodyState;

/// The external inputs of one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    /// Who is calling.
    pub caller: Address,
    /// The hosting ledger's current timestamp.
    pub now: DateTime<Utc>,
}

impl CallContext {
    /// A context for `caller` at `now`.
    pub fn new(caller: Address, now: DateTime<Utc>) -> Self {
        Self { caller, now }
    }
}

// ---------------------------------------------------------------------------
// Checkpoint
// ---------------------------------------------------------------------------

/// Pre-effect copies of the records an operation is about to change.
struct Checkpoint {
    wallets: Vec<(Address, Option<WalletRecord>)>,
    pool: Option<FundingPool>,
}

impl Checkpoint {
    fn capture(state: &CustodyState, wallets: &[Address], pool: Option<PoolKind>) -> Self {
        Self {
            wallets: wallets
                .iter()
                .map(|a| (*a, state.registry.get(a).cloned()))
                .collect(),
            pool: pool.map(|kind| state.pools.get(kind).clone()),
        }
    }

    fn restore(self, state: &mut CustodyState) {
        for (address, record) in self.wallets {
            match record {
                Some(record) => state.registry.insert(address, record),
                None => state.registry.remove(&address),
            }
        }
        if let Some(pool) = self.pool {
            let kind = pool.kind;
            *state.pools.get_mut(kind) = pool;
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The accounting and vesting state machine.
#[derive(Debug)]
pub struct CustodyEngine<L, A> {
    state: CustodyState,
    ledger: L,
    authority: A,
    events: Vec<CustodyEvent>,
}

impl<L: TokenLedger, A: Authority> CustodyEngine<L, A> {
    /// Wraps an existing state with its collaborators.
    pub fn new(state: CustodyState, ledger: L, authority: A) -> Self {
        Self {
            state,
            ledger,
            authority,
            events: Vec::new(),
        }
    }

    // -- accessors ----------------------------------------------------------

    /// The record for `address`, if one exists.
    pub fn wallet(&self, address: &Address) -> Option<&WalletRecord> {
        self.state.registry.get(address)
    }

    /// Counters of one pool.
    pub fn pool(&self, kind: PoolKind) -> &FundingPool {
        self.state.pools.get(kind)
    }

    /// Cumulative rewards credited across all wallets.
    pub fn reward_distributed_total(&self) -> Amount {
        self.state.pools.get(PoolKind::Reward).distributed_total
    }

    /// Maximum items per reward batch.
    pub fn max_batch_size(&self) -> usize {
        self.state.max_batch_size
    }

    /// The deployment's caps and rates.
    pub fn tokenomics(&self) -> &Tokenomics {
        &self.state.tokenomics
    }

    /// The whole store object.
    pub fn state(&self) -> &CustodyState {
        &self.state
    }

    /// The token-ledger collaborator.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Mutable access to the token ledger, for seeding balances outside
    /// any engine operation.
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    /// The capability collaborator.
    pub fn authority(&self) -> &A {
        &self.authority
    }

    /// Mutable access to the capability collaborator.
    pub fn authority_mut(&mut self) -> &mut A {
        &mut self.authority
    }

    /// Events emitted since the last drain, oldest first.
    pub fn events(&self) -> &[CustodyEvent] {
        &self.events
    }

    /// Hands the accumulated events to the caller.
    pub fn drain_events(&mut self) -> Vec<CustodyEvent> {
        std::mem::take(&mut self.events)
    }

    /// Splits the engine back into its parts.
    pub fn into_parts(self) -> (CustodyState, L, A) {
        (self.state, self.ledger, self.authority)
    }

    // -- queries ------------------------------------------------------------

    /// Whole vesting years since the team pool was first funded.
    pub fn current_team_vesting_year(&self, now: DateTime<Utc>) -> u32 {
        schedule::team_vesting_year(self.state.pools.get(PoolKind::Team), now)
    }

    /// Tranches the wallet's own clock has unlocked at `now`, claimed or not.
    pub fn unlocked_team_tranches(&self, address: &Address, now: DateTime<Utc>) -> u8 {
        match self.wallet(address) {
            Some(r) if r.is_team_wallet => r
                .added_to_whitelist_at
                .map_or(0, |at| schedule::unlocked_tranches(at, now)),
            _ => 0,
        }
    }

    // -- configuration ------------------------------------------------------

    /// Sets the maximum number of items one reward batch may carry. Owner only.
    pub fn set_max_batch_size(&mut self, ctx: &CallContext, max: usize) -> Result<(), CustodyError> {
        self.require(ctx, Role::Owner)?;
        if max == 0 {
            return Err(ValidationError::InvalidBatchSize.into());
        }
        self.state.max_batch_size = max;
        info!(max_batch_size = max, "max batch size updated");
        self.emit(CustodyEvent::MaxBatchSizeUpdated {
            max_batch_size: max,
        });
        Ok(())
    }

    // -- shared helpers -----------------------------------------------------

    fn require(&self, ctx: &CallContext, role: Role) -> Result<(), CustodyError> {
        if self.authority.has_capability(&ctx.caller, role) {
            return Ok(());
        }
        debug!(caller = %ctx.caller, %role, "capability check failed");
        Err(CustodyError::Unauthorized {
            caller: ctx.caller,
            role,
        })
    }

    /// Owner or whitelister. Reported as a missing whitelister capability.
    fn require_registrar(&self, ctx: &CallContext) -> Result<(), CustodyError> {
        if self.authority.has_capability(&ctx.caller, Role::Owner) {
            return Ok(());
        }
        self.require(ctx, Role::Whitelister)
    }

    fn checkpoint(&self, wallets: &[Address], pool: Option<PoolKind>) -> Checkpoint {
        Checkpoint::capture(&self.state, wallets, pool)
    }

    /// Issues the external transfer after effects are applied. On failure
    /// the checkpoint is restored and the ledger's error returned.
    fn settle<F>(&mut self, checkpoint: Checkpoint, transfer: F) -> Result<(), CustodyError>
    where
        F: FnOnce(&mut L) -> Result<(), TransferError>,
    {
        if let Err(err) = transfer(&mut self.ledger) {
            warn!(error = %err, "token transfer failed, restoring state");
            checkpoint.restore(&mut self.state);
            return Err(err.into());
        }
        Ok(())
    }

    fn emit(&mut self, event: CustodyEvent) {
        debug!(event = event.name(), "event emitted");
        self.events.push(event);
    }
}
