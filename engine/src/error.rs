//! Error taxonomy for custody operations.
//!
//! Four families, matching how each one aborts:
//!
//! - [`CustodyError::Unauthorized`] — the caller lacks a capability. Always
//!   aborts the whole call.
//! - [`ValidationError`] — malformed input shape. Always aborts the whole call.
//! - [`StateError`] — a timing, registry or pool precondition is not met.
//!   Aborts single-target calls; inside a batch the equivalent checks are
//!   reported per item as [`CreditRejection`](crate::rewards::CreditRejection).
//! - [`TransferError`] — raised by the token ledger and passed through
//!   unchanged.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::address::Address;
use crate::authority::Role;
use crate::config::Amount;
use crate::pools::PoolKind;

/// Top-level error returned by every engine operation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CustodyError {
    /// The caller does not hold the capability the operation requires.
    #[error("unauthorized: {caller} lacks the {role} capability")]
    Unauthorized {
        /// The address that attempted the call.
        caller: Address,
        /// The capability that was required.
        role: Role,
    },

    /// The call's input is malformed.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A precondition on timing, flags or balances is not met.
    #[error("state precondition failed: {0}")]
    State(#[from] StateError),

    /// The token ledger refused to move funds.
    #[error("token transfer failed: {0}")]
    Transfer(#[from] TransferError),

    /// Another call is already executing inside the engine.
    #[error("re-entrant call rejected: the engine is already executing an operation")]
    Reentrant,

    /// A checked arithmetic step overflowed.
    #[error("arithmetic overflow")]
    ArithmeticOverflow,
}

/// Malformed input. Never isolated per item.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Zero amount, or an amount outside its permitted range.
    #[error("invalid amount")]
    InvalidAmount,

    /// The zero address was supplied where a participant is required.
    #[error("zero address not allowed")]
    ZeroAddress,

    /// Batch wallet and amount lists differ in length.
    #[error("array length mismatch: {wallets} wallets, {amounts} amounts")]
    ArrayLengthMismatch {
        /// Number of wallets submitted.
        wallets: usize,
        /// Number of amounts submitted.
        amounts: usize,
    },

    /// The batch exceeds the configured maximum size.
    #[error("batch too large: {size} items, maximum is {max}")]
    BatchTooLarge {
        /// Number of items submitted.
        size: usize,
        /// Configured maximum.
        max: usize,
    },

    /// A maximum batch size of zero was requested.
    #[error("maximum batch size must be at least 1")]
    InvalidBatchSize,
}

/// A precondition on registry flags, timing or pool balances failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    /// The wallet is already enrolled.
    #[error("wallet already registered")]
    AlreadyRegistered,

    /// The wallet is not whitelisted.
    #[error("wallet not whitelisted")]
    NotWhitelisted,

    /// The wallet is on the deny list.
    #[error("wallet is blacklisted")]
    Blacklisted,

    /// The wallet is not subject to team vesting.
    #[error("wallet is not a team wallet")]
    NotTeamWallet,

    /// The pool has never been funded.
    #[error("{0} pool has not been funded yet")]
    NotStarted(PoolKind),

    /// The schedule does not permit a release yet.
    #[error("too early: next release available at {available_at}")]
    TooEarly {
        /// Earliest timestamp at which the call can succeed.
        available_at: DateTime<Utc>,
    },

    /// Nothing remains in custody for this schedule.
    #[error("{0} pool is exhausted")]
    Exhausted(PoolKind),

    /// Every tranche of this wallet has already been claimed.
    #[error("nothing left to withdraw")]
    NothingToWithdraw,

    /// Funding would push the pool past its cumulative cap.
    #[error("{pool} pool cap exceeded: cap {cap}, funded {funded}, requested {requested}")]
    CapExceeded {
        /// The pool being funded.
        pool: PoolKind,
        /// The pool's cap.
        cap: Amount,
        /// Amount funded so far.
        funded: Amount,
        /// Amount the caller tried to add.
        requested: Amount,
    },

    /// The pool does not hold enough to cover the request.
    #[error("insufficient {pool} pool balance: available {available}, requested {requested}")]
    InsufficientPoolBalance {
        /// The pool being drawn from.
        pool: PoolKind,
        /// Amount that may be drawn.
        available: Amount,
        /// Amount requested.
        requested: Amount,
    },

    /// A team wallet migration precondition failed.
    #[error("migration rejected: {0}")]
    MigrationRejected(MigrationConflict),
}

/// Why a team wallet migration was refused.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MigrationConflict {
    /// The team pool has never been funded.
    #[error("team pool not funded")]
    TeamPoolNotFunded,
    /// The source is not a team wallet.
    #[error("source is not a team wallet")]
    SourceNotTeamWallet,
    /// The source is not whitelisted.
    #[error("source is not whitelisted")]
    SourceNotWhitelisted,
    /// The source is blacklisted.
    #[error("source is blacklisted")]
    SourceBlacklisted,
    /// The destination is the zero address.
    #[error("destination is the zero address")]
    DestinationZero,
    /// Source and destination are the same address.
    #[error("destination equals source")]
    SameAddress,
    /// The destination is already whitelisted.
    #[error("destination already whitelisted")]
    DestinationWhitelisted,
    /// The destination is already a team wallet.
    #[error("destination already a team wallet")]
    DestinationTeamWallet,
    /// The destination is blacklisted.
    #[error("destination is blacklisted")]
    DestinationBlacklisted,
}

/// Failure reported by the token-ledger collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// The source account holds less than the requested amount.
    #[error("insufficient balance: {account} holds {available}, requested {requested}")]
    InsufficientBalance {
        /// Account being debited.
        account: Address,
        /// Its balance.
        available: Amount,
        /// Amount requested.
        requested: Amount,
    },

    /// The source has not approved enough for the custody account to pull.
    #[error("insufficient allowance: {owner} approved {approved}, requested {requested}")]
    InsufficientAllowance {
        /// Account being pulled from.
        owner: Address,
        /// Current allowance.
        approved: Amount,
        /// Amount requested.
        requested: Amount,
    },

    /// Any other refusal, described by the ledger.
    #[error("transfer rejected: {0}")]
    Rejected(String),
}
