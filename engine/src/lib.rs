// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Custody Engine — Core Library
//!
//! Holds a fungible token's balances on behalf of a project and releases
//! them according to three independent schedules:
//!
//! - **Growth** — a fixed annual release against a long-horizon pool.
//! - **Team** — a four-year cliff followed by five annual tranches, sized
//!   from each wallet's enrollment snapshot.
//! - **Rewards** — weekly proportional credits submitted in batches by an
//!   off-chain aggregator, claimed by the wallets themselves.
//!
//! ## Architecture
//!
//! ```text
//! config.rs      — protocol constants and per-deployment tokenomics
//! address.rs     — 20-byte account identifiers
//! registry.rs    — wallet records: enrollment, flags, vesting and reward fields
//! pools.rs       — capped, monotonically funded custody pools
//! schedule.rs    — pure release arithmetic for growth and team schedules
//! rewards.rs     — per-item batch outcomes and rejection reasons
//! ledger.rs      — token-ledger collaborator trait + in-memory ledger
//! authority.rs   — capability collaborator trait + default role table
//! events.rs      — events appended after successful operations
//! state.rs       — the explicit store object
//! engine/        — the operations, one file per component
//! shared.rs      — re-entrancy guarded handle around the engine
//! aggregator.rs  — off-chain proportional reward computation
//! ```
//!
//! ## Design Principles
//!
//! 1. Every amount is a `u128` in the token's smallest unit, and every
//!    arithmetic step is checked. Money does not wrap.
//! 2. Time is an input. Operations take a [`CallContext`] carrying the
//!    caller and the ledger's timestamp; nothing reads a clock.
//! 3. Checks, then effects, then the external transfer. A failed transfer
//!    restores the touched records, so single-target calls are atomic.
//! 4. Batch items fail in isolation; a malformed batch fails as a whole.

pub mod address;
pub mod aggregator;
pub mod authority;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod ledger;
pub mod pools;
pub mod registry;
pub mod rewards;
pub mod schedule;
pub mod shared;
pub mod state;

pub use address::Address;
pub use authority::{Authority, Role, RoleTable};
pub use config::{Amount, Tokenomics};
pub use engine::{CallContext, CustodyEngine};
pub use error::{CustodyError, StateError, TransferError, ValidationError};
pub use events::CustodyEvent;
pub use ledger::{MemoryLedger, TokenLedger};
pub use pools::{FundingPool, PoolKind};
pub use registry::{WalletRecord, WalletRegistry};
pub use rewards::{BatchReport, CreditOutcome, CreditRejection};
pub use shared::SharedEngine;
pub use state::CustodyState;
