// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Custody Node
//!
//! Entry point for the `custody-node` binary. Parses CLI arguments,
//! initializes logging, loads the deployment from sled, applies one engine
//! operation and commits the resulting state and events.
//!
//! Results are printed to stdout as JSON; logs go to stderr.
//!
//! - `init`                      — create a deployment
//! - `grant`                     — assign a capability slot
//! - `enroll` / `whitelist` / `blacklist` — maintain the registry
//! - `fund` / `burn`             — move tokens into or out of a pool
//! - `withdraw-growth` / `withdraw-team` / `withdraw-rewards` — releases
//! - `credit` / `credit-batch` / `distribute` — reward crediting
//! - `migrate`                   — move a team wallet's vesting
//! - `set-max-batch`             — reward batch limit
//! - `faucet` / `approve`        — devnet ledger helpers
//! - `status` / `events`         — inspection

mod cli;
mod logging;
mod store;

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::info;

use custody_engine::aggregator::{compute_plan, eligible_snapshot, RewardPlan};
use custody_engine::{
    Address, Amount, BatchReport, CallContext, CustodyEngine, CustodyEvent, CustodyState,
    FundingPool, MemoryLedger, PoolKind, RoleTable, TokenLedger, Tokenomics, WalletRecord,
};

use cli::{Commands, CustodyCli, GrantedRole};
use logging::LogFormat;
use store::CustodyDb;

type Engine = CustodyEngine<MemoryLedger, RoleTable>;

/// What a mutating command prints on success.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
enum CommandOutput {
    Initialized {
        owner: Address,
        custody: Address,
        tokenomics: Tokenomics,
    },
    Done {
        operation: &'static str,
    },
    Released {
        operation: &'static str,
        amount: Amount,
    },
    Credited {
        report: BatchReport,
    },
    Distributed {
        plan: RewardPlan,
        reports: Vec<BatchReport>,
    },
}

/// One item of a `credit-batch` input file.
#[derive(Debug, Deserialize)]
struct BatchItem {
    wallet: Address,
    amount: Amount,
}

#[derive(Debug, Serialize)]
struct StatusReport {
    evaluated_at: DateTime<Utc>,
    owner: Address,
    whitelister: Option<Address>,
    rewards_updater: Option<Address>,
    custody_balance: Amount,
    max_batch_size: usize,
    team_vesting_year: u32,
    wallets: usize,
    pools: Vec<FundingPool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    wallet: Option<WalletStatus>,
}

#[derive(Debug, Serialize)]
struct WalletStatus {
    address: Address,
    token_balance: Amount,
    unlocked_team_tranches: u8,
    record: Option<WalletRecord>,
}

#[derive(Debug, Serialize)]
struct JournalEntry {
    seq: u64,
    event: CustodyEvent,
}

fn main() -> Result<()> {
    let CustodyCli {
        data_dir,
        log_format,
        caller,
        at,
        command,
    } = CustodyCli::parse();

    logging::init_logging(logging::DEFAULT_FILTER, LogFormat::from_str_lossy(&log_format));

    let now = at.unwrap_or_else(Utc::now);
    let db = open_db(&data_dir)?;

    match command {
        Commands::Init(args) => init_deployment(&db, args.owner, args.custody),
        Commands::Status(args) => show_status(&db, args.wallet, now),
        Commands::Events(args) => show_events(&db, args.from, args.limit),
        Commands::Faucet(args) => {
            let output = with_engine(&db, |engine| {
                engine.ledger_mut().mint(args.to, args.amount);
                info!(to = %args.to, amount = %args.amount, "devnet tokens minted");
                Ok(CommandOutput::Done { operation: "faucet" })
            })?;
            print_json(&output)
        }
        command => {
            let caller =
                caller.context("no caller given; pass --caller or set CUSTODY_CALLER")?;
            let ctx = CallContext::new(caller, now);
            let output = with_engine(&db, |engine| execute(engine, &ctx, command))?;
            print_json(&output)
        }
    }
}

fn open_db(data_dir: &Path) -> Result<CustodyDb> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;
    CustodyDb::open(data_dir.join("db"))
        .with_context(|| format!("failed to open database in {}", data_dir.display()))
}

/// Creates a deployment with the default tokenomics.
fn init_deployment(db: &CustodyDb, owner: Address, custody: Address) -> Result<()> {
    if db.is_initialized()? {
        bail!("data directory already holds a deployment");
    }
    if owner.is_zero() || custody.is_zero() {
        bail!("owner and custody addresses must be non-zero");
    }

    let tokenomics = Tokenomics::default();
    let state = CustodyState::new(tokenomics)?;
    let roles = RoleTable::new(owner);
    let ledger = MemoryLedger::new(custody);
    db.commit(&state, &roles, &ledger, &[])
        .context("failed to write new deployment")?;
    info!(%owner, %custody, "deployment initialized");

    print_json(&CommandOutput::Initialized {
        owner,
        custody,
        tokenomics,
    })
}

/// Loads the engine, runs `op`, and commits only if it succeeded. A failed
/// operation leaves the engine untouched, so nothing is written.
fn with_engine<F>(db: &CustodyDb, op: F) -> Result<CommandOutput>
where
    F: FnOnce(&mut Engine) -> Result<CommandOutput>,
{
    let mut engine = load_engine(db)?;
    let output = op(&mut engine)?;

    let events = engine.drain_events();
    let (state, ledger, roles) = engine.into_parts();
    db.commit(&state, &roles, &ledger, &events)
        .context("failed to persist custody state")?;
    info!(events = events.len(), "state committed");
    Ok(output)
}

fn load_engine(db: &CustodyDb) -> Result<Engine> {
    if !db.is_initialized()? {
        bail!("no deployment found; run `custody-node init` first");
    }
    let state = db.load_state().context("failed to load custody state")?;
    let roles = db.load_roles().context("failed to load role table")?;
    let ledger = db.load_ledger().context("failed to load token ledger")?;
    Ok(CustodyEngine::new(state, ledger, roles))
}

fn execute(engine: &mut Engine, ctx: &CallContext, command: Commands) -> Result<CommandOutput> {
    match command {
        Commands::Grant(args) => {
            let roles = engine.authority_mut();
            match args.role {
                GrantedRole::Whitelister => roles.grant_whitelister(&ctx.caller, args.address)?,
                GrantedRole::RewardsUpdater => {
                    roles.grant_rewards_updater(&ctx.caller, args.address)?
                }
            }
            done("grant")
        }
        Commands::Enroll(args) => {
            engine.enroll(ctx, args.wallet, args.team, args.snapshot)?;
            done("enroll")
        }
        Commands::Whitelist(args) => {
            engine.set_whitelisted(ctx, args.wallet, !args.remove)?;
            done("whitelist")
        }
        Commands::Blacklist(args) => {
            engine.set_blacklisted(ctx, args.wallet, !args.remove)?;
            done("blacklist")
        }
        Commands::Fund(args) => {
            engine.fund(ctx, args.pool, args.amount)?;
            done("fund")
        }
        Commands::Burn(args) => {
            engine.withdraw_to_burn(ctx, args.pool, args.amount)?;
            done("burn")
        }
        Commands::WithdrawGrowth => released("withdraw_growth", engine.withdraw_growth(ctx)?),
        Commands::WithdrawTeam => released("withdraw_team", engine.withdraw_team_tokens(ctx)?),
        Commands::WithdrawRewards => {
            released("withdraw_rewards", engine.withdraw_rewards(ctx)?)
        }
        Commands::Credit(args) => Ok(CommandOutput::Credited {
            report: engine.credit_single(ctx, args.wallet, args.amount)?,
        }),
        Commands::CreditBatch(args) => {
            let raw = std::fs::read_to_string(&args.file)
                .with_context(|| format!("failed to read {}", args.file.display()))?;
            let items: Vec<BatchItem> = serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse batch file {}", args.file.display()))?;
            let (wallets, amounts): (Vec<Address>, Vec<Amount>) =
                items.into_iter().map(|i| (i.wallet, i.amount)).unzip();
            Ok(CommandOutput::Credited {
                report: engine.credit_batch(ctx, &wallets, &amounts)?,
            })
        }
        Commands::Distribute(args) => {
            let emission = args
                .emission
                .unwrap_or(engine.tokenomics().weekly_emission_cap);
            let snapshot = eligible_snapshot(&engine.state().registry, engine.ledger());
            let plan = compute_plan(&snapshot, emission, engine.tokenomics())?;
            info!(
                holders = snapshot.len(),
                total = %plan.total,
                undistributed = %plan.undistributed,
                "reward plan computed"
            );

            let mut reports = Vec::new();
            if !args.dry_run {
                for (wallets, amounts) in plan.batches(engine.max_batch_size()) {
                    reports.push(engine.credit_batch(ctx, &wallets, &amounts)?);
                }
            }
            Ok(CommandOutput::Distributed { plan, reports })
        }
        Commands::Migrate(args) => {
            engine.migrate_team_wallet(ctx, args.from, args.to)?;
            done("migrate")
        }
        Commands::SetMaxBatch(args) => {
            engine.set_max_batch_size(ctx, args.size)?;
            done("set_max_batch")
        }
        Commands::Approve(args) => {
            engine.ledger_mut().approve(ctx.caller, args.amount);
            done("approve")
        }
        Commands::Init(_) | Commands::Status(_) | Commands::Events(_) | Commands::Faucet(_) => {
            bail!("command does not run against the engine")
        }
    }
}

fn done(operation: &'static str) -> Result<CommandOutput> {
    Ok(CommandOutput::Done { operation })
}

fn released(operation: &'static str, amount: Amount) -> Result<CommandOutput> {
    Ok(CommandOutput::Released { operation, amount })
}

fn show_status(db: &CustodyDb, wallet: Option<Address>, now: DateTime<Utc>) -> Result<()> {
    let engine = load_engine(db)?;
    let roles = engine.authority();

    let wallet = wallet.map(|address| WalletStatus {
        address,
        token_balance: engine.ledger().balance_of(&address),
        unlocked_team_tranches: engine.unlocked_team_tranches(&address, now),
        record: engine.wallet(&address).cloned(),
    });

    print_json(&StatusReport {
        evaluated_at: now,
        owner: roles.owner(),
        whitelister: roles.whitelister(),
        rewards_updater: roles.rewards_updater(),
        custody_balance: engine.ledger().custody_balance(),
        max_batch_size: engine.max_batch_size(),
        team_vesting_year: engine.current_team_vesting_year(now),
        wallets: engine.state().registry.len(),
        pools: PoolKind::ALL
            .iter()
            .map(|kind| engine.pool(*kind).clone())
            .collect(),
        wallet,
    })
}

fn show_events(db: &CustodyDb, from: u64, limit: usize) -> Result<()> {
    let entries: Vec<JournalEntry> = db
        .events(from, limit)
        .context("failed to read event journal")?
        .into_iter()
        .map(|(seq, event)| JournalEntry { seq, event })
        .collect();
    print_json(&entries)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{rendered}");
    Ok(())
}
