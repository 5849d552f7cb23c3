//! # CLI Interface
//!
//! Defines the command-line argument structure for `custody-node` using
//! `clap` derive. Every invocation runs exactly one engine operation
//! against the deployment stored in `--data-dir`.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use custody_engine::{Address, Amount, PoolKind};
use std::path::PathBuf;

/// Token custody operator.
///
/// Holds growth, team and reward pools on behalf of a token deployment,
/// applies their release schedules and keeps a journal of every state
/// change.
#[derive(Parser, Debug)]
#[command(
    name = "custody-node",
    about = "Token custody operator",
    version,
    propagate_version = true
)]
pub struct CustodyCli {
    /// Directory holding the sled database.
    #[arg(
        long,
        short = 'd',
        env = "CUSTODY_DATA_DIR",
        default_value = "./custody-data",
        global = true
    )]
    pub data_dir: PathBuf,

    /// Log output format: pretty or json.
    #[arg(long, env = "CUSTODY_LOG_FORMAT", default_value = "pretty", global = true)]
    pub log_format: String,

    /// Address the operation is performed as.
    #[arg(long, env = "CUSTODY_CALLER", global = true)]
    pub caller: Option<Address>,

    /// RFC 3339 timestamp the operation is evaluated at. Defaults to now.
    #[arg(long, global = true)]
    pub at: Option<DateTime<Utc>>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new deployment with the default tokenomics.
    Init(InitArgs),
    /// Assign the whitelister or rewards-updater slot (owner only).
    Grant(GrantArgs),
    /// Whitelist a wallet and record its snapshot.
    Enroll(EnrollArgs),
    /// Add or remove a wallet from the whitelist.
    Whitelist(ListArgs),
    /// Add or remove a wallet from the blacklist.
    Blacklist(ListArgs),
    /// Pull tokens from the caller into a pool.
    Fund(PoolAmountArgs),
    /// Send unallocated pool tokens to the burn address.
    Burn(PoolAmountArgs),
    /// Release this year's growth tranche to the caller.
    WithdrawGrowth,
    /// Release the caller's vested team tranches.
    WithdrawTeam,
    /// Pay out the caller's credited rewards.
    WithdrawRewards,
    /// Credit one wallet.
    Credit(CreditArgs),
    /// Credit a batch read from a JSON file of `{ "wallet", "amount" }` items.
    CreditBatch(CreditBatchArgs),
    /// Split a weekly emission over eligible holders and credit it.
    Distribute(DistributeArgs),
    /// Move a team wallet's vesting to a new address.
    Migrate(MigrateArgs),
    /// Change the maximum reward batch size.
    SetMaxBatch(SetMaxBatchArgs),
    /// Mint devnet tokens to an address.
    Faucet(FaucetArgs),
    /// Let the custody pull up to `amount` from the caller.
    Approve(ApproveArgs),
    /// Print pools, settings and optionally one wallet record.
    Status(StatusArgs),
    /// Print journaled events.
    Events(EventsArgs),
}

/// Arguments for the `init` subcommand.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Owner of the new deployment.
    #[arg(long)]
    pub owner: Address,

    /// Address the devnet ledger credits pulled tokens to.
    #[arg(long, default_value = "0x00000000000000000000000000000000c0571d7e")]
    pub custody: Address,
}

/// Capability slots that can be granted.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrantedRole {
    Whitelister,
    RewardsUpdater,
}

/// Arguments for the `grant` subcommand.
#[derive(Parser, Debug)]
pub struct GrantArgs {
    /// Slot to assign.
    #[arg(value_enum)]
    pub role: GrantedRole,

    /// Address receiving the slot.
    pub address: Address,
}

/// Arguments for the `enroll` subcommand.
#[derive(Parser, Debug)]
pub struct EnrollArgs {
    /// Wallet to enroll.
    pub wallet: Address,

    /// Enroll as a team wallet.
    #[arg(long)]
    pub team: bool,

    /// Vesting snapshot, required for team wallets.
    #[arg(long, default_value_t = 0)]
    pub snapshot: Amount,
}

/// Arguments for the `whitelist` and `blacklist` subcommands.
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Wallet to update.
    pub wallet: Address,

    /// Remove instead of add.
    #[arg(long)]
    pub remove: bool,
}

/// Arguments for the `fund` and `burn` subcommands.
#[derive(Parser, Debug)]
pub struct PoolAmountArgs {
    /// Target pool: growth, team or reward.
    pub pool: PoolKind,

    /// Amount in base units.
    pub amount: Amount,
}

/// Arguments for the `credit` subcommand.
#[derive(Parser, Debug)]
pub struct CreditArgs {
    /// Wallet to credit.
    pub wallet: Address,

    /// Amount in base units.
    pub amount: Amount,
}

/// Arguments for the `credit-batch` subcommand.
#[derive(Parser, Debug)]
pub struct CreditBatchArgs {
    /// JSON file holding an array of `{ "wallet": "0x..", "amount": n }`.
    pub file: PathBuf,
}

/// Arguments for the `distribute` subcommand.
#[derive(Parser, Debug)]
pub struct DistributeArgs {
    /// Emission to split. Defaults to the weekly cap.
    #[arg(long)]
    pub emission: Option<Amount>,

    /// Compute and print the plan without crediting it.
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `migrate` subcommand.
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    /// Team wallet being retired.
    pub from: Address,

    /// Fresh address taking over its vesting.
    pub to: Address,
}

/// Arguments for the `set-max-batch` subcommand.
#[derive(Parser, Debug)]
pub struct SetMaxBatchArgs {
    /// New maximum number of items per batch.
    pub size: usize,
}

/// Arguments for the `faucet` subcommand.
#[derive(Parser, Debug)]
pub struct FaucetArgs {
    /// Recipient.
    pub to: Address,

    /// Amount in base units.
    pub amount: Amount,
}

/// Arguments for the `approve` subcommand.
#[derive(Parser, Debug)]
pub struct ApproveArgs {
    /// Allowance in base units.
    pub amount: Amount,
}

/// Arguments for the `status` subcommand.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Also print this wallet's record and unlocked tranches.
    #[arg(long)]
    pub wallet: Option<Address>,
}

/// Arguments for the `events` subcommand.
#[derive(Parser, Debug)]
pub struct EventsArgs {
    /// First sequence number to print.
    #[arg(long, default_value_t = 0)]
    pub from: u64,

    /// Maximum number of events to print.
    #[arg(long, default_value_t = 100)]
    pub limit: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        CustodyCli::command().debug_assert();
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = CustodyCli::try_parse_from([
            "custody-node",
            "fund",
            "team",
            "1000",
            "--caller",
            "0x0000000000000000000000000000000000000001",
            "--at",
            "2026-01-01T00:00:00Z",
        ])
        .unwrap();
        assert_eq!(cli.caller, Some(Address::from_low_u64(1)));
        assert!(cli.at.is_some());
        match cli.command {
            Commands::Fund(args) => {
                assert_eq!(args.pool, PoolKind::Team);
                assert_eq!(args.amount, 1_000);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_malformed_address() {
        assert!(CustodyCli::try_parse_from(["custody-node", "enroll", "0x12"]).is_err());
    }
}
