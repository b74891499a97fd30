//! vestx: command-line front end for a local VestX ledger.
//!
//! Every command opens the sled database under `--data-dir`, does its work
//! and exits. State-changing commands build a `Transaction` for `--from`,
//! using the sender's current nonce, and apply it through the `StateEngine`.
//!
//! Usage:
//!   vestx init           --admin <b58> [--params <json>]
//!   vestx default-params --admin <b58>
//!   vestx address        --label <name>
//!   vestx info
//!   vestx balance        --account <b58>
//!   vestx add-schedule   --from <b58> --category <c> --beneficiary <b58> --amount <tokens> [--start <unix_ts>]
//!   vestx top-up         --from <b58> --category <c> --beneficiary <b58> --amount <tokens>
//!   vestx claim          --from <b58> --category <c> [--beneficiary <b58>]
//!   vestx claimable      --beneficiary <b58> --category <c>
//!   vestx schedule       --beneficiary <b58> --category <c> [--points <n>]
//!   vestx transfer       --from <b58> --to <b58> --amount <tokens>
//!   vestx grant-role     --from <b58> --account <b58> [--role <name|hex>]
//!   vestx revoke-role    --from <b58> --account <b58> [--role <name|hex>]
//!   vestx renounce-role  --from <b58> [--role <name|hex>]
//!   vestx has-role       --account <b58> [--role <name|hex>]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use vestx_core::category::Category;
use vestx_core::constants::{ADMIN_ROLE_NAME, DEFAULT_TIMELINE_POINTS};
use vestx_core::hash::{address_from_label, vesting_pool_address};
use vestx_core::transaction::{Action, Outcome, Receipt, Transaction};
use vestx_core::types::{Address, RoleId, Timestamp};
use vestx_core::units::{format_token_amount, parse_token_amount};
use vestx_genesis::{apply_genesis, GenesisParams};
use vestx_state::{LedgerQuery, StateDb, StateEngine};
use vestx_vesting::release_timeline;

// ── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "vestx",
    version,
    about = "VestX: fixed-supply token ledger with capped, vesting investor allocations"
)]
struct Args {
    /// Directory for the persistent state database.
    #[arg(long, global = true, default_value = "~/.vestx/data")]
    data_dir: PathBuf,

    /// Ledger time override (Unix seconds). Defaults to the system clock.
    #[arg(long, global = true)]
    now: Option<Timestamp>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply genesis to a fresh data directory.
    Init {
        /// Deployer address (base-58); receives ADMIN_ROLE.
        #[arg(long)]
        admin: String,
        /// Genesis params JSON. Defaults are used when omitted.
        #[arg(long)]
        params: Option<PathBuf>,
    },

    /// Print the default genesis params as JSON.
    DefaultParams {
        #[arg(long)]
        admin: String,
    },

    /// Derive a deterministic address from a label.
    Address {
        #[arg(long)]
        label: String,
    },

    /// Print supply, caps and admins.
    Info,

    /// Print an account's balance.
    Balance {
        #[arg(long)]
        account: String,
    },

    /// Create a vesting schedule (ADMIN).
    AddSchedule {
        #[arg(long)]
        from: String,
        /// Category index or name (angel-investor, private-sale, public-sale).
        #[arg(long)]
        category: String,
        #[arg(long)]
        beneficiary: String,
        /// Amount in tokens, e.g. "100000" or "0.5".
        #[arg(long)]
        amount: String,
        /// Vesting start (Unix seconds). Defaults to ledger time.
        #[arg(long)]
        start: Option<Timestamp>,
    },

    /// Increase an existing schedule (ADMIN).
    TopUp {
        #[arg(long)]
        from: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        beneficiary: String,
        #[arg(long)]
        amount: String,
    },

    /// Release vested tokens to the beneficiary.
    Claim {
        #[arg(long)]
        from: String,
        #[arg(long)]
        category: String,
        /// Defaults to `--from`.
        #[arg(long)]
        beneficiary: Option<String>,
    },

    /// Amount a claim would release now.
    Claimable {
        #[arg(long)]
        beneficiary: String,
        #[arg(long)]
        category: String,
    },

    /// Show a schedule and its release timeline.
    Schedule {
        #[arg(long)]
        beneficiary: String,
        #[arg(long)]
        category: String,
        #[arg(long, default_value_t = DEFAULT_TIMELINE_POINTS)]
        points: u32,
    },

    /// Transfer claimed tokens.
    Transfer {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: String,
    },

    /// Grant a role (ADMIN).
    GrantRole {
        #[arg(long)]
        from: String,
        #[arg(long)]
        account: String,
        /// Role name or 64-char hex id.
        #[arg(long, default_value = ADMIN_ROLE_NAME)]
        role: String,
    },

    /// Revoke a role (ADMIN).
    RevokeRole {
        #[arg(long)]
        from: String,
        #[arg(long)]
        account: String,
        #[arg(long, default_value = ADMIN_ROLE_NAME)]
        role: String,
    },

    /// Give up one of your own roles.
    RenounceRole {
        #[arg(long)]
        from: String,
        #[arg(long, default_value = ADMIN_ROLE_NAME)]
        role: String,
    },

    /// Check role membership.
    HasRole {
        #[arg(long)]
        account: String,
        #[arg(long, default_value = ADMIN_ROLE_NAME)]
        role: String,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn,vestx=info")),
        )
        .init();

    let args = Args::parse();
    let now = args.now.unwrap_or_else(|| chrono::Utc::now().timestamp());

    match &args.command {
        Command::DefaultParams { admin } => {
            let params = GenesisParams::default_for(parse_address(admin)?);
            println!("{}", params.to_json_pretty()?);
            return Ok(());
        }
        Command::Address { label } => {
            println!("{}", address_from_label(label));
            return Ok(());
        }
        _ => {}
    }

    // ── State database ────────────────────────────────────────────────────────
    let data_dir = expand_tilde(&args.data_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;
    let db = Arc::new(StateDb::open(&data_dir).context("opening state database")?);

    match args.command {
        Command::Init { admin, params } => cmd_init(&db, &admin, params.as_deref(), now),
        Command::Info => cmd_info(&db),
        Command::Balance { account } => {
            let account = parse_address(&account)?;
            let bal = LedgerQuery::new(&db).balance_of(&account)?;
            println!("Account:  {}", account);
            println!("Balance:  {} tokens  ({} base units)", format_token_amount(bal), bal);
            Ok(())
        }
        Command::AddSchedule { from, category, beneficiary, amount, start } => {
            let action = Action::AddVestingSchedule {
                category: parse_category(&category)?,
                beneficiary: parse_address(&beneficiary)?,
                amount: parse_token_amount(&amount)?,
                start_time: start.unwrap_or(now),
            };
            submit(&db, &from, vec![action], now)
        }
        Command::TopUp { from, category, beneficiary, amount } => {
            let action = Action::TopUpVestingSchedule {
                category: parse_category(&category)?,
                beneficiary: parse_address(&beneficiary)?,
                amount: parse_token_amount(&amount)?,
            };
            submit(&db, &from, vec![action], now)
        }
        Command::Claim { from, category, beneficiary } => {
            let beneficiary = parse_address(beneficiary.as_deref().unwrap_or(&from))?;
            let action = Action::Claim {
                beneficiary,
                category: parse_category(&category)?,
            };
            submit(&db, &from, vec![action], now)
        }
        Command::Claimable { beneficiary, category } => {
            let beneficiary = parse_address(&beneficiary)?;
            let category = Category::try_from(parse_category(&category)?)?;
            let amount = LedgerQuery::new(&db).claimable(&beneficiary, category, now)?;
            println!("{}", format_token_amount(amount));
            Ok(())
        }
        Command::Schedule { beneficiary, category, points } => {
            cmd_schedule(&db, &beneficiary, &category, points, now)
        }
        Command::Transfer { from, to, amount } => {
            let action = Action::Transfer {
                to: parse_address(&to)?,
                amount: parse_token_amount(&amount)?,
            };
            submit(&db, &from, vec![action], now)
        }
        Command::GrantRole { from, account, role } => {
            let action = Action::GrantRole {
                role: parse_role(&role)?,
                account: parse_address(&account)?,
            };
            submit(&db, &from, vec![action], now)
        }
        Command::RevokeRole { from, account, role } => {
            let action = Action::RevokeRole {
                role: parse_role(&role)?,
                account: parse_address(&account)?,
            };
            submit(&db, &from, vec![action], now)
        }
        Command::RenounceRole { from, role } => {
            let action = Action::RenounceRole { role: parse_role(&role)? };
            submit(&db, &from, vec![action], now)
        }
        Command::HasRole { account, role } => {
            let held = LedgerQuery::new(&db).has_role(&parse_role(&role)?, &parse_address(&account)?)?;
            println!("{held}");
            Ok(())
        }
        Command::DefaultParams { .. } | Command::Address { .. } => Ok(()),
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn cmd_init(db: &StateDb, admin: &str, params_path: Option<&Path>, now: Timestamp) -> anyhow::Result<()> {
    let admin = parse_address(admin)?;
    let params = match params_path {
        Some(p) => {
            let json = std::fs::read_to_string(p)
                .with_context(|| format!("reading genesis params from {}", p.display()))?;
            let params = GenesisParams::from_json(&json).context("parsing genesis params JSON")?;
            if params.admin != admin {
                bail!("--admin {} does not match params admin {}", admin, params.admin);
            }
            params
        }
        None => GenesisParams {
            genesis_timestamp: now,
            ..GenesisParams::default_for(admin)
        },
    };

    let accounts = apply_genesis(db, &params).context("applying genesis")?;
    println!("Genesis applied.");
    println!("Admin:         {}", accounts.admin);
    println!("Vesting pool:  {}", accounts.vesting_pool);
    println!("Supply:        {} tokens", format_token_amount(params.initial_supply));
    Ok(())
}

fn cmd_info(db: &StateDb) -> anyhow::Result<()> {
    let q = LedgerQuery::new(db);
    let pool = vesting_pool_address();
    println!("Initial supply:  {} tokens", format_token_amount(q.initial_supply()?));
    println!("Total supply:    {} tokens", format_token_amount(q.total_supply()?));
    println!("Vesting pool:    {}  ({} tokens)", pool, format_token_amount(q.balance_of(&pool)?));
    println!();
    println!("{:<22} {:>18} {:>18} {:>18}", "Category", "Cap", "Allocated", "Remaining");
    for c in Category::ALL {
        let cap = q.cap_of(c)?;
        let allocated = q.allocated(c)?;
        println!(
            "{:<22} {:>18} {:>18} {:>18}",
            c.to_string(),
            format_token_amount(cap),
            format_token_amount(allocated),
            format_token_amount(cap.saturating_sub(allocated)),
        );
    }
    println!();
    for admin in q.role_members(&vestx_core::types::ADMIN_ROLE)? {
        println!("Admin:           {}", admin);
    }
    Ok(())
}

fn cmd_schedule(
    db: &StateDb,
    beneficiary: &str,
    category: &str,
    points: u32,
    now: Timestamp,
) -> anyhow::Result<()> {
    let beneficiary = parse_address(beneficiary)?;
    let category = Category::try_from(parse_category(category)?)?;
    let q = LedgerQuery::new(db);
    println!("{}", q.describe(&beneficiary, category, now)?);

    let Some(schedule) = q.schedule(&beneficiary, category)? else {
        return Ok(());
    };
    println!();
    for p in release_timeline(&schedule, points) {
        let marker = if p.at <= now { "*" } else { " " };
        println!(
            "{} {:>12}  {}",
            marker,
            p.at,
            format_token_amount(p.vested)
        );
    }
    Ok(())
}

/// Build a transaction for `from` at its current nonce, apply it and print
/// the receipt.
fn submit(db: &Arc<StateDb>, from: &str, actions: Vec<Action>, now: Timestamp) -> anyhow::Result<()> {
    let from = parse_address(from)?;
    let engine = StateEngine::open(Arc::clone(db)).context("opening ledger")?;
    let nonce = db.get_account(&from)?.map(|a| a.nonce).unwrap_or(0);
    let tx = Transaction::new(from, nonce, now, actions)?;

    match engine.apply(&tx, now) {
        Ok(receipt) => {
            db.flush()?;
            print_receipt(&receipt);
            Ok(())
        }
        Err(e) => {
            warn!(tx_id = %tx.tx_id, error = %e, "transaction rejected");
            Err(e.into())
        }
    }
}

fn print_receipt(receipt: &Receipt) {
    println!("Applied: {}", receipt.tx_id);
    for outcome in &receipt.outcomes {
        match outcome {
            Outcome::Transferred { to, amount } => {
                println!("  transferred {} to {}", format_token_amount(*amount), to)
            }
            Outcome::ScheduleAdded { beneficiary, category, amount } => println!(
                "  schedule added: {} {} for {}",
                format_token_amount(*amount),
                category,
                beneficiary
            ),
            Outcome::ScheduleToppedUp { beneficiary, category, amount, new_total } => println!(
                "  schedule topped up: +{} {} for {} (total {})",
                format_token_amount(*amount),
                category,
                beneficiary,
                format_token_amount(*new_total)
            ),
            Outcome::Claimed { beneficiary, category, amount } => println!(
                "  claimed {} {} to {}",
                format_token_amount(*amount),
                category,
                beneficiary
            ),
            Outcome::RoleGranted { role, account } => println!("  granted {} to {}", role, account),
            Outcome::RoleRevoked { role, account } => println!("  revoked {} from {}", role, account),
        }
    }
    info!(tx_id = %receipt.tx_id, outcomes = receipt.outcomes.len(), "receipt");
}

// ── Argument parsing ──────────────────────────────────────────────────────────

fn parse_address(s: &str) -> anyhow::Result<Address> {
    Address::from_b58(s).with_context(|| format!("parsing address {s:?}"))
}

/// Raw category byte. Numbers pass through unchecked so the engine reports
/// out-of-table values itself.
fn parse_category(s: &str) -> anyhow::Result<u8> {
    if let Ok(n) = s.parse::<u8>() {
        return Ok(n);
    }
    let c: Category = s.parse().with_context(|| format!("parsing category {s:?}"))?;
    Ok(c.as_u8())
}

/// A 64-char hex string is taken as a raw role id; anything else is a name.
fn parse_role(s: &str) -> anyhow::Result<RoleId> {
    if s.len() == 64 && s.chars().all(|c| c.is_ascii_hexdigit()) {
        return RoleId::from_hex(s).with_context(|| format!("parsing role id {s:?}"));
    }
    Ok(RoleId::from_name(s))
}

/// Expand a leading `~` to the user's home directory (`HOME` or `USERPROFILE`).
fn expand_tilde(path: &Path) -> PathBuf {
    let home = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")).ok();
    expand_tilde_with(path, home.as_deref())
}

fn expand_tilde_with(path: &Path, home: Option<&str>) -> PathBuf {
    match (path.strip_prefix("~"), home) {
        (Ok(stripped), Some(home)) => PathBuf::from(home).join(stripped),
        _ => path.to_path_buf(),
    }
}
