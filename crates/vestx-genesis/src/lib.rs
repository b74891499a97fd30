//! vestx-genesis
//!
//! Builds the founding ledger state, writing directly into a `StateDb`
//! without going through the transaction engine:
//!
//! 1. Vesting pool:  the whole initial supply, minted once
//! 2. Category caps: cap derived from supply × bps, nothing allocated
//! 3. Admin role:    granted to the deployer
//! 4. Ledger config: cap table, release curves, duplicate and claim policy
//!
//! All four are committed in one batch. Parameters are validated before
//! anything is written.

pub mod params;

pub use params::GenesisParams;

use tracing::info;

use vestx_core::account::Account;
use vestx_core::category::Category;
use vestx_core::error::VestxError;
use vestx_core::hash::vesting_pool_address;
use vestx_core::types::{Address, ADMIN_ROLE};
use vestx_state::{StateBatch, StateDb};
use vestx_vesting::CapEntry;

/// Well-known accounts created at genesis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenesisAccounts {
    /// First holder of `ADMIN_ROLE`.
    pub admin: Address,
    /// Holds every unclaimed token. Has no key.
    pub vesting_pool: Address,
}

/// Apply genesis to an empty `StateDb`.
///
/// This is the one and only place tokens are created. Fails with
/// `GenesisAlreadyApplied` if the database already holds a ledger.
pub fn apply_genesis(db: &StateDb, params: &GenesisParams) -> Result<GenesisAccounts, VestxError> {
    let guard = db.lock_writes()?;
    if db.is_initialized()? {
        return Err(VestxError::GenesisAlreadyApplied);
    }
    params.validate()?;
    info!(admin = %params.admin, "applying VestX genesis state");

    let config = params.to_ledger_config();
    let accounts = GenesisAccounts {
        admin: params.admin,
        vesting_pool: vesting_pool_address(),
    };
    if accounts.admin == accounts.vesting_pool {
        return Err(VestxError::InvalidConfig("admin cannot be the vesting pool".into()));
    }

    let mut batch = StateBatch::default();

    // ── 1. Mint the supply into the pool ─────────────────────────────────────
    let mut pool = Account::new(accounts.vesting_pool);
    pool.balance = config.initial_supply;
    batch.put_account(pool);
    info!(
        account = %accounts.vesting_pool,
        supply = config.initial_supply,
        "genesis: supply minted to vesting pool"
    );

    // ── 2. Category caps ─────────────────────────────────────────────────────
    for category in Category::ALL {
        let cap = config.cap_of(category)?;
        batch.put_cap(CapEntry::new(category, cap));
        info!(category = ?category, cap, "genesis: category cap");
    }

    // ── 3. Admin role ────────────────────────────────────────────────────────
    batch.set_role(*ADMIN_ROLE, accounts.admin, true);

    // ── 4. Config ────────────────────────────────────────────────────────────
    StateDb::stage_genesis_meta(&mut batch, &config, params.genesis_timestamp)?;

    db.commit(&batch)?;
    drop(guard);

    verify_genesis_supply(db, config.initial_supply)?;

    db.flush()?;
    info!("genesis state committed to disk");

    Ok(accounts)
}

/// Verify that all balances sum to exactly the initial supply.
fn verify_genesis_supply(db: &StateDb, expected: u128) -> Result<(), VestxError> {
    let total = db
        .iter_accounts()?
        .iter()
        .try_fold(0u128, |acc, a| acc.checked_add(a.balance))
        .ok_or(VestxError::MathOverflow)?;

    if total != expected {
        return Err(VestxError::GenesisSupplyMismatch { expected, got: total });
    }

    info!(total, "genesis supply verified");
    Ok(())
}
