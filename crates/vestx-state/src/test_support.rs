//! Ledger seeding for unit tests in this crate.
//!
//! Writes the same records genesis writes, without depending on the genesis
//! crate.

use rand::RngCore;

use vestx_core::account::Account;
use vestx_core::category::Category;
use vestx_core::constants::UNITS_PER_TOKEN;
use vestx_core::hash::vesting_pool_address;
use vestx_core::types::{Address, Amount, Timestamp, ADMIN_ROLE};
use vestx_vesting::{CapEntry, LedgerConfig};

use crate::db::{StateBatch, StateDb};

pub const NOW: Timestamp = 1_700_000_000;

pub fn addr(b: u8) -> Address {
    Address::from_bytes([b; 32])
}

pub fn random_address() -> Address {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    Address::from_bytes(bytes)
}

pub fn tokens(n: u128) -> Amount {
    n * UNITS_PER_TOKEN
}

pub fn seed_ledger(db: &StateDb, config: &LedgerConfig, admin: Address) {
    let mut batch = StateBatch::default();
    let mut pool = Account::new(vesting_pool_address());
    pool.balance = config.initial_supply;
    batch.put_account(pool);
    for c in Category::ALL {
        batch.put_cap(CapEntry::new(c, config.cap_of(c).unwrap()));
    }
    batch.set_role(*ADMIN_ROLE, admin, true);
    StateDb::stage_genesis_meta(&mut batch, config, NOW).unwrap();
    db.commit(&batch).unwrap();
}
