use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::{ConflictableTransactionResult, TransactionError, Transactional};

use vestx_core::account::Account;
use vestx_core::category::Category;
use vestx_core::error::VestxError;
use vestx_core::transaction::Receipt;
use vestx_core::types::{Address, RoleId, Timestamp, TxId};
use vestx_vesting::{CapEntry, LedgerConfig, VestingSchedule};

const META_CONFIG: &str = "ledger_config";
const META_GENESIS_AT: &str = "genesis_at";

fn storage<E: std::fmt::Display>(e: E) -> VestxError {
    VestxError::Storage(e.to_string())
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, VestxError> {
    bincode::serialize(value).map_err(|e| VestxError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, VestxError> {
    bincode::deserialize(bytes).map_err(|e| VestxError::Serialization(e.to_string()))
}

/// `beneficiary ‖ category`: schedules of one beneficiary share a prefix.
pub fn schedule_key(beneficiary: &Address, category: Category) -> [u8; 33] {
    let mut key = [0u8; 33];
    key[..32].copy_from_slice(beneficiary.as_bytes());
    key[32] = category.as_u8();
    key
}

/// `role ‖ account`: members of one role share a prefix.
pub fn role_key(role: &RoleId, account: &Address) -> [u8; 64] {
    let mut key = [0u8; 64];
    key[..32].copy_from_slice(role.as_bytes());
    key[32..].copy_from_slice(account.as_bytes());
    key
}

// ── StateBatch ────────────────────────────────────────────────────────────────

/// A set of writes committed together by `StateDb::commit`.
///
/// Keyed maps, so a record touched twice within one transaction is written
/// once with its final value.
#[derive(Default, Debug)]
pub struct StateBatch {
    pub accounts: BTreeMap<Address, Account>,
    pub schedules: BTreeMap<(Address, Category), VestingSchedule>,
    pub caps: BTreeMap<Category, CapEntry>,
    /// `true` grants membership, `false` revokes it.
    pub roles: BTreeMap<(RoleId, Address), bool>,
    pub receipts: Vec<Receipt>,
    pub meta: BTreeMap<String, Vec<u8>>,
}

impl StateBatch {
    pub fn put_account(&mut self, account: Account) {
        self.accounts.insert(account.address, account);
    }

    pub fn put_schedule(&mut self, schedule: VestingSchedule) {
        self.schedules
            .insert((schedule.beneficiary, schedule.category), schedule);
    }

    pub fn put_cap(&mut self, entry: CapEntry) {
        self.caps.insert(entry.category, entry);
    }

    pub fn set_role(&mut self, role: RoleId, account: Address, member: bool) {
        self.roles.insert((role, account), member);
    }
}

/// Encoded form of a batch, built before entering the sled transaction so
/// the (possibly retried) transaction closure only copies bytes.
#[derive(Default)]
struct EncodedBatch {
    accounts: Vec<(Vec<u8>, Vec<u8>)>,
    schedules: Vec<(Vec<u8>, Vec<u8>)>,
    caps: Vec<(Vec<u8>, Vec<u8>)>,
    role_grants: Vec<Vec<u8>>,
    role_revokes: Vec<Vec<u8>>,
    receipts: Vec<(Vec<u8>, Vec<u8>)>,
    meta: Vec<(Vec<u8>, Vec<u8>)>,
}

impl EncodedBatch {
    fn from_batch(batch: &StateBatch) -> Result<Self, VestxError> {
        let mut out = EncodedBatch::default();
        for acc in batch.accounts.values() {
            out.accounts.push((acc.address.as_bytes().to_vec(), encode(acc)?));
        }
        for s in batch.schedules.values() {
            out.schedules
                .push((schedule_key(&s.beneficiary, s.category).to_vec(), encode(s)?));
        }
        for c in batch.caps.values() {
            out.caps.push((vec![c.category.as_u8()], encode(c)?));
        }
        for ((role, account), member) in &batch.roles {
            let key = role_key(role, account).to_vec();
            if *member {
                out.role_grants.push(key);
            } else {
                out.role_revokes.push(key);
            }
        }
        for r in &batch.receipts {
            out.receipts.push((r.tx_id.as_bytes().to_vec(), encode(r)?));
        }
        for (k, v) in &batch.meta {
            out.meta.push((k.as_bytes().to_vec(), v.clone()));
        }
        Ok(out)
    }
}

// ── StateDb ───────────────────────────────────────────────────────────────────

/// Persistent state database backed by sled (pure-Rust, no C dependencies).
///
/// Named trees:
///   accounts     Address bytes            → bincode(Account)
///   schedules    Address ‖ category byte  → bincode(VestingSchedule)
///   caps         category byte            → bincode(CapEntry)
///   roles        RoleId ‖ Address         → [] (membership set)
///   receipts     TxId bytes               → bincode(Receipt)
///   meta         utf8 key bytes           → raw bytes
///
/// Writers that read state, check it and then `commit` must hold
/// `lock_writes` for the whole sequence. The lock lives here, not in the
/// engine, so every engine sharing one `StateDb` is serialized.
pub struct StateDb {
    db: sled::Db,
    write_lock: Mutex<()>,
    accounts: sled::Tree,
    schedules: sled::Tree,
    caps: sled::Tree,
    roles: sled::Tree,
    receipts: sled::Tree,
    meta: sled::Tree,
}

impl StateDb {
    /// Open or create the state database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, VestxError> {
        let db = sled::open(path).map_err(storage)?;
        Self::from_db(db)
    }

    /// In-memory database removed on drop. Used by tests and dry runs.
    pub fn open_temporary() -> Result<Self, VestxError> {
        let db = sled::Config::new().temporary(true).open().map_err(storage)?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Self, VestxError> {
        let accounts  = db.open_tree("accounts").map_err(storage)?;
        let schedules = db.open_tree("schedules").map_err(storage)?;
        let caps      = db.open_tree("caps").map_err(storage)?;
        let roles     = db.open_tree("roles").map_err(storage)?;
        let receipts  = db.open_tree("receipts").map_err(storage)?;
        let meta      = db.open_tree("meta").map_err(storage)?;
        Ok(Self {
            db,
            write_lock: Mutex::new(()),
            accounts,
            schedules,
            caps,
            roles,
            receipts,
            meta,
        })
    }

    /// Exclusive read-check-commit section for this database.
    pub fn lock_writes(&self) -> Result<MutexGuard<'_, ()>, VestxError> {
        self.write_lock
            .lock()
            .map_err(|_| VestxError::Storage("write lock poisoned".into()))
    }

    // ── Accounts ─────────────────────────────────────────────────────────────

    pub fn get_account(&self, address: &Address) -> Result<Option<Account>, VestxError> {
        match self.accounts.get(address.as_bytes()).map_err(storage)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// All stored accounts, in address order.
    pub fn iter_accounts(&self) -> Result<Vec<Account>, VestxError> {
        let mut out = Vec::new();
        for item in self.accounts.iter() {
            let (_, bytes) = item.map_err(storage)?;
            out.push(decode(&bytes)?);
        }
        Ok(out)
    }

    // ── Vesting schedules ────────────────────────────────────────────────────

    pub fn get_schedule(
        &self,
        beneficiary: &Address,
        category: Category,
    ) -> Result<Option<VestingSchedule>, VestxError> {
        match self
            .schedules
            .get(schedule_key(beneficiary, category))
            .map_err(storage)?
        {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Every schedule held by `beneficiary`, in category order.
    pub fn schedules_of(&self, beneficiary: &Address) -> Result<Vec<VestingSchedule>, VestxError> {
        let mut out = Vec::new();
        for item in self.schedules.scan_prefix(beneficiary.as_bytes()) {
            let (_, bytes) = item.map_err(storage)?;
            out.push(decode(&bytes)?);
        }
        Ok(out)
    }

    // ── Category caps ────────────────────────────────────────────────────────

    pub fn get_cap(&self, category: Category) -> Result<Option<CapEntry>, VestxError> {
        match self.caps.get([category.as_u8()]).map_err(storage)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    // ── Roles ────────────────────────────────────────────────────────────────

    pub fn has_role(&self, role: &RoleId, account: &Address) -> Result<bool, VestxError> {
        self.roles
            .contains_key(role_key(role, account))
            .map_err(storage)
    }

    pub fn role_members(&self, role: &RoleId) -> Result<BTreeSet<Address>, VestxError> {
        let mut out = BTreeSet::new();
        for item in self.roles.scan_prefix(role.as_bytes()) {
            let (key, _) = item.map_err(storage)?;
            let mut arr = [0u8; 32];
            arr.copy_from_slice(&key[32..64]);
            out.insert(Address::from_bytes(arr));
        }
        Ok(out)
    }

    // ── Receipts ─────────────────────────────────────────────────────────────

    pub fn has_receipt(&self, tx_id: &TxId) -> Result<bool, VestxError> {
        self.receipts.contains_key(tx_id.as_bytes()).map_err(storage)
    }

    pub fn get_receipt(&self, tx_id: &TxId) -> Result<Option<Receipt>, VestxError> {
        match self.receipts.get(tx_id.as_bytes()).map_err(storage)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    // ── Meta ─────────────────────────────────────────────────────────────────

    pub fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, VestxError> {
        self.meta
            .get(key.as_bytes())
            .map(|v| v.map(|iv| iv.to_vec()))
            .map_err(storage)
    }

    pub fn get_config(&self) -> Result<Option<LedgerConfig>, VestxError> {
        match self.get_meta(META_CONFIG)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Stage the ledger config and genesis time into `batch`.
    pub fn stage_genesis_meta(
        batch: &mut StateBatch,
        config: &LedgerConfig,
        genesis_at: Timestamp,
    ) -> Result<(), VestxError> {
        batch.meta.insert(META_CONFIG.to_string(), encode(config)?);
        batch
            .meta
            .insert(META_GENESIS_AT.to_string(), genesis_at.to_le_bytes().to_vec());
        Ok(())
    }

    pub fn genesis_at(&self) -> Result<Option<Timestamp>, VestxError> {
        match self.get_meta(META_GENESIS_AT)? {
            Some(bytes) => {
                let arr: [u8; 8] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| VestxError::Serialization("genesis_at is not 8 bytes".into()))?;
                Ok(Some(Timestamp::from_le_bytes(arr)))
            }
            None => Ok(None),
        }
    }

    pub fn is_initialized(&self) -> Result<bool, VestxError> {
        self.meta.contains_key(META_CONFIG.as_bytes()).map_err(storage)
    }

    // ── Commit ───────────────────────────────────────────────────────────────

    /// Write every record in `batch` in a single multi-tree sled transaction:
    /// readers see either none of the batch or all of it.
    pub fn commit(&self, batch: &StateBatch) -> Result<(), VestxError> {
        let enc = EncodedBatch::from_batch(batch)?;

        (
            &self.accounts,
            &self.schedules,
            &self.caps,
            &self.roles,
            &self.receipts,
            &self.meta,
        )
            .transaction(
                |(accounts, schedules, caps, roles, receipts, meta)| -> ConflictableTransactionResult<(), VestxError> {
                    for (k, v) in &enc.accounts {
                        accounts.insert(k.as_slice(), v.as_slice())?;
                    }
                    for (k, v) in &enc.schedules {
                        schedules.insert(k.as_slice(), v.as_slice())?;
                    }
                    for (k, v) in &enc.caps {
                        caps.insert(k.as_slice(), v.as_slice())?;
                    }
                    for k in &enc.role_grants {
                        roles.insert(k.as_slice(), &[] as &[u8])?;
                    }
                    for k in &enc.role_revokes {
                        roles.remove(k.as_slice())?;
                    }
                    for (k, v) in &enc.receipts {
                        receipts.insert(k.as_slice(), v.as_slice())?;
                    }
                    for (k, v) in &enc.meta {
                        meta.insert(k.as_slice(), v.as_slice())?;
                    }
                    Ok(())
                },
            )
            .map_err(|e| match e {
                TransactionError::Abort(e) => e,
                TransactionError::Storage(e) => storage(e),
            })
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), VestxError> {
        self.db.flush().map_err(storage)?;
        Ok(())
    }
}
