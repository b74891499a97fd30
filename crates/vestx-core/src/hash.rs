use crate::constants::VESTING_POOL_LABEL;
use crate::types::{Address, TxId};

/// Compute BLAKE3 hash of arbitrary bytes → 32-byte array.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Deterministic address for a human-readable label.
///
/// Used for well-known accounts (the vesting pool) and for deriving test and
/// demo identities from the CLI.
pub fn address_from_label(label: &str) -> Address {
    Address::from_bytes(blake3_hash(label.as_bytes()))
}

/// Address of the vesting pool that holds all unclaimed supply.
pub fn vesting_pool_address() -> Address {
    address_from_label(VESTING_POOL_LABEL)
}

/// Derive a TxId from the canonical transaction body bytes using BLAKE3.
pub fn tx_id_from_body(body_bytes: &[u8]) -> TxId {
    TxId::from_bytes(blake3_hash(body_bytes))
}
