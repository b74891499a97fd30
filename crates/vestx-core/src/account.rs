use serde::{Deserialize, Serialize};

use crate::types::{Address, Amount, Nonce};

/// Ledger account as stored in the state DB.
///
/// Accounts come into existence the first time they receive tokens or author
/// a transaction; an address never seen before reads as a zero-balance,
/// zero-nonce account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: Address,
    pub balance: Amount,
    /// Next expected transaction nonce.
    pub nonce: Nonce,
}

impl Account {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            balance: 0,
            nonce: 0,
        }
    }
}
