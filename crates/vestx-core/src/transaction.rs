use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::error::VestxError;
use crate::hash::tx_id_from_body;
use crate::types::{Address, Amount, Nonce, RoleId, Timestamp, TxId};

// ── Action ────────────────────────────────────────────────────────────────────

/// Every state-changing operation on the ledger is one of these variants.
///
/// Categories travel as raw `u8` so that out-of-table values reach the engine
/// and are rejected there with `InvalidCategory`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Action {
    // ── Ledger ───────────────────────────────────────────────────────────────

    /// Move tokens from the sender to another holder.
    Transfer {
        to: Address,
        amount: Amount,
    },

    // ── Vesting (ADMIN) ───────────────────────────────────────────────────────

    /// Allocate `amount` from `category`'s cap to `beneficiary`, vesting from
    /// `start_time` along the category's release curve.
    AddVestingSchedule {
        category: u8,
        beneficiary: Address,
        amount: Amount,
        start_time: Timestamp,
    },

    /// Increase an existing schedule's total. Start time and curve are kept.
    TopUpVestingSchedule {
        category: u8,
        beneficiary: Address,
        amount: Amount,
    },

    // ── Vesting (claim policy) ────────────────────────────────────────────────

    /// Release everything vested but not yet claimed to `beneficiary`.
    Claim {
        beneficiary: Address,
        category: u8,
    },

    // ── Access control ────────────────────────────────────────────────────────

    /// Add `account` to `role`. ADMIN only.
    GrantRole {
        role: RoleId,
        account: Address,
    },

    /// Remove `account` from `role`. ADMIN only.
    RevokeRole {
        role: RoleId,
        account: Address,
    },

    /// Drop the sender's own membership of `role`.
    RenounceRole {
        role: RoleId,
    },
}

// ── Transaction ───────────────────────────────────────────────────────────────

/// An authenticated call into the ledger.
///
/// The execution substrate authenticates `from` before the transaction reaches
/// the state engine; the engine trusts it. `tx_id` is BLAKE3 of the canonical
/// bincode serialization of the body (every field except `tx_id`).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub tx_id: TxId,
    /// The account authorizing this transaction.
    pub from: Address,
    /// Must equal the sender's account nonce (replay protection).
    pub nonce: Nonce,
    /// UTC Unix timestamp when this transaction was created.
    pub timestamp: Timestamp,
    /// Applied in order; all succeed or none do.
    pub actions: Vec<Action>,
}

/// The body bytes that are hashed to produce `tx_id`.
#[derive(Serialize)]
pub struct TransactionBody<'a> {
    pub from: &'a Address,
    pub nonce: Nonce,
    pub timestamp: Timestamp,
    pub actions: &'a Vec<Action>,
}

impl Transaction {
    /// Build a transaction and compute its id.
    pub fn new(
        from: Address,
        nonce: Nonce,
        timestamp: Timestamp,
        actions: Vec<Action>,
    ) -> Result<Self, VestxError> {
        let mut tx = Self {
            tx_id: TxId::from_bytes([0u8; 32]),
            from,
            nonce,
            timestamp,
            actions,
        };
        tx.tx_id = tx_id_from_body(&tx.body_bytes()?);
        Ok(tx)
    }

    pub fn body(&self) -> TransactionBody<'_> {
        TransactionBody {
            from: &self.from,
            nonce: self.nonce,
            timestamp: self.timestamp,
            actions: &self.actions,
        }
    }

    /// Serialize the body to canonical bytes (bincode).
    pub fn body_bytes(&self) -> Result<Vec<u8>, VestxError> {
        bincode::serialize(&self.body()).map_err(|e| VestxError::Serialization(e.to_string()))
    }

    /// True when `tx_id` commits to the current body.
    pub fn id_matches_body(&self) -> Result<bool, VestxError> {
        Ok(tx_id_from_body(&self.body_bytes()?) == self.tx_id)
    }
}

// ── Receipt ───────────────────────────────────────────────────────────────────

/// Result of one applied action.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Outcome {
    Transferred {
        to: Address,
        amount: Amount,
    },
    ScheduleAdded {
        beneficiary: Address,
        category: Category,
        amount: Amount,
    },
    ScheduleToppedUp {
        beneficiary: Address,
        category: Category,
        amount: Amount,
        new_total: Amount,
    },
    Claimed {
        beneficiary: Address,
        category: Category,
        amount: Amount,
    },
    RoleGranted {
        role: RoleId,
        account: Address,
    },
    RoleRevoked {
        role: RoleId,
        account: Address,
    },
}

/// Stored for every applied transaction; one outcome per action, in order.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Receipt {
    pub tx_id: TxId,
    pub from: Address,
    pub applied_at: Timestamp,
    pub outcomes: Vec<Outcome>,
}

impl Receipt {
    /// Sum of all `Claimed` outcomes.
    pub fn claimed_total(&self) -> Amount {
        self.outcomes
            .iter()
            .map(|o| match o {
                Outcome::Claimed { amount, .. } => *amount,
                _ => 0,
            })
            .sum()
    }
}
