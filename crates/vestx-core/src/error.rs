use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VestxError {
    // ── Authorization ────────────────────────────────────────────────────────
    #[error("caller lacks the required role")]
    Unauthorized,

    #[error("only the beneficiary may claim this schedule")]
    NotBeneficiary,

    #[error("cannot remove the last holder of the admin role")]
    LastAdmin,

    // ── Input validation ─────────────────────────────────────────────────────
    #[error("amount must be greater than zero")]
    InvalidAmount,

    #[error("beneficiary must be a non-null address")]
    InvalidBeneficiary,

    #[error("unknown category: {0}")]
    InvalidCategory(u8),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid token amount: {0}")]
    InvalidTokenAmount(String),

    // ── Vesting ──────────────────────────────────────────────────────────────
    /// Category running total would exceed its fixed cap.
    #[error("limit reached")]
    CapExceeded,

    #[error("nothing to claim")]
    NothingToClaim,

    #[error("no vesting schedule for {beneficiary} in category {category}")]
    ScheduleNotFound { beneficiary: String, category: u8 },

    #[error("vesting schedule already exists for {beneficiary} in category {category}")]
    DuplicateSchedule { beneficiary: String, category: u8 },

    // ── Ledger ───────────────────────────────────────────────────────────────
    #[error("insufficient balance: need {need}, have {have}")]
    InsufficientBalance { need: u128, have: u128 },

    #[error("self-transfer not allowed")]
    SelfTransfer,

    #[error("arithmetic overflow")]
    MathOverflow,

    // ── Transactions ─────────────────────────────────────────────────────────
    #[error("invalid nonce: expected {expected}, got {got}")]
    InvalidNonce { expected: u64, got: u64 },

    #[error("transaction already applied: {0}")]
    DuplicateTransaction(String),

    #[error("transaction id does not match its body")]
    TxIdMismatch,

    #[error("transaction carries no actions")]
    EmptyTransaction,

    // ── Genesis / configuration ──────────────────────────────────────────────
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("genesis has already been applied")]
    GenesisAlreadyApplied,

    #[error("ledger not initialized: apply genesis first")]
    NotInitialized,

    #[error("genesis supply mismatch: expected {expected}, got {got}")]
    GenesisSupplyMismatch { expected: u128, got: u128 },

    // ── Serialization / storage ──────────────────────────────────────────────
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage error: {0}")]
    Storage(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cap_exceeded_reads_limit_reached() {
        assert_eq!(VestxError::CapExceeded.to_string(), "limit reached");
    }

    #[test]
    fn invalid_category_names_value() {
        assert_eq!(VestxError::InvalidCategory(9).to_string(), "unknown category: 9");
    }
}
