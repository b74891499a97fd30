use serde::{Deserialize, Serialize};

use vestx_core::category::Category;
use vestx_core::types::{Address, Amount, Timestamp};

use crate::policy::ReleasePolicy;

/// One beneficiary's allocation within one category.
///
/// `start_time` and the release curve are copied from the category policy at
/// creation and never change. `claimed_amount` only grows and never passes
/// `total_amount`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingSchedule {
    pub beneficiary: Address,
    pub category: Category,
    pub total_amount: Amount,
    pub start_time: Timestamp,
    pub cliff_secs: Timestamp,
    pub duration_secs: Timestamp,
    pub claimed_amount: Amount,
    /// Ledger time of the creating transaction.
    pub created_at: Timestamp,
}

impl VestingSchedule {
    pub fn new(
        beneficiary: Address,
        category: Category,
        total_amount: Amount,
        start_time: Timestamp,
        release: ReleasePolicy,
        created_at: Timestamp,
    ) -> Self {
        Self {
            beneficiary,
            category,
            total_amount,
            start_time,
            cliff_secs: release.cliff_secs,
            duration_secs: release.duration_secs,
            claimed_amount: 0,
            created_at,
        }
    }

    /// First instant at which anything is claimable.
    pub fn cliff_at(&self) -> Timestamp {
        self.start_time.saturating_add(self.cliff_secs)
    }

    /// First instant at which the whole allocation is claimable.
    pub fn end_at(&self) -> Timestamp {
        self.start_time.saturating_add(self.duration_secs)
    }

    /// Portion not yet withdrawn, vested or not.
    pub fn unclaimed(&self) -> Amount {
        self.total_amount.saturating_sub(self.claimed_amount)
    }

    pub fn is_fully_claimed(&self) -> bool {
        self.claimed_amount >= self.total_amount
    }
}
