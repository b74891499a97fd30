//! Category cap arithmetic.
//!
//! A cap is `floor(initial_supply × bps / 10_000)`. The running total per
//! category only moves through `CapEntry::reserve`, which never lets
//! `allocated` pass `cap`.

use serde::{Deserialize, Serialize};

use vestx_core::category::Category;
use vestx_core::constants::BPS_DENOMINATOR;
use vestx_core::error::VestxError;
use vestx_core::types::Amount;

/// `floor(supply × bps / 10_000)` without an intermediate overflow.
/// Saturates for `bps` above 10_000, which a validated config never has.
pub fn cap_from_bps(supply: Amount, bps: u32) -> Amount {
    let den = BPS_DENOMINATOR as Amount;
    let bps = bps as Amount;
    // supply = q·den + r  ⇒  supply·bps/den = q·bps + r·bps/den, with r·bps < den².
    (supply / den)
        .saturating_mul(bps)
        .saturating_add((supply % den) * bps / den)
}

/// Cap and running total for one category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapEntry {
    pub category: Category,
    pub cap: Amount,
    pub allocated: Amount,
}

impl CapEntry {
    pub fn new(category: Category, cap: Amount) -> Self {
        Self { category, cap, allocated: 0 }
    }

    /// Headroom left under the cap.
    pub fn remaining(&self) -> Amount {
        self.cap.saturating_sub(self.allocated)
    }

    /// Reserve `amount` against the cap.
    ///
    /// Landing exactly on the cap is allowed. On `CapExceeded` the entry is
    /// left untouched. A zero amount succeeds without changing the total.
    pub fn reserve(&mut self, amount: Amount) -> Result<(), VestxError> {
        let next = self
            .allocated
            .checked_add(amount)
            .ok_or(VestxError::CapExceeded)?;
        if next > self.cap {
            return Err(VestxError::CapExceeded);
        }
        self.allocated = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vestx_core::constants::{INITIAL_SUPPLY, UNITS_PER_TOKEN};

    const T: Amount = UNITS_PER_TOKEN;

    #[test]
    fn bps_of_supply() {
        assert_eq!(cap_from_bps(INITIAL_SUPPLY, 4_000), 400_000 * T);
        assert_eq!(cap_from_bps(INITIAL_SUPPLY, 10_000), INITIAL_SUPPLY);
        assert_eq!(cap_from_bps(INITIAL_SUPPLY, 0), 0);
        // Rounds down.
        assert_eq!(cap_from_bps(9_999, 5_000), 4_999);
        // No overflow near the top of the range.
        assert_eq!(cap_from_bps(u128::MAX, 10_000), u128::MAX);
    }

    #[test]
    fn reserve_up_to_exact_cap() {
        let mut e = CapEntry::new(Category::PrivateSale, 300_000 * T);
        e.reserve(300_000 * T).unwrap();
        assert_eq!(e.allocated, e.cap);
        assert_eq!(e.remaining(), 0);
        assert_eq!(e.reserve(1), Err(VestxError::CapExceeded));
        assert_eq!(e.allocated, 300_000 * T);
    }

    #[test]
    fn reserve_over_cap_leaves_total_unchanged() {
        let mut e = CapEntry::new(Category::AngelInvestor, 400_000 * T);
        e.reserve(100_000 * T).unwrap();
        assert_eq!(e.reserve(300_001 * T), Err(VestxError::CapExceeded));
        assert_eq!(e.allocated, 100_000 * T);
        e.reserve(300_000 * T).unwrap();
        assert_eq!(e.remaining(), 0);
    }

    #[test]
    fn zero_reservation_is_noop() {
        let mut e = CapEntry::new(Category::PublicSale, 10);
        e.reserve(0).unwrap();
        assert_eq!(e.allocated, 0);
    }

    #[test]
    fn overflowing_reservation_is_cap_exceeded() {
        let mut e = CapEntry::new(Category::PublicSale, u128::MAX);
        e.reserve(u128::MAX).unwrap();
        assert_eq!(e.reserve(1), Err(VestxError::CapExceeded));
    }
}
