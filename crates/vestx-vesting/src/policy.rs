use serde::{Deserialize, Serialize};

use vestx_core::category::Category;
use vestx_core::constants::{
    ANGEL_INVESTOR_CAP_BPS, ANGEL_INVESTOR_CLIFF_SECS, ANGEL_INVESTOR_DURATION_SECS,
    BPS_DENOMINATOR, PRIVATE_SALE_CAP_BPS, PRIVATE_SALE_CLIFF_SECS, PRIVATE_SALE_DURATION_SECS,
    PUBLIC_SALE_CAP_BPS, PUBLIC_SALE_CLIFF_SECS, PUBLIC_SALE_DURATION_SECS,
};
use vestx_core::error::VestxError;
use vestx_core::types::{Amount, Timestamp};

use crate::caps::cap_from_bps;

// ── ReleasePolicy ─────────────────────────────────────────────────────────────

/// Release curve applied to every schedule of a category.
///
/// Both durations are measured from the schedule's `start_time`: nothing is
/// claimable before `start + cliff_secs`, everything is claimable from
/// `start + duration_secs`, and the amount in between grows linearly from
/// `start`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleasePolicy {
    pub cliff_secs: Timestamp,
    pub duration_secs: Timestamp,
}

impl ReleasePolicy {
    pub fn validate(&self) -> Result<(), VestxError> {
        if self.cliff_secs < 0 || self.duration_secs < 0 {
            return Err(VestxError::InvalidConfig(
                "release durations must be non-negative".into(),
            ));
        }
        if self.cliff_secs > self.duration_secs {
            return Err(VestxError::InvalidConfig(format!(
                "cliff ({}s) longer than vesting duration ({}s)",
                self.cliff_secs, self.duration_secs
            )));
        }
        Ok(())
    }
}

// ── CategoryConfig ────────────────────────────────────────────────────────────

/// One row of the reviewed cap table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub category: Category,
    /// Cap as basis points of the initial supply.
    pub cap_bps: u32,
    pub release: ReleasePolicy,
}

impl CategoryConfig {
    pub fn default_for(category: Category) -> Self {
        let (cap_bps, cliff_secs, duration_secs) = match category {
            Category::AngelInvestor => (
                ANGEL_INVESTOR_CAP_BPS,
                ANGEL_INVESTOR_CLIFF_SECS,
                ANGEL_INVESTOR_DURATION_SECS,
            ),
            Category::PrivateSale => (
                PRIVATE_SALE_CAP_BPS,
                PRIVATE_SALE_CLIFF_SECS,
                PRIVATE_SALE_DURATION_SECS,
            ),
            Category::PublicSale => (
                PUBLIC_SALE_CAP_BPS,
                PUBLIC_SALE_CLIFF_SECS,
                PUBLIC_SALE_DURATION_SECS,
            ),
        };
        Self {
            category,
            cap_bps,
            release: ReleasePolicy { cliff_secs, duration_secs },
        }
    }
}

// ── Policies left open by the distribution model ──────────────────────────────

/// What `AddVestingSchedule` does when the (beneficiary, category) pair
/// already has a schedule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Fail with `DuplicateSchedule`; use `TopUpVestingSchedule` instead.
    #[default]
    Reject,
    /// Add the amount into the existing record (start time is kept).
    Merge,
}

/// Who may submit a `Claim` for a beneficiary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClaimPolicy {
    #[default]
    BeneficiaryOnly,
    /// Any caller may trigger the release; tokens still go to the beneficiary.
    Anyone,
}

// ── LedgerConfig ──────────────────────────────────────────────────────────────

/// Immutable ledger parameters, fixed at genesis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub initial_supply: Amount,
    pub categories: Vec<CategoryConfig>,
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
    #[serde(default)]
    pub claim_policy: ClaimPolicy,
}

impl LedgerConfig {
    /// Validate the cap table: every category exactly once, caps summing to
    /// at most 100% of supply, and sane release curves.
    pub fn validate(&self) -> Result<(), VestxError> {
        if self.initial_supply == 0 {
            return Err(VestxError::InvalidConfig("initial supply must be > 0".into()));
        }
        for c in Category::ALL {
            let n = self.categories.iter().filter(|cc| cc.category == c).count();
            if n != 1 {
                return Err(VestxError::InvalidConfig(format!(
                    "category {c} must appear exactly once, found {n}"
                )));
            }
        }
        let bps_sum: u64 = self.categories.iter().map(|c| c.cap_bps as u64).sum();
        if bps_sum > BPS_DENOMINATOR as u64 {
            return Err(VestxError::InvalidConfig(format!(
                "category caps sum to {bps_sum} bps, above {BPS_DENOMINATOR}"
            )));
        }
        for c in &self.categories {
            c.release.validate()?;
        }
        Ok(())
    }

    pub fn category(&self, category: Category) -> Result<&CategoryConfig, VestxError> {
        self.categories
            .iter()
            .find(|c| c.category == category)
            .ok_or(VestxError::InvalidCategory(category.as_u8()))
    }

    /// Absolute cap for `category`, derived from the initial supply.
    pub fn cap_of(&self, category: Category) -> Result<Amount, VestxError> {
        Ok(cap_from_bps(self.initial_supply, self.category(category)?.cap_bps))
    }

    pub fn default_categories() -> Vec<CategoryConfig> {
        Category::ALL.into_iter().map(CategoryConfig::default_for).collect()
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            initial_supply: vestx_core::constants::INITIAL_SUPPLY,
            categories: Self::default_categories(),
            duplicate_policy: DuplicatePolicy::default(),
            claim_policy: ClaimPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vestx_core::constants::{INITIAL_SUPPLY, UNITS_PER_TOKEN};

    #[test]
    fn default_caps_are_40_30_30() {
        let cfg = LedgerConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.cap_of(Category::AngelInvestor).unwrap(), 400_000 * UNITS_PER_TOKEN);
        assert_eq!(cfg.cap_of(Category::PrivateSale).unwrap(), 300_000 * UNITS_PER_TOKEN);
        assert_eq!(cfg.cap_of(Category::PublicSale).unwrap(), 300_000 * UNITS_PER_TOKEN);
        assert_eq!(cfg.initial_supply, INITIAL_SUPPLY);
    }

    #[test]
    fn overcommitted_caps_rejected() {
        let mut cfg = LedgerConfig::default();
        cfg.categories[0].cap_bps = 4_001;
        assert!(matches!(cfg.validate(), Err(VestxError::InvalidConfig(_))));
    }

    #[test]
    fn missing_or_repeated_category_rejected() {
        let mut cfg = LedgerConfig::default();
        cfg.categories.pop();
        assert!(cfg.validate().is_err());

        let mut cfg = LedgerConfig::default();
        cfg.categories[2].category = Category::AngelInvestor;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn cliff_after_end_rejected() {
        let p = ReleasePolicy { cliff_secs: 10, duration_secs: 5 };
        assert!(p.validate().is_err());
        let p = ReleasePolicy { cliff_secs: -1, duration_secs: 5 };
        assert!(p.validate().is_err());
        ReleasePolicy { cliff_secs: 0, duration_secs: 0 }.validate().unwrap();
    }

    #[test]
    fn policies_default_and_parse_from_json() {
        let cfg: LedgerConfig = serde_json::from_str(&format!(
            r#"{{"initial_supply": 1000, "categories": {}, "claim_policy": "anyone"}}"#,
            serde_json::to_string(&LedgerConfig::default_categories()).unwrap()
        ))
        .unwrap();
        assert_eq!(cfg.duplicate_policy, DuplicatePolicy::Reject);
        assert_eq!(cfg.claim_policy, ClaimPolicy::Anyone);
    }
}
