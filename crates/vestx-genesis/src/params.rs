use serde::{Deserialize, Serialize};

use vestx_core::constants::INITIAL_SUPPLY;
use vestx_core::error::VestxError;
use vestx_core::types::{Address, Amount, Timestamp};
use vestx_vesting::{CategoryConfig, ClaimPolicy, DuplicatePolicy, LedgerConfig};

/// Construction parameters for a ledger.
///
/// Loaded from JSON by `vestx init --params`. Everything here is frozen once
/// genesis is applied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisParams {
    /// Deployer; receives `ADMIN_ROLE`.
    pub admin: Address,
    /// Ledger time recorded for genesis. Informational only.
    pub genesis_timestamp: Timestamp,
    pub initial_supply: Amount,
    pub categories: Vec<CategoryConfig>,
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
    #[serde(default)]
    pub claim_policy: ClaimPolicy,
}

impl GenesisParams {
    /// Documented defaults: 1,000,000 tokens, caps 40/30/30, default curves.
    pub fn default_for(admin: Address) -> Self {
        Self {
            admin,
            genesis_timestamp: chrono::Utc::now().timestamp(),
            initial_supply: INITIAL_SUPPLY,
            categories: LedgerConfig::default_categories(),
            duplicate_policy: DuplicatePolicy::default(),
            claim_policy: ClaimPolicy::default(),
        }
    }

    pub fn to_ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            initial_supply: self.initial_supply,
            categories: self.categories.clone(),
            duplicate_policy: self.duplicate_policy,
            claim_policy: self.claim_policy,
        }
    }

    pub fn validate(&self) -> Result<(), VestxError> {
        if self.admin.is_null() {
            return Err(VestxError::InvalidConfig("admin must be a non-null address".into()));
        }
        self.to_ledger_config().validate()
    }

    pub fn from_json(s: &str) -> Result<Self, VestxError> {
        serde_json::from_str(s).map_err(|e| VestxError::InvalidConfig(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String, VestxError> {
        serde_json::to_string_pretty(self).map_err(|e| VestxError::Serialization(e.to_string()))
    }
}
