/// ─── VestX Ledger Constants ─────────────────────────────────────────────────
///
/// Fixed-supply token released to investor categories through vesting.
///
/// Initial supply: 1,000,000 tokens
/// Base unit:      10^-18 token (18 decimals)
/// Categories:     Angel investors 40% · Private sale 30% · Public sale 30%

use crate::types::{Amount, Timestamp};

// ── Supply ───────────────────────────────────────────────────────────────────

/// Number of decimal places in the display unit.
pub const TOKEN_DECIMALS: u32 = 18;

/// 1 token expressed in base units.
pub const UNITS_PER_TOKEN: Amount = 1_000_000_000_000_000_000;

/// Initial supply in whole tokens.
pub const INITIAL_SUPPLY_TOKENS: Amount = 1_000_000;

/// Total fixed supply in base units. Minted once at genesis, never again.
pub const INITIAL_SUPPLY: Amount = INITIAL_SUPPLY_TOKENS * UNITS_PER_TOKEN;

// ── Category caps (basis points of the initial supply) ───────────────────────

pub const BPS_DENOMINATOR: u32 = 10_000;

pub const ANGEL_INVESTOR_CAP_BPS: u32 = 4_000;
pub const PRIVATE_SALE_CAP_BPS: u32 = 3_000;
pub const PUBLIC_SALE_CAP_BPS: u32 = 3_000;

// ── Default release curves ───────────────────────────────────────────────────

pub const SECONDS_PER_DAY: Timestamp = 86_400;

/// Angel investors: 6-month cliff, linear over 24 months from start.
pub const ANGEL_INVESTOR_CLIFF_SECS: Timestamp = 180 * SECONDS_PER_DAY;
pub const ANGEL_INVESTOR_DURATION_SECS: Timestamp = 720 * SECONDS_PER_DAY;

/// Private sale: 3-month cliff, linear over 12 months from start.
pub const PRIVATE_SALE_CLIFF_SECS: Timestamp = 90 * SECONDS_PER_DAY;
pub const PRIVATE_SALE_DURATION_SECS: Timestamp = 360 * SECONDS_PER_DAY;

/// Public sale: no cliff, linear over 6 months from start.
pub const PUBLIC_SALE_CLIFF_SECS: Timestamp = 0;
pub const PUBLIC_SALE_DURATION_SECS: Timestamp = 180 * SECONDS_PER_DAY;

// ── Well-known identities ────────────────────────────────────────────────────

/// Role name hashed into `ADMIN_ROLE`.
pub const ADMIN_ROLE_NAME: &str = "ADMIN_ROLE";

/// Label hashed into the vesting pool address. The pool holds every
/// unclaimed token and has no key, so it can never author a transaction.
pub const VESTING_POOL_LABEL: &str = "vestx/vesting-pool";

/// Number of samples in a release timeline shown by the CLI.
pub const DEFAULT_TIMELINE_POINTS: u32 = 12;
