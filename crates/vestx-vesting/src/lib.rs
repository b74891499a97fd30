//! vestx-vesting
//!
//! Pure vesting arithmetic: category caps, release policies, schedule records
//! and the release calculator. No storage, no clock; callers pass `now`.

pub mod caps;
pub mod policy;
pub mod release;
pub mod schedule;

pub use caps::{cap_from_bps, CapEntry};
pub use policy::{CategoryConfig, ClaimPolicy, DuplicatePolicy, LedgerConfig, ReleasePolicy};
pub use release::{claimable, release_timeline, vested_amount, ReleasePoint};
pub use schedule::VestingSchedule;
