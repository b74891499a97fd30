//! Release calculator.
//!
//! For a schedule with start `s`, cliff `c`, duration `d` and total `T`:
//!
//!   vested(now) = 0                          if now < s + c  (or now < s)
//!               = T                          if now >= s + d
//!               = floor(T × (now − s) / d)   otherwise
//!
//!   claimable(now) = vested(now) − claimed, clamped at 0
//!
//! Integer arithmetic only. `now` comes from the caller and is not trusted
//! beyond ordering: any value, including one before `s`, yields a result.

use vestx_core::types::{Amount, Timestamp};

use crate::schedule::VestingSchedule;

/// One sample of a release timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReleasePoint {
    pub at: Timestamp,
    pub vested: Amount,
}

/// `floor(a × b / c)` for `b < c` without overflowing u128.
fn mul_div_floor(a: Amount, b: u128, c: u128) -> Amount {
    // a = q·c + r  ⇒  a·b/c = q·b + r·b/c, and r·b < c² fits because c < 2^64.
    let q = a / c;
    let r = a % c;
    q * b + r * b / c
}

/// Total unlocked at `now`, ignoring what has already been claimed.
pub fn vested_amount(schedule: &VestingSchedule, now: Timestamp) -> Amount {
    if now < schedule.start_time || now < schedule.cliff_at() {
        return 0;
    }
    if now >= schedule.end_at() {
        return schedule.total_amount;
    }
    // start <= now < start + duration, so 0 <= elapsed < duration.
    let elapsed = (now as i128 - schedule.start_time as i128) as u128;
    let duration = schedule.duration_secs as u128;
    mul_div_floor(schedule.total_amount, elapsed, duration)
}

/// Unlocked and not yet withdrawn at `now`.
pub fn claimable(schedule: &VestingSchedule, now: Timestamp) -> Amount {
    vested_amount(schedule, now).saturating_sub(schedule.claimed_amount)
}

/// Sample the vested amount at `points + 1` evenly spaced instants from the
/// cliff to the end of vesting (both included).
pub fn release_timeline(schedule: &VestingSchedule, points: u32) -> Vec<ReleasePoint> {
    if points == 0 {
        return Vec::new();
    }
    let from = schedule.cliff_at() as i128;
    let to = schedule.end_at() as i128;
    let span = (to - from).max(0);

    (0..=points)
        .map(|k| {
            let at = (from + span * k as i128 / points as i128) as Timestamp;
            ReleasePoint {
                at,
                vested: vested_amount(schedule, at),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ReleasePolicy;
    use vestx_core::category::Category;
    use vestx_core::constants::{SECONDS_PER_DAY, UNITS_PER_TOKEN};
    use vestx_core::types::Address;

    const START: Timestamp = 1_700_000_000;
    const DAY: Timestamp = SECONDS_PER_DAY;

    fn schedule(total: Amount, cliff_days: i64, duration_days: i64) -> VestingSchedule {
        VestingSchedule::new(
            Address::from_bytes([9u8; 32]),
            Category::PrivateSale,
            total,
            START,
            ReleasePolicy {
                cliff_secs: cliff_days * DAY,
                duration_secs: duration_days * DAY,
            },
            START,
        )
    }

    #[test]
    fn nothing_before_cliff() {
        let s = schedule(1_000, 90, 360);
        assert_eq!(claimable(&s, START - 1), 0);
        assert_eq!(claimable(&s, START), 0);
        assert_eq!(claimable(&s, START + 90 * DAY - 1), 0);
    }

    #[test]
    fn linear_from_start_once_cliff_passes() {
        let s = schedule(360 * UNITS_PER_TOKEN, 90, 360);
        // At the cliff a quarter has vested at once.
        assert_eq!(vested_amount(&s, START + 90 * DAY), 90 * UNITS_PER_TOKEN);
        assert_eq!(vested_amount(&s, START + 180 * DAY), 180 * UNITS_PER_TOKEN);
    }

    #[test]
    fn everything_at_and_after_end() {
        let mut s = schedule(1_000, 0, 100);
        assert_eq!(claimable(&s, START + 100 * DAY), 1_000);
        assert_eq!(claimable(&s, i64::MAX), 1_000);
        s.claimed_amount = 400;
        assert_eq!(claimable(&s, START + 100 * DAY), 600);
    }

    #[test]
    fn rounds_down() {
        let s = schedule(10, 0, 3);
        // 10 × 1/3 = 3.33…
        assert_eq!(vested_amount(&s, START + DAY), 3);
        assert_eq!(vested_amount(&s, START + 2 * DAY), 6);
        assert_eq!(vested_amount(&s, START + 3 * DAY), 10);
    }

    #[test]
    fn claimed_is_subtracted_and_clamped() {
        let mut s = schedule(1_000, 0, 10);
        s.claimed_amount = 500;
        assert_eq!(claimable(&s, START + 2 * DAY), 0);
        assert_eq!(claimable(&s, START + 6 * DAY), 100);
    }

    #[test]
    fn zero_duration_unlocks_at_start() {
        let s = schedule(77, 0, 0);
        assert_eq!(claimable(&s, START - 1), 0);
        assert_eq!(claimable(&s, START), 77);
    }

    #[test]
    fn monotonic_in_time() {
        let s = schedule(400_000 * UNITS_PER_TOKEN + 7, 180, 720);
        let mut prev = 0;
        let mut t = START - DAY;
        while t <= START + 800 * DAY {
            let v = vested_amount(&s, t);
            assert!(v >= prev, "vested decreased at t={t}: {v} < {prev}");
            assert!(v <= s.total_amount);
            prev = v;
            t += 3_601;
        }
        assert_eq!(prev, s.total_amount);
    }

    #[test]
    fn no_overflow_on_huge_totals() {
        let s = schedule(u128::MAX, 0, 365 * 100);
        let half = vested_amount(&s, START + 365 * 50 * DAY);
        assert_eq!(half, u128::MAX / 2);
    }

    #[test]
    fn extreme_timestamps_do_not_panic() {
        let mut s = schedule(1_000, 0, 10);
        s.start_time = i64::MIN;
        assert_eq!(vested_amount(&s, i64::MAX), 1_000);
        s.start_time = i64::MAX - 5;
        assert_eq!(vested_amount(&s, 0), 0);
    }

    #[test]
    fn timeline_spans_cliff_to_end() {
        let s = schedule(1_200, 30, 120);
        let tl = release_timeline(&s, 4);
        assert_eq!(tl.len(), 5);
        assert_eq!(tl[0].at, s.cliff_at());
        assert_eq!(tl[0].vested, 300);
        assert_eq!(tl[4].at, s.end_at());
        assert_eq!(tl[4].vested, 1_200);
        assert!(tl.windows(2).all(|w| w[0].vested <= w[1].vested));
        assert!(release_timeline(&s, 0).is_empty());
    }
}
