use std::collections::BTreeSet;

use chrono::DateTime;

use vestx_core::category::Category;
use vestx_core::constants::SECONDS_PER_DAY;
use vestx_core::error::VestxError;
use vestx_core::types::{Address, Amount, RoleId, Timestamp};
use vestx_core::units::format_token_amount;
use vestx_vesting::{claimable, vested_amount, LedgerConfig, VestingSchedule};

use crate::db::StateDb;

/// Read-only views over committed ledger state.
pub struct LedgerQuery<'a> {
    db: &'a StateDb,
}

fn render_time(ts: Timestamp) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|d| d.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ts.to_string())
}

/// Whole days, or hours (rounded up) inside the last day.
fn countdown(secs: Timestamp) -> String {
    if secs >= SECONDS_PER_DAY {
        format!("{} days", secs / SECONDS_PER_DAY)
    } else {
        format!("{} hours", (secs.max(0) + 3_599) / 3_600)
    }
}

impl<'a> LedgerQuery<'a> {
    pub fn new(db: &'a StateDb) -> Self {
        Self { db }
    }

    fn config(&self) -> Result<LedgerConfig, VestxError> {
        self.db.get_config()?.ok_or(VestxError::NotInitialized)
    }

    fn require_schedule(
        &self,
        beneficiary: &Address,
        category: Category,
    ) -> Result<VestingSchedule, VestxError> {
        self.db
            .get_schedule(beneficiary, category)?
            .ok_or_else(|| VestxError::ScheduleNotFound {
                beneficiary: beneficiary.to_string(),
                category: category.as_u8(),
            })
    }

    // ── Supply ───────────────────────────────────────────────────────────────

    /// Supply minted at genesis.
    pub fn initial_supply(&self) -> Result<Amount, VestxError> {
        Ok(self.config()?.initial_supply)
    }

    /// Sum of every stored balance. Equals `initial_supply` on a healthy ledger.
    pub fn total_supply(&self) -> Result<Amount, VestxError> {
        self.db
            .iter_accounts()?
            .iter()
            .try_fold(0u128, |acc, a| acc.checked_add(a.balance))
            .ok_or(VestxError::MathOverflow)
    }

    pub fn balance_of(&self, address: &Address) -> Result<Amount, VestxError> {
        Ok(self.db.get_account(address)?.map(|a| a.balance).unwrap_or(0))
    }

    // ── Roles ────────────────────────────────────────────────────────────────

    pub fn has_role(&self, role: &RoleId, address: &Address) -> Result<bool, VestxError> {
        self.db.has_role(role, address)
    }

    pub fn role_members(&self, role: &RoleId) -> Result<BTreeSet<Address>, VestxError> {
        self.db.role_members(role)
    }

    // ── Caps ─────────────────────────────────────────────────────────────────

    pub fn cap_of(&self, category: Category) -> Result<Amount, VestxError> {
        Ok(self
            .db
            .get_cap(category)?
            .ok_or(VestxError::NotInitialized)?
            .cap)
    }

    pub fn allocated(&self, category: Category) -> Result<Amount, VestxError> {
        Ok(self
            .db
            .get_cap(category)?
            .ok_or(VestxError::NotInitialized)?
            .allocated)
    }

    // ── Schedules ────────────────────────────────────────────────────────────

    pub fn schedule(
        &self,
        beneficiary: &Address,
        category: Category,
    ) -> Result<Option<VestingSchedule>, VestxError> {
        self.db.get_schedule(beneficiary, category)
    }

    pub fn schedules_of(&self, beneficiary: &Address) -> Result<Vec<VestingSchedule>, VestxError> {
        self.db.schedules_of(beneficiary)
    }

    /// Amount a `Claim` at `now` would release. Zero when no schedule exists.
    pub fn claimable(
        &self,
        beneficiary: &Address,
        category: Category,
        now: Timestamp,
    ) -> Result<Amount, VestxError> {
        Ok(self
            .db
            .get_schedule(beneficiary, category)?
            .map(|s| claimable(&s, now))
            .unwrap_or(0))
    }

    pub fn vested(
        &self,
        beneficiary: &Address,
        category: Category,
        now: Timestamp,
    ) -> Result<Amount, VestxError> {
        Ok(vested_amount(&self.require_schedule(beneficiary, category)?, now))
    }

    /// Human-readable summary of a schedule's state.
    pub fn describe(
        &self,
        beneficiary: &Address,
        category: Category,
        now: Timestamp,
    ) -> Result<String, VestxError> {
        let s = self.require_schedule(beneficiary, category)?;

        let status = if s.is_fully_claimed() {
            "fully claimed".to_string()
        } else if now < s.cliff_at() {
            format!("locked, cliff in {}", countdown(s.cliff_at().saturating_sub(now)))
        } else if now < s.end_at() {
            format!("vesting, {} claimable", format_token_amount(claimable(&s, now)))
        } else {
            format!("fully vested, {} claimable", format_token_amount(claimable(&s, now)))
        };

        Ok(format!(
            "{} | {} | total {} | claimed {} | start {} | cliff {} | end {} | {}",
            s.beneficiary,
            s.category,
            format_token_amount(s.total_amount),
            format_token_amount(s.claimed_amount),
            render_time(s.start_time),
            render_time(s.cliff_at()),
            render_time(s.end_at()),
            status
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{random_address, seed_ledger, tokens, NOW};
    use vestx_core::constants::INITIAL_SUPPLY;
    use vestx_core::types::ADMIN_ROLE;
    use vestx_vesting::ReleasePolicy;

    use crate::db::StateBatch;

    fn seeded() -> (StateDb, Address) {
        let db = StateDb::open_temporary().unwrap();
        let admin = random_address();
        seed_ledger(&db, &LedgerConfig::default(), admin);
        (db, admin)
    }

    fn put_schedule(db: &StateDb, s: VestingSchedule) {
        let mut batch = StateBatch::default();
        batch.put_schedule(s);
        db.commit(&batch).unwrap();
    }

    #[test]
    fn supply_and_caps_after_seeding() {
        let (db, admin) = seeded();
        let q = LedgerQuery::new(&db);
        assert_eq!(q.initial_supply().unwrap(), INITIAL_SUPPLY);
        assert_eq!(q.total_supply().unwrap(), INITIAL_SUPPLY);
        assert_eq!(q.cap_of(Category::AngelInvestor).unwrap(), tokens(400_000));
        assert_eq!(q.cap_of(Category::PublicSale).unwrap(), tokens(300_000));
        assert_eq!(q.allocated(Category::PrivateSale).unwrap(), 0);
        assert!(q.has_role(&ADMIN_ROLE, &admin).unwrap());
        assert!(!q.has_role(&ADMIN_ROLE, &random_address()).unwrap());
        assert_eq!(q.balance_of(&random_address()).unwrap(), 0);
    }

    #[test]
    fn claimable_is_zero_without_schedule() {
        let (db, _) = seeded();
        let q = LedgerQuery::new(&db);
        let b = random_address();
        assert_eq!(q.claimable(&b, Category::PublicSale, NOW).unwrap(), 0);
        assert!(matches!(
            q.vested(&b, Category::PublicSale, NOW),
            Err(VestxError::ScheduleNotFound { .. })
        ));
    }

    #[test]
    fn describe_reports_phase() {
        let (db, _) = seeded();
        let b = random_address();
        let day = SECONDS_PER_DAY;
        put_schedule(
            &db,
            VestingSchedule::new(
                b,
                Category::PrivateSale,
                tokens(360),
                NOW,
                ReleasePolicy { cliff_secs: 90 * day, duration_secs: 360 * day },
                NOW,
            ),
        );
        let q = LedgerQuery::new(&db);

        let locked = q.describe(&b, Category::PrivateSale, NOW).unwrap();
        assert!(locked.contains("locked, cliff in 90 days"), "{locked}");
        assert!(locked.contains("total 360"), "{locked}");

        let mid = q.describe(&b, Category::PrivateSale, NOW + 180 * day).unwrap();
        assert!(mid.contains("vesting, 180 claimable"), "{mid}");

        let done = q.describe(&b, Category::PrivateSale, NOW + 400 * day).unwrap();
        assert!(done.contains("fully vested, 360 claimable"), "{done}");

        assert_eq!(q.schedules_of(&b).unwrap().len(), 1);
        assert_eq!(q.vested(&b, Category::PrivateSale, NOW + 180 * day).unwrap(), tokens(180));
    }

    #[test]
    fn describe_survives_extreme_times() {
        let (db, _) = seeded();
        let b = random_address();
        put_schedule(
            &db,
            VestingSchedule::new(
                b,
                Category::PrivateSale,
                tokens(10),
                NOW,
                ReleasePolicy { cliff_secs: 90 * SECONDS_PER_DAY, duration_secs: 360 * SECONDS_PER_DAY },
                NOW,
            ),
        );
        let q = LedgerQuery::new(&db);
        assert_eq!(q.claimable(&b, Category::PrivateSale, i64::MIN).unwrap(), 0);
        let far_past = q.describe(&b, Category::PrivateSale, i64::MIN).unwrap();
        assert!(far_past.contains("locked, cliff in"), "{far_past}");
        let far_future = q.describe(&b, Category::PrivateSale, i64::MAX).unwrap();
        assert!(far_future.contains("fully vested, 10 claimable"), "{far_future}");
    }

    #[test]
    fn last_day_before_cliff_counts_hours() {
        assert_eq!(countdown(90 * SECONDS_PER_DAY), "90 days");
        assert_eq!(countdown(SECONDS_PER_DAY), "1 days");
        assert_eq!(countdown(SECONDS_PER_DAY - 1), "24 hours");
        assert_eq!(countdown(3_601), "2 hours");
        assert_eq!(countdown(1), "1 hours");
    }

    #[test]
    fn render_time_is_utc() {
        assert_eq!(render_time(0), "1970-01-01 00:00:00 UTC");
    }
}
