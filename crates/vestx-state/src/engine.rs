use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info};

use vestx_core::account::Account;
use vestx_core::category::Category;
use vestx_core::error::VestxError;
use vestx_core::hash::vesting_pool_address;
use vestx_core::transaction::{Action, Outcome, Receipt, Transaction};
use vestx_core::types::{Address, Amount, RoleId, Timestamp, ADMIN_ROLE};
use vestx_vesting::{claimable, CapEntry, ClaimPolicy, DuplicatePolicy, LedgerConfig, VestingSchedule};

use crate::db::{StateBatch, StateDb};

// ── Staged view ───────────────────────────────────────────────────────────────

/// Pending writes of one transaction layered over the committed state.
///
/// Every read made while applying actions goes through here, so a later
/// action in the same transaction sees the effects of the earlier ones.
struct Staged<'a> {
    db: &'a StateDb,
    batch: StateBatch,
}

impl<'a> Staged<'a> {
    fn new(db: &'a StateDb) -> Self {
        Self { db, batch: StateBatch::default() }
    }

    /// Unknown addresses read as fresh zero-balance accounts.
    fn account(&self, address: &Address) -> Result<Account, VestxError> {
        if let Some(acc) = self.batch.accounts.get(address) {
            return Ok(acc.clone());
        }
        Ok(self
            .db
            .get_account(address)?
            .unwrap_or_else(|| Account::new(*address)))
    }

    fn schedule(
        &self,
        beneficiary: &Address,
        category: Category,
    ) -> Result<Option<VestingSchedule>, VestxError> {
        if let Some(s) = self.batch.schedules.get(&(*beneficiary, category)) {
            return Ok(Some(s.clone()));
        }
        self.db.get_schedule(beneficiary, category)
    }

    fn cap(&self, category: Category) -> Result<CapEntry, VestxError> {
        if let Some(c) = self.batch.caps.get(&category) {
            return Ok(c.clone());
        }
        self.db.get_cap(category)?.ok_or(VestxError::NotInitialized)
    }

    fn has_role(&self, role: &RoleId, account: &Address) -> Result<bool, VestxError> {
        match self.batch.roles.get(&(*role, *account)) {
            Some(member) => Ok(*member),
            None => self.db.has_role(role, account),
        }
    }

    fn role_members(&self, role: &RoleId) -> Result<BTreeSet<Address>, VestxError> {
        let mut members = self.db.role_members(role)?;
        for ((r, account), member) in &self.batch.roles {
            if r != role {
                continue;
            }
            if *member {
                members.insert(*account);
            } else {
                members.remove(account);
            }
        }
        Ok(members)
    }

    fn require_role(&self, role: &RoleId, caller: &Address) -> Result<(), VestxError> {
        if self.has_role(role, caller)? {
            Ok(())
        } else {
            Err(VestxError::Unauthorized)
        }
    }

    /// Fails with `LastAdmin` when removing `account` from `role` would leave
    /// the admin role without members.
    fn check_not_last_admin(&self, role: &RoleId, account: &Address) -> Result<(), VestxError> {
        if role != &*ADMIN_ROLE {
            return Ok(());
        }
        let members = self.role_members(role)?;
        if members.contains(account) && members.len() == 1 {
            return Err(VestxError::LastAdmin);
        }
        Ok(())
    }

    /// Move `amount` between two accounts, staging both.
    fn move_tokens(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<(), VestxError> {
        let mut src = self.account(from)?;
        if src.balance < amount {
            return Err(VestxError::InsufficientBalance {
                need: amount,
                have: src.balance,
            });
        }
        src.balance -= amount;
        self.batch.put_account(src);

        let mut dst = self.account(to)?;
        dst.balance = dst
            .balance
            .checked_add(amount)
            .ok_or(VestxError::MathOverflow)?;
        self.batch.put_account(dst);
        Ok(())
    }
}

// ── StateEngine ───────────────────────────────────────────────────────────────

/// The state transition engine.
///
/// Validates and applies transactions to the persistent state database.
/// Each `apply` call is atomic: either all actions succeed or none do.
pub struct StateEngine {
    pub db: Arc<StateDb>,
    config: LedgerConfig,
    pool: Address,
}

impl StateEngine {
    /// Bind an engine to an initialized database.
    pub fn open(db: Arc<StateDb>) -> Result<Self, VestxError> {
        let config = db.get_config()?.ok_or(VestxError::NotInitialized)?;
        Ok(Self {
            db,
            config,
            pool: vesting_pool_address(),
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Validate and apply a transaction at ledger time `now`.
    pub fn apply(&self, tx: &Transaction, now: Timestamp) -> Result<Receipt, VestxError> {
        let _guard = self.db.lock_writes()?;

        // ── Structural checks ─────────────────────────────────────────────────
        if tx.actions.is_empty() {
            return Err(VestxError::EmptyTransaction);
        }
        if !tx.id_matches_body()? {
            return Err(VestxError::TxIdMismatch);
        }

        // ── Duplicate check ───────────────────────────────────────────────────
        if self.db.has_receipt(&tx.tx_id)? {
            return Err(VestxError::DuplicateTransaction(tx.tx_id.to_hex()));
        }

        // The pool and the null address have no key and never sign.
        if tx.from.is_null() || tx.from == self.pool {
            return Err(VestxError::Unauthorized);
        }

        let mut staged = Staged::new(&self.db);

        // ── Nonce check ───────────────────────────────────────────────────────
        let sender = staged.account(&tx.from)?;
        if tx.nonce != sender.nonce {
            return Err(VestxError::InvalidNonce {
                expected: sender.nonce,
                got: tx.nonce,
            });
        }

        // ── Apply each action ─────────────────────────────────────────────────
        let mut outcomes = Vec::with_capacity(tx.actions.len());
        for action in &tx.actions {
            outcomes.push(self.apply_action(action, &tx.from, &mut staged, now)?);
        }

        // Increment nonce after all actions succeed.
        let mut sender = staged.account(&tx.from)?;
        sender.nonce += 1;
        staged.batch.put_account(sender);

        let receipt = Receipt {
            tx_id: tx.tx_id,
            from: tx.from,
            applied_at: now,
            outcomes,
        };
        staged.batch.receipts.push(receipt.clone());

        // ── Commit ────────────────────────────────────────────────────────────
        self.db.commit(&staged.batch)?;

        info!(
            tx_id = %tx.tx_id,
            from = %tx.from,
            actions = tx.actions.len(),
            "applied transaction"
        );
        Ok(receipt)
    }

    // ── Action dispatch ───────────────────────────────────────────────────────

    fn apply_action(
        &self,
        action: &Action,
        caller: &Address,
        staged: &mut Staged<'_>,
        now: Timestamp,
    ) -> Result<Outcome, VestxError> {
        match action {
            // ── Transfer ─────────────────────────────────────────────────────
            Action::Transfer { to, amount } => {
                if *amount == 0 {
                    return Err(VestxError::InvalidAmount);
                }
                if to.is_null() {
                    return Err(VestxError::InvalidBeneficiary);
                }
                if to == caller {
                    return Err(VestxError::SelfTransfer);
                }
                staged.move_tokens(caller, to, *amount)?;
                debug!(to = %to, amount = *amount, "transfer");
                Ok(Outcome::Transferred { to: *to, amount: *amount })
            }

            // ── AddVestingSchedule ───────────────────────────────────────────
            Action::AddVestingSchedule {
                category,
                beneficiary,
                amount,
                start_time,
            } => {
                staged.require_role(&ADMIN_ROLE, caller)?;
                if *amount == 0 {
                    return Err(VestxError::InvalidAmount);
                }
                self.check_beneficiary(beneficiary)?;
                let category = Category::try_from(*category)?;

                if let Some(existing) = staged.schedule(beneficiary, category)? {
                    return match self.config.duplicate_policy {
                        DuplicatePolicy::Reject => Err(VestxError::DuplicateSchedule {
                            beneficiary: beneficiary.to_string(),
                            category: category.as_u8(),
                        }),
                        DuplicatePolicy::Merge => {
                            self.top_up(staged, existing, *amount)
                        }
                    };
                }

                self.reserve(staged, category, *amount)?;
                let release = self.config.category(category)?.release;
                staged.batch.put_schedule(VestingSchedule::new(
                    *beneficiary,
                    category,
                    *amount,
                    *start_time,
                    release,
                    now,
                ));
                debug!(beneficiary = %beneficiary, category = ?category, amount = *amount, "schedule added");
                Ok(Outcome::ScheduleAdded {
                    beneficiary: *beneficiary,
                    category,
                    amount: *amount,
                })
            }

            // ── TopUpVestingSchedule ─────────────────────────────────────────
            Action::TopUpVestingSchedule {
                category,
                beneficiary,
                amount,
            } => {
                staged.require_role(&ADMIN_ROLE, caller)?;
                if *amount == 0 {
                    return Err(VestxError::InvalidAmount);
                }
                self.check_beneficiary(beneficiary)?;
                let category = Category::try_from(*category)?;
                let existing = staged.schedule(beneficiary, category)?.ok_or_else(|| {
                    VestxError::ScheduleNotFound {
                        beneficiary: beneficiary.to_string(),
                        category: category.as_u8(),
                    }
                })?;
                self.top_up(staged, existing, *amount)
            }

            // ── Claim ────────────────────────────────────────────────────────
            Action::Claim { beneficiary, category } => {
                if self.config.claim_policy == ClaimPolicy::BeneficiaryOnly && caller != beneficiary {
                    return Err(VestxError::NotBeneficiary);
                }
                let category = Category::try_from(*category)?;
                let mut schedule = staged.schedule(beneficiary, category)?.ok_or_else(|| {
                    VestxError::ScheduleNotFound {
                        beneficiary: beneficiary.to_string(),
                        category: category.as_u8(),
                    }
                })?;

                let amount = claimable(&schedule, now);
                if amount == 0 {
                    return Err(VestxError::NothingToClaim);
                }
                schedule.claimed_amount = schedule
                    .claimed_amount
                    .checked_add(amount)
                    .ok_or(VestxError::MathOverflow)?;
                staged.batch.put_schedule(schedule);
                staged.move_tokens(&self.pool, beneficiary, amount)?;

                debug!(beneficiary = %beneficiary, category = ?category, amount, "claimed");
                Ok(Outcome::Claimed {
                    beneficiary: *beneficiary,
                    category,
                    amount,
                })
            }

            // ── Access control ───────────────────────────────────────────────
            Action::GrantRole { role, account } => {
                staged.require_role(&ADMIN_ROLE, caller)?;
                if account.is_null() {
                    return Err(VestxError::InvalidBeneficiary);
                }
                staged.batch.set_role(*role, *account, true);
                debug!(role = %role, account = %account, "role granted");
                Ok(Outcome::RoleGranted { role: *role, account: *account })
            }

            Action::RevokeRole { role, account } => {
                staged.require_role(&ADMIN_ROLE, caller)?;
                staged.check_not_last_admin(role, account)?;
                staged.batch.set_role(*role, *account, false);
                debug!(role = %role, account = %account, "role revoked");
                Ok(Outcome::RoleRevoked { role: *role, account: *account })
            }

            Action::RenounceRole { role } => {
                staged.check_not_last_admin(role, caller)?;
                staged.batch.set_role(*role, *caller, false);
                debug!(role = %role, account = %caller, "role renounced");
                Ok(Outcome::RoleRevoked { role: *role, account: *caller })
            }
        }
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn check_beneficiary(&self, beneficiary: &Address) -> Result<(), VestxError> {
        if beneficiary.is_null() || *beneficiary == self.pool {
            return Err(VestxError::InvalidBeneficiary);
        }
        Ok(())
    }

    fn reserve(&self, staged: &mut Staged<'_>, category: Category, amount: Amount) -> Result<(), VestxError> {
        let mut entry = staged.cap(category)?;
        entry.reserve(amount)?;
        staged.batch.put_cap(entry);
        Ok(())
    }

    fn top_up(
        &self,
        staged: &mut Staged<'_>,
        mut schedule: VestingSchedule,
        amount: Amount,
    ) -> Result<Outcome, VestxError> {
        self.reserve(staged, schedule.category, amount)?;
        schedule.total_amount = schedule
            .total_amount
            .checked_add(amount)
            .ok_or(VestxError::MathOverflow)?;
        let outcome = Outcome::ScheduleToppedUp {
            beneficiary: schedule.beneficiary,
            category: schedule.category,
            amount,
            new_total: schedule.total_amount,
        };
        debug!(
            beneficiary = %schedule.beneficiary,
            category = ?schedule.category,
            amount,
            new_total = schedule.total_amount,
            "schedule topped up"
        );
        staged.batch.put_schedule(schedule);
        Ok(outcome)
    }
}
