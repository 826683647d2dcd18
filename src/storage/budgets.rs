//! Budget repository
//!
//! Budgets live in budgets.json and the transfer history in
//! budget_transfers.json. A transfer touches both, so `apply_transfer` holds
//! both write locks for the whole check-and-move and rolls the in-memory state
//! back if either file fails to persist.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use chrono::Utc;

use crate::error::{FintrackError, FintrackResult};
use crate::models::{
    Budget, BudgetId, BudgetScope, BudgetTransfer, BudgetTransferId, CategoryId, Money, Month,
    UserId,
};

use super::repository::{
    read_guard, read_records, sorted_records, write_guard, write_records, Record,
};

impl Record for Budget {
    type Id = BudgetId;

    fn id(&self) -> BudgetId {
        self.id
    }

    fn owner(&self) -> Option<UserId> {
        match self.scope {
            BudgetScope::Personal { user_id } => Some(user_id),
            BudgetScope::Family { .. } => None,
        }
    }
}

impl Record for BudgetTransfer {
    type Id = BudgetTransferId;

    fn id(&self) -> BudgetTransferId {
        self.id
    }
}

/// Repository for budgets and their transfer history
pub struct BudgetRepository {
    budgets_path: PathBuf,
    transfers_path: PathBuf,
    budgets: RwLock<HashMap<BudgetId, Budget>>,
    transfers: RwLock<Vec<BudgetTransfer>>,
}

impl BudgetRepository {
    pub fn new(budgets_path: PathBuf, transfers_path: PathBuf) -> Self {
        Self {
            budgets_path,
            transfers_path,
            budgets: RwLock::new(HashMap::new()),
            transfers: RwLock::new(Vec::new()),
        }
    }

    pub fn load(&self) -> FintrackResult<()> {
        let budgets: Vec<Budget> = read_records(&self.budgets_path)?;
        let mut transfers: Vec<BudgetTransfer> = read_records(&self.transfers_path)?;
        transfers.sort_by_key(|t| t.created_at);

        let mut data = write_guard(&self.budgets)?;
        data.clear();
        for budget in budgets {
            data.insert(budget.id, budget);
        }
        *write_guard(&self.transfers)? = transfers;
        Ok(())
    }

    /// Write both files; on failure memory is reset to what is on disk
    pub fn save(&self) -> FintrackResult<()> {
        let mut budgets = write_guard(&self.budgets)?;
        let mut transfers = write_guard(&self.transfers)?;
        let persisted = write_records(&self.budgets_path, sorted_records(&budgets))
            .and_then(|_| write_records(&self.transfers_path, transfers.clone()));

        if let Err(e) = persisted {
            if let Ok(records) = read_records::<Budget>(&self.budgets_path) {
                budgets.clear();
                for budget in records {
                    budgets.insert(budget.id, budget);
                }
            }
            if let Ok(mut records) = read_records::<BudgetTransfer>(&self.transfers_path) {
                records.sort_by_key(|t| t.created_at);
                *transfers = records;
            }
            return Err(e);
        }
        Ok(())
    }

    pub fn get(&self, id: BudgetId) -> FintrackResult<Option<Budget>> {
        let budgets = read_guard(&self.budgets)?;
        Ok(budgets.get(&id).cloned())
    }

    /// Look up the single budget for a scope, category and month
    pub fn find_by_key(
        &self,
        scope: BudgetScope,
        category_id: CategoryId,
        month: Month,
    ) -> FintrackResult<Option<Budget>> {
        let budgets = read_guard(&self.budgets)?;
        Ok(budgets
            .values()
            .find(|b| b.key() == (scope, category_id, month))
            .cloned())
    }

    /// Budgets of a scope, optionally limited to one month, oldest month first
    pub fn get_for_scope(
        &self,
        scope: BudgetScope,
        month: Option<Month>,
    ) -> FintrackResult<Vec<Budget>> {
        let budgets = read_guard(&self.budgets)?;
        let mut found: Vec<Budget> = budgets
            .values()
            .filter(|b| b.scope == scope && month.map_or(true, |m| b.month == m))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.month.cmp(&b.month).then_with(|| a.created_at.cmp(&b.created_at)));
        Ok(found)
    }

    pub fn get_all(&self) -> FintrackResult<Vec<Budget>> {
        let budgets = read_guard(&self.budgets)?;
        Ok(sorted_records(&budgets))
    }

    /// Insert or update a budget, enforcing one budget per key
    pub fn upsert(&self, budget: Budget) -> FintrackResult<()> {
        let mut budgets = write_guard(&self.budgets)?;
        if budgets
            .values()
            .any(|b| b.id != budget.id && b.key() == budget.key())
        {
            return Err(FintrackError::Duplicate {
                entity_type: "Budget",
                identifier: format!("{} {}", budget.scope, budget.month),
            });
        }
        budgets.insert(budget.id, budget);
        Ok(())
    }

    pub fn delete(&self, id: BudgetId) -> FintrackResult<Option<Budget>> {
        let mut budgets = write_guard(&self.budgets)?;
        Ok(budgets.remove(&id))
    }

    /// Delete every budget of a scope along with its transfer history
    pub fn delete_scope(&self, scope: BudgetScope) -> FintrackResult<usize> {
        let mut budgets = write_guard(&self.budgets)?;
        let mut transfers = write_guard(&self.transfers)?;
        let before = budgets.len();
        budgets.retain(|_, b| b.scope != scope);
        transfers.retain(|t| t.scope != scope);
        Ok(before - budgets.len())
    }

    /// Drop every budget in a category (used when a custom category goes away)
    pub fn delete_by_category(&self, category_id: CategoryId) -> FintrackResult<usize> {
        let mut budgets = write_guard(&self.budgets)?;
        let before = budgets.len();
        budgets.retain(|_, b| b.category_id != category_id);
        Ok(before - budgets.len())
    }

    /// Transfer history of a scope, optionally one month, newest first
    pub fn transfers_for(
        &self,
        scope: BudgetScope,
        month: Option<Month>,
    ) -> FintrackResult<Vec<BudgetTransfer>> {
        let transfers = read_guard(&self.transfers)?;
        Ok(transfers
            .iter()
            .rev()
            .filter(|t| t.scope == scope && month.map_or(true, |m| t.month == m))
            .cloned()
            .collect())
    }

    /// Move `transfer.amount` of limit from one budget to another
    ///
    /// `from_spent` is the current spending against the source budget. The
    /// source's unspent remainder is re-read under the write lock, so two
    /// concurrent transfers cannot both draw on the same headroom. Both files
    /// are written after the in-memory state is updated; if either write
    /// fails the in-memory state is restored and the error returned.
    pub fn apply_transfer(
        &self,
        transfer: BudgetTransfer,
        from_spent: Money,
    ) -> FintrackResult<(Budget, Budget)> {
        let mut budgets = write_guard(&self.budgets)?;
        let mut transfers = write_guard(&self.transfers)?;

        let from = budgets
            .get(&transfer.from_budget)
            .cloned()
            .ok_or_else(|| FintrackError::budget_not_found(transfer.from_budget.to_string()))?;
        let to = budgets
            .get(&transfer.to_budget)
            .cloned()
            .ok_or_else(|| FintrackError::budget_not_found(transfer.to_budget.to_string()))?;

        if from.id == to.id {
            return Err(FintrackError::Budget(
                "Cannot transfer a budget to itself".into(),
            ));
        }
        if from.scope != to.scope || from.month != to.month {
            return Err(FintrackError::Budget(
                "Transfers must stay within one scope and month".into(),
            ));
        }
        if !transfer.amount.is_positive() {
            return Err(FintrackError::Validation(
                "Transfer amount must be positive".into(),
            ));
        }

        let available = (from.limit - from_spent).max(Money::zero());
        if transfer.amount > available {
            return Err(FintrackError::InsufficientFunds {
                budget: from.id.to_string(),
                needed: transfer.amount.cents(),
                available: available.cents(),
            });
        }

        let now = Utc::now();
        let mut new_from = from.clone();
        new_from.limit -= transfer.amount;
        new_from.updated_at = now;
        let mut new_to = to.clone();
        new_to.limit += transfer.amount;
        new_to.updated_at = now;

        budgets.insert(new_from.id, new_from.clone());
        budgets.insert(new_to.id, new_to.clone());
        transfers.push(transfer);

        let persisted = write_records(&self.budgets_path, sorted_records(&budgets))
            .and_then(|_| write_records(&self.transfers_path, transfers.clone()));

        if let Err(e) = persisted {
            budgets.insert(from.id, from);
            budgets.insert(to.id, to);
            transfers.pop();
            // Best effort: put the budgets file back in line with memory
            let _ = write_records(&self.budgets_path, sorted_records(&budgets));
            return Err(e);
        }

        Ok((new_from, new_to))
    }

    pub fn count(&self) -> FintrackResult<usize> {
        let budgets = read_guard(&self.budgets)?;
        Ok(budgets.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, BudgetRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = BudgetRepository::new(
            temp_dir.path().join("budgets.json"),
            temp_dir.path().join("budget_transfers.json"),
        );
        (temp_dir, repo)
    }

    fn budget(scope: BudgetScope, month: Month, cents: i64) -> Budget {
        Budget::new(
            scope,
            CategoryId::new(),
            month,
            Money::from_cents(cents),
            80,
            UserId::new(),
        )
    }

    fn month() -> Month {
        Month::new(2025, 3).unwrap()
    }

    #[test]
    fn test_unique_key() {
        let (_temp_dir, repo) = create_test_repo();
        let scope = BudgetScope::personal(UserId::new());
        let first = budget(scope, month(), 10_000);
        repo.upsert(first.clone()).unwrap();

        let mut clash = budget(scope, month(), 5_000);
        clash.category_id = first.category_id;
        let err = repo.upsert(clash).unwrap_err();
        assert!(matches!(err, FintrackError::Duplicate { .. }));

        // updating the same budget is fine
        let mut updated = first.clone();
        updated.limit = Money::from_cents(20_000);
        repo.upsert(updated).unwrap();
        assert_eq!(
            repo.find_by_key(scope, first.category_id, month())
                .unwrap()
                .unwrap()
                .limit,
            Money::from_cents(20_000)
        );
    }

    #[test]
    fn test_apply_transfer_moves_limit_and_records_history() {
        let (temp_dir, repo) = create_test_repo();
        let scope = BudgetScope::personal(UserId::new());
        let from = budget(scope, month(), 50_000);
        let to = budget(scope, month(), 10_000);
        repo.upsert(from.clone()).unwrap();
        repo.upsert(to.clone()).unwrap();

        let transfer = BudgetTransfer::new(&from, &to, Money::from_cents(15_000), "", UserId::new());
        let (new_from, new_to) = repo
            .apply_transfer(transfer, Money::from_cents(30_000))
            .unwrap();

        assert_eq!(new_from.limit, Money::from_cents(35_000));
        assert_eq!(new_to.limit, Money::from_cents(25_000));
        assert_eq!(repo.transfers_for(scope, Some(month())).unwrap().len(), 1);

        // already persisted
        let reloaded = BudgetRepository::new(
            temp_dir.path().join("budgets.json"),
            temp_dir.path().join("budget_transfers.json"),
        );
        reloaded.load().unwrap();
        assert_eq!(
            reloaded.get(from.id).unwrap().unwrap().limit,
            Money::from_cents(35_000)
        );
        assert_eq!(reloaded.transfers_for(scope, None).unwrap().len(), 1);
    }

    #[test]
    fn test_apply_transfer_rejects_overdraw() {
        let (_temp_dir, repo) = create_test_repo();
        let scope = BudgetScope::personal(UserId::new());
        let from = budget(scope, month(), 10_000);
        let to = budget(scope, month(), 0);
        repo.upsert(from.clone()).unwrap();
        repo.upsert(to.clone()).unwrap();

        let transfer = BudgetTransfer::new(&from, &to, Money::from_cents(4_000), "", UserId::new());
        let err = repo
            .apply_transfer(transfer, Money::from_cents(7_000))
            .unwrap_err();
        match err {
            FintrackError::InsufficientFunds {
                needed, available, ..
            } => {
                assert_eq!(needed, 4_000);
                assert_eq!(available, 3_000);
            }
            other => panic!("unexpected error: {other}"),
        }

        // nothing moved
        assert_eq!(repo.get(from.id).unwrap().unwrap().limit, Money::from_cents(10_000));
        assert!(repo.transfers_for(scope, None).unwrap().is_empty());
    }

    #[test]
    fn test_apply_transfer_rolls_back_when_history_cannot_be_written() {
        let temp_dir = TempDir::new().unwrap();
        let budgets_path = temp_dir.path().join("budgets.json");
        // A directory where the history file should go makes its write fail
        let transfers_path = temp_dir.path().join("budget_transfers.json");
        std::fs::create_dir(&transfers_path).unwrap();
        let repo = BudgetRepository::new(budgets_path.clone(), transfers_path);

        let scope = BudgetScope::personal(UserId::new());
        let from = budget(scope, month(), 50_000);
        let to = budget(scope, month(), 10_000);
        repo.upsert(from.clone()).unwrap();
        repo.upsert(to.clone()).unwrap();

        let transfer = BudgetTransfer::new(&from, &to, Money::from_cents(15_000), "", UserId::new());
        assert!(matches!(
            repo.apply_transfer(transfer, Money::zero()),
            Err(FintrackError::Storage(_))
        ));

        assert_eq!(repo.get(from.id).unwrap().unwrap().limit, Money::from_cents(50_000));
        assert_eq!(repo.get(to.id).unwrap().unwrap().limit, Money::from_cents(10_000));
        assert!(repo.transfers_for(scope, None).unwrap().is_empty());

        let on_disk: Vec<Budget> = read_records(&budgets_path).unwrap();
        let limit_of = |id: BudgetId| on_disk.iter().find(|b| b.id == id).unwrap().limit;
        assert_eq!(limit_of(from.id), Money::from_cents(50_000));
        assert_eq!(limit_of(to.id), Money::from_cents(10_000));
    }

    #[test]
    fn test_failed_save_drops_unsaved_budgets() {
        let temp_dir = TempDir::new().unwrap();
        let blocked = temp_dir.path().join("blocked");
        std::fs::write(&blocked, b"").unwrap();
        let repo = BudgetRepository::new(
            blocked.join("budgets.json"),
            blocked.join("budget_transfers.json"),
        );

        repo.upsert(budget(BudgetScope::personal(UserId::new()), month(), 100))
            .unwrap();
        assert!(matches!(repo.save(), Err(FintrackError::Storage(_))));
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn test_apply_transfer_requires_same_month() {
        let (_temp_dir, repo) = create_test_repo();
        let scope = BudgetScope::personal(UserId::new());
        let from = budget(scope, month(), 10_000);
        let to = budget(scope, month().next(), 0);
        repo.upsert(from.clone()).unwrap();
        repo.upsert(to.clone()).unwrap();

        let transfer = BudgetTransfer::new(&from, &to, Money::from_cents(100), "", UserId::new());
        assert!(matches!(
            repo.apply_transfer(transfer, Money::zero()),
            Err(FintrackError::Budget(_))
        ));
    }

    #[test]
    fn test_delete_scope() {
        let (_temp_dir, repo) = create_test_repo();
        let family = BudgetScope::family(crate::models::FamilyId::new());
        let personal = BudgetScope::personal(UserId::new());
        repo.upsert(budget(family, month(), 100)).unwrap();
        repo.upsert(budget(family, month().next(), 100)).unwrap();
        repo.upsert(budget(personal, month(), 100)).unwrap();

        assert_eq!(repo.get_for_scope(family, None).unwrap().len(), 2);
        assert_eq!(repo.delete_scope(family).unwrap(), 2);
        assert_eq!(repo.count().unwrap(), 1);
    }
}
