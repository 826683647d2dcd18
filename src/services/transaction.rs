//! Transaction service
//!
//! Provides business logic for recording, editing and querying income and
//! expense transactions, plus the per-month summary used by reports.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::audit::EntityType;
use crate::error::{FintrackError, FintrackResult};
use crate::models::{
    Category, CategoryId, Money, Month, Transaction, TransactionId, TransactionKind, UserId,
};
use crate::storage::Storage;

use super::category::CategoryService;

/// Service for transaction management
pub struct TransactionService<'a> {
    storage: &'a Storage,
}

/// Input for creating a new transaction
#[derive(Debug, Clone)]
pub struct CreateTransactionInput {
    pub kind: TransactionKind,
    pub amount: Money,
    pub category_id: CategoryId,
    pub date: NaiveDate,
    pub description: String,
    pub payee: String,
    pub tags: Vec<String>,
}

/// Partial update; `None` leaves a field as it is
#[derive(Debug, Clone, Default)]
pub struct UpdateTransactionInput {
    pub kind: Option<TransactionKind>,
    pub amount: Option<Money>,
    pub category_id: Option<CategoryId>,
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    pub payee: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Filter options for listing transactions
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub kind: Option<TransactionKind>,
    pub category: Option<CategoryId>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub search: Option<String>,
    pub min_amount: Option<Money>,
    pub max_amount: Option<Money>,
    pub limit: Option<usize>,
}

impl TransactionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn category(mut self, category_id: CategoryId) -> Self {
        self.category = Some(category_id);
        self
    }

    pub fn date_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    pub fn month(self, month: Month) -> Self {
        self.date_range(month.start_date(), month.end_date())
    }

    pub fn search(mut self, needle: impl Into<String>) -> Self {
        self.search = Some(needle.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn matches(&self, txn: &Transaction) -> bool {
        self.kind.map_or(true, |k| txn.kind == k)
            && self.category.map_or(true, |c| txn.category_id == c)
            && self.start.map_or(true, |d| txn.date >= d)
            && self.end.map_or(true, |d| txn.date <= d)
            && self.min_amount.map_or(true, |m| txn.amount >= m)
            && self.max_amount.map_or(true, |m| txn.amount <= m)
            && self
                .search
                .as_deref()
                .map_or(true, |s| s.trim().is_empty() || txn.matches_search(s))
    }
}

/// Totals for one category within a month
#[derive(Debug, Clone, Serialize)]
pub struct CategoryTotal {
    pub category_id: CategoryId,
    pub category_name: String,
    pub kind: TransactionKind,
    pub total: Money,
    pub count: usize,
}

/// Income, expenses and savings for one month
#[derive(Debug, Clone, Serialize)]
pub struct MonthlySummary {
    pub month: Month,
    pub income: Money,
    pub expenses: Money,
    pub net: Money,
    /// Net as a percentage of income; zero without income
    pub savings_rate: f64,
    /// Largest totals first
    pub by_category: Vec<CategoryTotal>,
}

impl MonthlySummary {
    /// Summarise `transactions`, naming categories from `categories`
    pub fn from_transactions(
        month: Month,
        transactions: &[Transaction],
        categories: &[Category],
    ) -> Self {
        let names: HashMap<CategoryId, &str> =
            categories.iter().map(|c| (c.id, c.name.as_str())).collect();

        let mut income = Money::zero();
        let mut expenses = Money::zero();
        let mut totals: HashMap<CategoryId, CategoryTotal> = HashMap::new();

        for txn in transactions.iter().filter(|t| month.contains(t.date)) {
            if txn.is_income() {
                income += txn.amount;
            } else {
                expenses += txn.amount;
            }
            let entry = totals.entry(txn.category_id).or_insert_with(|| CategoryTotal {
                category_id: txn.category_id,
                category_name: names
                    .get(&txn.category_id)
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "Unknown".to_string()),
                kind: txn.kind,
                total: Money::zero(),
                count: 0,
            });
            entry.total += txn.amount;
            entry.count += 1;
        }

        let mut by_category: Vec<CategoryTotal> = totals.into_values().collect();
        by_category.sort_by(|a, b| {
            b.total
                .cmp(&a.total)
                .then_with(|| a.category_name.cmp(&b.category_name))
        });

        let net = income - expenses;
        let savings_rate = if income.is_positive() {
            net.percent_of(income)
        } else {
            0.0
        };

        Self {
            month,
            income,
            expenses,
            net,
            savings_rate,
            by_category,
        }
    }
}

impl<'a> TransactionService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// The category must be visible to the user, active, and of the same kind
    fn check_category(
        &self,
        user_id: UserId,
        category_id: CategoryId,
        kind: TransactionKind,
    ) -> FintrackResult<Category> {
        let category = CategoryService::new(self.storage).get(user_id, category_id)?;
        if category.archived {
            return Err(FintrackError::Validation(format!(
                "Category '{}' is archived",
                category.name
            )));
        }
        if category.kind != kind {
            return Err(FintrackError::Validation(format!(
                "Category '{}' is for {} transactions, not {}",
                category.name,
                category.kind.to_string().to_lowercase(),
                kind.to_string().to_lowercase()
            )));
        }
        Ok(category)
    }

    /// Record a new transaction
    pub fn create(
        &self,
        user_id: UserId,
        input: CreateTransactionInput,
    ) -> FintrackResult<Transaction> {
        self.check_category(user_id, input.category_id, input.kind)?;

        let mut txn = Transaction::new(
            user_id,
            input.kind,
            input.amount,
            input.category_id,
            input.date,
        );
        txn.description = input.description.trim().to_string();
        txn.payee = input.payee.trim().to_string();
        txn.tags = input.tags.iter().map(|t| t.trim().to_string()).collect();

        txn.validate()
            .map_err(|e| FintrackError::Validation(e.to_string()))?;

        self.storage.transactions.upsert(txn.clone())?;
        self.storage.transactions.save()?;

        self.storage.log_create(
            Some(user_id),
            EntityType::Transaction,
            txn.id.to_string(),
            Some(txn.description.clone()).filter(|d| !d.is_empty()),
            &txn,
        )?;

        Ok(txn)
    }

    /// Get one of the user's transactions
    pub fn get(&self, user_id: UserId, id: TransactionId) -> FintrackResult<Transaction> {
        match self.storage.transactions.get(id)? {
            Some(txn) if txn.user_id == user_id => Ok(txn),
            // someone else's transaction looks the same as a missing one
            _ => Err(FintrackError::transaction_not_found(id.to_string())),
        }
    }

    /// Find one of the user's transactions by full or short ID
    pub fn find(&self, user_id: UserId, identifier: &str) -> FintrackResult<Transaction> {
        if let Ok(id) = TransactionId::parse(identifier.trim()) {
            return self.get(user_id, id);
        }
        let mut matches: Vec<Transaction> = self
            .storage
            .transactions
            .get_by_user(user_id)?
            .into_iter()
            .filter(|t| t.id.matches_short(identifier))
            .collect();
        match matches.len() {
            1 => Ok(matches.remove(0)),
            0 => Err(FintrackError::transaction_not_found(identifier)),
            n => Err(FintrackError::Validation(format!(
                "'{}' matches {} transactions; use more of the ID",
                identifier, n
            ))),
        }
    }

    pub fn update(
        &self,
        user_id: UserId,
        id: TransactionId,
        input: UpdateTransactionInput,
    ) -> FintrackResult<Transaction> {
        let mut txn = self.get(user_id, id)?;
        let before = txn.clone();

        if let Some(kind) = input.kind {
            txn.kind = kind;
        }
        if let Some(amount) = input.amount {
            txn.amount = amount;
        }
        if let Some(category_id) = input.category_id {
            txn.category_id = category_id;
        }
        if let Some(date) = input.date {
            txn.date = date;
        }
        if let Some(description) = input.description {
            txn.description = description.trim().to_string();
        }
        if let Some(payee) = input.payee {
            txn.payee = payee.trim().to_string();
        }
        if let Some(tags) = input.tags {
            txn.tags = tags.iter().map(|t| t.trim().to_string()).collect();
        }

        if txn.kind != before.kind || txn.category_id != before.category_id {
            self.check_category(user_id, txn.category_id, txn.kind)?;
        }
        txn.validate()
            .map_err(|e| FintrackError::Validation(e.to_string()))?;
        txn.touch();

        self.storage.transactions.upsert(txn.clone())?;
        self.storage.transactions.save()?;

        self.storage.log_update(
            Some(user_id),
            EntityType::Transaction,
            txn.id.to_string(),
            Some(txn.description.clone()).filter(|d| !d.is_empty()),
            &before,
            &txn,
        )?;

        Ok(txn)
    }

    pub fn delete(&self, user_id: UserId, id: TransactionId) -> FintrackResult<Transaction> {
        let txn = self.get(user_id, id)?;

        self.storage.transactions.delete(id)?;
        self.storage.transactions.save()?;

        self.storage.log_delete(
            Some(user_id),
            EntityType::Transaction,
            txn.id.to_string(),
            Some(txn.description.clone()).filter(|d| !d.is_empty()),
            &txn,
        )?;

        Ok(txn)
    }

    /// The user's transactions matching `filter`, newest first
    pub fn list(
        &self,
        user_id: UserId,
        filter: &TransactionFilter,
    ) -> FintrackResult<Vec<Transaction>> {
        let txns = self
            .storage
            .transactions
            .get_by_user(user_id)?
            .into_iter()
            .filter(|t| filter.matches(t));

        Ok(match filter.limit {
            Some(limit) => txns.take(limit).collect(),
            None => txns.collect(),
        })
    }

    pub fn monthly_summary(&self, user_id: UserId, month: Month) -> FintrackResult<MonthlySummary> {
        let txns = self.storage.transactions.get_for_users_in_range(
            &[user_id],
            month.start_date(),
            month.end_date(),
        )?;
        let categories = CategoryService::new(self.storage).list_visible(user_id)?;
        Ok(MonthlySummary::from_transactions(month, &txns, &categories))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{create_test_storage, register};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn input(
        kind: TransactionKind,
        cents: i64,
        category_id: CategoryId,
        day: u32,
    ) -> CreateTransactionInput {
        CreateTransactionInput {
            kind,
            amount: Money::from_cents(cents),
            category_id,
            date: date(2025, 3, day),
            description: format!("txn on {}", day),
            payee: String::new(),
            tags: Vec::new(),
        }
    }

    fn category(storage: &Storage, user_id: UserId, name: &str) -> CategoryId {
        CategoryService::new(storage).resolve(user_id, name).unwrap().id
    }

    #[test]
    fn test_create_checks_category() {
        let (_temp_dir, storage) = create_test_storage();
        let service = TransactionService::new(&storage);
        let alice = register(&storage, "alice");
        let groceries = category(&storage, alice.id, "Groceries");
        let salary = category(&storage, alice.id, "Salary");

        let txn = service
            .create(alice.id, input(TransactionKind::Expense, 4_250, groceries, 3))
            .unwrap();
        assert_eq!(txn.amount.cents(), 4_250);
        assert_eq!(storage.audit().entry_count().unwrap(), 2);

        // kind mismatch
        assert!(service
            .create(alice.id, input(TransactionKind::Income, 100, groceries, 3))
            .unwrap_err()
            .is_validation());
        assert!(service
            .create(alice.id, input(TransactionKind::Expense, 100, salary, 3))
            .unwrap_err()
            .is_validation());
        // non-positive amount
        assert!(service
            .create(alice.id, input(TransactionKind::Expense, 0, groceries, 3))
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn test_other_users_cannot_see_or_edit() {
        let (_temp_dir, storage) = create_test_storage();
        let service = TransactionService::new(&storage);
        let alice = register(&storage, "alice");
        let bob = register(&storage, "bob");
        let groceries = category(&storage, alice.id, "Groceries");

        let txn = service
            .create(alice.id, input(TransactionKind::Expense, 1_000, groceries, 1))
            .unwrap();

        assert!(service.get(bob.id, txn.id).unwrap_err().is_not_found());
        assert!(service.delete(bob.id, txn.id).unwrap_err().is_not_found());
        assert!(service
            .update(bob.id, txn.id, UpdateTransactionInput::default())
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_update_and_find_short_id() {
        let (_temp_dir, storage) = create_test_storage();
        let service = TransactionService::new(&storage);
        let alice = register(&storage, "alice");
        let groceries = category(&storage, alice.id, "Groceries");
        let salary = category(&storage, alice.id, "Salary");

        let txn = service
            .create(alice.id, input(TransactionKind::Expense, 1_000, groceries, 1))
            .unwrap();

        let found = service.find(alice.id, &txn.id.to_string()).unwrap();
        assert_eq!(found.id, txn.id);

        let updated = service
            .update(
                alice.id,
                txn.id,
                UpdateTransactionInput {
                    amount: Some(Money::from_cents(1_500)),
                    description: Some(" Weekly shop ".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.amount.cents(), 1_500);
        assert_eq!(updated.description, "Weekly shop");

        // switching kind requires a matching category
        let bad = service.update(
            alice.id,
            txn.id,
            UpdateTransactionInput {
                kind: Some(TransactionKind::Income),
                ..Default::default()
            },
        );
        assert!(bad.unwrap_err().is_validation());

        let switched = service
            .update(
                alice.id,
                txn.id,
                UpdateTransactionInput {
                    kind: Some(TransactionKind::Income),
                    category_id: Some(salary),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(switched.is_income());
    }

    #[test]
    fn test_list_filters() {
        let (_temp_dir, storage) = create_test_storage();
        let service = TransactionService::new(&storage);
        let alice = register(&storage, "alice");
        let groceries = category(&storage, alice.id, "Groceries");
        let dining = category(&storage, alice.id, "Dining Out");

        for (cents, cat, day) in [(1_000, groceries, 1), (2_500, dining, 5), (7_000, groceries, 9)]
        {
            service
                .create(alice.id, input(TransactionKind::Expense, cents, cat, day))
                .unwrap();
        }

        let all = service.list(alice.id, &TransactionFilter::new()).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].date, date(2025, 3, 9));

        let groceries_only = service
            .list(alice.id, &TransactionFilter::new().category(groceries))
            .unwrap();
        assert_eq!(groceries_only.len(), 2);

        let ranged = service
            .list(
                alice.id,
                &TransactionFilter::new().date_range(date(2025, 3, 2), date(2025, 3, 9)),
            )
            .unwrap();
        assert_eq!(ranged.len(), 2);

        let big = TransactionFilter {
            min_amount: Some(Money::from_cents(2_000)),
            ..Default::default()
        };
        assert_eq!(service.list(alice.id, &big).unwrap().len(), 2);

        let searched = service
            .list(alice.id, &TransactionFilter::new().search("ON 5"))
            .unwrap();
        assert_eq!(searched.len(), 1);

        let limited = service
            .list(alice.id, &TransactionFilter::new().limit(1))
            .unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn test_monthly_summary() {
        let (_temp_dir, storage) = create_test_storage();
        let service = TransactionService::new(&storage);
        let alice = register(&storage, "alice");
        let groceries = category(&storage, alice.id, "Groceries");
        let salary = category(&storage, alice.id, "Salary");

        service
            .create(alice.id, input(TransactionKind::Income, 400_000, salary, 1))
            .unwrap();
        service
            .create(alice.id, input(TransactionKind::Expense, 30_000, groceries, 2))
            .unwrap();
        service
            .create(alice.id, input(TransactionKind::Expense, 70_000, groceries, 20))
            .unwrap();

        let summary = service
            .monthly_summary(alice.id, Month::new(2025, 3).unwrap())
            .unwrap();
        assert_eq!(summary.income.cents(), 400_000);
        assert_eq!(summary.expenses.cents(), 100_000);
        assert_eq!(summary.net.cents(), 300_000);
        assert!((summary.savings_rate - 75.0).abs() < 1e-9);
        assert_eq!(summary.by_category[0].category_name, "Salary");
        assert_eq!(summary.by_category[1].count, 2);

        let empty = service
            .monthly_summary(alice.id, Month::new(2025, 4).unwrap())
            .unwrap();
        assert_eq!(empty.savings_rate, 0.0);
    }
}
