//! Budget Report
//!
//! One scope's budgets for a month: limit, spending, remaining and status
//! per category.

use std::collections::HashMap;
use std::io::Write;

use crate::error::FintrackResult;
use crate::export::escape_csv;
use crate::models::{BudgetScope, BudgetStatus, CategoryId, Money, Month, UserId};
use crate::services::{BudgetService, BudgetTotals, CategoryService};
use crate::storage::Storage;

use super::write_error;

#[derive(Debug, Clone)]
pub struct BudgetReportRow {
    pub category_id: CategoryId,
    pub category_name: String,
    pub limit: Money,
    pub spent: Money,
    pub remaining: Money,
    pub percent_used: f64,
    pub status: BudgetStatus,
}

#[derive(Debug, Clone)]
pub struct BudgetReport {
    pub scope: BudgetScope,
    pub month: Month,
    /// Sorted by category name
    pub rows: Vec<BudgetReportRow>,
    pub totals: BudgetTotals,
}

impl BudgetReport {
    pub fn generate(
        storage: &Storage,
        actor: UserId,
        scope: BudgetScope,
        month: Month,
    ) -> FintrackResult<Self> {
        let overview = BudgetService::new(storage).overview(actor, scope, month)?;
        let names: HashMap<CategoryId, String> = CategoryService::new(storage)
            .list_visible(actor)?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        let mut rows: Vec<BudgetReportRow> = overview
            .summaries
            .iter()
            .map(|s| BudgetReportRow {
                category_id: s.category_id,
                category_name: names
                    .get(&s.category_id)
                    .cloned()
                    .unwrap_or_else(|| "Unknown".to_string()),
                limit: s.limit,
                spent: s.spent,
                remaining: s.remaining,
                percent_used: s.percent_used,
                status: s.status,
            })
            .collect();
        rows.sort_by(|a, b| a.category_name.cmp(&b.category_name));

        Ok(Self {
            scope,
            month,
            rows,
            totals: overview.totals,
        })
    }

    pub fn format_terminal(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Budget Report ({}): {}\n", self.scope, self.month));
        output.push_str(&"=".repeat(86));
        output.push('\n');

        if self.rows.is_empty() {
            output.push_str("No budgets set for this month.\n");
            return output;
        }

        output.push_str(&format!(
            "{:<24} {:>12} {:>12} {:>12} {:>7}  {}\n",
            "Category", "Limit", "Spent", "Remaining", "Used", "Status"
        ));
        output.push_str(&"-".repeat(86));
        output.push('\n');

        for row in &self.rows {
            let marker = match row.status {
                BudgetStatus::OverBudget => "!!",
                BudgetStatus::NearLimit => "! ",
                BudgetStatus::UnderBudget => "  ",
            };
            output.push_str(&format!(
                "{:<24} {:>12} {:>12} {:>12} {:>6.1}% {}{}\n",
                row.category_name,
                row.limit,
                row.spent,
                row.remaining,
                row.percent_used,
                marker,
                row.status
            ));
        }

        output.push_str(&"-".repeat(86));
        output.push('\n');
        output.push_str(&format!(
            "{:<24} {:>12} {:>12} {:>12} {:>6.1}%\n",
            "TOTAL",
            self.totals.limit,
            self.totals.spent,
            self.totals.remaining,
            self.totals.percent_used
        ));
        if self.totals.over_budget > 0 || self.totals.near_limit > 0 {
            output.push_str(&format!(
                "\n{} over budget, {} near the limit\n",
                self.totals.over_budget, self.totals.near_limit
            ));
        }

        output
    }

    pub fn export_csv<W: Write>(&self, writer: &mut W) -> FintrackResult<()> {
        writeln!(
            writer,
            "Month,Scope,Category,Limit,Spent,Remaining,Percent Used,Status"
        )
        .map_err(write_error)?;

        for row in &self.rows {
            writeln!(
                writer,
                "{},{},{},{:.2},{:.2},{:.2},{:.1},{}",
                self.month,
                self.scope,
                escape_csv(&row.category_name),
                row.limit.as_f64(),
                row.spent.as_f64(),
                row.remaining.as_f64(),
                row.percent_used,
                row.status
            )
            .map_err(write_error)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Transaction, TransactionKind};
    use crate::services::testing::{create_test_storage, register};
    use crate::services::CreateBudgetInput;
    use chrono::NaiveDate;

    #[test]
    fn test_budget_report() {
        let (_temp_dir, storage) = create_test_storage();
        let alice = register(&storage, "alice");
        let month = Month::new(2025, 6).unwrap();
        let service = BudgetService::new(&storage);

        for (name, limit, spent) in [("Groceries", 10_000, 9_000), ("Entertainment", 5_000, 6_000)] {
            let category = storage
                .categories
                .find_builtin(name, TransactionKind::Expense)
                .unwrap()
                .unwrap();
            service
                .create(
                    alice.id,
                    CreateBudgetInput {
                        scope: BudgetScope::personal(alice.id),
                        category_id: category.id,
                        month,
                        limit: Money::from_cents(limit),
                        alert_threshold: 80,
                        notes: String::new(),
                    },
                )
                .unwrap();
            storage
                .transactions
                .upsert(Transaction::expense(
                    alice.id,
                    Money::from_cents(spent),
                    category.id,
                    NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
                    "",
                ))
                .unwrap();
        }

        let report =
            BudgetReport::generate(&storage, alice.id, BudgetScope::personal(alice.id), month)
                .unwrap();
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].category_name, "Entertainment");
        assert_eq!(report.rows[0].status, BudgetStatus::OverBudget);
        assert_eq!(report.rows[1].status, BudgetStatus::NearLimit);
        assert_eq!(report.totals.spent.cents(), 15_000);

        let text = report.format_terminal();
        assert!(text.contains("1 over budget, 1 near the limit"));

        let mut csv = Vec::new();
        report.export_csv(&mut csv).unwrap();
        let csv = String::from_utf8(csv).unwrap();
        assert!(csv.contains("2025-06,personal,Groceries,100.00,90.00,10.00,90.0,Near limit"));
    }

    #[test]
    fn test_empty_budget_report() {
        let (_temp_dir, storage) = create_test_storage();
        let alice = register(&storage, "alice");
        let report = BudgetReport::generate(
            &storage,
            alice.id,
            BudgetScope::personal(alice.id),
            Month::new(2025, 6).unwrap(),
        )
        .unwrap();
        assert!(report.format_terminal().contains("No budgets set"));
    }
}
