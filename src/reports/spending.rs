//! Spending Report
//!
//! Expense totals by category for a date range, with each category's share
//! of total spending.

use std::collections::HashMap;
use std::io::Write;

use chrono::NaiveDate;

use crate::error::FintrackResult;
use crate::export::escape_csv;
use crate::models::{CategoryId, Money, UserId};
use crate::services::CategoryService;
use crate::storage::Storage;

use super::write_error;

/// Spending in one category
#[derive(Debug, Clone)]
pub struct SpendingByCategory {
    pub category_id: CategoryId,
    pub category_name: String,
    pub total_spending: Money,
    pub transaction_count: usize,
    /// Share of total spending
    pub percentage: f64,
}

#[derive(Debug, Clone)]
pub struct SpendingReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Largest spending first
    pub categories: Vec<SpendingByCategory>,
    pub total_spending: Money,
    pub total_income: Money,
    /// Expense transactions only
    pub total_transactions: usize,
}

impl SpendingReport {
    /// Generate a spending report for an inclusive date range
    pub fn generate(
        storage: &Storage,
        user_id: UserId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> FintrackResult<Self> {
        let names: HashMap<CategoryId, String> = CategoryService::new(storage)
            .list_visible(user_id)?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();
        let transactions =
            storage
                .transactions
                .get_for_users_in_range(&[user_id], start_date, end_date)?;

        let mut by_category: HashMap<CategoryId, (Money, usize)> = HashMap::new();
        let mut total_spending = Money::zero();
        let mut total_income = Money::zero();
        let mut total_transactions = 0;

        for txn in &transactions {
            if txn.is_income() {
                total_income += txn.amount;
                continue;
            }
            let entry = by_category
                .entry(txn.category_id)
                .or_insert((Money::zero(), 0));
            entry.0 += txn.amount;
            entry.1 += 1;
            total_spending += txn.amount;
            total_transactions += 1;
        }

        let mut categories: Vec<SpendingByCategory> = by_category
            .into_iter()
            .map(|(category_id, (total, count))| SpendingByCategory {
                category_id,
                category_name: names
                    .get(&category_id)
                    .cloned()
                    .unwrap_or_else(|| "Unknown".to_string()),
                total_spending: total,
                transaction_count: count,
                percentage: total.percent_of(total_spending),
            })
            .collect();
        categories.sort_by(|a, b| {
            b.total_spending
                .cmp(&a.total_spending)
                .then_with(|| a.category_name.cmp(&b.category_name))
        });

        Ok(Self {
            start_date,
            end_date,
            categories,
            total_spending,
            total_income,
            total_transactions,
        })
    }

    /// The `limit` categories with the most spending
    pub fn top_categories(&self, limit: usize) -> &[SpendingByCategory] {
        &self.categories[..limit.min(self.categories.len())]
    }

    pub fn format_terminal(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "Spending Report: {} to {}\n",
            self.start_date, self.end_date
        ));
        output.push_str(&"=".repeat(68));
        output.push('\n');
        output.push_str(&format!("Total Spending: {}\n", self.total_spending));
        output.push_str(&format!("Total Income: {}\n\n", self.total_income));

        output.push_str(&format!(
            "{:<35} {:>14} {:>8} {:>8}\n",
            "Category", "Amount", "Count", "%"
        ));
        output.push_str(&"-".repeat(68));
        output.push('\n');

        for category in &self.categories {
            output.push_str(&format!(
                "{:<35} {:>14} {:>8} {:>7.1}%\n",
                category.category_name,
                category.total_spending,
                category.transaction_count,
                category.percentage
            ));
        }

        output.push_str(&"-".repeat(68));
        output.push('\n');
        output.push_str(&format!(
            "{:<35} {:>14} {:>8}\n",
            "TOTAL SPENDING", self.total_spending, self.total_transactions
        ));

        output
    }

    pub fn export_csv<W: Write>(&self, writer: &mut W) -> FintrackResult<()> {
        writeln!(
            writer,
            "Start Date,End Date,Category,Amount,Transaction Count,Percentage"
        )
        .map_err(write_error)?;

        for category in &self.categories {
            writeln!(
                writer,
                "{},{},{},{:.2},{},{:.2}",
                self.start_date,
                self.end_date,
                escape_csv(&category.category_name),
                category.total_spending.as_f64(),
                category.transaction_count,
                category.percentage
            )
            .map_err(write_error)?;
        }

        writeln!(
            writer,
            "{},{},TOTAL,{:.2},{},100.00",
            self.start_date,
            self.end_date,
            self.total_spending.as_f64(),
            self.total_transactions
        )
        .map_err(write_error)?;

        Ok(())
    }
}
