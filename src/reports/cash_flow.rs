//! Cash Flow Report
//!
//! Income, expenses and net per month over a trailing window.

use std::io::Write;

use crate::error::{FintrackError, FintrackResult};
use crate::models::{Money, Month, UserId};
use crate::services::insights::MAX_WINDOW_MONTHS;
use crate::services::{CategoryService, MonthlySummary};
use crate::storage::Storage;

use super::write_error;

#[derive(Debug, Clone)]
pub struct CashFlowRow {
    pub month: Month,
    pub income: Money,
    pub expenses: Money,
    pub net: Money,
    pub savings_rate: f64,
}

#[derive(Debug, Clone)]
pub struct CashFlowReport {
    /// Oldest month first
    pub rows: Vec<CashFlowRow>,
    pub total_income: Money,
    pub total_expenses: Money,
    pub total_net: Money,
    pub average_net: Money,
}

impl CashFlowReport {
    /// Generate the report for `months` months ending with `through`
    pub fn generate(
        storage: &Storage,
        user_id: UserId,
        through: Month,
        months: u32,
    ) -> FintrackResult<Self> {
        let months = months.max(1);
        if months > MAX_WINDOW_MONTHS {
            return Err(FintrackError::Validation(format!(
                "A window of {} months is longer than the {} allowed",
                months, MAX_WINDOW_MONTHS
            )));
        }
        let first = through.minus(months - 1);
        let categories = CategoryService::new(storage).list_visible(user_id)?;
        let transactions = storage.transactions.get_for_users_in_range(
            &[user_id],
            first.start_date(),
            through.end_date(),
        )?;

        let rows: Vec<CashFlowRow> = through
            .range_back(months)
            .into_iter()
            .map(|month| {
                let summary = MonthlySummary::from_transactions(month, &transactions, &categories);
                CashFlowRow {
                    month,
                    income: summary.income,
                    expenses: summary.expenses,
                    net: summary.net,
                    savings_rate: summary.savings_rate,
                }
            })
            .collect();

        let total_income: Money = rows.iter().map(|r| r.income).sum();
        let total_expenses: Money = rows.iter().map(|r| r.expenses).sum();
        let total_net = total_income - total_expenses;
        let average_net = Money::from_cents(total_net.cents() / rows.len() as i64);

        Ok(Self {
            rows,
            total_income,
            total_expenses,
            total_net,
            average_net,
        })
    }

    pub fn format_terminal(&self) -> String {
        let mut output = String::new();

        if let (Some(first), Some(last)) = (self.rows.first(), self.rows.last()) {
            output.push_str(&format!("Cash Flow: {} to {}\n", first.month, last.month));
        }
        output.push_str(&"=".repeat(64));
        output.push('\n');
        output.push_str(&format!(
            "{:<10} {:>14} {:>14} {:>14} {:>8}\n",
            "Month", "Income", "Expenses", "Net", "Saved"
        ));
        output.push_str(&"-".repeat(64));
        output.push('\n');

        for row in &self.rows {
            output.push_str(&format!(
                "{:<10} {:>14} {:>14} {:>14} {:>7.1}%\n",
                row.month, row.income, row.expenses, row.net, row.savings_rate
            ));
        }

        output.push_str(&"-".repeat(64));
        output.push('\n');
        output.push_str(&format!(
            "{:<10} {:>14} {:>14} {:>14}\n",
            "TOTAL", self.total_income, self.total_expenses, self.total_net
        ));
        output.push_str(&format!("Average monthly net: {}\n", self.average_net));

        output
    }

    pub fn export_csv<W: Write>(&self, writer: &mut W) -> FintrackResult<()> {
        writeln!(writer, "Month,Income,Expenses,Net,Savings Rate").map_err(write_error)?;
        for row in &self.rows {
            writeln!(
                writer,
                "{},{:.2},{:.2},{:.2},{:.2}",
                row.month,
                row.income.as_f64(),
                row.expenses.as_f64(),
                row.net.as_f64(),
                row.savings_rate
            )
            .map_err(write_error)?;
        }
        Ok(())
    }
}
