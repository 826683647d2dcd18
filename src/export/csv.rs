//! CSV Export functionality
//!
//! The transaction export uses the same column names the importer reads, so
//! a file exported by one user can be imported by another.

use std::collections::HashMap;
use std::io::Write;

use chrono::NaiveDate;

use crate::error::FintrackResult;
use crate::models::{CategoryId, Month, UserId};
use crate::services::{BudgetService, CategoryService};
use crate::storage::Storage;

use super::{escape_csv, write_error};

/// Export a user's transactions to CSV, oldest first
///
/// `range` limits the export to an inclusive date range.
pub fn export_transactions_csv<W: Write>(
    storage: &Storage,
    user_id: UserId,
    range: Option<(NaiveDate, NaiveDate)>,
    writer: &mut W,
) -> FintrackResult<usize> {
    let names = category_names(storage, user_id)?;

    let mut transactions = storage.transactions.get_by_user(user_id)?;
    if let Some((start, end)) = range {
        transactions.retain(|t| t.date >= start && t.date <= end);
    }
    transactions.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));

    writeln!(writer, "id,date,type,amount,category,description,payee,tags")
        .map_err(write_error)?;

    for txn in &transactions {
        let category = names
            .get(&txn.category_id)
            .map(String::as_str)
            .unwrap_or("Unknown");
        writeln!(
            writer,
            "{},{},{},{:.2},{},{},{},{}",
            txn.id.as_uuid(),
            txn.date,
            txn.kind.to_string().to_lowercase(),
            txn.amount.as_f64(),
            escape_csv(category),
            escape_csv(&txn.description),
            escape_csv(&txn.payee),
            escape_csv(&txn.tags.join(";"))
        )
        .map_err(write_error)?;
    }

    Ok(transactions.len())
}

/// Export the budgets of every scope the user can see
pub fn export_budgets_csv<W: Write>(
    storage: &Storage,
    user_id: UserId,
    month: Option<Month>,
    writer: &mut W,
) -> FintrackResult<usize> {
    let names = category_names(storage, user_id)?;
    let service = BudgetService::new(storage);

    writeln!(
        writer,
        "month,scope,category,limit,spent,remaining,percent_used,status"
    )
    .map_err(write_error)?;

    let mut rows = 0;
    for scope in service.scopes_for(user_id)? {
        let mut budgets = storage.budgets.get_for_scope(scope, month)?;
        budgets.sort_by(|a, b| a.month.cmp(&b.month));
        for budget in &budgets {
            let summary = service.summary(budget)?;
            writeln!(
                writer,
                "{},{},{},{:.2},{:.2},{:.2},{:.1},{}",
                budget.month,
                scope,
                escape_csv(
                    names
                        .get(&budget.category_id)
                        .map(String::as_str)
                        .unwrap_or("Unknown")
                ),
                summary.limit.as_f64(),
                summary.spent.as_f64(),
                summary.remaining.as_f64(),
                summary.percent_used,
                summary.status
            )
            .map_err(write_error)?;
            rows += 1;
        }
    }

    Ok(rows)
}

fn category_names(storage: &Storage, user_id: UserId) -> FintrackResult<HashMap<CategoryId, String>> {
    Ok(CategoryService::new(storage)
        .list_visible(user_id)?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect())
}
