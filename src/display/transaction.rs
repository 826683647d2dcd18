//! Transaction display formatting

use std::collections::HashMap;

use tabled::Tabled;

use crate::models::{CategoryId, Transaction};
use crate::services::MonthlySummary;

use super::{format_bar, render_table, truncate};

#[derive(Tabled)]
struct TransactionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Amount")]
    amount: String,
}

/// Transactions as a table; expenses show as negative amounts
pub fn format_transaction_table(
    transactions: &[Transaction],
    category_names: &HashMap<CategoryId, String>,
) -> String {
    if transactions.is_empty() {
        return "No transactions found.\n".to_string();
    }

    let rows = transactions
        .iter()
        .map(|txn| {
            let mut description = txn.description.clone();
            if !txn.payee.is_empty() {
                if description.is_empty() {
                    description = txn.payee.clone();
                } else {
                    description = format!("{} ({})", description, txn.payee);
                }
            }
            TransactionRow {
                id: txn.id.to_string(),
                date: txn.date.format("%Y-%m-%d").to_string(),
                category: category_names
                    .get(&txn.category_id)
                    .map(|n| truncate(n, 18))
                    .unwrap_or_else(|| "Unknown".to_string()),
                description: truncate(&description, 36),
                amount: txn.signed_amount().to_string(),
            }
        })
        .collect();

    let mut output = render_table(rows, 4);
    output.push('\n');
    output
}

pub fn format_transaction_details(txn: &Transaction, category_name: Option<&str>) -> String {
    let mut output = String::new();

    output.push_str(&format!("Transaction: {}\n", txn.id.as_uuid()));
    output.push_str(&format!("Date:        {}\n", txn.date.format("%Y-%m-%d")));
    output.push_str(&format!("Type:        {}\n", txn.kind));
    output.push_str(&format!("Amount:      {}\n", txn.amount));
    output.push_str(&format!(
        "Category:    {}\n",
        category_name.unwrap_or("(unknown)")
    ));
    if !txn.description.is_empty() {
        output.push_str(&format!("Description: {}\n", txn.description));
    }
    if !txn.payee.is_empty() {
        output.push_str(&format!("Payee:       {}\n", txn.payee));
    }
    if !txn.tags.is_empty() {
        output.push_str(&format!("Tags:        {}\n", txn.tags.join(", ")));
    }
    if txn.import_id.is_some() {
        output.push_str("Source:      CSV import\n");
    }

    output
}

/// Month totals followed by a bar per category
pub fn format_monthly_summary(summary: &MonthlySummary) -> String {
    let mut output = String::new();

    output.push_str(&format!("Summary for {}\n", summary.month));
    output.push_str(&"=".repeat(56));
    output.push('\n');
    output.push_str(&format!("Income:       {:>14}\n", summary.income));
    output.push_str(&format!("Expenses:     {:>14}\n", summary.expenses));
    output.push_str(&format!("Net:          {:>14}\n", summary.net));
    output.push_str(&format!("Savings rate: {:>13.1}%\n", summary.savings_rate));

    if summary.by_category.is_empty() {
        return output;
    }

    let max = summary
        .by_category
        .iter()
        .map(|c| c.total.cents())
        .max()
        .unwrap_or(0) as f64;

    output.push('\n');
    for total in &summary.by_category {
        output.push_str(&format!(
            "{:<20} {:>12} {} {}\n",
            truncate(&total.category_name, 20),
            total.total,
            format_bar(total.total.cents() as f64, max, 20),
            if total.kind.is_income() { "in" } else { "" }
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Money, Month, UserId};
    use chrono::NaiveDate;

    #[test]
    fn test_transaction_table() {
        let category = CategoryId::new();
        let mut txn = Transaction::expense(
            UserId::new(),
            Money::from_cents(1_250),
            category,
            NaiveDate::from_ymd_opt(2025, 5, 2).unwrap(),
            "Lunch",
        );
        txn.payee = "Deli".into();

        let names = HashMap::from([(category, "Dining Out".to_string())]);
        let table = format_transaction_table(&[txn], &names);
        assert!(table.contains("Dining Out"));
        assert!(table.contains("Lunch (Deli)"));
        assert!(table.contains("-$12.50"));

        assert_eq!(
            format_transaction_table(&[], &names),
            "No transactions found.\n"
        );
    }

    #[test]
    fn test_monthly_summary_format() {
        let category = CategoryId::new();
        let user = UserId::new();
        let date = NaiveDate::from_ymd_opt(2025, 5, 2).unwrap();
        let transactions = vec![
            Transaction::income(user, Money::from_cents(100_000), category, date, ""),
            Transaction::expense(user, Money::from_cents(25_000), CategoryId::new(), date, ""),
        ];
        let summary =
            MonthlySummary::from_transactions(Month::new(2025, 5).unwrap(), &transactions, &[]);
        let text = format_monthly_summary(&summary);
        assert!(text.contains("Summary for 2025-05"));
        assert!(text.contains("75.0%"));
    }
}
