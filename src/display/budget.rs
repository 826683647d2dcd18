//! Budget display formatting

use std::collections::HashMap;

use tabled::Tabled;

use crate::models::{BudgetId, BudgetStatus, BudgetSummary, BudgetTransfer, CategoryId};
use crate::services::BudgetOverview;

use super::{format_bar, render_table};

#[derive(Tabled)]
struct BudgetRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Limit")]
    limit: String,
    #[tabled(rename = "Spent")]
    spent: String,
    #[tabled(rename = "Remaining")]
    remaining: String,
    #[tabled(rename = "Used")]
    used: String,
    #[tabled(rename = "")]
    bar: String,
    #[tabled(rename = "Status")]
    status: String,
}

fn status_label(status: BudgetStatus) -> String {
    match status {
        BudgetStatus::UnderBudget => "OK".to_string(),
        BudgetStatus::NearLimit => "! Near limit".to_string(),
        BudgetStatus::OverBudget => "!! Over".to_string(),
    }
}

fn category_name(names: &HashMap<CategoryId, String>, id: CategoryId) -> String {
    names
        .get(&id)
        .cloned()
        .unwrap_or_else(|| "Unknown".to_string())
}

fn rows(summaries: &[BudgetSummary], names: &HashMap<CategoryId, String>) -> Vec<BudgetRow> {
    summaries
        .iter()
        .map(|s| BudgetRow {
            id: s.budget_id.to_string(),
            category: category_name(names, s.category_id),
            limit: s.limit.to_string(),
            spent: s.spent.to_string(),
            remaining: s.remaining.to_string(),
            used: format!("{:.0}%", s.percent_used),
            bar: format_bar(s.percent_used, 100.0, 10),
            status: status_label(s.status),
        })
        .collect()
}

pub fn format_budget_overview(
    overview: &BudgetOverview,
    names: &HashMap<CategoryId, String>,
) -> String {
    let mut output = format!("Budgets ({}) for {}\n", overview.scope, overview.month);

    if overview.summaries.is_empty() {
        output.push_str("No budgets set. Use 'fintrack budget set' to add one.\n");
        return output;
    }

    let mut summaries = overview.summaries.clone();
    summaries.sort_by(|a, b| {
        category_name(names, a.category_id).cmp(&category_name(names, b.category_id))
    });
    output.push_str(&render_table(rows(&summaries, names), 2));
    output.push('\n');

    let totals = &overview.totals;
    output.push_str(&format!(
        "Total: {} of {} spent ({:.1}%), {} remaining\n",
        totals.spent, totals.limit, totals.percent_used, totals.remaining
    ));
    output
}

pub fn format_budget_alerts(alerts: &[BudgetSummary], names: &HashMap<CategoryId, String>) -> String {
    if alerts.is_empty() {
        return "All budgets are within their limits.\n".to_string();
    }

    let mut output = String::new();
    for alert in alerts {
        let line = match alert.status {
            BudgetStatus::OverBudget => format!(
                "!! {} ({}) is over budget by {} ({:.0}% of {})",
                category_name(names, alert.category_id),
                alert.scope,
                -alert.remaining,
                alert.percent_used,
                alert.limit
            ),
            _ => format!(
                "!  {} ({}) has used {:.0}% of {}; {} left",
                category_name(names, alert.category_id),
                alert.scope,
                alert.percent_used,
                alert.limit,
                alert.remaining
            ),
        };
        output.push_str(&line);
        output.push('\n');
    }
    output
}

/// Transfers with each budget labelled (usually by its category name)
pub fn format_transfer_list(
    transfers: &[BudgetTransfer],
    labels: &HashMap<BudgetId, String>,
) -> String {
    if transfers.is_empty() {
        return "No budget transfers.\n".to_string();
    }

    let label = |id: &BudgetId| labels.get(id).cloned().unwrap_or_else(|| id.to_string());
    let mut output = String::new();
    for transfer in transfers {
        output.push_str(&format!(
            "{}  {}  {} -> {}  {:>12}{}\n",
            transfer.created_at.format("%Y-%m-%d"),
            transfer.month,
            label(&transfer.from_budget),
            label(&transfer.to_budget),
            transfer.amount,
            if transfer.note.is_empty() {
                String::new()
            } else {
                format!("  ({})", transfer.note)
            }
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Budget, BudgetScope, Money, Month, UserId};

    fn summary(limit: i64, spent: i64) -> (BudgetSummary, HashMap<CategoryId, String>) {
        let user = UserId::new();
        let category = CategoryId::new();
        let budget = Budget::new(
            BudgetScope::personal(user),
            category,
            Month::new(2025, 3).unwrap(),
            Money::from_cents(limit),
            80,
            user,
        );
        (
            BudgetSummary::from_budget(&budget, Money::from_cents(spent)),
            HashMap::from([(category, "Groceries".to_string())]),
        )
    }

    #[test]
    fn test_alert_lines() {
        let (over, names) = summary(10_000, 12_500);
        let text = format_budget_alerts(&[over], &names);
        assert!(text.starts_with("!! Groceries (personal) is over budget by $25.00"));

        let (near, names) = summary(10_000, 9_000);
        let text = format_budget_alerts(&[near], &names);
        assert!(text.contains("has used 90% of $100.00; $10.00 left"));

        assert!(format_budget_alerts(&[], &names).contains("within their limits"));
    }
}
