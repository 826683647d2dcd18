//! Goal and debt display formatting

use tabled::Tabled;

use crate::models::{Goal, Liability, PayoffPlan};
use crate::services::{DebtSummary, GoalProgress};

use super::{format_bar, format_percentage, render_table, truncate};

#[derive(Tabled)]
struct GoalRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Goal")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Saved")]
    saved: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Progress")]
    progress: String,
    #[tabled(rename = "By")]
    target_date: String,
}

pub fn format_goal_list(goals: &[Goal]) -> String {
    if goals.is_empty() {
        return "No goals yet. Use 'fintrack goal add' to create one.\n".to_string();
    }

    let rows = goals
        .iter()
        .map(|g| GoalRow {
            id: g.id.to_string(),
            name: truncate(&g.name, 24),
            status: g.status.to_string(),
            saved: g.saved_amount.to_string(),
            target: g.target_amount.to_string(),
            progress: format!(
                "{} {}",
                format_bar(g.progress_percent(), 100.0, 10),
                format_percentage(g.progress_percent())
            ),
            target_date: g
                .target_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect();

    let mut output = render_table(rows, 3);
    output.push('\n');
    output
}

pub fn format_goal_details(goal: &Goal, progress: &GoalProgress) -> String {
    let mut output = String::new();

    output.push_str(&format!("Goal: {} ({})\n", goal.name, goal.kind));
    output.push_str(&format!("  ID:          {}\n", goal.id));
    output.push_str(&format!("  Status:      {}\n", goal.status));
    output.push_str(&format!(
        "  Saved:       {} of {} ({:.1}%)\n",
        progress.saved, progress.target, progress.percent
    ));
    output.push_str(&format!("  Remaining:   {}\n", progress.remaining));
    if let Some(date) = goal.target_date {
        output.push_str(&format!("  Target date: {}\n", date.format("%Y-%m-%d")));
    }
    if let Some(months) = progress.months_remaining {
        output.push_str(&format!("  Months left: {}\n", months));
    }
    if let Some(required) = progress.required_monthly {
        output.push_str(&format!("  Needed:      {}/month\n", required));
    }
    output.push_str(&format!("  Average:     {}/month\n", progress.average_monthly));
    if let Some(month) = progress.projected_completion {
        output.push_str(&format!("  Projected:   {}\n", month));
    }
    if goal.target_date.is_some() {
        output.push_str(&format!(
            "  On track:    {}\n",
            if progress.on_track { "yes" } else { "no" }
        ));
    }

    if !goal.contributions.is_empty() {
        output.push_str("\nRecent contributions:\n");
        for c in goal.contributions.iter().rev().take(10) {
            output.push_str(&format!(
                "  {}  {:>12}  {}\n",
                c.date.format("%Y-%m-%d"),
                c.amount,
                c.note
            ));
        }
    }

    output
}

#[derive(Tabled)]
struct LiabilityRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Balance")]
    balance: String,
    #[tabled(rename = "APR")]
    apr: String,
    #[tabled(rename = "Minimum")]
    minimum: String,
    #[tabled(rename = "Paid off")]
    paid_off: String,
}

pub fn format_liability_list(liabilities: &[Liability]) -> String {
    if liabilities.is_empty() {
        return "No debts recorded.\n".to_string();
    }

    let rows = liabilities
        .iter()
        .map(|l| LiabilityRow {
            id: l.id.to_string(),
            name: if l.closed {
                format!("{} (closed)", truncate(&l.name, 20))
            } else {
                truncate(&l.name, 24)
            },
            kind: l.kind.to_string(),
            balance: l.current_balance.to_string(),
            apr: format!("{:.2}%", l.apr() * 100.0),
            minimum: l.minimum_payment.to_string(),
            paid_off: format_percentage(l.percent_paid_off()),
        })
        .collect();

    let mut output = render_table(rows, 3);
    output.push('\n');
    output
}

pub fn format_liability_details(liability: &Liability) -> String {
    let mut output = String::new();

    output.push_str(&format!("Debt: {} ({})\n", liability.name, liability.kind));
    output.push_str(&format!("  ID:        {}\n", liability.id));
    if !liability.lender.is_empty() {
        output.push_str(&format!("  Lender:    {}\n", liability.lender));
    }
    output.push_str(&format!(
        "  Balance:   {} of {} originally\n",
        liability.current_balance, liability.original_balance
    ));
    output.push_str(&format!("  APR:       {:.2}%\n", liability.apr() * 100.0));
    output.push_str(&format!("  Minimum:   {}\n", liability.minimum_payment));
    if let Some(day) = liability.due_day {
        output.push_str(&format!("  Due day:   {}\n", day));
    }
    if let Some(utilization) = liability.utilization() {
        output.push_str(&format!("  Utilized:  {:.1}%\n", utilization));
    }
    output.push_str(&format!(
        "  Paid:      {} ({} interest)\n",
        liability.total_paid(),
        liability.total_interest_paid()
    ));

    if !liability.payments.is_empty() {
        output.push_str("\nPayments:\n");
        for p in liability.payments.iter().rev().take(12) {
            output.push_str(&format!(
                "  {}  {:>12}  interest {:>10}  principal {:>12}\n",
                p.date.format("%Y-%m-%d"),
                p.amount,
                p.interest,
                p.principal
            ));
        }
    }
    output
}

/// Payoff headline plus the first and last months of the schedule
pub fn format_payoff_plan(name: &str, plan: &PayoffPlan) -> String {
    let mut output = format!(
        "{} is paid off in {} months ({}), paying {} of which {} is interest\n\n",
        name, plan.months, plan.payoff_month, plan.total_paid, plan.total_interest
    );

    output.push_str(&format!(
        "{:<8} {:>12} {:>12} {:>12} {:>14}\n",
        "Month", "Payment", "Interest", "Principal", "Balance"
    ));
    let show = |output: &mut String, step: &crate::models::PayoffStep| {
        output.push_str(&format!(
            "{:<8} {:>12} {:>12} {:>12} {:>14}\n",
            step.month, step.payment, step.interest, step.principal, step.balance
        ));
    };

    if plan.schedule.len() <= 12 {
        plan.schedule.iter().for_each(|s| show(&mut output, s));
    } else {
        plan.schedule[..6].iter().for_each(|s| show(&mut output, s));
        output.push_str(&format!("{:^8}\n", "..."));
        plan.schedule[plan.schedule.len() - 3..]
            .iter()
            .for_each(|s| show(&mut output, s));
    }
    output
}

pub fn format_debt_summary(summary: &DebtSummary) -> String {
    let mut output = String::new();
    output.push_str(&format!("Open debts:        {}\n", summary.count));
    output.push_str(&format!("Total balance:     {}\n", summary.total_balance));
    output.push_str(&format!(
        "Minimum payments:  {}/month\n",
        summary.total_minimum_payment
    ));
    output.push_str(&format!("Weighted APR:      {:.2}%\n", summary.weighted_apr));
    if let Some(utilization) = summary.credit_utilization {
        output.push_str(&format!("Credit utilized:   {:.1}%\n", utilization));
    }
    output.push_str(&format!("Interest paid:     {}\n", summary.total_interest_paid));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GoalKind, LiabilityKind, Money, Month, UserId};

    #[test]
    fn test_goal_list() {
        let goal = Goal::new(
            UserId::new(),
            "Bike",
            GoalKind::Purchase,
            Money::from_cents(50_000),
            None,
        );
        let table = format_goal_list(&[goal]);
        assert!(table.contains("Bike"));
        assert!(table.contains("$500.00"));
        assert!(format_goal_list(&[]).contains("fintrack goal add"));
    }

    #[test]
    fn test_payoff_plan_is_abbreviated() {
        let loan = Liability::new(
            UserId::new(),
            "Car",
            LiabilityKind::AutoLoan,
            Money::from_cents(240_000),
            0,
        );
        let plan = loan
            .payoff_plan(Money::from_cents(10_000), Month::new(2025, 1).unwrap())
            .unwrap();
        assert_eq!(plan.months, 24);

        let text = format_payoff_plan("Car", &plan);
        assert!(text.starts_with("Car is paid off in 24 months (2027-01)"));
        // header + 6 + marker + 3
        assert_eq!(text.lines().skip(2).count(), 11);
    }
}
