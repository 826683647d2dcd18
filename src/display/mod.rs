//! Display formatting for terminal output
//!
//! List views are rendered as `tabled` tables; detail views are plain
//! aligned text.

pub mod budget;
pub mod category;
pub mod family;
pub mod insights;
pub mod plan;
pub mod transaction;

pub use budget::{format_budget_alerts, format_budget_overview, format_transfer_list};
pub use category::{format_category_list, format_category_tree};
pub use family::{format_family_details, format_invitations, format_member_spending};
pub use insights::{format_anomalies, format_clusters, format_health_score, format_trends};
pub use plan::{
    format_debt_summary, format_goal_details, format_goal_list, format_liability_details,
    format_liability_list, format_payoff_plan,
};
pub use transaction::{format_monthly_summary, format_transaction_details, format_transaction_table};

use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Style};
use tabled::{Table, Tabled};

/// Render rows as a table, right-aligning columns from `numeric_from` on
pub(crate) fn render_table<T: Tabled>(rows: Vec<T>, numeric_from: usize) -> String {
    let mut table = Table::new(rows);
    table
        .with(Style::sharp())
        .modify(Columns::new(numeric_from..), Alignment::right());
    table.to_string()
}

/// Format a percentage with precision suited to its size
pub fn format_percentage(pct: f64) -> String {
    if pct > 0.0 && pct < 0.1 {
        format!("{:.2}%", pct)
    } else if pct.abs() < 10.0 {
        format!("{:.1}%", pct)
    } else {
        format!("{:.0}%", pct)
    }
}

/// A horizontal bar of `width` cells, filled in proportion to `value / max`
pub fn format_bar(value: f64, max_value: f64, width: usize) -> String {
    if max_value <= 0.0 || value <= 0.0 {
        return "░".repeat(width);
    }
    let filled = ((value / max_value) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Shorten to at most `max_len` characters, ending in "..." when cut
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        ".".repeat(max_len)
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(0.05), "0.05%");
        assert_eq!(format_percentage(5.25), "5.2%");
        assert_eq!(format_percentage(42.6), "43%");
    }

    #[test]
    fn test_format_bar() {
        assert_eq!(format_bar(5.0, 10.0, 4), "██░░");
        assert_eq!(format_bar(20.0, 10.0, 4), "████");
        assert_eq!(format_bar(0.0, 10.0, 3), "░░░");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Groceries", 20), "Groceries");
        assert_eq!(truncate("Weekly grocery shop", 10), "Weekly ...");
        assert_eq!(truncate("Café au lait", 7), "Café...");
    }

    #[test]
    fn test_render_table() {
        #[derive(Tabled)]
        struct Row {
            name: &'static str,
            amount: String,
        }
        let out = render_table(
            vec![Row {
                name: "Rent",
                amount: "$1,200.00".into(),
            }],
            1,
        );
        assert!(out.contains("name"));
        assert!(out.contains("$1,200.00"));
    }
}
