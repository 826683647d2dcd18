//! Insight display formatting

use tabled::Tabled;

use crate::services::{CategoryTrend, HealthScore, SpendingAnomaly, SpendingCluster};

use super::{format_bar, render_table, truncate};

#[derive(Tabled)]
struct AnomalyRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Typical")]
    expected: String,
    #[tabled(rename = "z")]
    z_score: String,
    #[tabled(rename = "Severity")]
    severity: String,
}

pub fn format_anomalies(anomalies: &[SpendingAnomaly]) -> String {
    if anomalies.is_empty() {
        return "No unusual spending found.\n".to_string();
    }

    let rows = anomalies
        .iter()
        .map(|a| AnomalyRow {
            date: a.date.format("%Y-%m-%d").to_string(),
            category: truncate(&a.category_name, 18),
            description: truncate(&a.description, 28),
            amount: a.amount.to_string(),
            expected: a.expected.to_string(),
            z_score: a
                .z_score
                .map(|z| format!("{:.1}", z))
                .unwrap_or_else(|| "-".to_string()),
            severity: format!("{} ({})", a.severity, a.reason),
        })
        .collect();

    let mut output = render_table(rows, 3);
    output.push('\n');
    output
}

/// One line per series: average, direction and next-month forecast
pub fn format_trends(trends: &[CategoryTrend]) -> String {
    if trends.is_empty() {
        return "Not enough history for trends.\n".to_string();
    }

    let mut output = String::new();
    if let (Some(first), Some(last)) = (
        trends[0].months.first(),
        trends[0].months.last(),
    ) {
        output.push_str(&format!("Spending trends {} to {}\n", first, last));
    }
    output.push_str(&format!(
        "{:<22} {:>12} {:<8} {:>12} {:>14}\n",
        "Category", "Average", "Trend", "Per month", "Next month"
    ));
    output.push_str(&"-".repeat(72));
    output.push('\n');

    for trend in trends {
        let (direction, change, next) = match &trend.trend {
            Some(t) => (
                t.direction.to_string(),
                format!("{:+.2}", t.monthly_change),
                t.forecast
                    .first()
                    .map(|f| format!("{:.2}", f))
                    .unwrap_or_else(|| "-".to_string()),
            ),
            None => ("-".to_string(), "-".to_string(), "-".to_string()),
        };
        output.push_str(&format!(
            "{:<22} {:>12} {:<8} {:>12} {:>14}\n",
            truncate(&trend.name, 22),
            trend.average,
            direction,
            change,
            next
        ));
    }
    output
}

pub fn format_clusters(clusters: &[SpendingCluster]) -> String {
    if clusters.is_empty() {
        return "Not enough expenses to group.\n".to_string();
    }

    let mut output = String::new();
    for cluster in clusters {
        output.push_str(&format!(
            "{:<10} {:>4} expenses, typically {} around day {:.0}, {} in total\n",
            cluster.label, cluster.size, cluster.typical_amount, cluster.typical_day, cluster.total
        ));
    }
    output
}

pub fn format_health_score(health: &HealthScore) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Financial health for {}: {}/100 (grade {})\n",
        health.month, health.score, health.grade
    ));
    output.push_str(&format!("{}\n\n", format_bar(health.score as f64, 100.0, 40)));

    for component in &health.components {
        output.push_str(&format!(
            "{:<10} {:>5.0}/100  weight {:>3.0}%  {}\n",
            component.name, component.score, component.weight, component.detail
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Money, Month};
    use crate::services::ScoreComponent;

    #[test]
    fn test_health_score_format() {
        let health = HealthScore {
            month: Month::new(2025, 9).unwrap(),
            score: 82,
            grade: 'B',
            savings_rate: 18.0,
            budget_adherence: None,
            debt_to_income: None,
            components: vec![ScoreComponent {
                name: "Savings",
                score: 90.0,
                weight: 35.0,
                detail: "Saved 18.0% of income".into(),
            }],
        };
        let text = format_health_score(&health);
        assert!(text.starts_with("Financial health for 2025-09: 82/100 (grade B)"));
        assert!(text.contains("Saved 18.0% of income"));
    }

    #[test]
    fn test_clusters_format() {
        let cluster = SpendingCluster {
            label: "Small".into(),
            size: 12,
            total: Money::from_cents(18_000),
            typical_amount: Money::from_cents(1_500),
            typical_day: 14.2,
            transaction_ids: Vec::new(),
        };
        let text = format_clusters(&[cluster]);
        assert!(text.contains("typically $15.00 around day 14"));
    }
}
