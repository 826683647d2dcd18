//! Overview tab: the month at a glance

use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table},
    Frame,
};

use crate::tui::app::{App, Snapshot};
use crate::tui::layout::columns;

use super::{header_style, highlight_style, panel, table_state, usage_color};

pub fn render(frame: &mut Frame, app: &App, snapshot: &Snapshot, area: Rect) {
    let (left, right) = columns(area, 40);
    render_totals(frame, snapshot, left);
    render_categories(frame, app, snapshot, right);
}

fn label(text: &str) -> Span<'static> {
    Span::styled(format!("{:<18}", text), Style::default().fg(Color::Gray))
}

fn render_totals(frame: &mut Frame, snapshot: &Snapshot, area: Rect) {
    let summary = &snapshot.summary;
    let health = &snapshot.health;
    let net_color = if summary.net.is_negative() {
        Color::Red
    } else {
        Color::Green
    };

    let mut lines = vec![
        Line::from(vec![
            label("Income"),
            Span::styled(summary.income.to_string(), Style::default().fg(Color::Green)),
        ]),
        Line::from(vec![
            label("Expenses"),
            Span::styled(summary.expenses.to_string(), Style::default().fg(Color::Red)),
        ]),
        Line::from(vec![
            label("Net"),
            Span::styled(
                summary.net.to_string(),
                Style::default().fg(net_color).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            label("Savings rate"),
            Span::raw(format!("{:.1}%", summary.savings_rate)),
        ]),
        Line::from(""),
        Line::from(vec![
            label("Health score"),
            Span::styled(
                format!("{} ({})", health.score, health.grade),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
    ];

    for overview in &snapshot.budgets {
        if overview.summaries.is_empty() {
            continue;
        }
        let totals = &overview.totals;
        lines.push(Line::from(vec![
            label(&format!("Budgets ({})", overview.scope)),
            Span::styled(
                format!("{:.0}% of {}", totals.percent_used, totals.limit),
                Style::default().fg(usage_color(totals.percent_used, 80.0)),
            ),
        ]));
        if totals.over_budget > 0 {
            lines.push(Line::from(Span::styled(
                format!("  {} over budget", totals.over_budget),
                Style::default().fg(Color::Red),
            )));
        }
    }

    if snapshot.debt.count > 0 {
        lines.push(Line::from(vec![
            label("Debt"),
            Span::raw(format!(
                "{} across {}",
                snapshot.debt.total_balance, snapshot.debt.count
            )),
        ]));
    }
    if !snapshot.anomalies.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("{} unusual expense(s) this month", snapshot.anomalies.len()),
            Style::default().fg(Color::Yellow),
        )));
    }

    frame.render_widget(
        Paragraph::new(lines).block(panel(&format!(" {} ", summary.month))),
        area,
    );
}

fn render_categories(frame: &mut Frame, app: &App, snapshot: &Snapshot, area: Rect) {
    let categories = &snapshot.summary.by_category;
    if categories.is_empty() {
        super::empty(frame, area, " By category ", "No transactions this month.");
        return;
    }

    let header = Row::new(vec!["Category", "Type", "Total", "Count"]).style(header_style());
    let rows: Vec<Row> = categories
        .iter()
        .map(|c| {
            let color = if c.kind.is_income() {
                Color::Green
            } else {
                Color::Red
            };
            Row::new(vec![
                Cell::from(c.category_name.clone()),
                Cell::from(c.kind.to_string()),
                Cell::from(c.total.to_string()).style(Style::default().fg(color)),
                Cell::from(c.count.to_string()),
            ])
        })
        .collect();

    let widths = [
        Constraint::Min(16),
        Constraint::Length(8),
        Constraint::Length(12),
        Constraint::Length(6),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(panel(" By category "))
        .highlight_style(highlight_style());

    frame.render_stateful_widget(table, area, &mut table_state(app));
}
