//! Budgets tab: spending against each budget, personal then family

use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Style},
    widgets::{Cell, Row, Table},
    Frame,
};

use crate::display::format_bar;
use crate::models::BudgetStatus;
use crate::tui::app::{App, Snapshot};

use super::{header_style, highlight_style, panel, table_state};

pub fn render(frame: &mut Frame, app: &App, snapshot: &Snapshot, area: Rect) {
    let title = format!(" Budgets for {} ", app.month);
    if snapshot.budgets.iter().all(|b| b.summaries.is_empty()) {
        super::empty(
            frame,
            area,
            &title,
            "No budgets this month. Set one with 'fintrack budget set'.",
        );
        return;
    }

    let header = Row::new(vec![
        "Category", "Scope", "Limit", "Spent", "Remaining", "Used", "",
    ])
    .style(header_style());

    let rows: Vec<Row> = snapshot
        .budgets
        .iter()
        .flat_map(|overview| overview.summaries.iter())
        .map(|s| {
            let color = match s.status {
                BudgetStatus::OverBudget => Color::Red,
                BudgetStatus::NearLimit => Color::Yellow,
                BudgetStatus::UnderBudget => Color::Green,
            };
            Row::new(vec![
                Cell::from(snapshot.category_name(s.category_id).to_string()),
                Cell::from(s.scope.to_string()),
                Cell::from(s.limit.to_string()),
                Cell::from(s.spent.to_string()),
                Cell::from(s.remaining.to_string()).style(Style::default().fg(color)),
                Cell::from(format!("{:.0}%", s.percent_used)).style(Style::default().fg(color)),
                Cell::from(format_bar(s.percent_used, 100.0, 12)).style(Style::default().fg(color)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Min(16),
        Constraint::Length(8),
        Constraint::Length(12),
        Constraint::Length(12),
        Constraint::Length(12),
        Constraint::Length(6),
        Constraint::Length(12),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(panel(&title))
        .highlight_style(highlight_style());

    frame.render_stateful_widget(table, area, &mut table_state(app));
}
