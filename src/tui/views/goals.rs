//! Goals tab: progress of each active goal

use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Style},
    widgets::{Cell, Row, Table},
    Frame,
};

use crate::display::format_bar;
use crate::tui::app::{App, Snapshot};

use super::{header_style, highlight_style, panel, table_state};

pub fn render(frame: &mut Frame, app: &App, snapshot: &Snapshot, area: Rect) {
    if snapshot.goals.is_empty() {
        super::empty(
            frame,
            area,
            " Goals ",
            "No goals yet. Create one with 'fintrack goal add'.",
        );
        return;
    }

    let header = Row::new(vec![
        "Goal", "Saved", "Target", "Progress", "", "Need/month", "Status",
    ])
    .style(header_style());

    let rows: Vec<Row> = snapshot
        .goals
        .iter()
        .map(|(goal, progress)| {
            let (status, color) = if goal.is_completed() {
                ("Reached".to_string(), Color::Green)
            } else if goal.target_date.is_none() {
                ("No deadline".to_string(), Color::Gray)
            } else if progress.on_track {
                ("On track".to_string(), Color::Green)
            } else {
                ("Behind".to_string(), Color::Yellow)
            };
            Row::new(vec![
                Cell::from(goal.name.clone()),
                Cell::from(progress.saved.to_string()),
                Cell::from(progress.target.to_string()),
                Cell::from(format!("{:.0}%", progress.percent)),
                Cell::from(format_bar(progress.percent, 100.0, 12))
                    .style(Style::default().fg(Color::Cyan)),
                Cell::from(
                    progress
                        .required_monthly
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "-".into()),
                ),
                Cell::from(status).style(Style::default().fg(color)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Min(16),
        Constraint::Length(12),
        Constraint::Length(12),
        Constraint::Length(8),
        Constraint::Length(12),
        Constraint::Length(12),
        Constraint::Length(12),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(panel(" Goals "))
        .highlight_style(highlight_style());

    frame.render_stateful_widget(table, area, &mut table_state(app));
}
