//! Insights tab: this month's anomalies beside category trends

use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table},
    Frame,
};

use crate::analytics::anomaly::Severity;
use crate::analytics::forecast::TrendDirection;
use crate::display::truncate;
use crate::tui::app::{App, Snapshot};
use crate::tui::layout::columns;

use super::{header_style, highlight_style, panel, table_state};

pub fn render(frame: &mut Frame, app: &App, snapshot: &Snapshot, area: Rect) {
    let (left, right) = columns(area, 55);
    render_anomalies(frame, app, snapshot, left);
    render_trends(frame, snapshot, right);
}

fn render_anomalies(frame: &mut Frame, app: &App, snapshot: &Snapshot, area: Rect) {
    if snapshot.anomalies.is_empty() {
        super::empty(frame, area, " Unusual spending ", "Nothing unusual this month.");
        return;
    }

    let header =
        Row::new(vec!["Date", "Category", "Amount", "Expected", "Severity"]).style(header_style());
    let rows: Vec<Row> = snapshot
        .anomalies
        .iter()
        .map(|a| {
            let color = match a.severity {
                Severity::High => Color::Red,
                Severity::Medium => Color::Yellow,
                Severity::Low => Color::Gray,
            };
            Row::new(vec![
                Cell::from(a.date.format("%m-%d").to_string()),
                Cell::from(truncate(&a.category_name, 16)),
                Cell::from(a.amount.to_string()),
                Cell::from(a.expected.to_string()),
                Cell::from(a.severity.to_string()).style(Style::default().fg(color)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(6),
        Constraint::Min(12),
        Constraint::Length(11),
        Constraint::Length(11),
        Constraint::Length(8),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(panel(" Unusual spending "))
        .highlight_style(highlight_style());

    frame.render_stateful_widget(table, area, &mut table_state(app));
}

fn render_trends(frame: &mut Frame, snapshot: &Snapshot, area: Rect) {
    let lines: Vec<Line> = snapshot
        .trends
        .iter()
        .map(|t| {
            let (arrow, color) = match t.trend.as_ref().map(|tr| tr.direction) {
                Some(TrendDirection::Rising) => ("↑", Color::Red),
                Some(TrendDirection::Falling) => ("↓", Color::Green),
                Some(TrendDirection::Stable) => ("→", Color::Gray),
                None => (" ", Color::Gray),
            };
            let change = t
                .trend
                .as_ref()
                .map(|tr| format!("{:+.2}/mo", tr.monthly_change))
                .unwrap_or_default();
            Line::from(vec![
                Span::styled(format!("{} ", arrow), Style::default().fg(color)),
                Span::raw(format!("{:<18}", truncate(&t.name, 18))),
                Span::raw(format!("avg {:>11}  ", t.average.to_string())),
                Span::styled(change, Style::default().fg(color)),
            ])
        })
        .collect();

    let paragraph = if lines.is_empty() {
        Paragraph::new("Not enough history for trends.").style(Style::default().fg(Color::DarkGray))
    } else {
        Paragraph::new(lines)
    };
    frame.render_widget(paragraph.block(panel(" Trends ")), area);
}
