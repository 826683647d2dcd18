//! Transactions tab: the month's transactions, newest first

use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Style},
    widgets::{Cell, Row, Table},
    Frame,
};

use crate::display::truncate;
use crate::tui::app::{App, Snapshot};

use super::{header_style, highlight_style, panel, table_state};

pub fn render(frame: &mut Frame, app: &App, snapshot: &Snapshot, area: Rect) {
    let title = format!(" Transactions ({}) ", snapshot.transactions.len());
    if snapshot.transactions.is_empty() {
        super::empty(
            frame,
            area,
            &title,
            "No transactions. Add one with 'fintrack txn add'.",
        );
        return;
    }

    let header = Row::new(vec!["Date", "Category", "Description", "Payee", "Amount"])
        .style(header_style());

    let rows: Vec<Row> = snapshot
        .transactions
        .iter()
        .map(|txn| {
            let amount_style = if txn.is_income() {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Red)
            };
            Row::new(vec![
                Cell::from(txn.date.format("%Y-%m-%d").to_string()),
                Cell::from(truncate(snapshot.category_name(txn.category_id), 18)),
                Cell::from(truncate(&txn.description, 30)),
                Cell::from(truncate(&txn.payee, 18)),
                Cell::from(txn.signed_amount().to_string()).style(amount_style),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(11),
        Constraint::Length(18),
        Constraint::Min(20),
        Constraint::Length(18),
        Constraint::Length(12),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(panel(&title))
        .highlight_style(highlight_style())
        .highlight_symbol("▶ ");

    frame.render_stateful_widget(table, area, &mut table_state(app));
}
