//! Debts tab: open liabilities and the debt totals

use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Cell, Paragraph, Row, Table},
    Frame,
};

use crate::tui::app::{App, Snapshot};
use crate::tui::layout::SplitLayout;

use super::{header_style, highlight_style, panel, table_state};

pub fn render(frame: &mut Frame, app: &App, snapshot: &Snapshot, area: Rect) {
    if snapshot.liabilities.is_empty() {
        super::empty(
            frame,
            area,
            " Debts ",
            "No open debts. Track one with 'fintrack debt add'.",
        );
        return;
    }

    let layout = SplitLayout::new(area, 4);
    let debt = &snapshot.debt;
    let mut summary = vec![Line::from(format!(
        "Total {}  |  Minimum {}/month  |  Weighted APR {:.2}%",
        debt.total_balance, debt.total_minimum_payment, debt.weighted_apr
    ))];
    if let Some(utilization) = debt.credit_utilization {
        summary.push(Line::from(format!("Credit utilization {:.1}%", utilization)));
    }
    frame.render_widget(Paragraph::new(summary).block(panel(" Debt summary ")), layout.header);

    let header = Row::new(vec!["Name", "Type", "Balance", "APR", "Minimum", "Paid off"])
        .style(header_style());
    let rows: Vec<Row> = snapshot
        .liabilities
        .iter()
        .map(|l| {
            Row::new(vec![
                Cell::from(l.name.clone()),
                Cell::from(l.kind.to_string()),
                Cell::from(l.current_balance.to_string()).style(Style::default().fg(Color::Red)),
                Cell::from(format!("{:.2}%", l.apr() * 100.0)),
                Cell::from(l.minimum_payment.to_string()),
                Cell::from(format!("{:.0}%", l.percent_paid_off())),
            ])
        })
        .collect();

    let widths = [
        Constraint::Min(16),
        Constraint::Length(14),
        Constraint::Length(12),
        Constraint::Length(8),
        Constraint::Length(12),
        Constraint::Length(9),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(panel(" Open debts "))
        .highlight_style(highlight_style());

    frame.render_stateful_widget(table, layout.content, &mut table_state(app));
}
