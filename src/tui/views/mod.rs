//! TUI Views module
//!
//! One view per tab plus the tab bar, status bar and help popup.

pub mod budgets;
pub mod debts;
pub mod goals;
pub mod help;
pub mod insights;
pub mod overview;
pub mod status_bar;
pub mod transactions;

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph, TableState, Tabs},
    Frame,
};

use super::app::{App, Snapshot, Tab};
use super::layout::AppLayout;

/// Render the entire application
pub fn render(frame: &mut Frame, app: &App) {
    let layout = AppLayout::new(frame.area());

    render_tabs(frame, app, layout.tabs);

    match &app.snapshot {
        Some(snapshot) => render_tab(frame, app, snapshot, layout.main),
        None => {
            let text = Paragraph::new("Could not load data for this month. Press 'r' to retry.")
                .block(panel(" Error "))
                .style(Style::default().fg(Color::Red));
            frame.render_widget(text, layout.main);
        }
    }

    status_bar::render(frame, app, layout.status_bar);

    if app.show_help {
        help::render(frame);
    }
}

fn render_tab(frame: &mut Frame, app: &App, snapshot: &Snapshot, area: Rect) {
    match app.active_tab {
        Tab::Overview => overview::render(frame, app, snapshot, area),
        Tab::Transactions => transactions::render(frame, app, snapshot, area),
        Tab::Budgets => budgets::render(frame, app, snapshot, area),
        Tab::Goals => goals::render(frame, app, snapshot, area),
        Tab::Debts => debts::render(frame, app, snapshot, area),
        Tab::Insights => insights::render(frame, app, snapshot, area),
    }
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = Tab::ALL
        .iter()
        .enumerate()
        .map(|(i, tab)| Line::from(format!("{} {}", i + 1, tab.title())))
        .collect();

    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(format!(" fintrack | {} | {} ", app.user.name(), app.month))
                .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        )
        .select(app.active_tab.index())
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .divider("│");

    frame.render_widget(tabs, area);
}

/// A bordered panel with a cyan title
pub(crate) fn panel(title: &str) -> Block<'_> {
    Block::default()
        .title(title)
        .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
}

pub(crate) fn header_style() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}

pub(crate) fn highlight_style() -> Style {
    Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD)
}

/// Table state with the app's selection
pub(crate) fn table_state(app: &App) -> TableState {
    TableState::default().with_selected(Some(app.selected))
}

/// Green when under `warn`, yellow up to 100, red beyond
pub(crate) fn usage_color(percent: f64, warn: f64) -> Color {
    if percent > 100.0 {
        Color::Red
    } else if percent >= warn {
        Color::Yellow
    } else {
        Color::Green
    }
}

pub(crate) fn empty(frame: &mut Frame, area: Rect, title: &str, message: &str) {
    let text = Paragraph::new(message)
        .block(panel(title))
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(text, area);
}
