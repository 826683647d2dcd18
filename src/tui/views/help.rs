//! Help popup listing the key bindings

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::tui::layout::centered_rect;

const KEYS: &[(&str, &str)] = &[
    ("Tab / → / l", "Next tab"),
    ("Shift-Tab / ← / h", "Previous tab"),
    ("1-6", "Jump to a tab"),
    ("↓ / j, ↑ / k", "Scroll the list"),
    ("g / G", "First / last row"),
    ("[ / ]", "Previous / next month"),
    ("t", "Back to this month"),
    ("r", "Reload data"),
    ("?", "Show/hide help"),
    ("q / Esc", "Quit"),
];

pub fn render(frame: &mut Frame) {
    let area = centered_rect(50, 60, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" Help ")
        .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let mut lines = vec![
        Line::from(Span::styled(
            "Keys",
            Style::default().add_modifier(Modifier::BOLD).fg(Color::Yellow),
        )),
        Line::from(""),
    ];
    lines.extend(KEYS.iter().map(|(key, action)| {
        Line::from(vec![
            Span::styled(format!("{:<20}", key), Style::default().fg(Color::Cyan)),
            Span::raw(*action),
        ])
    }));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Changes are made with the fintrack CLI.",
        Style::default().fg(Color::DarkGray),
    )));

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}
