//! Status bar view
//!
//! Shows the month's net, any status message, and key hints

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::tui::app::App;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::styled(
        format!(" {} ", app.month),
        Style::default().fg(Color::Cyan),
    )];

    if let Some(snapshot) = &app.snapshot {
        let net = snapshot.summary.net;
        let color = if net.is_negative() {
            Color::Red
        } else {
            Color::Green
        };
        spans.push(Span::raw("│ Net: "));
        spans.push(Span::styled(
            net.to_string(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(" "));
    }

    if let Some(message) = &app.status_message {
        spans.push(Span::raw("│ "));
        spans.push(Span::styled(
            message.as_str(),
            Style::default().fg(Color::Yellow),
        ));
    }

    let hints = " Tab:Switch  ↑↓:Scroll  [ ]:Month  ?:Help  q:Quit ";

    // Right-align the hints when they fit
    let left_len: usize = spans.iter().map(|s| s.content.chars().count()).sum();
    let padding = (area.width as usize)
        .saturating_sub(left_len + hints.chars().count())
        .max(1);
    spans.push(Span::raw(" ".repeat(padding)));
    spans.push(Span::styled(hints, Style::default().fg(Color::White)));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
