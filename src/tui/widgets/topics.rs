use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::{progress_bar, truncate};
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let title = if let Some(filter) = &app.filter {
        format!(" Topics (filter: {}) ", filter)
    } else {
        " Topics ".to_string()
    };

    let items: Vec<ListItem> = app
        .topics
        .items
        .iter()
        .map(|t| {
            let percent = t.progress_percent();
            let bar_color = if percent >= 100.0 {
                Color::Green
            } else if percent > 0.0 {
                Color::Yellow
            } else {
                Color::DarkGray
            };
            let due = if t.review_count > 0 {
                format!("{} due", t.review_count)
            } else {
                String::new()
            };

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<30}", truncate(&t.name, 28)),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    format!("{:<18}", truncate(t.subject.as_deref().unwrap_or(&t.domain), 16)),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(progress_bar(percent, 10), Style::default().fg(bar_color)),
                Span::styled(
                    format!(" {:>3}/{:<4}", t.solved, t.total),
                    Style::default().fg(Color::Yellow),
                ),
                Span::styled(due, Style::default().fg(Color::Red)),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_style(Style::default().fg(Color::Cyan));

    let header_style = Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::BOLD);
    let header = Line::from(vec![
        Span::styled(format!("{:<30}", "Name"), header_style),
        Span::styled(format!("{:<18}", "Subject"), header_style),
        Span::styled("Progress  ", header_style),
        Span::styled(" Solved   ", header_style),
        Span::styled("Review", header_style),
    ]);

    let list = List::new(items)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(app.topics.selected);

    let inner = block.inner(area);
    f.render_widget(block, area);

    let header_area = Rect {
        x: inner.x + 2,
        y: inner.y,
        width: inner.width.saturating_sub(2),
        height: 1,
    };
    f.render_widget(Paragraph::new(header), header_area);

    let list_area = Rect {
        y: inner.y + 1,
        height: inner.height.saturating_sub(1),
        ..inner
    };
    f.render_stateful_widget(list, list_area, &mut state);
}
