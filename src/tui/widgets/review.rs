use chrono::Utc;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::topic_detail::{draw_problem, problem_line};
use crate::srs;
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    draw_queue(f, app, chunks[0]);
    draw_problem(f, app, app.selected_problem().and_then(|id| app.record(id)), chunks[1]);
}

fn draw_queue(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Revision Queue ({}) ", app.review.items.len()))
        .title_style(Style::default().fg(Color::Yellow));

    if app.review.items.is_empty() {
        let paragraph = Paragraph::new("Nothing due for review. Solve something new!")
            .style(Style::default().fg(Color::Green))
            .block(block);
        f.render_widget(paragraph, area);
        return;
    }

    let now = Utc::now();
    let items: Vec<ListItem> = app
        .review
        .items
        .iter()
        .filter_map(|id| app.record(id))
        .map(|r| {
            let overdue = match r.review_due_at {
                Some(_) => format!("{:>3}d ", srs::overdue_days(r, now)),
                None => " tag ".to_string(),
            };
            ListItem::new(vec![
                problem_line(app, r),
                Line::from(vec![
                    Span::raw("  "),
                    Span::styled(overdue, Style::default().fg(Color::Red)),
                    Span::styled(r.topic.as_str(), Style::default().fg(Color::DarkGray)),
                ]),
            ])
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(app.review.selected);
    f.render_stateful_widget(list, area, &mut state);
}
