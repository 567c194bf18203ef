use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Sparkline},
    Frame,
};

use super::{difficulty_color, status_style, truncate};
use crate::analytics::TREND_DAYS;
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(9), // Stats + revision queue
            Constraint::Length(7), // Trend
            Constraint::Min(0),    // Recent activity
        ])
        .split(area);

    let top_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[0]);

    draw_stats(f, app, top_chunks[0]);
    draw_revision_queue(f, app, top_chunks[1]);
    draw_trend(f, app, chunks[1]);
    draw_recent_activity(f, app, chunks[2]);
}

fn draw_stats(f: &mut Frame, app: &App, area: Rect) {
    let stats = &app.stats;

    let text = vec![
        Line::from(vec![
            Span::styled("XP: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", stats.total_xp),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("Streak: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{} day(s)", stats.streak),
                Style::default().fg(if stats.streak > 0 {
                    Color::Green
                } else {
                    Color::White
                }),
            ),
        ]),
        Line::from(vec![
            Span::styled("Today: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", stats.today_count),
                Style::default().fg(Color::Cyan),
            ),
        ]),
        Line::from(vec![
            Span::styled("Solved: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}/{}", stats.completed, stats.total),
                Style::default().fg(Color::White),
            ),
            Span::styled(
                format!("  {}E", stats.easy_solved),
                Style::default().fg(Color::Green),
            ),
            Span::styled(
                format!(" {}M", stats.medium_solved),
                Style::default().fg(Color::Yellow),
            ),
            Span::styled(
                format!(" {}H", stats.hard_solved),
                Style::default().fg(Color::Red),
            ),
        ]),
        Line::from(vec![
            Span::styled("Due: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", stats.review_due),
                Style::default().fg(if stats.review_due > 0 {
                    Color::Yellow
                } else {
                    Color::White
                }),
            ),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Stats ")
        .title_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(text).block(block);
    f.render_widget(paragraph, area);
}

fn draw_revision_queue(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .review
        .items
        .iter()
        .filter_map(|id| app.record(id))
        .take(area.height.saturating_sub(2) as usize)
        .enumerate()
        .map(|(i, r)| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{}. ", i + 1), Style::default().fg(Color::DarkGray)),
                Span::styled(
                    truncate(&r.title, 28),
                    Style::default().fg(difficulty_color(r.difficulty)),
                ),
                Span::styled(
                    if r.starred { " *" } else { "" },
                    Style::default().fg(Color::Yellow),
                ),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Revision Queue ")
        .title_style(Style::default().fg(Color::Yellow));

    if items.is_empty() {
        let paragraph = Paragraph::new("Nothing due. Nice!")
            .style(Style::default().fg(Color::Green))
            .block(block);
        f.render_widget(paragraph, area);
    } else {
        let list = List::new(items).block(block);
        f.render_widget(list, area);
    }
}

fn draw_trend(f: &mut Frame, app: &App, area: Rect) {
    let data: Vec<u64> = app.stats.trend.iter().map(|p| p.xp as u64).collect();
    let period_xp: u64 = data.iter().sum();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Last {} days: {} XP ", TREND_DAYS, period_xp))
        .title_style(Style::default().fg(Color::Green));

    let sparkline = Sparkline::default()
        .block(block)
        .data(&data)
        .style(Style::default().fg(Color::Green));
    f.render_widget(sparkline, area);
}

fn draw_recent_activity(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .recent
        .iter()
        .filter_map(|id| app.record(id))
        .map(|r| {
            let date = r
                .updated_at
                .map(|t| t.with_timezone(&chrono::Local).format("%b %d %H:%M").to_string())
                .unwrap_or_default();
            let (status_text, status_color) = status_style(r.status);

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<14}", date),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("{:<34}", truncate(&r.title, 32)),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    format!("{:<24}", truncate(&r.topic, 22)),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(status_text, Style::default().fg(status_color)),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Recent Activity ")
        .title_style(Style::default().fg(Color::Magenta));

    if items.is_empty() {
        let paragraph = Paragraph::new("No activity yet. Open a topic and start solving!")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(paragraph, area);
    } else {
        let list = List::new(items).block(block);
        f.render_widget(list, area);
    }
}
