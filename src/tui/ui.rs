use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use super::widgets::{dashboard, review, topic_detail, topics};
use super::{App, View};

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Help bar
        ])
        .split(f.area());

    draw_tabs(f, app, chunks[0]);
    draw_content(f, app, chunks[1]);
    draw_help_bar(f, app, chunks[2]);
}

fn draw_tabs(f: &mut Frame, app: &App, area: Rect) {
    let tab_titles = vec![
        "Dashboard".to_string(),
        "Topics".to_string(),
        format!("Review ({})", app.review.items.len()),
    ];
    let selected = match app.view {
        View::Dashboard => 0,
        View::Topics | View::TopicDetail => 1,
        View::Review => 2,
    };

    let tabs = Tabs::new(tab_titles)
        .block(Block::default().borders(Borders::ALL).title(" Babua "))
        .select(selected)
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    f.render_widget(tabs, area);
}

fn draw_content(f: &mut Frame, app: &App, area: Rect) {
    match app.view {
        View::Dashboard => dashboard::draw(f, app, area),
        View::Topics => topics::draw(f, app, area),
        View::TopicDetail => topic_detail::draw(f, app, area),
        View::Review => review::draw(f, app, area),
    }
}

const TOPIC_KEYS: &[(&str, &str)] = &[
    ("j/k", "Nav"),
    ("g/G", "Top/Bot"),
    ("l/<CR>", "Open"),
    ("/", "Filter"),
];

const PROBLEM_KEYS: &[(&str, &str)] = &[
    ("j/k", "Nav"),
    ("c", "Status"),
    ("s", "Star"),
    ("v", "Revision"),
    ("t", "Timer"),
];

/// Key hints for the help bar, in display order.
fn view_keys(view: View, filtered: bool) -> Vec<(&'static str, &'static str)> {
    let mut keys = vec![("h/l", "Views")];
    match view {
        View::Dashboard => keys.push(("^r", "Reload")),
        View::Topics => {
            keys.extend_from_slice(TOPIC_KEYS);
            if filtered {
                keys.push(("<Esc>", "Clear"));
            }
        }
        View::TopicDetail => {
            keys.push(("h/<Esc>", "Back"));
            keys.extend_from_slice(PROBLEM_KEYS);
        }
        View::Review => keys.extend_from_slice(PROBLEM_KEYS),
    }
    keys
}

fn hints<'a>(keys: &[(&'a str, &'a str)]) -> Vec<Span<'a>> {
    keys.iter()
        .flat_map(|(k, action)| {
            [
                Span::styled(*k, Style::default().fg(Color::Cyan)),
                Span::raw(format!(" {}  ", action)),
            ]
        })
        .collect()
}

fn draw_help_bar(f: &mut Frame, app: &App, area: Rect) {
    let spans = if app.filter_mode {
        let mut spans = vec![
            Span::styled("/", Style::default().fg(Color::Yellow)),
            Span::raw(app.filter_input.as_str()),
            Span::styled("█ ", Style::default().fg(Color::Yellow)),
        ];
        spans.extend(hints(&[("<CR>", "Apply"), ("<Esc>", "Cancel")]));
        spans
    } else if let Some(message) = &app.message {
        vec![Span::styled(message.as_str(), Style::default().fg(Color::Yellow))]
    } else {
        let mut spans = hints(&view_keys(app.view, app.filter.is_some()));
        if let Some(timer) = &app.timer {
            spans.push(Span::styled(
                format!("[{} {}s] ", timer.id, timer.started.elapsed().as_secs()),
                Style::default().fg(Color::Green),
            ));
        }
        spans.extend(hints(&[("q", "Quit")]));
        spans
    };

    let help = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    f.render_widget(help, area);
}
