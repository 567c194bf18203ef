use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use super::{difficulty_color, progress_bar, status_style, truncate};
use crate::models::{ProblemRecord, TopicRollup};
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let Some(topic) = &app.selected_topic else {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Topic Detail ");
        let paragraph = Paragraph::new("No topic selected").block(block);
        f.render_widget(paragraph, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Header
            Constraint::Min(0),    // Problems + detail
        ])
        .split(area);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);

    draw_header(f, topic, chunks[0]);
    draw_problems(f, app, body[0]);
    draw_problem(f, app, app.selected_problem().and_then(|id| app.record(id)), body[1]);
}

fn draw_header(f: &mut Frame, topic: &TopicRollup, area: Rect) {
    let percent = topic.progress_percent();
    let text = vec![
        Line::from(vec![
            Span::styled("Domain: ", Style::default().fg(Color::Gray)),
            Span::styled(topic.domain.as_str(), Style::default().fg(Color::White)),
            Span::raw("  "),
            Span::styled("Subject: ", Style::default().fg(Color::Gray)),
            Span::styled(
                topic.subject.as_deref().unwrap_or("-"),
                Style::default().fg(Color::Cyan),
            ),
        ]),
        Line::from(vec![
            Span::styled("Progress: ", Style::default().fg(Color::Gray)),
            Span::styled(progress_bar(percent, 20), Style::default().fg(Color::Green)),
            Span::styled(
                format!(" {}/{} ({:.0}%)", topic.solved, topic.total, percent),
                Style::default().fg(Color::Yellow),
            ),
            Span::raw("  "),
            Span::styled("Due: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", topic.review_count),
                Style::default().fg(if topic.review_count > 0 {
                    Color::Red
                } else {
                    Color::White
                }),
            ),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", topic.name))
        .title_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    let paragraph = Paragraph::new(text).block(block);
    f.render_widget(paragraph, area);
}

fn draw_problems(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .topic_problems
        .items
        .iter()
        .filter_map(|id| app.record(id))
        .map(|r| ListItem::new(problem_line(app, r)))
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Problems ({}) ", items.len()))
        .title_style(Style::default().fg(Color::Cyan));

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(app.topic_problems.selected);
    f.render_stateful_widget(list, area, &mut state);
}

pub fn problem_line<'a>(app: &App, r: &'a ProblemRecord) -> Line<'a> {
    let (status_text, status_color) = status_style(r.status);
    let timing = app.timer.as_ref().is_some_and(|t| t.id == r.id);

    Line::from(vec![
        Span::styled(
            if r.starred { "* " } else { "  " },
            Style::default().fg(Color::Yellow),
        ),
        Span::styled(
            format!("{:<32}", truncate(&r.title, 30)),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("{:<7}", r.difficulty.as_str()),
            Style::default().fg(difficulty_color(r.difficulty)),
        ),
        Span::styled(status_text, Style::default().fg(status_color)),
        Span::styled(
            if r.is_review_due { " due" } else { "" },
            Style::default().fg(Color::Red),
        ),
        Span::styled(
            if timing { " [timer]" } else { "" },
            Style::default().fg(Color::Green),
        ),
    ])
}

pub fn draw_problem(f: &mut Frame, app: &App, record: Option<&ProblemRecord>, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Problem ")
        .title_style(Style::default().fg(Color::Magenta));

    let Some(r) = record else {
        let paragraph = Paragraph::new("No problem selected")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(paragraph, area);
        return;
    };

    let label = |s: &'static str| Span::styled(s, Style::default().fg(Color::Gray));
    let tags = if r.tags.is_empty() {
        "-".to_string()
    } else {
        r.tags.iter().cloned().collect::<Vec<_>>().join(", ")
    };
    let mut seconds = r.time_spent;
    if let Some(timer) = app.timer.as_ref().filter(|t| t.id == r.id) {
        seconds += timer.started.elapsed().as_secs();
    }

    let mut text = vec![
        Line::from(Span::styled(
            r.title.as_str(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![label("ID: "), Span::raw(r.id.as_str())]),
        Line::from(vec![
            label("Difficulty: "),
            Span::styled(
                format!("{} ({} XP)", r.difficulty.as_str(), r.difficulty.xp()),
                Style::default().fg(difficulty_color(r.difficulty)),
            ),
        ]),
        Line::from(vec![label("Tags: "), Span::styled(tags, Style::default().fg(Color::Cyan))]),
        Line::from(vec![
            label("Time: "),
            Span::raw(format!("{}m {:02}s", seconds / 60, seconds % 60)),
        ]),
    ];
    if let Some(link) = &r.problem_link {
        text.push(Line::from(vec![label("Link: "), Span::raw(link.as_str())]));
    }
    if let Some(due) = r.review_due_at {
        text.push(Line::from(vec![
            label("Review: "),
            Span::styled(
                due.with_timezone(&chrono::Local).format("%b %d %H:%M").to_string(),
                Style::default().fg(if r.is_review_due {
                    Color::Red
                } else {
                    Color::White
                }),
            ),
        ]));
    }

    for (name, body) in [
        ("Notes", &r.notes),
        ("Approach", &r.approach),
        ("Solution", &r.solution),
    ] {
        if let Some(body) = body.as_deref().filter(|b| !b.trim().is_empty()) {
            text.push(Line::from(""));
            text.push(Line::from(Span::styled(
                name,
                Style::default().fg(Color::Yellow),
            )));
            text.extend(body.lines().map(|l| Line::from(l.to_string())));
        }
    }

    let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}
