pub mod dashboard;
pub mod review;
pub mod topic_detail;
pub mod topics;

use ratatui::style::Color;

use crate::models::{Difficulty, Status};

pub fn progress_bar(percent: f64, width: usize) -> String {
    let filled = ((percent / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

pub fn difficulty_color(d: Difficulty) -> Color {
    match d {
        Difficulty::Easy => Color::Green,
        Difficulty::Medium => Color::Yellow,
        Difficulty::Hard => Color::Red,
    }
}

pub fn status_style(s: Status) -> (&'static str, Color) {
    match s {
        Status::Pending => ("Pending    ", Color::DarkGray),
        Status::InProgress => ("In Progress", Color::Cyan),
        Status::Completed => ("Completed  ", Color::Green),
    }
}
