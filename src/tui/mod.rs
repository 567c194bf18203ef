mod ui;
pub mod widgets;

use std::io;
use std::time::{Duration, Instant};

use chrono::{Local, Utc};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::info;
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::analytics::{self, Analytics};
use crate::catalog::CatalogSource;
use crate::models::{ProblemRecord, TopicRollup, REVISION_TAG};
use crate::rollup;
use crate::store::Store;

const RECENT_LIMIT: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Topics,
    TopicDetail,
    Review,
}

impl View {
    fn next(&self) -> Self {
        match self {
            View::Dashboard => View::Topics,
            View::Topics => View::Review,
            View::TopicDetail => View::Topics,
            View::Review => View::Dashboard,
        }
    }

    fn prev(&self) -> Self {
        match self {
            View::Dashboard => View::Review,
            View::Topics => View::Dashboard,
            View::TopicDetail => View::Topics,
            View::Review => View::Topics,
        }
    }
}

pub struct StatefulList<T> {
    pub items: Vec<T>,
    pub selected: Option<usize>,
}

impl<T> StatefulList<T> {
    fn with_items(items: Vec<T>) -> Self {
        let selected = if items.is_empty() { None } else { Some(0) };
        Self { items, selected }
    }

    /// Replace the items, keeping the cursor position where possible.
    fn replace(&mut self, items: Vec<T>) {
        self.selected = match (self.selected, items.len()) {
            (_, 0) => None,
            (Some(i), len) => Some(i.min(len - 1)),
            (None, _) => Some(0),
        };
        self.items = items;
    }

    fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(i) if i + 1 < self.items.len() => i + 1,
            _ => 0,
        };
        self.selected = Some(i);
    }

    fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(0) | None => self.items.len() - 1,
            Some(i) => i - 1,
        };
        self.selected = Some(i);
    }

    fn first(&mut self) {
        if !self.items.is_empty() {
            self.selected = Some(0);
        }
    }

    fn last(&mut self) {
        if !self.items.is_empty() {
            self.selected = Some(self.items.len() - 1);
        }
    }

    fn selected_item(&self) -> Option<&T> {
        self.selected.and_then(|i| self.items.get(i))
    }
}

/// A running practice timer for one problem.
pub struct ActiveTimer {
    pub id: String,
    pub started: Instant,
}

pub struct App<'a> {
    store: Store,
    source: Option<&'a dyn CatalogSource>,
    seen_version: u64,
    pub view: View,
    pub stats: Analytics,
    pub topics: StatefulList<TopicRollup>,
    pub selected_topic: Option<TopicRollup>,
    /// Record ids of the selected topic.
    pub topic_problems: StatefulList<String>,
    /// Record ids in revision order.
    pub review: StatefulList<String>,
    pub recent: Vec<String>,
    pub filter: Option<String>,
    pub filter_input: String,
    pub filter_mode: bool,
    pub timer: Option<ActiveTimer>,
    pub message: Option<String>,
    pub should_quit: bool,
}

impl<'a> App<'a> {
    pub fn new(store: Store, source: Option<&'a dyn CatalogSource>) -> Self {
        let mut app = Self {
            stats: store.analytics(Local::now()),
            store,
            source,
            seen_version: 0,
            view: View::Dashboard,
            topics: StatefulList::with_items(Vec::new()),
            selected_topic: None,
            topic_problems: StatefulList::with_items(Vec::new()),
            review: StatefulList::with_items(Vec::new()),
            recent: Vec::new(),
            filter: None,
            filter_input: String::new(),
            filter_mode: false,
            timer: None,
            message: None,
            should_quit: false,
        };
        app.sync_views();
        app
    }

    pub fn record(&self, id: &str) -> Option<&ProblemRecord> {
        self.store.get(id)
    }

    /// Rebuild every derived list when the store changed since last time.
    fn sync_views(&mut self) {
        if self.seen_version == self.store.version() {
            return;
        }
        self.seen_version = self.store.version();

        self.stats = self.store.analytics(Local::now());
        self.recent = analytics::recent_activity(self.store.records(), RECENT_LIMIT)
            .into_iter()
            .map(|r| r.id.clone())
            .collect();
        self.review.replace(
            analytics::revision_queue(self.store.records())
                .into_iter()
                .map(|r| r.id.clone())
                .collect(),
        );
        self.topics.replace(self.filtered_rollups());

        if let Some(selected) = &self.selected_topic {
            let id = selected.id.clone();
            self.selected_topic = self.store.rollups().into_iter().find(|t| t.id == id);
            let ids = self.topic_record_ids(&id);
            self.topic_problems.replace(ids);
        }
    }

    fn filtered_rollups(&self) -> Vec<TopicRollup> {
        let needle = self.filter.as_deref().map(str::to_lowercase);
        self.store
            .rollups()
            .into_iter()
            .filter(|t| {
                needle
                    .as_ref()
                    .map_or(true, |n| t.name.to_lowercase().contains(n))
            })
            .collect()
    }

    fn topic_record_ids(&self, topic_id: &str) -> Vec<String> {
        rollup::records_for_topic(self.store.records(), topic_id)
            .map(|r| r.id.clone())
            .collect()
    }

    pub fn reload(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let report = self.store.load(self.source, Utc::now())?;
        self.message = Some(format!("Reloaded {} problems", report.total));
        self.sync_views();
        Ok(())
    }

    fn apply_filter(&mut self) {
        self.filter = if self.filter_input.is_empty() {
            None
        } else {
            Some(self.filter_input.clone())
        };
        self.topics = StatefulList::with_items(self.filtered_rollups());
    }

    fn select_topic(&mut self) {
        if let Some(topic) = self.topics.selected_item().cloned() {
            self.topic_problems = StatefulList::with_items(self.topic_record_ids(&topic.id));
            self.selected_topic = Some(topic);
            self.view = View::TopicDetail;
        }
    }

    /// The record under the cursor in the current list view.
    pub fn selected_problem(&self) -> Option<&str> {
        let id = match self.view {
            View::TopicDetail => self.topic_problems.selected_item(),
            View::Review => self.review.selected_item(),
            _ => None,
        };
        id.map(String::as_str)
    }

    fn toggle_timer(&mut self, id: &str) -> Result<(), Box<dyn std::error::Error>> {
        let stopped_same = self.timer.as_ref().is_some_and(|t| t.id == id);
        self.stop_timer()?;
        if !stopped_same {
            self.timer = Some(ActiveTimer {
                id: id.to_string(),
                started: Instant::now(),
            });
            self.message = Some(format!("Timer started for {}", id));
        }
        Ok(())
    }

    fn stop_timer(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(timer) = self.timer.take() {
            let seconds = timer.started.elapsed().as_secs();
            let record = self.store.add_time(&timer.id, seconds, Utc::now())?;
            info!("Logged {}s on {}", seconds, record.id);
            self.message = Some(format!("Logged {}s on {}", seconds, record.title));
        }
        Ok(())
    }

    fn act_on_selected(&mut self, key: char) -> Result<(), Box<dyn std::error::Error>> {
        let Some(id) = self.selected_problem().map(str::to_string) else {
            return Ok(());
        };
        let now = Utc::now();
        match key {
            'c' => {
                let r = self.store.cycle_status(&id, now)?;
                self.message = Some(format!("{} -> {}", r.title, r.status.as_str()));
            }
            's' => {
                self.store.toggle_star(&id, now)?;
            }
            'v' => {
                let r = self.store.toggle_tag(&id, REVISION_TAG, now)?;
                self.message = Some(if r.has_tag(REVISION_TAG) {
                    format!("{} marked for revision", r.title)
                } else {
                    format!("{} unmarked", r.title)
                });
            }
            't' => self.toggle_timer(&id)?,
            _ => {}
        }
        self.sync_views();
        Ok(())
    }

    fn handle_key(
        &mut self,
        key: KeyCode,
        modifiers: KeyModifiers,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if self.filter_mode {
            match key {
                KeyCode::Esc => {
                    self.filter_mode = false;
                    self.filter_input.clear();
                }
                KeyCode::Enter => {
                    self.filter_mode = false;
                    self.apply_filter();
                }
                KeyCode::Backspace => {
                    self.filter_input.pop();
                }
                KeyCode::Char(c) => {
                    self.filter_input.push(c);
                }
                _ => {}
            }
            return Ok(());
        }

        self.message = None;

        match key {
            KeyCode::Char('q') => {
                self.stop_timer()?;
                self.should_quit = true;
            }

            KeyCode::Char('r') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.reload()?;
            }

            KeyCode::Char('/') if self.view == View::Topics => {
                self.filter_mode = true;
                self.filter_input.clear();
            }

            KeyCode::Esc => match self.view {
                View::TopicDetail => {
                    self.view = View::Topics;
                    self.selected_topic = None;
                }
                View::Topics if self.filter.is_some() => {
                    self.filter_input.clear();
                    self.apply_filter();
                }
                _ => {}
            },

            KeyCode::Char('h') | KeyCode::Left => match self.view {
                View::TopicDetail => {
                    self.view = View::Topics;
                    self.selected_topic = None;
                }
                _ => self.view = self.view.prev(),
            },
            KeyCode::Char('l') | KeyCode::Right => match self.view {
                View::Topics => self.select_topic(),
                View::TopicDetail => {}
                _ => self.view = self.view.next(),
            },

            KeyCode::Tab => {
                if modifiers.contains(KeyModifiers::SHIFT) {
                    self.view = self.view.prev();
                } else {
                    self.view = self.view.next();
                }
            }
            KeyCode::BackTab => {
                self.view = self.view.prev();
            }

            KeyCode::Char('j') | KeyCode::Down => match self.view {
                View::Topics => self.topics.next(),
                View::TopicDetail => self.topic_problems.next(),
                View::Review => self.review.next(),
                View::Dashboard => {}
            },
            KeyCode::Char('k') | KeyCode::Up => match self.view {
                View::Topics => self.topics.previous(),
                View::TopicDetail => self.topic_problems.previous(),
                View::Review => self.review.previous(),
                View::Dashboard => {}
            },

            KeyCode::Char('g') => match self.view {
                View::Topics => self.topics.first(),
                View::TopicDetail => self.topic_problems.first(),
                View::Review => self.review.first(),
                View::Dashboard => {}
            },
            KeyCode::Char('G') => match self.view {
                View::Topics => self.topics.last(),
                View::TopicDetail => self.topic_problems.last(),
                View::Review => self.review.last(),
                View::Dashboard => {}
            },

            KeyCode::Enter if self.view == View::Topics => self.select_topic(),

            KeyCode::Char(c @ ('c' | 's' | 'v' | 't')) => self.act_on_selected(c)?,

            _ => {}
        }
        Ok(())
    }
}

pub fn run(
    store: Store,
    source: Option<&dyn CatalogSource>,
) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(store, source);

    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key.code, key.modifiers)?;
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn setup_app() -> App<'static> {
        let db = Database::open(":memory:").expect("Failed to create in-memory database");
        db.init().expect("Failed to initialize database");
        let mut store = Store::new(db);
        store.load(None, Utc::now()).unwrap();
        App::new(store, None)
    }

    fn press(app: &mut App, key: KeyCode) {
        app.handle_key(key, KeyModifiers::NONE).unwrap();
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    mod list_tests {
        use super::*;

        #[test]
        fn next_wraps_around() {
            let mut list = StatefulList::with_items(vec![1, 2]);
            list.next();
            list.next();
            assert_eq!(list.selected, Some(0));
            list.previous();
            assert_eq!(list.selected, Some(1));
        }

        #[test]
        fn empty_list_has_no_selection() {
            let mut list: StatefulList<i32> = StatefulList::with_items(vec![]);
            list.next();
            list.last();
            assert_eq!(list.selected, None);
        }

        #[test]
        fn replace_clamps_cursor() {
            let mut list = StatefulList::with_items(vec![1, 2, 3]);
            list.last();
            list.replace(vec![1]);
            assert_eq!(list.selected, Some(0));
            list.replace(vec![]);
            assert_eq!(list.selected, None);
        }
    }

    mod navigation_tests {
        use super::*;

        #[test]
        fn tab_cycles_views() {
            let mut app = setup_app();
            assert_eq!(app.view, View::Dashboard);
            press(&mut app, KeyCode::Tab);
            assert_eq!(app.view, View::Topics);
            press(&mut app, KeyCode::Tab);
            assert_eq!(app.view, View::Review);
            press(&mut app, KeyCode::Tab);
            assert_eq!(app.view, View::Dashboard);
        }

        #[test]
        fn open_and_close_topic() {
            let mut app = setup_app();
            press(&mut app, KeyCode::Tab);
            press(&mut app, KeyCode::Enter);
            assert_eq!(app.view, View::TopicDetail);
            assert!(app.selected_topic.is_some());
            assert!(!app.topic_problems.items.is_empty());

            press(&mut app, KeyCode::Esc);
            assert_eq!(app.view, View::Topics);
            assert!(app.selected_topic.is_none());
        }

        #[test]
        fn filter_narrows_topics() {
            let mut app = setup_app();
            press(&mut app, KeyCode::Tab);
            let all = app.topics.items.len();

            press(&mut app, KeyCode::Char('/'));
            type_str(&mut app, "trees");
            press(&mut app, KeyCode::Enter);

            assert_eq!(app.filter.as_deref(), Some("trees"));
            assert_eq!(app.topics.items.len(), 1);
            assert_eq!(app.topics.items[0].name, "Trees");

            press(&mut app, KeyCode::Esc);
            assert!(app.filter.is_none());
            assert_eq!(app.topics.items.len(), all);
        }

        #[test]
        fn quit_key() {
            let mut app = setup_app();
            press(&mut app, KeyCode::Char('q'));
            assert!(app.should_quit);
        }
    }

    mod action_tests {
        use super::*;

        fn open_first_topic(app: &mut App) -> String {
            press(app, KeyCode::Tab);
            press(app, KeyCode::Enter);
            app.selected_problem().unwrap().to_string()
        }

        #[test]
        fn cycle_status_updates_rollup() {
            let mut app = setup_app();
            let id = open_first_topic(&mut app);

            press(&mut app, KeyCode::Char('c'));
            press(&mut app, KeyCode::Char('c'));

            assert!(app.record(&id).unwrap().is_completed());
            assert_eq!(app.selected_topic.as_ref().unwrap().solved, 1);
            assert_eq!(app.stats.completed, 1);
            assert_eq!(app.recent.first(), Some(&id));
        }

        #[test]
        fn revision_toggle_fills_review_queue() {
            let mut app = setup_app();
            let id = open_first_topic(&mut app);
            assert!(app.review.items.is_empty());

            press(&mut app, KeyCode::Char('v'));
            assert_eq!(app.review.items, vec![id.clone()]);

            press(&mut app, KeyCode::Char('v'));
            assert!(app.review.items.is_empty());
        }

        #[test]
        fn star_toggles() {
            let mut app = setup_app();
            let id = open_first_topic(&mut app);
            press(&mut app, KeyCode::Char('s'));
            assert!(app.record(&id).unwrap().starred);
        }

        #[test]
        fn timer_start_and_stop() {
            let mut app = setup_app();
            let id = open_first_topic(&mut app);

            press(&mut app, KeyCode::Char('t'));
            assert_eq!(app.timer.as_ref().map(|t| t.id.as_str()), Some(id.as_str()));

            press(&mut app, KeyCode::Char('t'));
            assert!(app.timer.is_none());
            assert!(app.record(&id).unwrap().updated_at.is_some());
        }

        #[test]
        fn actions_ignored_on_dashboard() {
            let mut app = setup_app();
            let version = app.store.version();
            press(&mut app, KeyCode::Char('c'));
            assert_eq!(app.store.version(), version);
        }
    }
}
