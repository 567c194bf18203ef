mod analytics;
mod catalog;
mod config;
mod db;
mod error;
mod fallback;
mod merge;
mod models;
mod rollup;
mod srs;
mod store;
mod tui;

use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use log::debug;
use serde::Serialize;

use catalog::{CatalogSource, HttpCatalog};
use config::Config;
use db::Database;
use models::{JsonOutput, ProblemRecord, Status, TextField};
use store::{LoadReport, Store, StoreEvent};
use tui::widgets::truncate;

#[derive(Parser)]
#[command(name = "babua")]
#[command(about = "Practice tracker with topic progress, streaks and spaced review")]
#[command(version)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Skip the remote catalog and use cached data
    #[arg(long, global = true)]
    offline: bool,

    /// Fetch the remote catalog before running the command
    #[arg(long, global = true, conflicts_with = "offline")]
    refresh: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database and fetch the catalog
    Init,

    /// Refresh the catalog cache from the remote source
    Sync,

    /// List problems
    Problems {
        /// Filter by topic name
        #[arg(long, short)]
        topic: Option<String>,

        /// Filter by status: pending/in-progress/completed
        #[arg(long, short)]
        status: Option<String>,

        /// Filter by domain (DSA, Core Engineering, AI/ML)
        #[arg(long, short)]
        domain: Option<String>,

        /// Case-insensitive search over title and id
        #[arg(long)]
        search: Option<String>,

        /// Only starred problems
        #[arg(long)]
        starred: bool,

        /// Only problems due for review
        #[arg(long)]
        due: bool,
    },

    /// Show problem details
    Show {
        /// Problem ID
        id: String,
    },

    /// Set the status of a problem
    Status {
        /// Problem ID
        id: String,

        /// New status: pending/in-progress/completed
        status: String,
    },

    /// Toggle the star on a problem
    Star {
        /// Problem ID
        id: String,
    },

    /// Replace the tags of a problem
    Tag {
        /// Problem ID
        id: String,

        /// Comma-separated tags (replaces existing)
        #[arg(long, short)]
        tags: String,
    },

    /// Add or remove a single tag
    ToggleTag {
        /// Problem ID
        id: String,

        /// Tag name, e.g. Revision
        tag: String,
    },

    /// Edit notes, solution or approach
    Note {
        /// Problem ID
        id: String,

        #[arg(long, short)]
        notes: Option<String>,

        #[arg(long, short)]
        solution: Option<String>,

        #[arg(long, short)]
        approach: Option<String>,
    },

    /// Log time spent on a problem
    Time {
        /// Problem ID
        id: String,

        /// Seconds to add
        seconds: u64,
    },

    /// Show topic progress
    Topics {
        /// Filter by subject (e.g. "System Design")
        #[arg(long, short)]
        subject: Option<String>,
    },

    /// Show XP, streak and activity
    Stats,

    /// List problems due for review
    Review,

    /// Pick the next problem to review (weighted random)
    Next,

    /// Suggest a quick win, a weak link and a fresh start
    Recommend,

    /// Print study material for a topic
    Theory {
        /// Topic name or slug
        topic: String,
    },

    /// Launch interactive terminal UI
    Tui,
}

impl Cli {
    /// Only these load from the remote catalog unless `--refresh` is given;
    /// everything else works from the cache.
    fn fetches_catalog(&self) -> bool {
        self.refresh || matches!(self.command, Commands::Init | Commands::Sync | Commands::Tui)
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(matches!(cli.command, Commands::Tui));

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(tui: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().filter_or("BABUA_LOG", "warn"));
    // Log lines would tear the alternate screen.
    if tui && std::env::var_os("BABUA_LOG").is_none() {
        builder.filter_level(log::LevelFilter::Off);
    }
    builder.init();
}

fn print_json<T: Serialize>(output: &JsonOutput<T>) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string(output)?);
    Ok(())
}

fn catalog_source(config: &Config, offline: bool) -> Result<Option<HttpCatalog>, Box<dyn std::error::Error>> {
    if offline {
        return Ok(None);
    }
    match config.catalog_url() {
        Some(url) => Ok(Some(HttpCatalog::new(url, config.catalog.timeout())?)),
        None => Ok(None),
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();
    let db_path = config.database_path();
    let db = Database::open(&db_path)?;
    db.init()?;

    let http = catalog_source(&config, cli.offline)?;
    let source = http.as_ref().map(|c| c as &dyn CatalogSource);

    let mut store = Store::new(db);
    let logger = store.subscribe(|event| match event {
        StoreEvent::Loaded { version, total } => debug!("store v{}: loaded {} records", version, total),
        StoreEvent::Updated { version, id } => debug!("store v{}: updated {}", version, id),
    });
    let report = store.load(source.filter(|_| cli.fetches_catalog()), Utc::now())?;

    match cli.command {
        Commands::Init => {
            if cli.json {
                print_json(&JsonOutput::ok(&report))?;
            } else {
                println!("Database initialized at: {}", db_path.display());
                print_load_report(&report);
                println!("{} problems with local progress.", store.db().count_overrides()?);
            }
        }

        Commands::Sync => {
            if cli.json {
                print_json(&JsonOutput::ok(&report))?;
            } else {
                print_load_report(&report);
            }
        }

        Commands::Problems {
            topic,
            status,
            domain,
            search,
            starred,
            due,
        } => {
            let status = match status.as_deref() {
                Some(s) => Some(
                    Status::from_str(s)
                        .ok_or("Invalid status. Use: pending, in-progress, completed")?,
                ),
                None => None,
            };
            let topic_slug = topic.as_deref().map(rollup::slugify);
            let search = search.map(|s| s.to_lowercase());

            let problems: Vec<&ProblemRecord> = store
                .records()
                .iter()
                .filter(|r| {
                    topic_slug
                        .as_ref()
                        .map_or(true, |slug| &rollup::slugify(r.topic.trim()) == slug)
                })
                .filter(|r| status.map_or(true, |s| r.status == s))
                .filter(|r| {
                    domain
                        .as_ref()
                        .map_or(true, |d| r.domain.eq_ignore_ascii_case(d))
                })
                .filter(|r| {
                    search.as_ref().map_or(true, |q| {
                        r.title.to_lowercase().contains(q) || r.id.to_lowercase().contains(q)
                    })
                })
                .filter(|r| !starred || r.starred)
                .filter(|r| !due || r.is_review_due)
                .collect();

            if cli.json {
                print_json(&JsonOutput::ok(&problems))?;
            } else if problems.is_empty() {
                println!("No problems found.");
            } else {
                print_problem_table(&problems);
            }
        }

        Commands::Show { id } => {
            if let Some(record) = store.get(&id) {
                if cli.json {
                    print_json(&JsonOutput::ok(record))?;
                } else {
                    print_problem(record);
                }
            } else if cli.json {
                print_json(&JsonOutput::<()>::err("Problem not found"))?;
            } else {
                println!("Problem not found.");
            }
        }

        Commands::Status { id, status } => {
            let status = Status::from_str(&status)
                .ok_or("Invalid status. Use: pending, in-progress, completed")?;
            let result = store.set_status(&id, status, Utc::now());
            report_mutation(cli.json, result, |r| {
                format!("{} is now {}.", r.title, r.status.as_str())
            })?;
        }

        Commands::Star { id } => {
            let result = store.toggle_star(&id, Utc::now());
            report_mutation(cli.json, result, |r| {
                if r.starred {
                    format!("Starred {}.", r.title)
                } else {
                    format!("Unstarred {}.", r.title)
                }
            })?;
        }

        Commands::Tag { id, tags } => {
            let result = store.set_tags(&id, tags.split(','), Utc::now());
            report_mutation(cli.json, result, |r| format!("Updated tags for {}.", r.title))?;
        }

        Commands::ToggleTag { id, tag } => {
            let result = store.toggle_tag(&id, &tag, Utc::now());
            report_mutation(cli.json, result, |r| {
                let verb = if r.has_tag(tag.trim()) { "Added" } else { "Removed" };
                format!("{} tag '{}' on {}.", verb, tag.trim(), r.title)
            })?;
        }

        Commands::Note {
            id,
            notes,
            solution,
            approach,
        } => {
            let edits = [
                (TextField::Notes, notes),
                (TextField::Solution, solution),
                (TextField::Approach, approach),
            ];
            if edits.iter().all(|(_, v)| v.is_none()) {
                return Err("Nothing to update. Use --notes, --solution or --approach".into());
            }

            let edits = edits
                .into_iter()
                .filter_map(|(field, value)| value.map(|v| (field, v)));
            let result = store.set_text(&id, edits, Utc::now());
            report_mutation(cli.json, result, |r| format!("Saved notes for {}.", r.title))?;
        }

        Commands::Time { id, seconds } => {
            let result = store.add_time(&id, seconds, Utc::now());
            report_mutation(cli.json, result, |r| {
                format!("Logged {} on {} ({} total).", format_duration(seconds), r.title, format_duration(r.time_spent))
            })?;
        }

        Commands::Topics { subject } => {
            let rollups: Vec<_> = store
                .rollups()
                .into_iter()
                .filter(|t| {
                    subject.as_ref().map_or(true, |s| {
                        t.subject
                            .as_deref()
                            .is_some_and(|ts| ts.eq_ignore_ascii_case(s))
                    })
                })
                .collect();

            if cli.json {
                print_json(&JsonOutput::ok(&rollups))?;
            } else if rollups.is_empty() {
                println!("No topics found.");
            } else {
                println!(
                    "{:<30} {:<18} {:<18} {:>7} {:>6} PROGRESS",
                    "TOPIC", "DOMAIN", "SUBJECT", "SOLVED", "DUE"
                );
                println!("{}", "-".repeat(95));
                for t in rollups {
                    println!(
                        "{:<30} {:<18} {:<18} {:>7} {:>6} {:.0}%",
                        truncate(&t.name, 28),
                        truncate(&t.domain, 16),
                        truncate(t.subject.as_deref().unwrap_or("-"), 16),
                        format!("{}/{}", t.solved, t.total),
                        t.review_count,
                        t.progress_percent()
                    );
                }
            }
        }

        Commands::Stats => {
            let stats = store.analytics(Local::now());
            if cli.json {
                print_json(&JsonOutput::ok(&stats))?;
            } else {
                println!("=== Practice Statistics ===");
                println!("Total XP: {}", stats.total_xp);
                println!("Current streak: {} day(s)", stats.streak);
                println!("Solved today: {}", stats.today_count);
                println!("Completed: {}/{}", stats.completed, stats.total);
                println!(
                    "By difficulty: {} easy, {} medium, {} hard",
                    stats.easy_solved, stats.medium_solved, stats.hard_solved
                );
                println!("Due for review: {}", stats.review_due);
                println!();
                println!("--- Last 7 days ---");
                for point in stats.trend.iter().rev().take(7).rev() {
                    println!("{}  {:>4} XP", point.date.format("%a %d %b"), point.xp);
                }
            }
        }

        Commands::Review => {
            let queue = analytics::revision_queue(store.records());
            if cli.json {
                print_json(&JsonOutput::ok(&queue))?;
            } else if queue.is_empty() {
                println!("Nothing due for review.");
            } else {
                let now = Utc::now();
                println!("{:<10} {:<40} {:<10} OVERDUE", "ID", "TITLE", "DIFFICULTY");
                println!("{}", "-".repeat(75));
                for r in queue {
                    let overdue = match r.review_due_at {
                        Some(_) => format!("{}d", srs::overdue_days(r, now)),
                        None => "tagged".to_string(),
                    };
                    println!(
                        "{:<10} {:<40} {:<10} {}",
                        truncate(&r.id, 10),
                        truncate(&r.title, 38),
                        r.difficulty.as_str(),
                        overdue
                    );
                }
            }
        }

        Commands::Next => {
            let picked =
                analytics::pick_next_review(store.records(), Utc::now(), &mut rand::thread_rng());
            match picked {
                Some(record) => {
                    if cli.json {
                        print_json(&JsonOutput::ok(record))?;
                    } else {
                        println!("=== Next Problem to Review ===");
                        println!();
                        print_problem(record);
                    }
                }
                None => {
                    if cli.json {
                        print_json(&JsonOutput::<()>::err("Nothing due for review"))?;
                    } else {
                        println!("Nothing due for review. Solve something new!");
                    }
                }
            }
        }

        Commands::Recommend => {
            let rollups = store.rollups();
            let recs = analytics::recommend(store.records(), &rollups);
            if cli.json {
                print_json(&JsonOutput::ok(&recs))?;
            } else {
                for (label, pick) in [
                    ("Quick Win", recs.quick_win),
                    ("Weak Link", recs.weak_link),
                    ("Fresh Start", recs.fresh_start),
                ] {
                    match pick {
                        Some(r) => println!(
                            "{:<12} {} [{}] ({})",
                            label,
                            r.title,
                            r.difficulty.as_str(),
                            r.topic
                        ),
                        None => println!("{:<12} -", label),
                    }
                }
            }
        }

        Commands::Theory { topic } => {
            let catalog = http.as_ref().ok_or(
                "No catalog configured. Set BABUA_CATALOG_URL or [catalog] url in the config",
            )?;
            let text = catalog.fetch_theory(&rollup::slugify(&topic))?;
            if cli.json {
                print_json(&JsonOutput::ok(&text))?;
            } else {
                println!("{}", text);
            }
        }

        Commands::Tui => {
            // The TUI reports changes in its own status line.
            store.unsubscribe(logger);
            tui::run(store, source)?;
        }
    }

    Ok(())
}

/// Print the outcome of a single-record action; an unknown id is reported
/// rather than treated as a failure.
fn report_mutation<F>(
    json: bool,
    result: error::Result<ProblemRecord>,
    describe: F,
) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce(&ProblemRecord) -> String,
{
    match result {
        Ok(record) => {
            if json {
                print_json(&JsonOutput::ok(&record))?;
            } else {
                println!("{}", describe(&record));
            }
            Ok(())
        }
        Err(error::Error::ProblemNotFound(_)) => {
            if json {
                print_json(&JsonOutput::<()>::err("Problem not found"))?;
            } else {
                println!("Problem not found.");
            }
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn print_load_report(report: &LoadReport) {
    let origin = match report.origin {
        store::LoadOrigin::Remote => "remote catalog",
        store::LoadOrigin::Cached => "cached catalog",
        store::LoadOrigin::FallbackOnly => "bundled problems only",
    };
    println!(
        "Loaded {} problems ({} from {}).",
        report.total, report.remote_count, origin
    );
}

fn print_problem_table(problems: &[&ProblemRecord]) {
    println!(
        "{:<10} {:<36} {:<24} {:<7} {:<12} FLAGS",
        "ID", "TITLE", "TOPIC", "LEVEL", "STATUS"
    );
    println!("{}", "-".repeat(100));
    for r in problems {
        let mut flags = Vec::new();
        if r.starred {
            flags.push("*");
        }
        if r.is_review_due {
            flags.push("due");
        }
        println!(
            "{:<10} {:<36} {:<24} {:<7} {:<12} {}",
            truncate(&r.id, 10),
            truncate(&r.title, 34),
            truncate(&r.topic, 22),
            r.difficulty.as_str(),
            r.status.as_str(),
            flags.join(" ")
        );
    }
}

fn print_problem(r: &ProblemRecord) {
    println!("Problem: {}", r.title);
    println!("ID: {}", r.id);
    println!("Topic: {} ({})", r.topic, r.domain);
    println!("Difficulty: {} ({} XP)", r.difficulty.as_str(), r.difficulty.xp());
    println!("Status: {}", r.status.as_str());
    if let Some(link) = &r.problem_link {
        println!("Link: {}", link);
    }
    println!(
        "Tags: {}",
        if r.tags.is_empty() {
            "-".to_string()
        } else {
            r.tags.iter().cloned().collect::<Vec<_>>().join(", ")
        }
    );
    if r.starred {
        println!("Starred: yes");
    }
    if r.time_spent > 0 {
        println!("Time spent: {}", format_duration(r.time_spent));
    }
    if let Some(at) = r.completion() {
        println!("Completed: {}", at.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
    }
    if let Some(due) = r.review_due_at {
        println!(
            "Review: {}{}",
            due.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            if r.is_review_due { " (due)" } else { "" }
        );
    } else if r.is_review_due {
        println!("Review: due (tagged)");
    }

    for (label, text) in [
        ("Notes", &r.notes),
        ("Approach", &r.approach),
        ("Solution", &r.solution),
    ] {
        if let Some(text) = text.as_deref().filter(|t| !t.trim().is_empty()) {
            println!();
            println!("--- {} ---", label);
            println!("{}", text);
        }
    }
}

fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{}h {:02}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {:02}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    mod duration_tests {
        use super::*;

        #[test]
        fn seconds_only() {
            assert_eq!(format_duration(45), "45s");
        }

        #[test]
        fn minutes_and_seconds() {
            assert_eq!(format_duration(125), "2m 05s");
        }

        #[test]
        fn hours_drop_seconds() {
            assert_eq!(format_duration(3 * 3600 + 7 * 60 + 9), "3h 07m");
        }
    }

    mod cli_parsing_tests {
        use super::*;

        #[test]
        fn parse_init_command() {
            let cli = Cli::try_parse_from(["babua", "init"]).unwrap();
            assert!(!cli.json);
            assert!(!cli.offline);
            assert!(matches!(cli.command, Commands::Init));
        }

        #[test]
        fn parse_global_flags() {
            let cli = Cli::try_parse_from(["babua", "--json", "--offline", "stats"]).unwrap();
            assert!(cli.json);
            assert!(cli.offline);

            let cli = Cli::try_parse_from(["babua", "stats", "--json"]).unwrap();
            assert!(cli.json);
        }

        #[test]
        fn only_sync_commands_fetch_by_default() {
            let parse = |args: &[&str]| {
                Cli::try_parse_from(std::iter::once("babua").chain(args.iter().copied())).unwrap()
            };
            assert!(parse(&["sync"]).fetches_catalog());
            assert!(parse(&["init"]).fetches_catalog());
            assert!(parse(&["tui"]).fetches_catalog());
            assert!(!parse(&["star", "dsa-001"]).fetches_catalog());
            assert!(parse(&["--refresh", "stats"]).fetches_catalog());
            assert!(Cli::try_parse_from(["babua", "--refresh", "--offline", "stats"]).is_err());
        }

        #[test]
        fn parse_problems_filters() {
            let cli = Cli::try_parse_from([
                "babua",
                "problems",
                "--topic",
                "Two Pointers",
                "-s",
                "completed",
                "--starred",
                "--due",
            ])
            .unwrap();
            match cli.command {
                Commands::Problems {
                    topic,
                    status,
                    domain,
                    search,
                    starred,
                    due,
                } => {
                    assert_eq!(topic, Some("Two Pointers".to_string()));
                    assert_eq!(status, Some("completed".to_string()));
                    assert!(domain.is_none());
                    assert!(search.is_none());
                    assert!(starred);
                    assert!(due);
                }
                _ => panic!("Expected Problems command"),
            }
        }

        #[test]
        fn parse_status_command() {
            let cli = Cli::try_parse_from(["babua", "status", "dsa-001", "in-progress"]).unwrap();
            match cli.command {
                Commands::Status { id, status } => {
                    assert_eq!(id, "dsa-001");
                    assert_eq!(status, "in-progress");
                }
                _ => panic!("Expected Status command"),
            }
        }

        #[test]
        fn parse_tag_command() {
            let cli =
                Cli::try_parse_from(["babua", "tag", "dsa-002", "--tags", "Revision,dp"]).unwrap();
            match cli.command {
                Commands::Tag { id, tags } => {
                    assert_eq!(id, "dsa-002");
                    assert_eq!(tags, "Revision,dp");
                }
                _ => panic!("Expected Tag command"),
            }
        }

        #[test]
        fn parse_toggle_tag_command() {
            let cli = Cli::try_parse_from(["babua", "toggle-tag", "dsa-002", "Revision"]).unwrap();
            assert!(matches!(
                cli.command,
                Commands::ToggleTag { ref id, ref tag } if id == "dsa-002" && tag == "Revision"
            ));
        }

        #[test]
        fn parse_note_command() {
            let cli = Cli::try_parse_from([
                "babua",
                "note",
                "dsa-003",
                "--approach",
                "sliding window",
                "-n",
                "watch duplicates",
            ])
            .unwrap();
            match cli.command {
                Commands::Note {
                    id,
                    notes,
                    solution,
                    approach,
                } => {
                    assert_eq!(id, "dsa-003");
                    assert_eq!(notes, Some("watch duplicates".to_string()));
                    assert!(solution.is_none());
                    assert_eq!(approach, Some("sliding window".to_string()));
                }
                _ => panic!("Expected Note command"),
            }
        }

        #[test]
        fn parse_time_command() {
            let cli = Cli::try_parse_from(["babua", "time", "dsa-004", "900"]).unwrap();
            match cli.command {
                Commands::Time { id, seconds } => {
                    assert_eq!(id, "dsa-004");
                    assert_eq!(seconds, 900);
                }
                _ => panic!("Expected Time command"),
            }
        }

        #[test]
        fn parse_time_rejects_negative() {
            assert!(Cli::try_parse_from(["babua", "time", "dsa-004", "-5"]).is_err());
        }

        #[test]
        fn parse_topics_with_subject() {
            let cli =
                Cli::try_parse_from(["babua", "topics", "--subject", "System Design"]).unwrap();
            match cli.command {
                Commands::Topics { subject } => {
                    assert_eq!(subject, Some("System Design".to_string()));
                }
                _ => panic!("Expected Topics command"),
            }
        }

        #[test]
        fn parse_simple_commands() {
            let parse = |arg: &str| Cli::try_parse_from(["babua", arg]).unwrap().command;
            assert!(matches!(parse("sync"), Commands::Sync));
            assert!(matches!(parse("stats"), Commands::Stats));
            assert!(matches!(parse("review"), Commands::Review));
            assert!(matches!(parse("next"), Commands::Next));
            assert!(matches!(parse("recommend"), Commands::Recommend));
            assert!(matches!(parse("tui"), Commands::Tui));
        }

        #[test]
        fn parse_theory_command() {
            let cli = Cli::try_parse_from(["babua", "theory", "sliding-window"]).unwrap();
            assert!(matches!(cli.command, Commands::Theory { ref topic } if topic == "sliding-window"));
        }

        #[test]
        fn parse_invalid_command_fails() {
            assert!(Cli::try_parse_from(["babua", "invalid"]).is_err());
        }

        #[test]
        fn parse_missing_required_arg_fails() {
            assert!(Cli::try_parse_from(["babua", "show"]).is_err());
            assert!(Cli::try_parse_from(["babua", "status", "dsa-001"]).is_err());
            assert!(Cli::try_parse_from(["babua", "tag", "dsa-001"]).is_err());
        }
    }
}
