use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rand::Rng;
use serde::Serialize;

use crate::models::{Difficulty, ProblemRecord, Status, TopicRollup};
use crate::rollup::slugify;
use crate::srs;

pub const TREND_DAYS: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub xp: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub total_xp: u32,
    pub streak: u32,
    pub today_count: usize,
    pub completed: usize,
    pub total: usize,
    pub review_due: usize,
    pub easy_solved: usize,
    pub medium_solved: usize,
    pub hard_solved: usize,
    pub trend: Vec<TrendPoint>,
}

impl Analytics {
    /// Aggregate metrics in one pass. Days are calendar dates in `now`'s
    /// time zone.
    pub fn compute<Tz: TimeZone>(records: &[ProblemRecord], now: DateTime<Tz>) -> Self {
        let tz = now.timezone();
        let today = now.date_naive();
        let first_trend_day = today - Duration::days(TREND_DAYS as i64 - 1);

        let mut trend: Vec<TrendPoint> = (0..TREND_DAYS)
            .map(|i| TrendPoint {
                date: first_trend_day + Duration::days(i as i64),
                xp: 0,
            })
            .collect();
        let mut completed_dates: HashSet<NaiveDate> = HashSet::new();

        let mut stats = Analytics {
            total_xp: 0,
            streak: 0,
            today_count: 0,
            completed: 0,
            total: records.len(),
            review_due: 0,
            easy_solved: 0,
            medium_solved: 0,
            hard_solved: 0,
            trend: Vec::new(),
        };

        for record in records {
            if record.is_review_due {
                stats.review_due += 1;
            }
            if record.status != Status::Completed {
                continue;
            }

            let xp = record.difficulty.xp();
            stats.completed += 1;
            stats.total_xp += xp;
            match record.difficulty {
                Difficulty::Easy => stats.easy_solved += 1,
                Difficulty::Medium => stats.medium_solved += 1,
                Difficulty::Hard => stats.hard_solved += 1,
            }

            let Some(completed_at) = record.completed_at else {
                continue;
            };
            let day = completed_at.with_timezone(&tz).date_naive();
            completed_dates.insert(day);

            if day == today {
                stats.today_count += 1;
            }
            if day >= first_trend_day && day <= today {
                let offset = (day - first_trend_day).num_days() as usize;
                trend[offset].xp += xp;
            }
        }

        stats.streak = streak(&completed_dates, today);
        stats.trend = trend;
        stats
    }
}

/// Consecutive days with a completion, ending today or yesterday.
pub fn streak(dates: &HashSet<NaiveDate>, today: NaiveDate) -> u32 {
    let yesterday = today - Duration::days(1);
    let mut day = if dates.contains(&today) {
        today
    } else if dates.contains(&yesterday) {
        yesterday
    } else {
        return 0;
    };

    let mut count = 0;
    while dates.contains(&day) {
        count += 1;
        day -= Duration::days(1);
    }
    count
}

/// Due records, soonest scheduled review first; tag-only reviews last,
/// most recently touched first.
pub fn revision_queue(records: &[ProblemRecord]) -> Vec<&ProblemRecord> {
    let mut queue: Vec<&ProblemRecord> = records.iter().filter(|r| r.is_review_due).collect();
    queue.sort_by(|a, b| match (a.review_due_at, b.review_due_at) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| b.updated_at.cmp(&a.updated_at)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => b.updated_at.cmp(&a.updated_at),
    });
    queue
}

pub fn recent_activity(records: &[ProblemRecord], limit: usize) -> Vec<&ProblemRecord> {
    let mut touched: Vec<&ProblemRecord> =
        records.iter().filter(|r| r.updated_at.is_some()).collect();
    touched.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    touched.truncate(limit);
    touched
}

/// Stochastic pick from the revision queue: longer overdue and starred
/// problems are more likely to come up.
pub fn pick_next_review<'a, R: Rng>(
    records: &'a [ProblemRecord],
    now: DateTime<Utc>,
    rng: &mut R,
) -> Option<&'a ProblemRecord> {
    let queue = revision_queue(records);
    if queue.is_empty() {
        return None;
    }

    let weights: Vec<f64> = queue
        .iter()
        .map(|r| {
            let overdue = srs::overdue_days(r, now) as f64 + 1.0;
            if r.starred {
                overdue * 2.0
            } else {
                overdue
            }
        })
        .collect();

    let total_weight: f64 = weights.iter().sum();
    let mut point = rng.gen::<f64>() * total_weight;
    for (i, weight) in weights.iter().enumerate() {
        point -= weight;
        if point <= 0.0 {
            return Some(queue[i]);
        }
    }

    queue.last().copied()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendations<'a> {
    pub quick_win: Option<&'a ProblemRecord>,
    pub weak_link: Option<&'a ProblemRecord>,
    pub fresh_start: Option<&'a ProblemRecord>,
}

pub fn recommend<'a>(records: &'a [ProblemRecord], rollups: &[TopicRollup]) -> Recommendations<'a> {
    let mut open_by_topic: HashMap<String, Vec<&'a ProblemRecord>> = HashMap::new();
    for record in records.iter().filter(|r| !r.is_completed()) {
        let slug = slugify(record.topic.trim());
        if !slug.is_empty() {
            open_by_topic.entry(slug).or_default().push(record);
        }
    }
    let open = |topic: &TopicRollup| open_by_topic.get(&topic.id).map(Vec::as_slice).unwrap_or(&[]);

    // Ties keep the earliest topic.
    let quick_win = rollups
        .iter()
        .filter_map(|t| {
            open(t)
                .iter()
                .find(|r| r.difficulty == Difficulty::Easy)
                .map(|r| (t.solved_ratio(), *r))
        })
        .fold(None, |best: Option<(f64, &ProblemRecord)>, cand| match best {
            Some(b) if b.0 >= cand.0 => Some(b),
            _ => Some(cand),
        })
        .map(|(_, r)| r);

    let weak_link = rollups
        .iter()
        .filter(|t| t.solved > 0)
        .filter_map(|t| open(t).first().map(|r| (t.solved_ratio(), *r)))
        .fold(None, |best: Option<(f64, &ProblemRecord)>, cand| match best {
            Some(b) if b.0 <= cand.0 => Some(b),
            _ => Some(cand),
        })
        .map(|(_, r)| r);

    let fresh_start = rollups
        .iter()
        .filter(|t| t.solved == 0)
        .find_map(|t| open(t).first().copied());

    Recommendations {
        quick_win,
        weak_link,
        fresh_start,
    }
}
