use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{DateTime, TimeZone, Utc};
use log::{debug, warn};
use serde_json::Value;

use crate::catalog::RawProblem;
use crate::models::{
    Difficulty, ProblemPatch, ProblemRecord, Status, DEFAULT_DOMAIN, TITLE_SENTINEL,
};
use crate::srs;

/// Validate a wire entry into a strict record. Entries without an id are
/// rejected; every other missing or unknown field gets its default.
pub fn normalize(raw: &RawProblem) -> Option<ProblemRecord> {
    let id = match raw.id.as_ref().and_then(id_string) {
        Some(id) => id,
        None => {
            warn!("Skipping catalog entry without id (title: {:?})", raw.title);
            return None;
        }
    };

    let mut record = ProblemRecord::new(id, raw.topic.clone().unwrap_or_default());
    record.title = raw
        .title
        .clone()
        .unwrap_or_else(|| TITLE_SENTINEL.to_string());
    if let Some(domain) = raw.domain.as_deref().filter(|d| !d.trim().is_empty()) {
        record.domain = domain.to_string();
    }
    record.difficulty = raw
        .difficulty
        .as_deref()
        .and_then(Difficulty::from_str)
        .unwrap_or(Difficulty::Easy);
    record.status = raw
        .status
        .as_deref()
        .and_then(Status::from_str)
        .unwrap_or(Status::Pending);
    record.starred = raw.starred.unwrap_or(false);
    record.tags = raw
        .tags
        .iter()
        .flatten()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>();
    record.problem_link = raw.problem_link.clone().filter(|l| !l.trim().is_empty());
    record.completed_at = raw.completed_at.as_ref().and_then(parse_timestamp);
    record.updated_at = raw.updated_at.as_ref().and_then(parse_timestamp);
    record.time_spent = raw
        .time_spent
        .as_ref()
        .and_then(|v| v.as_f64())
        .filter(|s| *s > 0.0)
        .map(|s| s as u64)
        .unwrap_or(0);
    record.notes = raw.notes.clone();
    record.solution = raw.solution.clone();
    record.approach = raw.approach.clone();

    Some(record)
}

fn id_string(value: &Value) -> Option<String> {
    let id = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

/// RFC 3339 strings or epoch milliseconds.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

/// `https://leetcode.com/problems/two-sum/` -> `Two Sum`
pub fn title_from_link(link: &str) -> Option<String> {
    let path = link.split(['?', '#']).next().unwrap_or(link);
    let segment = path.split('/').rev().find(|s| !s.is_empty())?;

    let title = segment
        .split('-')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}

/// Replace a placeholder title with one derived from the problem link, or
/// the id when there is no link.
pub fn resolve_title(record: &mut ProblemRecord) {
    let placeholder = record.title.trim().is_empty() || record.title == TITLE_SENTINEL;
    if !placeholder {
        return;
    }
    if let Some(title) = record.problem_link.as_deref().and_then(title_from_link) {
        debug!("Derived title '{}' for {}", title, record.id);
        record.title = title;
    } else {
        record.title = record.id.clone();
    }
}

/// Defaults and derived fields applied after every patch, both on load and
/// on a single update.
pub fn finalize(record: &mut ProblemRecord, now: DateTime<Utc>) {
    resolve_title(record);
    if record.domain.trim().is_empty() {
        record.domain = DEFAULT_DOMAIN.to_string();
    }
    srs::annotate_in_place(record, now);
}

fn finish(
    mut record: ProblemRecord,
    overrides: &HashMap<String, ProblemPatch>,
    now: DateTime<Utc>,
) -> ProblemRecord {
    if let Some(patch) = overrides.get(&record.id) {
        record.apply(patch);
    }
    finalize(&mut record, now);
    record
}

/// Distinct ids among the entries that pass `normalize`.
pub fn count_valid(entries: &[RawProblem]) -> usize {
    entries
        .iter()
        .filter_map(|raw| raw.id.as_ref().and_then(id_string))
        .collect::<HashSet<_>>()
        .len()
}

/// Merge the catalog and the fallback dataset, overlay patches and annotate.
///
/// Catalog entries always win over fallback entries with the same id; within
/// one source the first occurrence of an id wins.
pub fn merge_catalog(
    remote: &[RawProblem],
    fallback: &[RawProblem],
    overrides: &HashMap<String, ProblemPatch>,
    now: DateTime<Utc>,
) -> Vec<ProblemRecord> {
    let mut seen: HashSet<String> = HashSet::with_capacity(remote.len() + fallback.len());
    let mut records = Vec::with_capacity(remote.len() + fallback.len());

    for (source, entries) in [("catalog", remote), ("fallback", fallback)] {
        for raw in entries {
            let Some(record) = normalize(raw) else {
                continue;
            };
            if !seen.insert(record.id.clone()) {
                if source == "catalog" {
                    warn!("Duplicate catalog id {}, keeping the first", record.id);
                }
                continue;
            }
            records.push(finish(record, overrides, now));
        }
    }

    records
}
