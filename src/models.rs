use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub const REVISION_TAG: &str = "Revision";
pub const DEFAULT_DOMAIN: &str = "DSA";
pub const TITLE_SENTINEL: &str = "None";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" | "e" => Some(Difficulty::Easy),
            "medium" | "m" => Some(Difficulty::Medium),
            "hard" | "h" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Points awarded for completing a problem of this difficulty.
    pub fn xp(&self) -> u32 {
        match self {
            Difficulty::Easy => 50,
            Difficulty::Medium => 100,
            Difficulty::Hard => 200,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "Pending",
            Status::InProgress => "In Progress",
            Status::Completed => "Completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" | "todo" | "p" => Some(Status::Pending),
            "in progress" | "in-progress" | "in_progress" | "inprogress" | "i" => {
                Some(Status::InProgress)
            }
            "completed" | "complete" | "done" | "c" => Some(Status::Completed),
            _ => None,
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Status::Pending => Status::InProgress,
            Status::InProgress => Status::Completed,
            Status::Completed => Status::Pending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemRecord {
    pub id: String,
    pub title: String,
    pub topic: String,
    pub domain: String,
    pub difficulty: Difficulty,
    pub status: Status,
    pub starred: bool,
    pub tags: BTreeSet<String>,
    pub problem_link: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub time_spent: u64,
    pub notes: Option<String>,
    pub solution: Option<String>,
    pub approach: Option<String>,
    // derived, recomputed by srs::annotate_in_place
    pub review_due_at: Option<DateTime<Utc>>,
    pub is_review_due: bool,
}

impl ProblemRecord {
    pub fn new(id: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: TITLE_SENTINEL.to_string(),
            topic: topic.into(),
            domain: DEFAULT_DOMAIN.to_string(),
            difficulty: Difficulty::Easy,
            status: Status::Pending,
            starred: false,
            tags: BTreeSet::new(),
            problem_link: None,
            completed_at: None,
            updated_at: None,
            time_spent: 0,
            notes: None,
            solution: None,
            approach: None,
            review_due_at: None,
            is_review_due: false,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn is_completed(&self) -> bool {
        self.status == Status::Completed
    }

    /// Completion timestamp, only while the record is actually completed.
    pub fn completion(&self) -> Option<DateTime<Utc>> {
        if self.is_completed() {
            self.completed_at
        } else {
            None
        }
    }

    /// Shallow merge: every field the patch mentions replaces ours.
    pub fn apply(&mut self, patch: &ProblemPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(topic) = &patch.topic {
            self.topic = topic.clone();
        }
        if let Some(domain) = &patch.domain {
            self.domain = domain.clone();
        }
        if let Some(difficulty) = patch.difficulty {
            self.difficulty = difficulty;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(starred) = patch.starred {
            self.starred = starred;
        }
        if let Some(tags) = &patch.tags {
            self.tags = tags.clone();
        }
        if let Some(link) = &patch.problem_link {
            self.problem_link = Some(link.clone());
        }
        if let Some(completed_at) = patch.completed_at {
            self.completed_at = completed_at;
        }
        if let Some(updated_at) = patch.updated_at {
            self.updated_at = Some(updated_at);
        }
        if let Some(time_spent) = patch.time_spent {
            self.time_spent = time_spent;
        }
        if let Some(notes) = &patch.notes {
            self.notes = Some(notes.clone());
        }
        if let Some(solution) = &patch.solution {
            self.solution = Some(solution.clone());
        }
        if let Some(approach) = &patch.approach {
            self.approach = Some(approach.clone());
        }
    }
}

/// A locally persisted partial record layered over catalog data.
///
/// `completed_at` is doubly optional: `None` leaves the field alone,
/// `Some(None)` clears it (serialized as JSON `null`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starred: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem_link: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub completed_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approach: Option<String>,
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl ProblemPatch {
    /// Layer `newer` on top of this patch; fields it mentions win.
    pub fn merge(&mut self, newer: &ProblemPatch) {
        fn take<T: Clone>(slot: &mut Option<T>, newer: &Option<T>) {
            if newer.is_some() {
                slot.clone_from(newer);
            }
        }
        take(&mut self.title, &newer.title);
        take(&mut self.topic, &newer.topic);
        take(&mut self.domain, &newer.domain);
        take(&mut self.difficulty, &newer.difficulty);
        take(&mut self.status, &newer.status);
        take(&mut self.starred, &newer.starred);
        take(&mut self.tags, &newer.tags);
        take(&mut self.problem_link, &newer.problem_link);
        take(&mut self.completed_at, &newer.completed_at);
        take(&mut self.updated_at, &newer.updated_at);
        take(&mut self.time_spent, &newer.time_spent);
        take(&mut self.notes, &newer.notes);
        take(&mut self.solution, &newer.solution);
        take(&mut self.approach, &newer.approach);
    }

    pub fn is_empty(&self) -> bool {
        *self == ProblemPatch::default()
    }
}

/// Free-text fields a user can edit on a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Notes,
    Solution,
    Approach,
}

impl TextField {
    pub fn patch(&self, value: String) -> ProblemPatch {
        let mut patch = ProblemPatch::default();
        match self {
            TextField::Notes => patch.notes = Some(value),
            TextField::Solution => patch.solution = Some(value),
            TextField::Approach => patch.approach = Some(value),
        }
        patch
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicRollup {
    pub id: String,
    pub name: String,
    pub domain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub total: usize,
    pub solved: usize,
    pub review_count: usize,
}

impl TopicRollup {
    pub fn progress_percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.solved as f64 / self.total as f64) * 100.0
        }
    }

    pub fn solved_ratio(&self) -> f64 {
        self.progress_percent() / 100.0
    }
}

// JSON output wrapper for CLI
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}
