use chrono::{DateTime, Duration, Utc};

use crate::models::{ProblemRecord, Status, REVISION_TAG};

pub const REVIEW_INTERVAL_DAYS: i64 = 3;

#[cfg(test)]
pub fn annotate(mut record: ProblemRecord, now: DateTime<Utc>) -> ProblemRecord {
    annotate_in_place(&mut record, now);
    record
}

/// Recompute `review_due_at` and `is_review_due` from the record's own fields.
pub fn annotate_in_place(record: &mut ProblemRecord, now: DateTime<Utc>) {
    let tagged = record.has_tag(REVISION_TAG);

    match (record.status, record.completed_at) {
        (Status::Completed, Some(completed_at)) => {
            let due_at = completed_at + Duration::days(REVIEW_INTERVAL_DAYS);
            record.review_due_at = Some(due_at);
            record.is_review_due = now > due_at || tagged;
        }
        _ => {
            record.review_due_at = None;
            record.is_review_due = tagged;
        }
    }
}

/// Whole days a due record has been waiting past its scheduled review.
pub fn overdue_days(record: &ProblemRecord, now: DateTime<Utc>) -> i64 {
    record
        .review_due_at
        .map(|due| now.signed_duration_since(due).num_days().max(0))
        .unwrap_or(0)
}
