use std::collections::HashMap;

use crate::models::{ProblemRecord, TopicRollup};

/// Ordered keyword groups; the first group with a keyword contained in the
/// lowercased topic name decides the subject.
const SUBJECT_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "System Design",
        &[
            "scalability",
            "caching",
            "cache",
            "load balanc",
            "sharding",
            "replication",
            "consistent hashing",
            "microservice",
            "rate limit",
            "message queue",
        ],
    ),
    (
        "Operating Systems",
        &[
            "operating system",
            "process",
            "thread",
            "scheduling",
            "deadlock",
            "paging",
            "virtual memory",
            "memory management",
        ],
    ),
    (
        "DBMS",
        &["dbms", "sql", "normalization", "indexing", "transaction", "acid"],
    ),
    (
        "Computer Networks",
        &["network", "tcp", "http", "dns", "osi model", "routing"],
    ),
    (
        "Machine Learning",
        &[
            "machine learning",
            "regression",
            "classification",
            "neural",
            "gradient descent",
            "clustering",
            "transformer",
        ],
    ),
];

pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

pub fn classify_subject(topic: &str) -> Option<&'static str> {
    let lowered = topic.to_lowercase();
    SUBJECT_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(subject, _)| *subject)
}

/// One rollup per distinct topic slug, in order of first appearance.
pub fn rollup_topics(records: &[ProblemRecord]) -> Vec<TopicRollup> {
    let mut rollups: Vec<TopicRollup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let name = record.topic.trim();
        if name.is_empty() {
            continue;
        }
        let slug = slugify(name);
        if slug.is_empty() {
            continue;
        }

        let i = *index.entry(slug.clone()).or_insert_with(|| {
            rollups.push(TopicRollup {
                id: slug,
                name: name.to_string(),
                domain: record.domain.clone(),
                subject: classify_subject(name).map(str::to_string),
                total: 0,
                solved: 0,
                review_count: 0,
            });
            rollups.len() - 1
        });

        let rollup = &mut rollups[i];
        rollup.total += 1;
        if record.is_completed() {
            rollup.solved += 1;
        }
        if record.is_review_due {
            rollup.review_count += 1;
        }
    }

    rollups
}

/// Records belonging to the topic identified by `topic_id` (a slug).
pub fn records_for_topic<'a>(
    records: &'a [ProblemRecord],
    topic_id: &'a str,
) -> impl Iterator<Item = &'a ProblemRecord> + 'a {
    records
        .iter()
        .filter(move |r| slugify(r.topic.trim()) == topic_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;

    fn record(id: &str, topic: &str, status: Status) -> ProblemRecord {
        let mut r = ProblemRecord::new(id, topic);
        r.status = status;
        r
    }

    mod slug_tests {
        use super::*;

        #[test]
        fn slug_basic() {
            assert_eq!(slugify("Sliding Window"), "sliding-window");
        }

        #[test]
        fn slug_collapses_punctuation() {
            assert_eq!(slugify("  Heap / Priority Queue "), "heap-priority-queue");
            assert_eq!(slugify("1-D DP!!"), "1-d-dp");
        }

        #[test]
        fn slug_of_symbols_is_empty() {
            assert_eq!(slugify("---"), "");
        }
    }

    mod subject_tests {
        use super::*;

        #[test]
        fn classifies_system_design() {
            assert_eq!(classify_subject("Caching Strategies"), Some("System Design"));
            assert_eq!(classify_subject("Load Balancing"), Some("System Design"));
            assert_eq!(classify_subject("Scalability Basics"), Some("System Design"));
        }

        #[test]
        fn first_group_wins() {
            // "cache" (System Design) and "transaction" (DBMS) both match.
            assert_eq!(
                classify_subject("Transaction Cache Layer"),
                Some("System Design")
            );
        }

        #[test]
        fn other_subjects() {
            assert_eq!(classify_subject("Deadlock Avoidance"), Some("Operating Systems"));
            assert_eq!(classify_subject("SQL Joins"), Some("DBMS"));
            assert_eq!(classify_subject("TCP Handshake"), Some("Computer Networks"));
            assert_eq!(classify_subject("Linear Regression"), Some("Machine Learning"));
        }

        #[test]
        fn no_match_is_none() {
            assert_eq!(classify_subject("Two Pointers"), None);
        }
    }

    mod rollup_tests {
        use super::*;

        #[test]
        fn counts_total_solved_and_review() {
            let mut due = record("c", "Arrays", Status::Completed);
            due.is_review_due = true;
            let records = vec![
                record("a", "Arrays", Status::Completed),
                record("b", "Arrays", Status::Pending),
                due,
                record("d", "Graphs", Status::InProgress),
            ];

            let rollups = rollup_topics(&records);
            assert_eq!(rollups.len(), 2);

            let arrays = &rollups[0];
            assert_eq!(arrays.id, "arrays");
            assert_eq!(arrays.total, 3);
            assert_eq!(arrays.solved, 2);
            assert_eq!(arrays.review_count, 1);

            let graphs = &rollups[1];
            assert_eq!(graphs.total, 1);
            assert_eq!(graphs.solved, 0);
        }

        #[test]
        fn name_and_domain_from_first_record() {
            let mut first = record("a", "Sliding Window", Status::Pending);
            first.domain = "DSA".to_string();
            let mut second = record("b", "sliding window", Status::Pending);
            second.domain = "Core Engineering".to_string();

            let rollups = rollup_topics(&[first, second]);
            assert_eq!(rollups.len(), 1);
            assert_eq!(rollups[0].name, "Sliding Window");
            assert_eq!(rollups[0].domain, "DSA");
            assert_eq!(rollups[0].total, 2);
        }

        #[test]
        fn topicless_records_are_skipped() {
            let records = vec![
                record("a", "", Status::Completed),
                record("b", "   ", Status::Completed),
                record("c", "Trees", Status::Completed),
            ];
            let rollups = rollup_topics(&records);
            assert_eq!(rollups.len(), 1);
            assert_eq!(rollups[0].total, 1);
        }

        #[test]
        fn totals_match_records_with_topic() {
            let statuses = [Status::Pending, Status::InProgress, Status::Completed];
            let topics = ["Arrays", "Trees", "", "Graphs", "Caching"];
            let records: Vec<ProblemRecord> = (0..40)
                .map(|i| {
                    record(
                        &format!("p{}", i),
                        topics[i % topics.len()],
                        statuses[i % statuses.len()],
                    )
                })
                .collect();

            let rollups = rollup_topics(&records);
            let with_topic = records.iter().filter(|r| !r.topic.trim().is_empty()).count();
            let sum: usize = rollups.iter().map(|r| r.total).sum();

            assert_eq!(sum, with_topic);
            assert!(rollups.iter().all(|r| r.solved <= r.total));
        }

        #[test]
        fn subject_attached_on_first_sight() {
            let rollups = rollup_topics(&[record("a", "Caching", Status::Pending)]);
            assert_eq!(rollups[0].subject.as_deref(), Some("System Design"));
        }

        #[test]
        fn records_for_topic_matches_by_slug() {
            let records = vec![
                record("a", "Two Pointers", Status::Pending),
                record("b", "two pointers", Status::Pending),
                record("c", "Trees", Status::Pending),
            ];
            let ids: Vec<&str> = records_for_topic(&records, "two-pointers")
                .map(|r| r.id.as_str())
                .collect();
            assert_eq!(ids, vec!["a", "b"]);
        }
    }
}
