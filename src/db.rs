use std::collections::HashMap;
use std::path::Path;

use chrono::Utc;
use log::{debug, warn};
use rusqlite::{params, Connection, OptionalExtension, Result};

use crate::catalog::RawProblem;
use crate::models::ProblemPatch;

pub struct Database {
    conn: Connection,
}

/// The last catalog payload that was fetched successfully.
#[derive(Debug, Clone)]
pub struct CachedCatalog {
    pub problems: Vec<RawProblem>,
    pub fetched_at: String,
}

fn to_sql_error(e: serde_json::Error) -> rusqlite::Error {
    rusqlite::Error::ToSqlConversionFailure(Box::new(e))
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS overrides (
                id TEXT PRIMARY KEY,
                patch TEXT NOT NULL,
                updated_at TEXT
            );

            CREATE TABLE IF NOT EXISTS catalog_cache (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                body TEXT NOT NULL,
                fetched_at TEXT NOT NULL
            );
            "#,
        )?;

        Ok(())
    }

    // Override operations

    /// Every stored patch keyed by problem id. Rows that no longer parse are
    /// skipped with a warning.
    pub fn load_overrides(&self) -> Result<HashMap<String, ProblemPatch>> {
        let mut stmt = self.conn.prepare("SELECT id, patch FROM overrides")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut overrides = HashMap::new();
        for row in rows {
            let (id, body) = row?;
            match serde_json::from_str::<ProblemPatch>(&body) {
                Ok(patch) => {
                    overrides.insert(id, patch);
                }
                Err(e) => warn!("Skipping corrupt override for {}: {}", id, e),
            }
        }

        debug!("Loaded {} overrides", overrides.len());
        Ok(overrides)
    }

    /// Merge `patch` into the stored patch for `id` and return the result.
    /// The read and the write share one transaction.
    pub fn save_override(&mut self, id: &str, patch: &ProblemPatch) -> Result<ProblemPatch> {
        let tx = self.conn.transaction()?;

        let existing: Option<String> = tx
            .query_row(
                "SELECT patch FROM overrides WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        let mut merged = match existing.as_deref().map(serde_json::from_str::<ProblemPatch>) {
            Some(Ok(stored)) => stored,
            Some(Err(e)) => {
                warn!("Replacing corrupt override for {}: {}", id, e);
                ProblemPatch::default()
            }
            None => ProblemPatch::default(),
        };
        merged.merge(patch);

        let body = serde_json::to_string(&merged).map_err(to_sql_error)?;
        tx.execute(
            r#"
            INSERT INTO overrides (id, patch, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET patch = excluded.patch, updated_at = excluded.updated_at
            "#,
            params![id, body, Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;

        Ok(merged)
    }

    pub fn count_overrides(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM overrides", [], |row| row.get(0))
    }

    // Catalog cache

    pub fn cache_catalog(&self, problems: &[RawProblem]) -> Result<()> {
        let body = serde_json::to_string(problems).map_err(to_sql_error)?;
        self.conn.execute(
            r#"
            INSERT INTO catalog_cache (id, body, fetched_at) VALUES (1, ?1, ?2)
            ON CONFLICT(id) DO UPDATE SET body = excluded.body, fetched_at = excluded.fetched_at
            "#,
            params![body, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn cached_catalog(&self) -> Result<Option<CachedCatalog>> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT body, fetched_at FROM catalog_cache WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((body, fetched_at)) = row else {
            return Ok(None);
        };

        match serde_json::from_str(&body) {
            Ok(problems) => Ok(Some(CachedCatalog {
                problems,
                fetched_at,
            })),
            Err(e) => {
                warn!("Ignoring corrupt catalog cache: {}", e);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;

    fn setup_db() -> Database {
        let db = Database::open(":memory:").expect("Failed to create in-memory database");
        db.init().expect("Failed to initialize database");
        db
    }

    mod init_tests {
        use super::*;

        #[test]
        fn init_creates_tables() {
            let db = setup_db();
            let overrides: i64 = db
                .conn
                .query_row("SELECT COUNT(*) FROM overrides", [], |row| row.get(0))
                .expect("overrides table should exist");
            assert_eq!(overrides, 0);

            let cache: i64 = db
                .conn
                .query_row("SELECT COUNT(*) FROM catalog_cache", [], |row| row.get(0))
                .expect("catalog_cache table should exist");
            assert_eq!(cache, 0);
        }

        #[test]
        fn init_is_idempotent() {
            let mut db = setup_db();
            db.save_override(
                "p1",
                &ProblemPatch {
                    starred: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();

            db.init().expect("Re-init should succeed");
            assert_eq!(db.count_overrides().unwrap(), 1);
        }
    }

    mod override_tests {
        use super::*;

        #[test]
        fn save_and_get() {
            let mut db = setup_db();
            let patch = ProblemPatch {
                status: Some(Status::InProgress),
                ..Default::default()
            };
            db.save_override("p1", &patch).unwrap();

            let overrides = db.load_overrides().unwrap();
            assert_eq!(overrides.get("p1"), Some(&patch));
            assert!(!overrides.contains_key("missing"));
        }

        #[test]
        fn save_merges_with_existing() {
            let mut db = setup_db();
            db.save_override(
                "p1",
                &ProblemPatch {
                    starred: Some(true),
                    notes: Some("first".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
            let merged = db
                .save_override(
                    "p1",
                    &ProblemPatch {
                        notes: Some("second".to_string()),
                        ..Default::default()
                    },
                )
                .unwrap();

            assert_eq!(merged.starred, Some(true));
            assert_eq!(merged.notes.as_deref(), Some("second"));
            assert_eq!(db.load_overrides().unwrap()["p1"], merged);
            assert_eq!(db.count_overrides().unwrap(), 1);
        }

        #[test]
        fn cleared_completed_at_survives_storage() {
            let mut db = setup_db();
            db.save_override(
                "p1",
                &ProblemPatch {
                    completed_at: Some(Some(Utc::now())),
                    ..Default::default()
                },
            )
            .unwrap();
            db.save_override(
                "p1",
                &ProblemPatch {
                    completed_at: Some(None),
                    ..Default::default()
                },
            )
            .unwrap();

            let overrides = db.load_overrides().unwrap();
            assert_eq!(overrides["p1"].completed_at, Some(None));
        }

        #[test]
        fn load_skips_corrupt_rows() {
            let mut db = setup_db();
            db.save_override(
                "good",
                &ProblemPatch {
                    starred: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();
            db.conn
                .execute(
                    "INSERT INTO overrides (id, patch) VALUES ('bad', '{not json')",
                    [],
                )
                .unwrap();

            let overrides = db.load_overrides().unwrap();
            assert_eq!(overrides.len(), 1);
            assert_eq!(overrides["good"].starred, Some(true));
        }

        #[test]
        fn save_replaces_corrupt_row() {
            let mut db = setup_db();
            db.conn
                .execute(
                    "INSERT INTO overrides (id, patch) VALUES ('p1', 'garbage')",
                    [],
                )
                .unwrap();

            let merged = db
                .save_override(
                    "p1",
                    &ProblemPatch {
                        time_spent: Some(30),
                        ..Default::default()
                    },
                )
                .unwrap();
            assert_eq!(merged.time_spent, Some(30));
            assert!(db.load_overrides().unwrap().contains_key("p1"));
        }

        #[test]
        fn overrides_persist_across_reopen() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("babua.db");
            {
                let mut db = Database::open(&path).unwrap();
                db.init().unwrap();
                db.save_override(
                    "p1",
                    &ProblemPatch {
                        status: Some(Status::Completed),
                        ..Default::default()
                    },
                )
                .unwrap();
            }

            let db = Database::open(&path).unwrap();
            db.init().unwrap();
            let overrides = db.load_overrides().unwrap();
            assert_eq!(overrides["p1"].status, Some(Status::Completed));
        }
    }

    mod cache_tests {
        use super::*;

        fn raw(id: &str) -> RawProblem {
            RawProblem {
                id: Some(serde_json::json!(id)),
                topic: Some("Arrays".to_string()),
                ..Default::default()
            }
        }

        #[test]
        fn empty_cache_is_none() {
            let db = setup_db();
            assert!(db.cached_catalog().unwrap().is_none());
        }

        #[test]
        fn cache_keeps_latest_payload() {
            let db = setup_db();
            db.cache_catalog(&[raw("a"), raw("b")]).unwrap();
            db.cache_catalog(&[raw("c")]).unwrap();

            let cached = db.cached_catalog().unwrap().unwrap();
            assert_eq!(cached.problems, vec![raw("c")]);
        }

        #[test]
        fn corrupt_cache_is_ignored() {
            let db = setup_db();
            db.conn
                .execute(
                    "INSERT INTO catalog_cache (id, body, fetched_at) VALUES (1, 'oops', '2026-01-01T00:00:00Z')",
                    [],
                )
                .unwrap();
            assert!(db.cached_catalog().unwrap().is_none());
        }
    }
}
