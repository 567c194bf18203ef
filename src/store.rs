use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, TimeZone, Utc};
use log::{debug, info, warn};
use serde::Serialize;

use crate::analytics::Analytics;
use crate::catalog::{CatalogSource, RawProblem};
use crate::db::Database;
use crate::error::{Error, Result};
use crate::fallback;
use crate::merge;
use crate::models::{ProblemPatch, ProblemRecord, Status, TextField, TopicRollup};
use crate::rollup;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoadOrigin {
    /// Fresh catalog from the remote source.
    Remote,
    /// Remote unavailable; last successful fetch from the cache.
    Cached,
    /// Nothing remote at all; only the bundled dataset.
    FallbackOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    pub origin: LoadOrigin,
    pub remote_count: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Loaded { version: u64, total: usize },
    Updated { version: u64, id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&StoreEvent)>;

pub struct Store {
    db: Database,
    records: Vec<ProblemRecord>,
    index: HashMap<String, usize>,
    version: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl Store {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            records: Vec::new(),
            index: HashMap::new(),
            version: 0,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Fetch (or fall back), merge with the bundled dataset and re-apply
    /// every stored patch. Without a source the cached catalog is used.
    pub fn load(&mut self, source: Option<&dyn CatalogSource>, now: DateTime<Utc>) -> Result<LoadReport> {
        let (origin, remote) = self.remote_problems(source)?;
        let overrides = self.db.load_overrides()?;
        let fallback = fallback::problems();

        self.records = merge::merge_catalog(&remote, &fallback, &overrides, now);
        self.index = self
            .records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.clone(), i))
            .collect();
        self.version += 1;

        let report = LoadReport {
            origin,
            remote_count: merge::count_valid(&remote),
            total: self.records.len(),
        };
        info!(
            "Loaded {} records ({} remote, {:?}), {} overrides",
            report.total,
            report.remote_count,
            report.origin,
            overrides.len()
        );

        self.notify(&StoreEvent::Loaded {
            version: self.version,
            total: report.total,
        });
        Ok(report)
    }

    fn remote_problems(
        &self,
        source: Option<&dyn CatalogSource>,
    ) -> Result<(LoadOrigin, Vec<RawProblem>)> {
        if let Some(source) = source {
            match source.fetch_problems() {
                Ok(problems) => {
                    if let Err(e) = self.db.cache_catalog(&problems) {
                        warn!("Could not cache catalog: {}", e);
                    }
                    return Ok((LoadOrigin::Remote, problems));
                }
                Err(e) => warn!("Catalog fetch failed, using cached data: {}", e),
            }
        }

        Ok(match self.db.cached_catalog()? {
            Some(cached) => {
                debug!("Using catalog cached at {}", cached.fetched_at);
                (LoadOrigin::Cached, cached.problems)
            }
            None => (LoadOrigin::FallbackOnly, Vec::new()),
        })
    }

    pub fn records(&self) -> &[ProblemRecord] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&ProblemRecord> {
        self.index.get(id).map(|&i| &self.records[i])
    }

    /// Bumped on every load and update.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn rollups(&self) -> Vec<TopicRollup> {
        rollup::rollup_topics(&self.records)
    }

    pub fn analytics<Tz: TimeZone>(&self, now: DateTime<Tz>) -> Analytics {
        Analytics::compute(&self.records, now)
    }

    /// Apply a partial update to one record and persist it as an override.
    pub fn update(&mut self, id: &str, patch: &ProblemPatch, now: DateTime<Utc>) -> Result<ProblemRecord> {
        let idx = *self
            .index
            .get(id)
            .ok_or_else(|| Error::ProblemNotFound(id.to_string()))?;
        if patch.is_empty() {
            return Ok(self.records[idx].clone());
        }

        self.db.save_override(id, patch)?;

        let record = &mut self.records[idx];
        record.apply(patch);
        merge::finalize(record, now);
        let updated = record.clone();

        self.version += 1;
        debug!("Updated {} (version {})", id, self.version);
        self.notify(&StoreEvent::Updated {
            version: self.version,
            id: id.to_string(),
        });
        Ok(updated)
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&StoreEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    fn notify(&mut self, event: &StoreEvent) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(event);
        }
    }

    fn require(&self, id: &str) -> Result<&ProblemRecord> {
        self.get(id)
            .ok_or_else(|| Error::ProblemNotFound(id.to_string()))
    }

    // User actions

    pub fn set_status(&mut self, id: &str, status: Status, now: DateTime<Utc>) -> Result<ProblemRecord> {
        let current = self.require(id)?;
        let mut patch = ProblemPatch {
            status: Some(status),
            updated_at: Some(now),
            ..Default::default()
        };
        match (current.is_completed(), status == Status::Completed) {
            (false, true) => patch.completed_at = Some(Some(now)),
            (true, false) => patch.completed_at = Some(None),
            _ => {}
        }
        self.update(id, &patch, now)
    }

    pub fn cycle_status(&mut self, id: &str, now: DateTime<Utc>) -> Result<ProblemRecord> {
        let next = self.require(id)?.status.next();
        self.set_status(id, next, now)
    }

    pub fn toggle_star(&mut self, id: &str, now: DateTime<Utc>) -> Result<ProblemRecord> {
        let starred = !self.require(id)?.starred;
        let patch = ProblemPatch {
            starred: Some(starred),
            updated_at: Some(now),
            ..Default::default()
        };
        self.update(id, &patch, now)
    }

    /// Replace the tag set. Blank tags are dropped.
    pub fn set_tags<I, S>(&mut self, id: &str, tags: I, now: DateTime<Utc>) -> Result<ProblemRecord>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tags: BTreeSet<String> = tags
            .into_iter()
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        let patch = ProblemPatch {
            tags: Some(tags),
            updated_at: Some(now),
            ..Default::default()
        };
        self.update(id, &patch, now)
    }

    pub fn toggle_tag(&mut self, id: &str, tag: &str, now: DateTime<Utc>) -> Result<ProblemRecord> {
        let mut tags = self.require(id)?.tags.clone();
        let tag = tag.trim();
        if !tags.remove(tag) && !tag.is_empty() {
            tags.insert(tag.to_string());
        }
        let patch = ProblemPatch {
            tags: Some(tags),
            updated_at: Some(now),
            ..Default::default()
        };
        self.update(id, &patch, now)
    }

    /// Write any of the free-text fields in one update.
    pub fn set_text<I>(&mut self, id: &str, edits: I, now: DateTime<Utc>) -> Result<ProblemRecord>
    where
        I: IntoIterator<Item = (TextField, String)>,
    {
        let mut patch = ProblemPatch {
            updated_at: Some(now),
            ..Default::default()
        };
        for (field, value) in edits {
            patch.merge(&field.patch(value));
        }
        self.update(id, &patch, now)
    }

    pub fn add_time(&mut self, id: &str, seconds: u64, now: DateTime<Utc>) -> Result<ProblemRecord> {
        let total = self.require(id)?.time_spent.saturating_add(seconds);
        let patch = ProblemPatch {
            time_spent: Some(total),
            updated_at: Some(now),
            ..Default::default()
        };
        self.update(id, &patch, now)
    }
}
