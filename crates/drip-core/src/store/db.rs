//! Persistent schedules and selection records using redb.
//!
//! # Table design
//!
//! `SCHEDULES` maps the schedule id to its JSON encoding.
//!
//! `SELECTIONS` uses a 16-byte composite key and no payload:
//! ```text
//! [ schedule_id: i64 big-endian (8 bytes) | activity_id: i64 big-endian (8 bytes) ]
//! ```
//!
//! The key itself is the record, so a (schedule, activity) pair can exist at
//! most once and inserting it again is a no-op. All selections of a schedule
//! share the 8-byte prefix and come back from a single range scan.

use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition};

use super::{ScheduleStore, SelectionStore};
use crate::error::{DripError, Result};
use crate::types::{ActivityId, Schedule, ScheduleId};
use std::collections::BTreeSet;

// ---------------------------------------------------------------------------
// Table definitions
// ---------------------------------------------------------------------------

const SCHEDULES: TableDefinition<i64, &[u8]> = TableDefinition::new("schedules");

const SELECTIONS: TableDefinition<&[u8], u8> = TableDefinition::new("selections");

const PRESENT: u8 = 1;

// ---------------------------------------------------------------------------
// Key helpers
// ---------------------------------------------------------------------------

fn selection_key(schedule_id: ScheduleId, activity_id: ActivityId) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&schedule_id.to_be_bytes());
    key[8..].copy_from_slice(&activity_id.to_be_bytes());
    key
}

/// Inclusive key range covering every selection of `schedule_id`.
fn selection_bounds(schedule_id: ScheduleId) -> ([u8; 16], [u8; 16]) {
    let mut lower = [0u8; 16];
    lower[..8].copy_from_slice(&schedule_id.to_be_bytes());
    let mut upper = lower;
    upper[8..].fill(0xff);
    (lower, upper)
}

fn activity_from_key(key: &[u8]) -> Option<ActivityId> {
    let bytes: [u8; 8] = key.get(8..16)?.try_into().ok()?;
    Some(ActivityId::from_be_bytes(bytes))
}

fn db_err(e: impl std::fmt::Display) -> DripError {
    DripError::Store(e.to_string())
}

// ---------------------------------------------------------------------------
// DripDb
// ---------------------------------------------------------------------------

/// Persistent store for `Schedule` records and their selections.
pub struct DripDb {
    db: Database,
}

impl std::fmt::Debug for DripDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DripDb").finish_non_exhaustive()
    }
}

impl DripDb {
    /// Open or create the redb database at `path`, creating both tables.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path).map_err(db_err)?;
        let wt = db.begin_write().map_err(db_err)?;
        wt.open_table(SCHEDULES).map_err(db_err)?;
        wt.open_table(SELECTIONS).map_err(db_err)?;
        wt.commit().map_err(db_err)?;
        Ok(Self { db })
    }

    /// All schedules, ordered by id.
    pub fn list_schedules(&self) -> Result<Vec<Schedule>> {
        let rt = self.db.begin_read().map_err(db_err)?;
        let table = rt.open_table(SCHEDULES).map_err(db_err)?;
        let mut result = Vec::new();
        for entry in table.iter().map_err(db_err)? {
            let (_, v) = entry.map_err(db_err)?;
            result.push(serde_json::from_slice(v.value())?);
        }
        Ok(result)
    }
}

impl ScheduleStore for DripDb {
    /// Slot lookup, id assignment and the write share one write transaction,
    /// so concurrent upserts of the same slot cannot create two records.
    fn upsert(&self, schedule: &Schedule) -> Result<Schedule> {
        let wt = self.db.begin_write().map_err(db_err)?;
        let stored = {
            let mut table = wt.open_table(SCHEDULES).map_err(db_err)?;
            let mut existing = None;
            let mut max_id: ScheduleId = 0;
            for entry in table.iter().map_err(db_err)? {
                let (k, v) = entry.map_err(db_err)?;
                max_id = max_id.max(k.value());
                let candidate: Schedule = serde_json::from_slice(v.value())?;
                if schedule.same_slot(&candidate) {
                    existing = Some(k.value());
                }
            }
            let id = match (schedule.id, existing) {
                (_, Some(id)) => id,
                (Some(id), None) => return Err(DripError::ScheduleNotFound(id)),
                (None, None) => max_id + 1,
            };
            let mut stored = schedule.clone();
            stored.id = Some(id);
            let value = serde_json::to_vec(&stored)?;
            table.insert(id, value.as_slice()).map_err(db_err)?;
            stored
        };
        wt.commit().map_err(db_err)?;
        tracing::debug!(schedule_id = ?stored.id, "schedule saved");
        Ok(stored)
    }

    fn get(&self, id: ScheduleId) -> Result<Schedule> {
        let rt = self.db.begin_read().map_err(db_err)?;
        let table = rt.open_table(SCHEDULES).map_err(db_err)?;
        let value = table
            .get(id)
            .map_err(db_err)?
            .ok_or(DripError::ScheduleNotFound(id))?;
        Ok(serde_json::from_slice(value.value())?)
    }
}

impl SelectionStore for DripDb {
    fn get_selections(&self, schedule_id: ScheduleId) -> Result<BTreeSet<ActivityId>> {
        let (lower, upper) = selection_bounds(schedule_id);
        let rt = self.db.begin_read().map_err(db_err)?;
        let table = rt.open_table(SELECTIONS).map_err(db_err)?;
        let mut result = BTreeSet::new();
        for entry in table
            .range(lower.as_slice()..=upper.as_slice())
            .map_err(db_err)?
        {
            let (k, _) = entry.map_err(db_err)?;
            if let Some(id) = activity_from_key(k.value()) {
                result.insert(id);
            }
        }
        Ok(result)
    }

    fn insert_selection(&self, schedule_id: ScheduleId, activity_id: ActivityId) -> Result<bool> {
        let key = selection_key(schedule_id, activity_id);
        let wt = self.db.begin_write().map_err(db_err)?;
        let inserted = {
            let mut table = wt.open_table(SELECTIONS).map_err(db_err)?;
            let previous = table.insert(key.as_slice(), PRESENT).map_err(db_err)?;
            previous.is_none()
        };
        wt.commit().map_err(db_err)?;
        Ok(inserted)
    }

    fn remove_selection(&self, schedule_id: ScheduleId, activity_id: ActivityId) -> Result<bool> {
        let key = selection_key(schedule_id, activity_id);
        let wt = self.db.begin_write().map_err(db_err)?;
        let removed = {
            let mut table = wt.open_table(SELECTIONS).map_err(db_err)?;
            let previous = table.remove(key.as_slice()).map_err(db_err)?;
            previous.is_some()
        };
        wt.commit().map_err(db_err)?;
        Ok(removed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
