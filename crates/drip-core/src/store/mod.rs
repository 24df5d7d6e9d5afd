//! Collaborator boundaries of the engine.
//!
//! The engine owns no state between calls. Activities, their availability
//! rule field, schedules and selection records all live behind these traits
//! and are re-read on every operation.

pub mod catalog;
pub mod db;
pub mod memory;

pub use catalog::ActivityCatalog;
pub use db::DripDb;
pub use memory::MemoryStore;

use crate::error::Result;
use crate::types::{
    Activity, ActivityId, ActivityTypeDescriptor, CourseId, GroupId, Schedule, ScheduleId,
};
use std::collections::{BTreeMap, BTreeSet};

/// Lists the host's activities.
pub trait ActivityRepository {
    /// Activities of `activity_type` in `course_id`, ordered by natural order index.
    fn list_activities(
        &self,
        course_id: CourseId,
        activity_type: &str,
        group: Option<GroupId>,
    ) -> Result<Vec<Activity>>;

    fn list_activity_types(
        &self,
        course_id: CourseId,
    ) -> Result<BTreeMap<String, ActivityTypeDescriptor>>;
}

/// Membership of activities in a schedule. Inserts are keyed, so inserting
/// an existing pair is a no-op.
pub trait SelectionStore {
    fn get_selections(&self, schedule_id: ScheduleId) -> Result<BTreeSet<ActivityId>>;

    /// Returns `true` when the pair was not present before.
    fn insert_selection(&self, schedule_id: ScheduleId, activity_id: ActivityId) -> Result<bool>;

    /// Returns `true` when a pair was removed.
    fn remove_selection(&self, schedule_id: ScheduleId, activity_id: ActivityId) -> Result<bool>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleWrite {
    pub activity_id: ActivityId,
    /// `None` clears the rule.
    pub rule: Option<String>,
}

/// The host's opaque per-activity availability rule.
pub trait RuleField {
    fn read(&self, activity_id: ActivityId) -> Result<Option<String>>;

    fn write(&self, activity_id: ActivityId, rule: Option<&str>) -> Result<()>;

    /// Apply several writes. Stores with transactions override this to make
    /// the batch all-or-nothing.
    fn write_batch(&self, writes: &[RuleWrite]) -> Result<()> {
        for w in writes {
            self.write(w.activity_id, w.rule.as_deref())?;
        }
        Ok(())
    }
}

pub trait ScheduleStore {
    /// Insert or replace. Matches by id when set, otherwise by course and
    /// activity type; assigns an id on first insert.
    fn upsert(&self, schedule: &Schedule) -> Result<Schedule>;

    fn get(&self, id: ScheduleId) -> Result<Schedule>;
}
