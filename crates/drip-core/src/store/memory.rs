use super::{ActivityRepository, RuleField, RuleWrite, ScheduleStore, SelectionStore};
use crate::error::{DripError, Result};
use crate::types::{
    Activity, ActivityId, ActivityTypeDescriptor, CourseId, GroupId, Schedule, ScheduleId,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

/// Every collaborator in one process-local value. Used by tests and by
/// embedders that keep their own persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    activities: Mutex<Vec<Activity>>,
    rules: Mutex<BTreeMap<ActivityId, String>>,
    schedules: Mutex<BTreeMap<ScheduleId, Schedule>>,
    selections: Mutex<BTreeMap<ScheduleId, BTreeSet<ActivityId>>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_activities(activities: impl IntoIterator<Item = Activity>) -> Self {
        let store = Self::new();
        for a in activities {
            store.add_activity(a);
        }
        store
    }

    /// Add or replace an activity by id.
    pub fn add_activity(&self, activity: Activity) {
        let mut activities = lock(&self.activities);
        activities.retain(|a| a.id != activity.id);
        activities.push(activity);
    }

    fn has_activity(&self, id: ActivityId) -> bool {
        lock(&self.activities).iter().any(|a| a.id == id)
    }
}

impl ActivityRepository for MemoryStore {
    fn list_activities(
        &self,
        course_id: CourseId,
        activity_type: &str,
        group: Option<GroupId>,
    ) -> Result<Vec<Activity>> {
        let mut found: Vec<Activity> = lock(&self.activities)
            .iter()
            .filter(|a| a.course_id == course_id && a.activity_type == activity_type)
            .filter(|a| a.in_group(group))
            .cloned()
            .collect();
        found.sort_by_key(|a| (a.natural_order_index, a.id));
        Ok(found)
    }

    fn list_activity_types(
        &self,
        course_id: CourseId,
    ) -> Result<BTreeMap<String, ActivityTypeDescriptor>> {
        let mut types: BTreeMap<String, ActivityTypeDescriptor> = BTreeMap::new();
        for a in lock(&self.activities).iter().filter(|a| a.course_id == course_id) {
            types
                .entry(a.activity_type.clone())
                .or_insert_with(|| ActivityTypeDescriptor {
                    name: a.activity_type.clone(),
                    count: 0,
                })
                .count += 1;
        }
        Ok(types)
    }
}

impl RuleField for MemoryStore {
    fn read(&self, activity_id: ActivityId) -> Result<Option<String>> {
        if !self.has_activity(activity_id) {
            return Err(DripError::ActivityNotFound(activity_id));
        }
        Ok(lock(&self.rules).get(&activity_id).cloned())
    }

    fn write(&self, activity_id: ActivityId, rule: Option<&str>) -> Result<()> {
        self.write_batch(&[RuleWrite {
            activity_id,
            rule: rule.map(str::to_string),
        }])
    }

    fn write_batch(&self, writes: &[RuleWrite]) -> Result<()> {
        if let Some(missing) = writes.iter().find(|w| !self.has_activity(w.activity_id)) {
            return Err(DripError::ActivityNotFound(missing.activity_id));
        }
        let mut rules = lock(&self.rules);
        for w in writes {
            match w.rule.as_deref() {
                Some(r) if !r.is_empty() => {
                    rules.insert(w.activity_id, r.to_string());
                }
                _ => {
                    rules.remove(&w.activity_id);
                }
            }
        }
        Ok(())
    }
}

impl ScheduleStore for MemoryStore {
    fn upsert(&self, schedule: &Schedule) -> Result<Schedule> {
        let mut schedules = lock(&self.schedules);
        let existing = schedules
            .values()
            .find(|s| schedule.same_slot(s))
            .and_then(|s| s.id);
        let id = match (schedule.id, existing) {
            (_, Some(id)) => id,
            (Some(id), None) => return Err(DripError::ScheduleNotFound(id)),
            (None, None) => schedules.keys().next_back().copied().unwrap_or(0) + 1,
        };
        let mut stored = schedule.clone();
        stored.id = Some(id);
        schedules.insert(id, stored.clone());
        Ok(stored)
    }

    fn get(&self, id: ScheduleId) -> Result<Schedule> {
        lock(&self.schedules)
            .get(&id)
            .cloned()
            .ok_or(DripError::ScheduleNotFound(id))
    }
}

impl SelectionStore for MemoryStore {
    fn get_selections(&self, schedule_id: ScheduleId) -> Result<BTreeSet<ActivityId>> {
        Ok(lock(&self.selections)
            .get(&schedule_id)
            .cloned()
            .unwrap_or_default())
    }

    fn insert_selection(&self, schedule_id: ScheduleId, activity_id: ActivityId) -> Result<bool> {
        Ok(lock(&self.selections)
            .entry(schedule_id)
            .or_default()
            .insert(activity_id))
    }

    fn remove_selection(&self, schedule_id: ScheduleId, activity_id: ActivityId) -> Result<bool> {
        Ok(lock(&self.selections)
            .get_mut(&schedule_id)
            .is_some_and(|set| set.remove(&activity_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn schedule(course_id: CourseId, activity_type: &str) -> Schedule {
        Schedule {
            id: None,
            course_id,
            activity_type: activity_type.to_string(),
            activities_per_session: 1,
            session_length_days: 1,
            schedule_start: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            schedule_finish: Utc.with_ymd_and_hms(2023, 2, 1, 0, 0, 0).unwrap(),
            stay_available: false,
            group_filter: None,
            hide_unselected: false,
            reset_unselected: false,
            display_disabled: false,
        }
    }

    #[test]
    fn activities_come_back_in_natural_order() {
        let store = MemoryStore::with_activities([
            Activity::new(30, "Quiz 3", 1, "quiz", 2),
            Activity::new(10, "Quiz 1", 1, "quiz", 0),
            Activity::new(20, "Quiz 2", 1, "quiz", 1),
            Activity::new(40, "Forum", 1, "forum", 3),
            Activity::new(50, "Other course", 2, "quiz", 0),
        ]);
        let ids: Vec<_> = store
            .list_activities(1, "quiz", None)
            .unwrap()
            .iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec![10, 20, 30]);
    }

    #[test]
    fn activity_types_are_counted_per_course() {
        let store = MemoryStore::with_activities([
            Activity::new(1, "Quiz 1", 1, "quiz", 0),
            Activity::new(2, "Quiz 2", 1, "quiz", 1),
            Activity::new(3, "Forum", 1, "forum", 2),
            Activity::new(4, "Elsewhere", 2, "page", 0),
        ]);
        let types = store.list_activity_types(1).unwrap();
        assert_eq!(types.len(), 2);
        assert_eq!(types["quiz"].count, 2);
        assert!(!types.contains_key("page"));
    }

    #[test]
    fn upsert_assigns_id_then_replaces_by_slot() {
        let store = MemoryStore::new();
        let first = store.upsert(&schedule(1, "quiz")).unwrap();
        assert_eq!(first.id, Some(1));

        let mut changed = schedule(1, "quiz");
        changed.session_length_days = 7;
        let second = store.upsert(&changed).unwrap();
        assert_eq!(second.id, Some(1));
        assert_eq!(store.get(1).unwrap().session_length_days, 7);

        let other = store.upsert(&schedule(1, "assign")).unwrap();
        assert_eq!(other.id, Some(2));
    }

    #[test]
    fn upsert_with_unknown_id_is_not_found() {
        let store = MemoryStore::new();
        let mut s = schedule(1, "quiz");
        s.id = Some(99);
        assert!(matches!(
            store.upsert(&s),
            Err(DripError::ScheduleNotFound(99))
        ));
        assert!(matches!(store.get(5), Err(DripError::ScheduleNotFound(5))));
    }

    #[test]
    fn rule_batch_is_rejected_whole_on_unknown_activity() {
        let store = MemoryStore::with_activities([Activity::new(1, "Quiz 1", 1, "quiz", 0)]);
        let writes = [
            RuleWrite {
                activity_id: 1,
                rule: Some("{}".to_string()),
            },
            RuleWrite {
                activity_id: 2,
                rule: None,
            },
        ];
        assert!(matches!(
            store.write_batch(&writes),
            Err(DripError::ActivityNotFound(2))
        ));
        assert_eq!(store.read(1).unwrap(), None);
    }

    #[test]
    fn selections_are_a_set() {
        let store = MemoryStore::new();
        assert!(store.insert_selection(1, 5).unwrap());
        assert!(!store.insert_selection(1, 5).unwrap());
        assert_eq!(store.get_selections(1).unwrap().len(), 1);
        assert!(store.remove_selection(1, 5).unwrap());
        assert!(!store.remove_selection(1, 5).unwrap());
    }
}
