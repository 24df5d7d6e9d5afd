use crate::error::Result;
use crate::rows::ActivityRow;
use crate::store::{RuleField, RuleWrite};
use crate::types::Schedule;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnselectedOutcome {
    /// The activity's rule was cleared.
    Reset,
    /// The activity's rule was left as it was.
    Left,
}

/// Rule write that the schedule's policy calls for on an unselected
/// activity, if any.
/// `hide_unselected` and `display_disabled` do not change this.
pub fn unselected_write(row: &ActivityRow, schedule: &Schedule) -> Option<RuleWrite> {
    schedule.reset_unselected.then(|| RuleWrite {
        activity_id: row.activity.id,
        rule: None,
    })
}

/// Apply the unselected-activity policy to one row.
pub fn process_unselected<R: RuleField + ?Sized>(
    row: &ActivityRow,
    schedule: &Schedule,
    rules: &R,
) -> Result<UnselectedOutcome> {
    match unselected_write(row, schedule) {
        Some(w) => {
            rules.write(w.activity_id, w.rule.as_deref())?;
            tracing::debug!(activity_id = w.activity_id, "unselected activity reset");
            Ok(UnselectedOutcome::Reset)
        }
        None => Ok(UnselectedOutcome::Left),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::Calendar;
    use crate::rows::{build_rows, Row};
    use crate::store::{MemoryStore, RuleField};
    use crate::types::Activity;
    use chrono::{TimeZone, Utc};

    fn setup(reset: bool) -> (MemoryStore, Schedule, ActivityRow) {
        let store = MemoryStore::with_activities([
            Activity::new(1, "Quiz 1", 1, "quiz", 0),
            Activity::new(2, "Quiz 2", 1, "quiz", 1),
        ]);
        let schedule = Schedule {
            id: Some(1),
            course_id: 1,
            activity_type: "quiz".to_string(),
            activities_per_session: 1,
            session_length_days: 1,
            schedule_start: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            schedule_finish: Utc.with_ymd_and_hms(2023, 2, 1, 0, 0, 0).unwrap(),
            stay_available: false,
            group_filter: None,
            hide_unselected: true,
            reset_unselected: reset,
            display_disabled: true,
        };
        store.write(1, Some("XXX")).unwrap();
        let rows = build_rows(&schedule, &store, &store, &store, &Calendar::default()).unwrap();
        let Some(Row::Activity(row)) = rows.into_iter().nth(1) else {
            panic!("expected activity row");
        };
        (store, schedule, row)
    }

    #[test]
    fn reset_clears_existing_rule() {
        let (store, schedule, row) = setup(true);
        assert_eq!(store.read(1).unwrap().as_deref(), Some("XXX"));
        let outcome = process_unselected(&row, &schedule, &store).unwrap();
        assert_eq!(outcome, UnselectedOutcome::Reset);
        assert_eq!(store.read(1).unwrap(), None);
    }

    #[test]
    fn without_reset_rule_is_left_alone() {
        let (store, schedule, row) = setup(false);
        let outcome = process_unselected(&row, &schedule, &store).unwrap();
        assert_eq!(outcome, UnselectedOutcome::Left);
        assert_eq!(store.read(1).unwrap().as_deref(), Some("XXX"));
    }

    #[test]
    fn presentation_flags_do_not_trigger_writes() {
        let (_store, mut schedule, row) = setup(false);
        schedule.hide_unselected = true;
        schedule.display_disabled = true;
        assert!(unselected_write(&row, &schedule).is_none());
    }
}
