//! Top-level schedule operations.
//!
//! `DripRelease` binds the collaborators and a calendar together. It holds no
//! state of its own; every call re-reads what it needs from the stores.

use crate::calendar::Calendar;
use crate::error::Result;
use crate::rows::{self, Row};
use crate::rule;
use crate::selection;
use crate::store::{ActivityRepository, RuleField, RuleWrite, ScheduleStore, SelectionStore};
use crate::types::{
    ActivityId, ActivityTypeDescriptor, CourseId, Schedule, ScheduleForm, ScheduleId,
};
use crate::unselected::unselected_write;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

// ---------------------------------------------------------------------------
// ApplyReport
// ---------------------------------------------------------------------------

/// What `apply_rows` did to each activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    /// Selected activities that received a window rule.
    pub applied: Vec<ActivityId>,
    /// Unselected activities whose rule was cleared.
    pub reset: Vec<ActivityId>,
    /// Unselected activities left untouched.
    pub left: Vec<ActivityId>,
    /// Unselected activities the host should hide (`hide_unselected`).
    pub hidden: Vec<ActivityId>,
}

// ---------------------------------------------------------------------------
// DripRelease
// ---------------------------------------------------------------------------

pub struct DripRelease<'a> {
    activities: &'a dyn ActivityRepository,
    schedules: &'a dyn ScheduleStore,
    selections: &'a dyn SelectionStore,
    rules: &'a dyn RuleField,
    calendar: Calendar,
}

impl std::fmt::Debug for DripRelease<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DripRelease")
            .field("calendar", &self.calendar)
            .finish_non_exhaustive()
    }
}

impl<'a> DripRelease<'a> {
    pub fn new(
        activities: &'a dyn ActivityRepository,
        schedules: &'a dyn ScheduleStore,
        selections: &'a dyn SelectionStore,
        rules: &'a dyn RuleField,
        calendar: Calendar,
    ) -> Self {
        Self {
            activities,
            schedules,
            selections,
            rules,
            calendar,
        }
    }

    /// Use one value for every collaborator.
    pub fn from_store<T>(store: &'a T, calendar: Calendar) -> Self
    where
        T: ActivityRepository + ScheduleStore + SelectionStore + RuleField,
    {
        Self::new(store, store, store, store, calendar)
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    // -----------------------------------------------------------------------
    // Schedule updates
    // -----------------------------------------------------------------------

    /// Save the schedule described by `form` and add its checked activities
    /// to the selection set. Nothing is written if the form is invalid.
    pub fn update(
        &self,
        form: &ScheduleForm,
        course_id: CourseId,
    ) -> Result<(BTreeSet<ActivityId>, Schedule)> {
        let schedule = form.to_schedule(course_id);
        schedule.validate()?;

        let saved = self.schedules.upsert(&schedule)?;
        let schedule_id = saved.require_id()?;
        let requested = form.requested_activity_ids();
        let selections = selection::reconcile(self.selections, schedule_id, &requested)?;
        tracing::info!(
            schedule_id,
            course_id,
            selected = selections.len(),
            "schedule updated"
        );
        Ok((selections, saved))
    }

    pub fn schedule(&self, id: ScheduleId) -> Result<Schedule> {
        self.schedules.get(id)
    }

    pub fn selections(&self, schedule_id: ScheduleId) -> Result<BTreeSet<ActivityId>> {
        self.selections.get_selections(schedule_id)
    }

    pub fn remove_selection(&self, schedule_id: ScheduleId, activity_id: ActivityId) -> Result<bool> {
        selection::remove_selection(self.selections, schedule_id, activity_id)
    }

    pub fn activity_types(
        &self,
        course_id: CourseId,
    ) -> Result<BTreeMap<String, ActivityTypeDescriptor>> {
        self.activities.list_activity_types(course_id)
    }

    // -----------------------------------------------------------------------
    // Rows
    // -----------------------------------------------------------------------

    pub fn build_rows(&self, schedule: &Schedule) -> Result<Vec<Row>> {
        rows::build_rows(
            schedule,
            self.activities,
            self.selections,
            self.rules,
            &self.calendar,
        )
    }

    // -----------------------------------------------------------------------
    // Applying
    // -----------------------------------------------------------------------

    /// Build the schedule's rows and write every activity's rule.
    pub fn apply_schedule(&self, schedule: &Schedule) -> Result<ApplyReport> {
        let rows = self.build_rows(schedule)?;
        self.apply_rows(&rows, schedule)
    }

    /// Write rules for `rows`: selected activities get their window rule,
    /// unselected ones follow the schedule's reset policy. All writes go to
    /// the rule field as one batch, and the rules are a pure function of
    /// the rows, so re-running after a failure converges.
    pub fn apply_rows(&self, rows: &[Row], schedule: &Schedule) -> Result<ApplyReport> {
        schedule.validate()?;

        let mut report = ApplyReport::default();
        let mut writes = Vec::new();
        for row in rows {
            let Row::Activity(row) = row else {
                continue;
            };
            let id = row.activity.id;
            if row.selected {
                writes.push(RuleWrite {
                    activity_id: id,
                    rule: Some(rule::encode_for(schedule, &row.window, &self.calendar)?),
                });
                report.applied.push(id);
                continue;
            }
            match unselected_write(row, schedule) {
                Some(w) => {
                    writes.push(w);
                    report.reset.push(id);
                }
                None => report.left.push(id),
            }
            if schedule.hide_unselected {
                report.hidden.push(id);
            }
        }

        if !writes.is_empty() {
            self.rules.write_batch(&writes)?;
        }
        tracing::info!(
            schedule_id = ?schedule.id,
            applied = report.applied.len(),
            reset = report.reset.len(),
            left = report.left.len(),
            "schedule applied"
        );
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
