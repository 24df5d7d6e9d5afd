use crate::error::{DripError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub type ActivityId = i64;
pub type ScheduleId = i64;
pub type CourseId = i64;
pub type GroupId = i64;

/// Activity id carried by header rows so renderers can tell them apart.
pub const HEADER_ACTIVITY_ID: ActivityId = -1;

/// Prefix of the selection keys submitted by the schedule form (`activity_<id>`).
pub const SELECTION_KEY_PREFIX: &str = "activity_";

// ---------------------------------------------------------------------------
// Activity
// ---------------------------------------------------------------------------

/// A release-able unit owned by the host system (e.g. a quiz).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub name: String,
    pub course_id: CourseId,
    pub activity_type: String,
    /// 0-based position within the course, assigned by the host.
    pub natural_order_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupId>,
}

impl Activity {
    pub fn new(
        id: ActivityId,
        name: impl Into<String>,
        course_id: CourseId,
        activity_type: impl Into<String>,
        natural_order_index: u32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            course_id,
            activity_type: activity_type.into(),
            natural_order_index,
            question_count: None,
            groups: Vec::new(),
        }
    }

    pub fn in_group(&self, group: Option<GroupId>) -> bool {
        match group {
            Some(g) => self.groups.contains(&g),
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityTypeDescriptor {
    pub name: String,
    pub count: usize,
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// Configuration driving one release plan for a course and activity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ScheduleId>,
    pub course_id: CourseId,
    pub activity_type: String,
    pub activities_per_session: u32,
    pub session_length_days: u32,
    pub schedule_start: DateTime<Utc>,
    /// Informational only; windows are never clipped to it.
    pub schedule_finish: DateTime<Utc>,
    #[serde(default)]
    pub stay_available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_filter: Option<GroupId>,
    #[serde(default)]
    pub hide_unselected: bool,
    #[serde(default)]
    pub reset_unselected: bool,
    #[serde(default)]
    pub display_disabled: bool,
}

impl Schedule {
    /// Reject parameters the window calculator cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.activity_type.trim().is_empty() {
            return Err(DripError::InvalidConfiguration(
                "activity type is required".to_string(),
            ));
        }
        if self.activities_per_session < 1 {
            return Err(DripError::InvalidConfiguration(format!(
                "activities per session must be at least 1, got {}",
                self.activities_per_session
            )));
        }
        if self.session_length_days < 1 {
            return Err(DripError::InvalidConfiguration(format!(
                "session length must be at least 1 day, got {}",
                self.session_length_days
            )));
        }
        Ok(())
    }

    pub fn require_id(&self) -> Result<ScheduleId> {
        self.id.ok_or_else(|| {
            DripError::InvalidConfiguration("schedule has not been saved yet".to_string())
        })
    }

    /// True when `other` is the same logical schedule (same id, or same
    /// course and activity type when no id is known).
    pub fn same_slot(&self, other: &Schedule) -> bool {
        match self.id {
            Some(id) => other.id == Some(id),
            None => {
                self.course_id == other.course_id && self.activity_type == other.activity_type
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ScheduleForm
// ---------------------------------------------------------------------------

/// Submitted schedule settings plus the per-activity selection map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleForm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ScheduleId>,
    pub activity_type: String,
    pub activities_per_session: u32,
    pub session_length_days: u32,
    pub schedule_start: DateTime<Utc>,
    pub schedule_finish: DateTime<Utc>,
    #[serde(default)]
    pub stay_available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_filter: Option<GroupId>,
    #[serde(default)]
    pub hide_unselected: bool,
    #[serde(default)]
    pub reset_unselected: bool,
    #[serde(default)]
    pub display_disabled: bool,
    /// `activity_<id>` → checkbox value; non-zero means selected.
    #[serde(default)]
    pub activity_group: BTreeMap<String, u8>,
}

impl ScheduleForm {
    pub fn to_schedule(&self, course_id: CourseId) -> Schedule {
        Schedule {
            id: self.id,
            course_id,
            activity_type: self.activity_type.clone(),
            activities_per_session: self.activities_per_session,
            session_length_days: self.session_length_days,
            schedule_start: self.schedule_start,
            schedule_finish: self.schedule_finish,
            stay_available: self.stay_available,
            group_filter: self.group_filter,
            hide_unselected: self.hide_unselected,
            reset_unselected: self.reset_unselected,
            display_disabled: self.display_disabled,
        }
    }

    /// Ids of the checked activities. Keys that are not `activity_<int>`
    /// are ignored.
    pub fn requested_activity_ids(&self) -> BTreeSet<ActivityId> {
        self.activity_group
            .iter()
            .filter(|(_, checked)| **checked != 0)
            .filter_map(|(key, _)| key.strip_prefix(SELECTION_KEY_PREFIX))
            .filter_map(|id| id.parse::<ActivityId>().ok())
            .collect()
    }

    pub fn select(&mut self, id: ActivityId) {
        self.activity_group
            .insert(format!("{SELECTION_KEY_PREFIX}{id}"), 1);
    }
}

// ---------------------------------------------------------------------------
// Comparator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparator {
    #[serde(rename = ">=")]
    From,
    #[serde(rename = "<")]
    Until,
}

impl Comparator {
    pub fn as_str(self) -> &'static str {
        match self {
            Comparator::From => ">=",
            Comparator::Until => "<",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
