//! Row sequence for rendering a schedule.
//!
//! Activities are listed in natural order. A header row opens every session:
//! walking the activities, a header is emitted whenever the session index
//! differs from the previous activity's (and before the first activity).

use crate::calendar::Calendar;
use crate::error::Result;
use crate::rule::{self, RuleSummary};
use crate::store::{ActivityRepository, RuleField, SelectionStore};
use crate::types::{Activity, ActivityId, Schedule, HEADER_ACTIVITY_ID};
use crate::window::{window_for, SessionWindow};
use serde::{Serialize, Serializer};

pub const HEADER_NAME: &str = "Session";

// ---------------------------------------------------------------------------
// Row
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderRow {
    pub name: String,
    /// Always `HEADER_ACTIVITY_ID`.
    pub activity_id: ActivityId,
    pub window: SessionWindow,
}

impl HeaderRow {
    pub fn new(window: SessionWindow) -> Self {
        Self {
            name: HEADER_NAME.to_string(),
            activity_id: HEADER_ACTIVITY_ID,
            window,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityRow {
    pub activity: Activity,
    #[serde(serialize_with = "checked_marker")]
    pub selected: bool,
    pub window: SessionWindow,
    pub question_count: u32,
    /// The activity's existing rule, summarized.
    pub current: RuleSummary,
}

impl ActivityRow {
    /// `"checked"` when selected, `""` otherwise.
    pub fn checked(&self) -> &'static str {
        if self.selected {
            "checked"
        } else {
            ""
        }
    }
}

fn checked_marker<S: Serializer>(selected: &bool, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(if *selected { "checked" } else { "" })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Row {
    Header(HeaderRow),
    Activity(ActivityRow),
}

impl Row {
    pub fn is_header(&self) -> bool {
        matches!(self, Row::Header(_))
    }

    pub fn activity_id(&self) -> ActivityId {
        match self {
            Row::Header(h) => h.activity_id,
            Row::Activity(a) => a.activity.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Row::Header(h) => &h.name,
            Row::Activity(a) => &a.activity.name,
        }
    }

    pub fn window(&self) -> &SessionWindow {
        match self {
            Row::Header(h) => &h.window,
            Row::Activity(a) => &a.window,
        }
    }
}

// ---------------------------------------------------------------------------
// Header transition
// ---------------------------------------------------------------------------

/// Header to emit before an activity in `window`, given the previous
/// activity's session index.
pub fn header_transition(previous: Option<u32>, window: &SessionWindow) -> Option<HeaderRow> {
    (previous != Some(window.session_index)).then(|| HeaderRow::new(*window))
}

/// Fold activity rows into the rendered sequence, inserting headers.
pub fn interleave_headers(rows: impl IntoIterator<Item = ActivityRow>) -> Vec<Row> {
    let (out, _) = rows
        .into_iter()
        .fold((Vec::new(), None), |(mut out, previous), row| {
            let index = row.window.session_index;
            if let Some(header) = header_transition(previous, &row.window) {
                out.push(Row::Header(header));
            }
            out.push(Row::Activity(row));
            (out, Some(index))
        });
    out
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Rows for `schedule`: every candidate activity with its computed window,
/// selection state and current rule, headers interleaved.
pub fn build_rows<A, S, R>(
    schedule: &Schedule,
    activities: &A,
    selections: &S,
    rules: &R,
    calendar: &Calendar,
) -> Result<Vec<Row>>
where
    A: ActivityRepository + ?Sized,
    S: SelectionStore + ?Sized,
    R: RuleField + ?Sized,
{
    schedule.validate()?;
    let schedule_id = schedule.require_id()?;
    let candidates = activities.list_activities(
        schedule.course_id,
        &schedule.activity_type,
        schedule.group_filter,
    )?;
    let selected = selections.get_selections(schedule_id)?;

    let mut data = Vec::with_capacity(candidates.len());
    for (ordinal, activity) in (0u32..).zip(candidates) {
        let window = window_for(schedule, ordinal, calendar)?;
        let current = rule::decode(rules.read(activity.id)?.as_deref(), calendar);
        data.push(ActivityRow {
            selected: selected.contains(&activity.id),
            question_count: activity.question_count.unwrap_or(0),
            window,
            current,
            activity,
        });
    }

    let rows = interleave_headers(data);
    tracing::debug!(schedule_id, rows = rows.len(), "rows built");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn jan(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, day, 0, 0, 0).unwrap()
    }

    fn schedule(per_session: u32, length: u32) -> Schedule {
        Schedule {
            id: Some(1),
            course_id: 1,
            activity_type: "quiz".to_string(),
            activities_per_session: per_session,
            session_length_days: length,
            schedule_start: jan(1),
            schedule_finish: Utc.with_ymd_and_hms(2023, 2, 1, 0, 0, 0).unwrap(),
            stay_available: false,
            group_filter: None,
            hide_unselected: false,
            reset_unselected: false,
            display_disabled: false,
        }
    }

    fn quizzes(n: u32) -> MemoryStore {
        MemoryStore::with_activities(
            (0..n).map(|i| Activity::new(i64::from(i) + 100, format!("Quiz {}", i + 1), 1, "quiz", i)),
        )
    }

    fn window(index: u32, start: DateTime<Utc>, length: i64) -> SessionWindow {
        SessionWindow {
            session_index: index,
            start,
            end: start + Duration::days(length - 1),
        }
    }

    #[test]
    fn one_per_day_interleaves_a_header_per_activity() {
        let store = quizzes(3);
        store.insert_selection(1, 100).unwrap();
        let rows = build_rows(&schedule(1, 1), &store, &store, &store, &Calendar::default()).unwrap();

        assert_eq!(rows.len(), 6);
        for (i, day) in [1u32, 2, 3].into_iter().enumerate() {
            let header = &rows[i * 2];
            let data = &rows[i * 2 + 1];
            assert!(header.is_header());
            assert_eq!(header.name(), "Session");
            assert_eq!(header.activity_id(), HEADER_ACTIVITY_ID);
            assert_eq!(header.window().start, jan(day));
            assert_eq!(data.window().start, jan(day));
            assert_eq!(data.window().end, jan(day));
            assert_eq!(header.window(), data.window());
        }

        let Row::Activity(first) = &rows[1] else {
            panic!("expected activity row");
        };
        assert_eq!(first.activity.name, "Quiz 1");
        assert_eq!(first.checked(), "checked");
        assert_eq!(first.question_count, 0);
        let Row::Activity(second) = &rows[3] else {
            panic!("expected activity row");
        };
        assert_eq!(second.checked(), "");
    }

    #[test]
    fn sessions_group_activities_under_one_header() {
        let store = quizzes(5);
        let rows = build_rows(&schedule(2, 7), &store, &store, &store, &Calendar::default()).unwrap();
        let headers: Vec<_> = rows.iter().filter(|r| r.is_header()).collect();
        assert_eq!(headers.len(), 3);
        let kinds: Vec<bool> = rows.iter().map(Row::is_header).collect();
        assert_eq!(
            kinds,
            vec![true, false, false, true, false, false, true, false]
        );
        assert_eq!(rows[3].window().start, jan(8));
        assert_eq!(rows[4].window(), rows[3].window());
    }

    #[test]
    fn empty_course_has_no_rows() {
        let store = MemoryStore::new();
        let rows = build_rows(&schedule(1, 1), &store, &store, &store, &Calendar::default()).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn group_filter_limits_candidates() {
        let store = quizzes(3);
        let mut grouped = Activity::new(200, "Group quiz", 1, "quiz", 5);
        grouped.groups.push(4);
        store.add_activity(grouped);
        let mut s = schedule(1, 1);
        s.group_filter = Some(4);
        let rows = build_rows(&s, &store, &store, &store, &Calendar::default()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].activity_id(), 200);
        assert_eq!(rows[1].window().start, jan(1));
    }

    #[test]
    fn current_rule_is_summarized_and_garbage_tolerated() {
        let store = quizzes(2);
        store
            .write(100, Some(r#"{"op":"&","c":[{"type":"date","d":">=","t":1609459200}]}"#))
            .unwrap();
        store.write(101, Some("XXX")).unwrap();
        let cal = Calendar::from_name("GMT").unwrap();
        let rows = build_rows(&schedule(1, 1), &store, &store, &store, &cal).unwrap();
        let Row::Activity(a) = &rows[1] else {
            panic!("expected activity row");
        };
        assert_eq!(a.current.from.as_deref(), Some("Fri 1 Jan 2021 00:00"));
        let Row::Activity(b) = &rows[3] else {
            panic!("expected activity row");
        };
        assert!(b.current.is_empty());
    }

    #[test]
    fn question_count_is_copied() {
        let store = quizzes(1);
        let mut q = Activity::new(100, "Quiz 1", 1, "quiz", 0);
        q.question_count = Some(12);
        store.add_activity(q);
        let rows = build_rows(&schedule(1, 1), &store, &store, &store, &Calendar::default()).unwrap();
        let Row::Activity(a) = &rows[1] else {
            panic!("expected activity row");
        };
        assert_eq!(a.question_count, 12);
    }

    #[test]
    fn unsaved_schedule_is_rejected() {
        let store = quizzes(1);
        let mut s = schedule(1, 1);
        s.id = None;
        assert!(build_rows(&s, &store, &store, &store, &Calendar::default()).is_err());
    }

    #[test]
    fn transition_fires_only_on_change() {
        let w0 = window(0, jan(1), 1);
        let w1 = window(1, jan(2), 1);
        assert!(header_transition(None, &w0).is_some());
        assert!(header_transition(Some(0), &w0).is_none());
        let header = header_transition(Some(0), &w1).unwrap();
        assert_eq!(header.window, w1);
        assert_eq!(header.activity_id, -1);
    }

    #[test]
    fn rows_serialize_with_checked_marker() {
        let row = Row::Activity(ActivityRow {
            activity: Activity::new(5, "Quiz 1", 1, "quiz", 0),
            selected: true,
            window: window(0, jan(1), 1),
            question_count: 0,
            current: RuleSummary::default(),
        });
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["kind"], "activity");
        assert_eq!(value["selected"], "checked");
        assert_eq!(value["current"], serde_json::json!({}));
    }
}
