//! Availability rule codec.
//!
//! Rules are stored by the host as a JSON conjunction of conditions:
//!
//! ```text
//! {"op":"&","c":[{"type":"date","d":">=","t":1672531200},
//!                {"type":"date","d":"<","t":1672617600}],"showc":[true,true]}
//! ```
//!
//! Only `date` conditions are understood. Other condition kinds are skipped
//! when reading so rules written by newer hosts still summarize.

use crate::calendar::Calendar;
use crate::error::{DripError, Result};
use crate::types::{Comparator, Schedule};
use crate::window::SessionWindow;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

const CONJUNCTION: &str = "&";

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Date {
        comparator: Comparator,
        at: DateTime<Utc>,
    },
}

/// Conjunction of date bounds, plus whether the host should still list the
/// activity (greyed out) while the rule keeps it closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityRule {
    pub conditions: Vec<Condition>,
    pub shown: bool,
}

/// Human-readable bounds of a rule. Both keys are absent for an empty rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

impl RuleSummary {
    pub fn is_empty(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

// ---------------------------------------------------------------------------
// Wire shape
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RawCondition {
    Date { d: Comparator, t: i64 },
}

#[derive(Debug, Deserialize)]
struct RawRuleIn {
    #[serde(default)]
    op: Option<String>,
    c: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct RawRuleOut<'a> {
    op: &'a str,
    c: Vec<RawCondition>,
    showc: Vec<bool>,
}

// ---------------------------------------------------------------------------
// AvailabilityRule
// ---------------------------------------------------------------------------

impl AvailabilityRule {
    /// Rule opening at `window.start` and, unless `stay_available`, closing
    /// at the start of the day after `window.end`.
    pub fn for_window(
        window: &SessionWindow,
        stay_available: bool,
        shown: bool,
        calendar: &Calendar,
    ) -> Result<Self> {
        let mut conditions = vec![Condition::Date {
            comparator: Comparator::From,
            at: window.start,
        }];
        if !stay_available {
            conditions.push(Condition::Date {
                comparator: Comparator::Until,
                at: window.end_exclusive(calendar)?,
            });
        }
        Ok(Self { conditions, shown })
    }

    /// Parse a raw rule. Unknown condition kinds are dropped; anything that
    /// is not a JSON object with a `c` array is `MalformedRule`.
    pub fn parse(raw: &str) -> Result<Self> {
        let parsed: RawRuleIn =
            serde_json::from_str(raw).map_err(|e| DripError::MalformedRule(e.to_string()))?;
        if let Some(op) = parsed.op.as_deref() {
            if op != CONJUNCTION {
                tracing::debug!(op, "reading bounds from non-conjunction rule");
            }
        }
        let conditions = parsed
            .c
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<RawCondition>(value) {
                Ok(RawCondition::Date { d, t }) => Utc
                    .timestamp_opt(t, 0)
                    .single()
                    .map(|at| Condition::Date { comparator: d, at }),
                Err(_) => None,
            })
            .collect();
        Ok(Self {
            conditions,
            shown: true,
        })
    }

    pub fn to_raw(&self) -> Result<String> {
        let out = RawRuleOut {
            op: CONJUNCTION,
            c: self
                .conditions
                .iter()
                .map(|c| match c {
                    Condition::Date { comparator, at } => RawCondition::Date {
                        d: *comparator,
                        t: at.timestamp(),
                    },
                })
                .collect(),
            showc: vec![self.shown; self.conditions.len()],
        };
        Ok(serde_json::to_string(&out)?)
    }

    pub fn summary(&self, calendar: &Calendar) -> RuleSummary {
        let mut summary = RuleSummary::default();
        for condition in &self.conditions {
            let Condition::Date { comparator, at } = condition;
            match comparator {
                Comparator::From => summary.from = Some(calendar.display(*at)),
                Comparator::Until => summary.to = Some(calendar.display(*at)),
            }
        }
        summary
    }
}

// ---------------------------------------------------------------------------
// Codec entry points
// ---------------------------------------------------------------------------

/// Summarize a raw rule for display. Empty input yields an empty summary,
/// and so does a malformed rule (logged, not propagated).
pub fn decode(raw: Option<&str>, calendar: &Calendar) -> RuleSummary {
    let raw = match raw {
        Some(r) if !r.trim().is_empty() => r,
        _ => return RuleSummary::default(),
    };
    match AvailabilityRule::parse(raw) {
        Ok(rule) => rule.summary(calendar),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unreadable availability rule");
            RuleSummary::default()
        }
    }
}

/// Raw rule for `window`, displayed while restricted.
pub fn encode(window: &SessionWindow, stay_available: bool, calendar: &Calendar) -> Result<String> {
    AvailabilityRule::for_window(window, stay_available, true, calendar)?.to_raw()
}

/// Raw rule for `window` using the schedule's `stay_available` and
/// `display_disabled` settings.
pub fn encode_for(schedule: &Schedule, window: &SessionWindow, calendar: &Calendar) -> Result<String> {
    AvailabilityRule::for_window(
        window,
        schedule.stay_available,
        schedule.display_disabled,
        calendar,
    )?
    .to_raw()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gmt() -> Calendar {
        Calendar::from_name("GMT").unwrap()
    }

    fn window(day: u32, length: i64) -> SessionWindow {
        let start = Utc.with_ymd_and_hms(2023, 1, day, 0, 0, 0).unwrap();
        SessionWindow {
            session_index: 0,
            start,
            end: start + chrono::Duration::days(length - 1),
        }
    }

    #[test]
    fn decode_month_range_in_gmt() {
        let json = serde_json::json!({
            "c": [
                {"type": "date", "d": ">=", "t": 1609459200},
                {"type": "date", "d": "<", "t": 1612137600},
            ]
        })
        .to_string();
        let summary = decode(Some(&json), &gmt());
        assert_eq!(summary.from.as_deref(), Some("Fri 1 Jan 2021 00:00"));
        assert_eq!(summary.to.as_deref(), Some("Mon 1 Feb 2021 00:00"));
    }

    #[test]
    fn decode_empty_and_missing_is_empty() {
        assert_eq!(decode(None, &gmt()), RuleSummary::default());
        assert_eq!(decode(Some(""), &gmt()), RuleSummary::default());
        let json = serde_json::to_string(&RuleSummary::default()).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn decode_malformed_degrades_to_empty() {
        assert!(decode(Some("XXX"), &gmt()).is_empty());
        assert!(decode(Some(r#"{"op":"&"}"#), &gmt()).is_empty());
        assert!(matches!(
            AvailabilityRule::parse("XXX"),
            Err(DripError::MalformedRule(_))
        ));
    }

    #[test]
    fn decode_skips_unknown_condition_kinds() {
        let json = r#"{"op":"&","c":[{"type":"group","id":4},{"type":"date","d":">=","t":1609459200}]}"#;
        let summary = decode(Some(json), &gmt());
        assert_eq!(summary.from.as_deref(), Some("Fri 1 Jan 2021 00:00"));
        assert!(summary.to.is_none());
    }

    #[test]
    fn encode_then_decode_recovers_bounds() {
        let cal = gmt();
        let w = window(1, 7);
        let raw = encode(&w, false, &cal).unwrap();
        let summary = decode(Some(&raw), &cal);
        assert_eq!(summary.from, Some(cal.display(w.start)));
        assert_eq!(summary.to, Some(cal.display(w.end_exclusive(&cal).unwrap())));
        assert_eq!(summary.to.as_deref(), Some("Sun 8 Jan 2023 00:00"));
    }

    #[test]
    fn stay_available_omits_upper_bound() {
        let cal = gmt();
        let raw = encode(&window(1, 1), true, &cal).unwrap();
        let summary = decode(Some(&raw), &cal);
        assert_eq!(summary.from.as_deref(), Some("Sun 1 Jan 2023 00:00"));
        assert!(summary.to.is_none());
    }

    #[test]
    fn encoded_rule_carries_start_timestamp_and_visibility() {
        let cal = gmt();
        let w = window(1, 1);
        let raw = encode(&w, false, &cal).unwrap();
        assert!(raw.contains(&w.start.timestamp().to_string()));
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["op"], "&");
        assert_eq!(value["showc"], serde_json::json!([true, true]));
        assert_eq!(value["c"][0]["d"], ">=");
        assert_eq!(value["c"][1]["d"], "<");
    }

    #[test]
    fn encode_for_hides_unless_display_disabled() {
        let cal = gmt();
        let mut schedule = crate::types::Schedule {
            id: Some(1),
            course_id: 1,
            activity_type: "quiz".to_string(),
            activities_per_session: 1,
            session_length_days: 1,
            schedule_start: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            schedule_finish: Utc.with_ymd_and_hms(2023, 2, 1, 0, 0, 0).unwrap(),
            stay_available: true,
            group_filter: None,
            hide_unselected: false,
            reset_unselected: false,
            display_disabled: false,
        };
        let w = window(1, 1);
        let hidden: serde_json::Value =
            serde_json::from_str(&encode_for(&schedule, &w, &cal).unwrap()).unwrap();
        assert_eq!(hidden["showc"], serde_json::json!([false]));

        schedule.display_disabled = true;
        let shown: serde_json::Value =
            serde_json::from_str(&encode_for(&schedule, &w, &cal).unwrap()).unwrap();
        assert_eq!(shown["showc"], serde_json::json!([true]));
    }
}
