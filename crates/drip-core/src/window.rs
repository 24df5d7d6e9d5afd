use crate::calendar::Calendar;
use crate::error::{DripError, Result};
use crate::types::Schedule;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Inclusive release window of one session: `end` is the start of the last
/// day the session's activities are meant to be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionWindow {
    pub session_index: u32,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl SessionWindow {
    /// First instant after the window, i.e. `end` plus one calendar day.
    pub fn end_exclusive(&self, calendar: &Calendar) -> Result<DateTime<Utc>> {
        calendar
            .add_days(self.end, 1)
            .ok_or_else(|| out_of_range(self.session_index))
    }
}

pub fn session_index(activities_per_session: u32, ordinal: u32) -> u32 {
    ordinal / activities_per_session
}

/// Window for the activity at `ordinal` (0-based) within the schedule.
/// Not clipped to `schedule_finish`.
pub fn window_for(schedule: &Schedule, ordinal: u32, calendar: &Calendar) -> Result<SessionWindow> {
    schedule.validate()?;
    let index = session_index(schedule.activities_per_session, ordinal);
    let length = u64::from(schedule.session_length_days);
    let offset = u64::from(index) * length;
    // Both bounds are measured from the configured start so a DST shift of
    // one bound is not carried into the other.
    let start = calendar
        .add_days(schedule.schedule_start, offset)
        .ok_or_else(|| out_of_range(index))?;
    let end = calendar
        .add_days(schedule.schedule_start, offset + length - 1)
        .ok_or_else(|| out_of_range(index))?;
    Ok(SessionWindow {
        session_index: index,
        start,
        end,
    })
}

fn out_of_range(session: u32) -> DripError {
    DripError::InvalidConfiguration(format!(
        "session {session} falls outside the supported calendar range"
    ))
}
