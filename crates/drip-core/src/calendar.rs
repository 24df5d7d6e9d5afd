//! Calendar-day arithmetic and display formatting in an explicit time zone.
//!
//! Windows are computed in local calendar days, so adding one day across a
//! daylight-saving change keeps the local wall-clock time instead of adding a
//! fixed 24 hours.

use crate::error::{DripError, Result};
use chrono::{DateTime, Days, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Display format for rule bounds, e.g. `Fri 1 Jan 2021 00:00`.
pub const DISPLAY_FORMAT: &str = "%a %-d %b %Y %H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    tz: Tz,
}

impl Default for Calendar {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl Calendar {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Resolve an IANA zone name such as `Europe/London`.
    pub fn from_name(name: &str) -> Result<Self> {
        name.parse::<Tz>()
            .map(Self::new)
            .map_err(|e| DripError::InvalidConfiguration(format!("unknown time zone '{name}': {e}")))
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// Move `at` by `days` local calendar days, keeping the local time of day.
    /// `None` when the result is outside the representable date range.
    pub fn add_days(&self, at: DateTime<Utc>, days: u64) -> Option<DateTime<Utc>> {
        let local = at.with_timezone(&self.tz).naive_local();
        local
            .checked_add_days(Days::new(days))
            .map(|shifted| self.resolve(shifted))
    }

    /// Start of `date` in this zone.
    pub fn local_midnight(&self, date: NaiveDate) -> DateTime<Utc> {
        self.resolve(date.and_time(chrono::NaiveTime::MIN))
    }

    pub fn display(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.tz).format(DISPLAY_FORMAT).to_string()
    }

    /// Map a local wall-clock time back to UTC. Ambiguous times take the
    /// earlier instant; times inside a DST gap move forward past the gap.
    fn resolve(&self, local: NaiveDateTime) -> DateTime<Utc> {
        match self.tz.from_local_datetime(&local) {
            LocalResult::Single(dt) => dt.with_timezone(&Utc),
            LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
            LocalResult::None => {
                let bumped = local + Duration::hours(1);
                self.tz
                    .from_local_datetime(&bumped)
                    .earliest()
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|| Utc.from_utc_datetime(&local))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_expected_shape() {
        let cal = Calendar::from_name("GMT").unwrap();
        let at = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(cal.display(at), "Fri 1 Jan 2021 00:00");
    }

    #[test]
    fn display_uses_local_zone() {
        let cal = Calendar::from_name("America/New_York").unwrap();
        let at = Utc.with_ymd_and_hms(2021, 2, 1, 0, 0, 0).unwrap();
        assert_eq!(cal.display(at), "Sun 31 Jan 2021 19:00");
    }

    #[test]
    fn unknown_zone_is_invalid_configuration() {
        let err = Calendar::from_name("Mars/Olympus").unwrap_err();
        assert!(matches!(err, DripError::InvalidConfiguration(_)));
    }

    #[test]
    fn add_days_keeps_local_midnight_across_dst() {
        // Europe/London springs forward on 2023-03-26.
        let cal = Calendar::from_name("Europe/London").unwrap();
        let start = Utc.with_ymd_and_hms(2023, 3, 25, 0, 0, 0).unwrap();
        let next = cal.add_days(start, 2).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2023, 3, 26, 23, 0, 0).unwrap());
        assert_eq!(cal.display(next), "Mon 27 Mar 2023 00:00");
    }

    #[test]
    fn add_days_steps_over_gap() {
        // 01:30 on 2023-03-26 does not exist in London.
        let cal = Calendar::from_name("Europe/London").unwrap();
        let start = Utc.with_ymd_and_hms(2023, 3, 25, 1, 30, 0).unwrap();
        let next = cal.add_days(start, 1).unwrap();
        assert_eq!(cal.display(next), "Sun 26 Mar 2023 02:30");
    }

    #[test]
    fn add_days_past_the_calendar_range_is_none() {
        let cal = Calendar::default();
        let at = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(cal.add_days(at, 200_000_000), None);
    }

    #[test]
    fn local_midnight_is_zone_relative() {
        let cal = Calendar::from_name("Australia/Sydney").unwrap();
        let date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        assert_eq!(
            cal.local_midnight(date),
            Utc.with_ymd_and_hms(2022, 12, 31, 13, 0, 0).unwrap()
        );
    }

    #[test]
    fn add_zero_days_is_identity() {
        let cal = Calendar::default();
        let at = Utc.with_ymd_and_hms(2023, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(cal.add_days(at, 0), Some(at));
    }
}
