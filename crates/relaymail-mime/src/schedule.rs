//! Send-later timestamps for the `X-Scheduled-Time` header.

use chrono::{DateTime, Local, Months, TimeDelta};
use std::fmt;

/// Header name that carries a scheduled send time.
pub const SCHEDULE_HEADER: &str = "X-Scheduled-Time";

/// Timestamp format written into the header.
pub const SCHEDULE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A future instant built from offsets relative to now.
///
/// Offsets that would overflow the calendar leave the instant unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    at: DateTime<Local>,
}

impl Default for Schedule {
    fn default() -> Self {
        Self::now()
    }
}

impl Schedule {
    /// Starts at the current local time.
    #[must_use]
    pub fn now() -> Self {
        Self { at: Local::now() }
    }

    /// Starts at a fixed instant.
    #[must_use]
    pub const fn at(at: DateTime<Local>) -> Self {
        Self { at }
    }

    /// Adds calendar years.
    #[must_use]
    pub fn add_years(self, years: u32) -> Self {
        self.add_months(years.saturating_mul(12))
    }

    /// Adds calendar months, clamping to the last day of shorter months.
    #[must_use]
    pub fn add_months(self, months: u32) -> Self {
        Self {
            at: self.at.checked_add_months(Months::new(months)).unwrap_or(self.at),
        }
    }

    /// Adds weeks.
    #[must_use]
    pub fn add_weeks(self, weeks: u32) -> Self {
        self.add_delta(TimeDelta::try_weeks(i64::from(weeks)))
    }

    /// Adds days.
    #[must_use]
    pub fn add_days(self, days: u32) -> Self {
        self.add_delta(TimeDelta::try_days(i64::from(days)))
    }

    /// Adds hours.
    #[must_use]
    pub fn add_hours(self, hours: u32) -> Self {
        self.add_delta(TimeDelta::try_hours(i64::from(hours)))
    }

    /// Adds minutes.
    #[must_use]
    pub fn add_minutes(self, minutes: u32) -> Self {
        self.add_delta(TimeDelta::try_minutes(i64::from(minutes)))
    }

    /// Adds seconds.
    #[must_use]
    pub fn add_seconds(self, seconds: u32) -> Self {
        self.add_delta(TimeDelta::try_seconds(i64::from(seconds)))
    }

    /// Returns the instant.
    #[must_use]
    pub const fn date_time(&self) -> DateTime<Local> {
        self.at
    }

    /// Formats as `YYYY-MM-DD HH:MM:SS`.
    #[must_use]
    pub fn format(&self) -> String {
        self.at.format(SCHEDULE_FORMAT).to_string()
    }

    fn add_delta(self, delta: Option<TimeDelta>) -> Self {
        let at = delta
            .and_then(|d| self.at.checked_add_signed(d))
            .unwrap_or(self.at);
        Self { at }
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn start() -> Schedule {
        let naive = NaiveDate::from_ymd_opt(2024, 1, 31)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        Schedule::at(Local.from_local_datetime(&naive).earliest().unwrap())
    }

    #[test]
    fn test_format() {
        assert_eq!(start().format(), "2024-01-31 12:00:00");
        assert_eq!(start().to_string(), "2024-01-31 12:00:00");
    }

    #[test]
    fn test_add_time_units() {
        let s = start().add_hours(1).add_minutes(30).add_seconds(15);
        assert_eq!(s.format(), "2024-01-31 13:30:15");
    }

    #[test]
    fn test_add_days_and_weeks() {
        assert!(start().add_days(1).format().starts_with("2024-02-01"));
        assert!(start().add_weeks(2).format().starts_with("2024-02-14"));
    }

    #[test]
    fn test_add_months_clamps() {
        assert!(start().add_months(1).format().starts_with("2024-02-29"));
        assert!(start().add_years(1).format().starts_with("2025-01-31"));
    }

    #[test]
    fn test_now_is_in_the_future_after_offset() {
        let now = Schedule::now();
        assert!(now.add_days(1).date_time() > now.date_time());
    }
}
