//! Time types for calendar events.
//!
//! [`EventTime`] is the start or end of an event, either a precise instant or
//! an all-day date. [`TimeWindow`] is a half-open UTC query range.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// The start or end of a calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum EventTime {
    /// A specific instant, stored in UTC.
    DateTime(DateTime<Utc>),
    /// An all-day date with no time component.
    AllDay(NaiveDate),
}

impl EventTime {
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self::DateTime(dt)
    }

    /// Normalizes a zoned instant to UTC.
    pub fn from_local<Tz: TimeZone>(dt: DateTime<Tz>) -> Self {
        Self::DateTime(dt.with_timezone(&Utc))
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self::AllDay(date)
    }

    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::AllDay(_))
    }

    /// Ordering key; all-day dates sort as midnight UTC.
    pub fn to_utc_datetime(&self) -> DateTime<Utc> {
        match self {
            Self::DateTime(dt) => *dt,
            Self::AllDay(date) => date.and_time(NaiveTime::MIN).and_utc(),
        }
    }

    /// Returns the calendar date of this time as seen in `tz`.
    pub fn date_in<Tz: TimeZone>(&self, tz: &Tz) -> NaiveDate {
        match self {
            Self::DateTime(dt) => dt.with_timezone(tz).date_naive(),
            Self::AllDay(date) => *date,
        }
    }
}

impl PartialOrd for EventTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EventTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_utc_datetime().cmp(&other.to_utc_datetime())
    }
}

/// Returns the UTC instant of local midnight at the start of `date` in `tz`.
///
/// Zones that skip midnight on a DST change fall back to midnight UTC.
pub fn local_midnight<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

/// A time window for querying calendar events.
///
/// Represents a half-open interval `[start, end)` in UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (exclusive).
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a new time window. A reversed pair is swapped.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Creates a time window for a single local day.
    pub fn for_date<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Self {
        Self::for_dates(date, date, tz)
    }

    /// Creates a window from local midnight of `first` to local midnight
    /// after `last`.
    pub fn for_dates<Tz: TimeZone>(first: NaiveDate, last: NaiveDate, tz: &Tz) -> Self {
        let after_last = last.succ_opt().unwrap_or(last);
        Self::new(local_midnight(first, tz), local_midnight(after_last, tz))
    }

    /// Returns the duration of this time window.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Checks if a datetime falls within this window.
    pub fn contains(&self, dt: DateTime<Utc>) -> bool {
        self.start <= dt && dt < self.end
    }

    /// Checks if the half-open range `[start, end)` overlaps this window.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end && end > self.start
    }

    /// Checks if `other` lies entirely inside this window.
    pub fn covers(&self, other: &TimeWindow) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Extends the window by the given duration on both ends.
    pub fn extend(&self, duration: Duration) -> Self {
        Self {
            start: self.start - duration,
            end: self.end + duration,
        }
    }
}
