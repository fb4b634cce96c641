//! Calendar views, their visible date ranges and date navigation.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::time::TimeWindow;

/// Days added before and after the visible range when syncing.
pub const SYNC_BUFFER_DAYS: i64 = 7;

/// Largest accepted sync buffer. Larger values are clamped.
pub const MAX_SYNC_BUFFER_DAYS: i64 = 366;

/// A time-range view of the calendar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalendarView {
    #[serde(rename = "day")]
    Day,
    #[serde(rename = "3days")]
    ThreeDays,
    #[serde(rename = "workweek")]
    WorkWeek,
    #[default]
    #[serde(rename = "week")]
    Week,
    #[serde(rename = "2weeks")]
    TwoWeeks,
    #[serde(rename = "month")]
    Month,
}

/// Direction of date navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}

/// An inclusive range of dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

impl DateRange {
    /// Iterates over every date in the range.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.first.iter_days().take_while(move |d| *d <= self.last)
    }

    /// Number of days in the range.
    pub fn len(&self) -> usize {
        ((self.last - self.first).num_days() + 1).max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CalendarView {
    pub const ALL: [CalendarView; 6] = [
        Self::Day,
        Self::ThreeDays,
        Self::WorkWeek,
        Self::Week,
        Self::TwoWeeks,
        Self::Month,
    ];

    /// Returns the persisted name of this view.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::ThreeDays => "3days",
            Self::WorkWeek => "workweek",
            Self::Week => "week",
            Self::TwoWeeks => "2weeks",
            Self::Month => "month",
        }
    }

    /// Returns the dates visible in this view around `date`.
    ///
    /// Weeks start on Monday.
    pub fn visible_range(&self, date: NaiveDate) -> DateRange {
        let monday = week_start(date);
        let (first, last) = match self {
            Self::Day => (date, date),
            Self::ThreeDays => (date, shift_days(date, 2)),
            Self::WorkWeek => (monday, shift_days(monday, 4)),
            Self::Week => (monday, shift_days(monday, 6)),
            Self::TwoWeeks => (monday, shift_days(monday, 13)),
            Self::Month => {
                let first = date.with_day(1).unwrap_or(date);
                let last = first
                    .checked_add_months(Months::new(1))
                    .and_then(|d| d.pred_opt())
                    .unwrap_or(first);
                (first, last)
            }
        };
        DateRange { first, last }
    }

    /// Returns the window to sync for this view: the visible range padded by
    /// [`SYNC_BUFFER_DAYS`] on each side, between local midnights in `tz`.
    pub fn sync_window<Tz: TimeZone>(&self, date: NaiveDate, tz: &Tz) -> TimeWindow {
        self.padded_sync_window(date, SYNC_BUFFER_DAYS, tz)
    }

    /// Same as [`sync_window`](Self::sync_window) with a custom buffer,
    /// clamped to `0..=MAX_SYNC_BUFFER_DAYS`.
    pub fn padded_sync_window<Tz: TimeZone>(
        &self,
        date: NaiveDate,
        buffer_days: i64,
        tz: &Tz,
    ) -> TimeWindow {
        let buffer = buffer_days.clamp(0, MAX_SYNC_BUFFER_DAYS);
        let range = self.visible_range(date);
        TimeWindow::for_dates(
            shift_days(range.first, -buffer),
            shift_days(range.last, buffer),
            tz,
        )
    }

    /// Moves `date` one view-step in `direction`.
    ///
    /// Month steps move by one calendar month, clamping the day to the end of
    /// shorter months.
    pub fn navigate(&self, date: NaiveDate, direction: Direction) -> NaiveDate {
        let days = match self {
            Self::Day => 1,
            Self::ThreeDays => 3,
            Self::WorkWeek | Self::Week => 7,
            Self::TwoWeeks => 14,
            Self::Month => {
                let step = Months::new(1);
                let moved = match direction {
                    Direction::Next => date.checked_add_months(step),
                    Direction::Prev => date.checked_sub_months(step),
                };
                return moved.unwrap_or(date);
            }
        };
        let moved = match direction {
            Direction::Next => date.checked_add_days(Days::new(days)),
            Direction::Prev => date.checked_sub_days(Days::new(days)),
        };
        moved.unwrap_or(date)
    }
}

/// Returns the Monday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    shift_days(date, -i64::from(date.weekday().num_days_from_monday()))
}

/// Moves `date` by `days`, saturating at the ends of the supported range.
fn shift_days(date: NaiveDate, days: i64) -> NaiveDate {
    let step = Days::new(days.unsigned_abs());
    if days >= 0 {
        date.checked_add_days(step).unwrap_or(NaiveDate::MAX)
    } else {
        date.checked_sub_days(step).unwrap_or(NaiveDate::MIN)
    }
}

impl fmt::Display for CalendarView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown view name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown view '{0}' (expected day, 3days, workweek, week, 2weeks or month)")]
pub struct ParseViewError(String);

impl FromStr for CalendarView {
    type Err = ParseViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| ParseViewError(s.to_string()))
    }
}
