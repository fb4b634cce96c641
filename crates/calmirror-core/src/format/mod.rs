//! Display formatting for events and views.
//!
//! Front ends use these helpers for event time labels, the header title of
//! the active view and a plain-text agenda of the visible days.

use std::fmt::Write as _;

use chrono::{Duration, NaiveDate, TimeZone};

use crate::event::{Calendar, Event, events_on};
use crate::time::EventTime;
use crate::view::{CalendarView, week_start};

#[cfg(test)]
mod golden_tests;

const DAY_FORMAT: &str = "%b %-d";
const CLOCK_FORMAT: &str = "%-I:%M %p";

/// Formats the time label of an event.
///
/// All-day events show `All day` for a single day, otherwise their inclusive
/// date range. Timed events show a clock range, with dates when they span
/// midnight in `tz`.
pub fn format_event_time<Tz: TimeZone>(start: &EventTime, end: &EventTime, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match (start, end) {
        (EventTime::AllDay(first), EventTime::AllDay(last)) => {
            if last <= first {
                "All day".to_string()
            } else {
                format!(
                    "{} - {}",
                    first.format(DAY_FORMAT),
                    last.format(DAY_FORMAT)
                )
            }
        }
        (EventTime::DateTime(start), EventTime::DateTime(end)) => {
            let start = start.with_timezone(tz);
            let end = end.with_timezone(tz);
            if start.date_naive() == end.date_naive() {
                format!(
                    "{} - {}",
                    start.format(CLOCK_FORMAT),
                    end.format(CLOCK_FORMAT)
                )
            } else {
                format!(
                    "{}, {} - {}, {}",
                    start.format(DAY_FORMAT),
                    start.format(CLOCK_FORMAT),
                    end.format(DAY_FORMAT),
                    end.format(CLOCK_FORMAT)
                )
            }
        }
        _ => String::new(),
    }
}

/// Formats the header title of `view` around `date`.
pub fn format_view_title(view: CalendarView, date: NaiveDate) -> String {
    let span = |first: NaiveDate, last: NaiveDate| {
        format!("{} - {}", first.format(DAY_FORMAT), last.format("%b %-d, %Y"))
    };
    let monday = week_start(date);
    match view {
        CalendarView::Day => date.format("%A, %B %-d, %Y").to_string(),
        CalendarView::ThreeDays => span(date, date + Duration::days(2)),
        CalendarView::WorkWeek => span(monday, monday + Duration::days(4)),
        CalendarView::Week => span(monday, monday + Duration::days(6)),
        CalendarView::TwoWeeks => span(monday, monday + Duration::days(13)),
        CalendarView::Month => date.format("%B %Y").to_string(),
    }
}

/// Options for [`format_agenda`].
#[derive(Debug, Clone, Default)]
pub struct AgendaOptions {
    /// Show the owning calendar name after each title.
    pub show_calendar: bool,
    /// Show event ids, for commands that take one.
    pub show_ids: bool,
    /// Skip days without events.
    pub skip_empty_days: bool,
}

/// Renders the events of each visible day of `view` as plain text.
pub fn format_agenda<Tz: TimeZone>(
    view: CalendarView,
    date: NaiveDate,
    events: &[Event],
    calendars: &[Calendar],
    tz: &Tz,
    options: &AgendaOptions,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let mut out = String::new();
    for day in view.visible_range(date).days() {
        let found = events_on(events, day, tz);
        if found.is_empty() && options.skip_empty_days {
            continue;
        }
        let _ = writeln!(out, "{}", day.format("%a %b %-d"));
        if found.is_empty() {
            let _ = writeln!(out, "  (no events)");
        }
        for event in found {
            let _ = write!(
                out,
                "  {:<22} {}",
                format_event_time(&event.start, &event.end, tz),
                event.summary
            );
            if options.show_calendar
                && let Some(calendar) = calendars.iter().find(|c| c.id == event.calendar_id)
            {
                let _ = write!(out, " [{}]", calendar.name);
            }
            if options.show_ids {
                let _ = write!(out, " ({})", event.id);
            }
            out.push('\n');
        }
    }
    out
}
