//! Calendar and event types shared by the provider, sync and client crates.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::time::{EventTime, TimeWindow};

/// Title given to fetched events that have none.
pub const UNTITLED_EVENT: &str = "Untitled Event";

/// Color used for a calendar that does not define one.
pub const DEFAULT_CALENDAR_COLOR: &str = "#4285f4";

/// A calendar from the user's calendar list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    /// Unique calendar identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Background color (hex).
    pub background_color: Option<String>,
    /// Foreground color (hex).
    pub foreground_color: Option<String>,
    /// Whether this is the account's primary calendar.
    #[serde(default)]
    pub primary: bool,
    /// Whether the user wants this calendar's events shown and synced.
    #[serde(default)]
    pub selected: bool,
}

impl Calendar {
    /// Creates an unselected, non-primary calendar.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            background_color: None,
            foreground_color: None,
            primary: false,
            selected: false,
        }
    }

    /// Builder method to mark as primary.
    pub fn with_primary(mut self, primary: bool) -> Self {
        self.primary = primary;
        self
    }

    /// Builder method to set the selected flag.
    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    /// Builder method to set the background color.
    pub fn with_background_color(mut self, color: impl Into<String>) -> Self {
        self.background_color = Some(color.into());
        self
    }
}

/// Looks up the display color of a calendar, falling back to the default.
pub fn calendar_color<'a>(calendar_id: &str, calendars: &'a [Calendar]) -> &'a str {
    calendars
        .iter()
        .find(|c| c.id == calendar_id)
        .and_then(|c| c.background_color.as_deref())
        .unwrap_or(DEFAULT_CALENDAR_COLOR)
}

/// An attendee's response to an invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseStatus {
    Accepted,
    Declined,
    Tentative,
    NeedsAction,
}

impl ResponseStatus {
    /// Returns the wire name used by the Calendar API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Declined => "declined",
            Self::Tentative => "tentative",
            Self::NeedsAction => "needsAction",
        }
    }

    /// Parses the wire name; unknown values map to `NeedsAction`.
    pub fn parse(s: &str) -> Self {
        match s {
            "accepted" => Self::Accepted,
            "declined" => Self::Declined,
            "tentative" => Self::Tentative,
            _ => Self::NeedsAction,
        }
    }
}

/// An event attendee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub email: String,
    pub display_name: Option<String>,
    pub response_status: Option<ResponseStatus>,
}

impl Attendee {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            display_name: None,
            response_status: None,
        }
    }
}

/// The writable fields of an event, as sent on create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventInput {
    pub summary: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
    /// IANA time zone the timed start/end were entered in.
    pub time_zone: Option<String>,
    #[serde(default)]
    pub attendees: Vec<Attendee>,
    pub color_id: Option<String>,
}

impl EventInput {
    /// Creates an input with only a title and time range.
    pub fn new(summary: impl Into<String>, start: EventTime, end: EventTime) -> Self {
        Self {
            summary: summary.into(),
            description: None,
            location: None,
            start,
            end,
            time_zone: None,
            attendees: Vec::new(),
            color_id: None,
        }
    }
}

/// A calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event identifier, unique within its calendar.
    pub id: String,
    /// The calendar that owns this event.
    pub calendar_id: String,
    pub summary: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
    pub time_zone: Option<String>,
    #[serde(default)]
    pub attendees: Vec<Attendee>,
    /// Parent event id when this is an instance of a recurring event.
    pub recurring_event_id: Option<String>,
    /// Color override for this event.
    pub color_id: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub html_link: Option<String>,
}

impl Event {
    /// Creates an event from its writable fields.
    pub fn from_input(
        id: impl Into<String>,
        calendar_id: impl Into<String>,
        input: EventInput,
    ) -> Self {
        Self {
            id: id.into(),
            calendar_id: calendar_id.into(),
            summary: input.summary,
            description: input.description,
            location: input.location,
            start: input.start,
            end: input.end,
            time_zone: input.time_zone,
            attendees: input.attendees,
            recurring_event_id: None,
            color_id: input.color_id,
            created: None,
            updated: None,
            html_link: None,
        }
    }

    /// Returns the writable fields of this event.
    pub fn to_input(&self) -> EventInput {
        EventInput {
            summary: self.summary.clone(),
            description: self.description.clone(),
            location: self.location.clone(),
            start: self.start.clone(),
            end: self.end.clone(),
            time_zone: self.time_zone.clone(),
            attendees: self.attendees.clone(),
            color_id: self.color_id.clone(),
        }
    }

    /// Returns true for all-day events.
    pub fn is_all_day(&self) -> bool {
        self.start.is_all_day()
    }

    /// Returns true if the event is shown on `day` in `tz`.
    ///
    /// All-day events include both their start and end dates. Timed events
    /// appear on every local day their `[start, end)` range touches; a
    /// zero-length event appears on the day it starts.
    pub fn occurs_on<Tz: TimeZone>(&self, day: NaiveDate, tz: &Tz) -> bool {
        match &self.start {
            EventTime::AllDay(start) => {
                let end = self.end.date_in(tz).max(*start);
                *start <= day && day <= end
            }
            EventTime::DateTime(start) => {
                let window = TimeWindow::for_date(day, tz);
                let end = self.end.to_utc_datetime();
                if end <= *start {
                    window.contains(*start)
                } else {
                    window.overlaps(*start, end)
                }
            }
        }
    }
}

/// Returns the events shown on `day`, ordered by start time.
pub fn events_on<'a, Tz: TimeZone>(events: &'a [Event], day: NaiveDate, tz: &Tz) -> Vec<&'a Event> {
    let mut found: Vec<&Event> = events.iter().filter(|e| e.occurs_on(day, tz)).collect();
    found.sort_by(|a, b| a.start.cmp(&b.start));
    found
}
