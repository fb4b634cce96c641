//! Event form validation.
//!
//! An [`EventDraft`] holds the raw values of the create/edit form. Validation
//! collects every field error at once and, on success, produces a trimmed
//! [`EventInput`] ready to submit.

use std::fmt;

use chrono::{NaiveDateTime, TimeZone};
use chrono_tz::Tz;

use crate::event::{Event, EventInput};
use crate::time::EventTime;

pub const TITLE_MAX_LENGTH: usize = 200;
pub const DESCRIPTION_MAX_LENGTH: usize = 5000;
pub const LOCATION_MAX_LENGTH: usize = 200;

/// A form field that can carry an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Description,
    Location,
    Start,
    End,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::Location => "location",
            Self::Start => "start",
            Self::End => "end",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

/// All errors found in a draft.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    fn push(&mut self, field: Field, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// Returns the error message for `field`, if any.
    pub fn get(&self, field: Field) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for error in &self.errors {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", error.field.as_str(), error.message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Raw values of the event form.
///
/// `start` and `end` are wall-clock times in the user's zone; for all-day
/// drafts only their dates are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventDraft {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub calendar_id: String,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub all_day: bool,
}

/// A draft that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidDraft {
    pub calendar_id: String,
    pub input: EventInput,
}

impl EventDraft {
    /// Fills a draft from an existing event, for editing.
    pub fn from_event(event: &Event, tz: &Tz) -> Self {
        let to_naive = |time: &EventTime| match time {
            EventTime::DateTime(dt) => dt.with_timezone(tz).naive_local(),
            EventTime::AllDay(date) => date.and_time(chrono::NaiveTime::MIN),
        };
        Self {
            title: event.summary.clone(),
            description: event.description.clone(),
            location: event.location.clone(),
            calendar_id: event.calendar_id.clone(),
            start: Some(to_naive(&event.start)),
            end: Some(to_naive(&event.end)),
            all_day: event.is_all_day(),
        }
    }

    /// Validates the draft, converting wall-clock times from `tz`.
    pub fn validate(&self, tz: &Tz) -> Result<ValidDraft, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if self.title.trim().is_empty() {
            errors.push(Field::Title, "Event title is required");
        } else if self.title.chars().count() > TITLE_MAX_LENGTH {
            errors.push(
                Field::Title,
                format!("Title must be {TITLE_MAX_LENGTH} characters or less"),
            );
        }

        if let Some(description) = &self.description
            && description.chars().count() > DESCRIPTION_MAX_LENGTH
        {
            errors.push(
                Field::Description,
                format!("Description must be {DESCRIPTION_MAX_LENGTH} characters or less"),
            );
        }

        if let Some(location) = &self.location
            && location.chars().count() > LOCATION_MAX_LENGTH
        {
            errors.push(
                Field::Location,
                format!("Location must be {LOCATION_MAX_LENGTH} characters or less"),
            );
        }

        if self.start.is_none() {
            errors.push(Field::Start, "Start date is required");
        }
        if self.end.is_none() {
            errors.push(Field::End, "End date is required");
        }

        let (start, end) = match (self.start, self.end) {
            (Some(start), Some(end)) => (start, end),
            _ => return Err(errors),
        };

        let (start, end) = if self.all_day {
            (
                EventTime::from_date(start.date()),
                EventTime::from_date(end.date()),
            )
        } else {
            (local_time(start, tz), local_time(end, tz))
        };
        if start > end {
            errors.push(Field::End, "End date must be after start date");
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let mut input = EventInput::new(self.title.trim(), start, end);
        input.description = non_empty(self.description.as_deref());
        input.location = non_empty(self.location.as_deref());
        if !self.all_day {
            input.time_zone = Some(tz.name().to_string());
        }

        Ok(ValidDraft {
            calendar_id: self.calendar_id.clone(),
            input,
        })
    }
}

fn local_time(naive: NaiveDateTime, tz: &Tz) -> EventTime {
    match tz.from_local_datetime(&naive).earliest() {
        Some(dt) => EventTime::from_local(dt),
        None => EventTime::from_utc(naive.and_utc()),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn draft() -> EventDraft {
        EventDraft {
            title: "  Standup ".into(),
            description: Some("   ".into()),
            location: Some(" Room 4 ".into()),
            calendar_id: "primary".into(),
            start: Some(at(2024, 1, 15, 9, 0)),
            end: Some(at(2024, 1, 15, 9, 30)),
            all_day: false,
        }
    }

    #[test]
    fn valid_draft_is_trimmed() {
        let valid = draft().validate(&Tz::UTC).unwrap();
        assert_eq!(valid.calendar_id, "primary");
        assert_eq!(valid.input.summary, "Standup");
        assert_eq!(valid.input.description, None);
        assert_eq!(valid.input.location.as_deref(), Some("Room 4"));
        assert_eq!(valid.input.time_zone.as_deref(), Some("UTC"));
        assert_eq!(
            valid.input.start,
            EventTime::from_utc(at(2024, 1, 15, 9, 0).and_utc())
        );
    }

    #[test]
    fn local_times_convert_from_zone() {
        let valid = draft().validate(&chrono_tz::Europe::Paris).unwrap();
        assert_eq!(
            valid.input.start.to_utc_datetime(),
            at(2024, 1, 15, 8, 0).and_utc()
        );
        assert_eq!(valid.input.time_zone.as_deref(), Some("Europe/Paris"));
    }

    #[test]
    fn collects_all_errors() {
        let mut d = draft();
        d.title = "   ".into();
        d.description = Some("x".repeat(DESCRIPTION_MAX_LENGTH + 1));
        d.location = Some("y".repeat(LOCATION_MAX_LENGTH + 1));
        d.start = None;
        d.end = None;

        let errors = d.validate(&Tz::UTC).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert_eq!(errors.get(Field::Title), Some("Event title is required"));
        assert_eq!(
            errors.get(Field::Location),
            Some("Location must be 200 characters or less")
        );
        assert_eq!(errors.get(Field::Start), Some("Start date is required"));
    }

    #[test]
    fn long_title_rejected() {
        let mut d = draft();
        d.title = "t".repeat(TITLE_MAX_LENGTH + 1);
        let errors = d.validate(&Tz::UTC).unwrap_err();
        assert_eq!(
            errors.get(Field::Title),
            Some("Title must be 200 characters or less")
        );
    }

    #[test]
    fn end_before_start_rejected() {
        let mut d = draft();
        d.end = Some(at(2024, 1, 15, 8, 0));
        let errors = d.validate(&Tz::UTC).unwrap_err();
        assert_eq!(
            errors.get(Field::End),
            Some("End date must be after start date")
        );
        assert_eq!(errors.to_string(), "end: End date must be after start date");
    }

    #[test]
    fn all_day_reduced_to_dates() {
        let mut d = draft();
        d.all_day = true;
        d.start = Some(at(2024, 3, 1, 14, 0));
        d.end = Some(at(2024, 3, 3, 0, 0));
        let valid = d.validate(&Tz::UTC).unwrap();
        assert_eq!(
            valid.input.start,
            EventTime::from_date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );
        assert_eq!(valid.input.time_zone, None);
    }

    #[test]
    fn from_event_roundtrip() {
        let valid = draft().validate(&Tz::UTC).unwrap();
        let event = Event::from_input("e1", "primary", valid.input.clone());
        let back = EventDraft::from_event(&event, &Tz::UTC);
        assert_eq!(back.start, Some(at(2024, 1, 15, 9, 0)));
        assert_eq!(back.validate(&Tz::UTC).unwrap().input, valid.input);
    }
}
