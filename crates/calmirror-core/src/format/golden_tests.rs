//! Golden tests for display formatting.
//!
//! Snapshots are inline; run `cargo insta review` after intentional changes.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Europe::Paris;

use crate::event::{Calendar, Event, EventInput};
use crate::format::{AgendaOptions, format_agenda, format_event_time, format_view_title};
use crate::time::EventTime;
use crate::view::CalendarView;

fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn timed(start: DateTime<Utc>, end: DateTime<Utc>) -> (EventTime, EventTime) {
    (EventTime::from_utc(start), EventTime::from_utc(end))
}

fn all_day(first: NaiveDate, last: NaiveDate) -> (EventTime, EventTime) {
    (EventTime::from_date(first), EventTime::from_date(last))
}

#[test]
fn all_day_labels() {
    let (s, e) = all_day(date(2024, 3, 1), date(2024, 3, 1));
    insta::assert_snapshot!(format_event_time(&s, &e, &Utc), @"All day");

    let (s, e) = all_day(date(2024, 3, 1), date(2024, 3, 2));
    insta::assert_snapshot!(format_event_time(&s, &e, &Utc), @"Mar 1 - Mar 2");

    let (s, e) = all_day(date(2024, 3, 1), date(2024, 3, 3));
    insta::assert_snapshot!(format_event_time(&s, &e, &Utc), @"Mar 1 - Mar 3");
}

#[test]
fn timed_labels() {
    let (s, e) = timed(utc(2024, 1, 15, 9, 0), utc(2024, 1, 15, 9, 30));
    insta::assert_snapshot!(format_event_time(&s, &e, &Utc), @"9:00 AM - 9:30 AM");

    let (s, e) = timed(utc(2024, 1, 15, 21, 0), utc(2024, 1, 16, 1, 0));
    insta::assert_snapshot!(
        format_event_time(&s, &e, &Utc),
        @"Jan 15, 9:00 PM - Jan 16, 1:00 AM"
    );
}

#[test]
fn timed_label_in_zone() {
    let (s, e) = timed(utc(2024, 1, 15, 8, 0), utc(2024, 1, 15, 8, 30));
    insta::assert_snapshot!(format_event_time(&s, &e, &Paris), @"9:00 AM - 9:30 AM");

    // Same UTC day, but the end crosses midnight in Paris.
    let (s, e) = timed(utc(2024, 1, 15, 22, 30), utc(2024, 1, 15, 23, 30));
    insta::assert_snapshot!(
        format_event_time(&s, &e, &Paris),
        @"Jan 15, 11:30 PM - Jan 16, 12:30 AM"
    );
}

#[test]
fn mixed_times_are_blank() {
    let s = EventTime::from_date(date(2024, 3, 1));
    let e = EventTime::from_utc(utc(2024, 3, 1, 10, 0));
    assert_eq!(format_event_time(&s, &e, &Utc), "");
}

#[test]
fn view_titles() {
    let d = date(2024, 1, 17);
    insta::assert_snapshot!(format_view_title(CalendarView::Day, date(2024, 1, 15)), @"Monday, January 15, 2024");
    insta::assert_snapshot!(format_view_title(CalendarView::ThreeDays, date(2024, 1, 15)), @"Jan 15 - Jan 17, 2024");
    insta::assert_snapshot!(format_view_title(CalendarView::WorkWeek, d), @"Jan 15 - Jan 19, 2024");
    insta::assert_snapshot!(format_view_title(CalendarView::Week, d), @"Jan 15 - Jan 21, 2024");
    insta::assert_snapshot!(format_view_title(CalendarView::TwoWeeks, d), @"Jan 15 - Jan 28, 2024");
    insta::assert_snapshot!(format_view_title(CalendarView::Month, d), @"January 2024");
}

fn agenda_fixture() -> (Vec<Event>, Vec<Calendar>) {
    let (s, e) = timed(utc(2024, 1, 15, 9, 0), utc(2024, 1, 15, 9, 30));
    let standup = Event::from_input("s1", "work", EventInput::new("Standup", s, e));
    let (s, e) = all_day(date(2024, 1, 16), date(2024, 1, 16));
    let offsite = Event::from_input("o1", "home", EventInput::new("Offsite", s, e));
    let calendars = vec![
        Calendar::new("work", "Work").with_primary(true),
        Calendar::new("home", "Personal"),
    ];
    (vec![standup, offsite], calendars)
}

#[test]
fn agenda_three_days() {
    let (events, calendars) = agenda_fixture();
    let options = AgendaOptions {
        show_calendar: true,
        ..Default::default()
    };
    let output = format_agenda(
        CalendarView::ThreeDays,
        date(2024, 1, 15),
        &events,
        &calendars,
        &Utc,
        &options,
    );
    insta::assert_snapshot!(output.trim_end(), @r"
    Mon Jan 15
      9:00 AM - 9:30 AM      Standup [Work]
    Tue Jan 16
      All day                Offsite [Personal]
    Wed Jan 17
      (no events)
    ");
}

#[test]
fn agenda_skips_empty_days_with_ids() {
    let (events, calendars) = agenda_fixture();
    let options = AgendaOptions {
        show_ids: true,
        skip_empty_days: true,
        ..Default::default()
    };
    let output = format_agenda(
        CalendarView::Week,
        date(2024, 1, 17),
        &events,
        &calendars,
        &Utc,
        &options,
    );
    insta::assert_snapshot!(output.trim_end(), @r"
    Mon Jan 15
      9:00 AM - 9:30 AM      Standup (s1)
    Tue Jan 16
      All day                Offsite (o1)
    ");
}
