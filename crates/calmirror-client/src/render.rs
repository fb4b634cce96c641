//! Output rendering for the agenda, calendar list and session status.

use std::fmt::Write as _;

use calmirror_core::{
    AgendaOptions, Calendar, CalendarView, Event, Theme, calendar_color, format_agenda,
    format_event_time, format_view_title,
};
use calmirror_providers::google::AuthState;
use calmirror_sync::AppState;
use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::Serialize;

use crate::config::DisplaySettings;

/// Renders the agenda of the visible range, headed by the view title.
pub fn agenda(state: &AppState, tz: &Tz, display: &DisplaySettings, show_ids: bool) -> String {
    let options = AgendaOptions {
        show_calendar: display.show_calendar,
        show_ids,
        skip_empty_days: display.skip_empty_days,
    };
    let mut out = format!(
        "{} ({})\n\n",
        format_view_title(state.view, state.current_date),
        state.view
    );
    out.push_str(&format_agenda(
        state.view,
        state.current_date,
        &state.visible_events(),
        &state.calendars,
        tz,
        &options,
    ));
    out
}

#[derive(Serialize)]
struct AgendaJson<'a> {
    view: CalendarView,
    date: NaiveDate,
    title: String,
    events: Vec<EventJson<'a>>,
    error: Option<&'a str>,
}

#[derive(Serialize)]
struct EventJson<'a> {
    #[serde(flatten)]
    event: &'a Event,
    time: String,
    color: &'a str,
}

/// Renders the visible events of the range as JSON.
pub fn agenda_json(state: &AppState, tz: &Tz) -> serde_json::Result<String> {
    let range = state.view.visible_range(state.current_date);
    let visible = state.visible_events();
    let events = state
        .events
        .iter()
        .filter(|e| visible.contains(e))
        .filter(|e| range.days().any(|day| e.occurs_on(day, tz)))
        .map(|event| EventJson {
            event,
            time: format_event_time(&event.start, &event.end, tz),
            color: calendar_color(&event.calendar_id, &state.calendars),
        })
        .collect();

    serde_json::to_string_pretty(&AgendaJson {
        view: state.view,
        date: state.current_date,
        title: format_view_title(state.view, state.current_date),
        events,
        error: state.error.as_deref(),
    })
}

/// Renders the calendar list, one line per calendar.
pub fn calendars(calendars: &[Calendar]) -> String {
    if calendars.is_empty() {
        return "No calendars. Run `calmirror calendars` while signed in.\n".to_string();
    }
    let mut out = String::new();
    for calendar in calendars {
        let _ = write!(
            out,
            "[{}] {} {}",
            if calendar.selected { "x" } else { " " },
            calendar.name,
            calendar_color(&calendar.id, calendars)
        );
        if calendar.primary {
            out.push_str(" (primary)");
        }
        let _ = writeln!(out, "\n    {}", calendar.id);
    }
    out
}

/// Session and preference summary.
#[derive(Debug, Serialize)]
pub struct Status {
    pub state: AuthState,
    pub email: Option<String>,
    pub view: CalendarView,
    pub date: NaiveDate,
    pub theme: Theme,
    pub calendars: usize,
    pub selected: usize,
    pub events: usize,
    pub synced_calendars: usize,
}

impl Status {
    pub fn from_state(state: AuthState, email: Option<String>, app: &AppState) -> Self {
        Self {
            state,
            email,
            view: app.view,
            date: app.current_date,
            theme: app.theme,
            calendars: app.calendars.len(),
            selected: app.selected_calendars().count(),
            events: app.events.len(),
            synced_calendars: app.sync_records.len(),
        }
    }

    pub fn to_text(&self) -> String {
        let account = match (&self.state, &self.email) {
            (AuthState::Authenticated | AuthState::Expiring, Some(email)) => {
                format!("signed in as {}", email)
            }
            (AuthState::Invalid, _) => "session expired, sign in again".to_string(),
            _ => "not signed in".to_string(),
        };
        format!(
            "account:   {}\n\
             view:      {} ({})\n\
             theme:     {} [{}]\n\
             calendars: {} ({} shown)\n\
             events:    {} stored, {} calendars with sync tokens\n",
            account,
            self.view,
            self.date,
            self.theme,
            self.theme.css_class(),
            self.calendars,
            self.selected,
            self.events,
            self.synced_calendars,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calmirror_core::{EventInput, EventTime, MemoryStore};
    use calmirror_sync::Store;
    use chrono::TimeZone;
    use std::sync::Arc;

    async fn state_with_events() -> AppState {
        let store = Store::new(Arc::new(MemoryStore::new()), Tz::UTC);
        store.set_view(CalendarView::Day).await;
        store
            .set_current_date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
            .await;
        store
            .set_calendars(vec![
                Calendar::new("primary", "Work")
                    .with_primary(true)
                    .with_selected(true)
                    .with_background_color("#0b8043"),
                Calendar::new("hidden", "Hidden"),
            ])
            .await;

        let at = |h| EventTime::from_utc(chrono::Utc.with_ymd_and_hms(2024, 1, 15, h, 0, 0).unwrap());
        store
            .set_events(vec![
                Event::from_input("e1", "primary", EventInput::new("Standup", at(9), at(10))),
                Event::from_input("e2", "hidden", EventInput::new("Secret", at(11), at(12))),
            ])
            .await;
        store.state().await
    }

    #[tokio::test]
    async fn agenda_shows_selected_calendars_only() {
        let state = state_with_events().await;
        let text = agenda(&state, &Tz::UTC, &DisplaySettings::default(), true);
        assert!(text.starts_with("Monday, January 15, 2024 (day)"));
        assert!(text.contains("Standup [Work] (e1)"));
        assert!(!text.contains("Secret"));
    }

    #[tokio::test]
    async fn agenda_json_carries_color_and_time() {
        let state = state_with_events().await;
        let json: serde_json::Value =
            serde_json::from_str(&agenda_json(&state, &Tz::UTC).unwrap()).unwrap();
        let events = json["events"].as_array().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["id"], "e1");
        assert_eq!(events[0]["color"], "#0b8043");
        assert_eq!(events[0]["time"], "9:00 AM - 10:00 AM");
        assert_eq!(json["view"], "day");
    }

    #[tokio::test]
    async fn status_text_reports_account() {
        let state = state_with_events().await;
        let status = Status::from_state(
            AuthState::Authenticated,
            Some("me@example.com".into()),
            &state,
        );
        let text = status.to_text();
        assert!(text.contains("signed in as me@example.com"));
        assert!(text.contains("calendars: 2 (1 shown)"));

        let status = Status::from_state(AuthState::Invalid, None, &state);
        assert!(status.to_text().contains("session expired"));
    }

    #[test]
    fn calendar_list_marks_selection() {
        let list = vec![
            Calendar::new("primary", "Work").with_primary(true).with_selected(true),
            Calendar::new("team", "Team"),
        ];
        let text = calendars(&list);
        assert!(text.contains("[x] Work #4285f4 (primary)"));
        assert!(text.contains("[ ] Team"));
    }
}
