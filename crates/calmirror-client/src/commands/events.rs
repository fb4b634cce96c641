//! Agenda, sync and event editing commands.

use calmirror_core::{Event, EventDraft, format_event_time};
use calmirror_sync::{PRIMARY_CALENDAR_ID, SyncReport};
use chrono_tz::Tz;
use tracing::warn;

use crate::app::{App, Session};
use crate::cli::EventArgs;
use crate::error::{ClientError, ClientResult};
use crate::render;

/// Prints the agenda of the current view.
///
/// Unless `offline`, events are synced first. When that sync fails the
/// stored agenda is still printed before the error is returned.
pub async fn show(app: &App, offline: bool, json: bool, ids: bool) -> ClientResult<()> {
    let synced = if offline {
        Ok(())
    } else {
        refresh(app).await.map(|_| ())
    };
    if let Err(e) = &synced {
        warn!(error = %e, "showing stored events");
    }

    let state = app.store().state().await;
    if json {
        let out = render::agenda_json(&state, &app.tz)
            .map_err(|e| ClientError::InvalidInput(format!("failed to serialize: {}", e)))?;
        println!("{}", out);
    } else {
        print!(
            "{}",
            render::agenda(&state, &app.tz, &app.config.display, ids)
        );
    }
    synced
}

/// Incremental sync of the current view, loading the calendar list on
/// first use.
async fn refresh(app: &App) -> ClientResult<SyncReport> {
    let session = signed_in(app).await?;
    if app.store().read().await.calendars.is_empty() {
        session.engine.sync_calendars().await?;
    }
    Ok(session.engine.sync_events(false).await?)
}

async fn signed_in(app: &App) -> ClientResult<Session> {
    let session = app.connect().await?;
    session.require_sign_in().await?;
    Ok(session)
}

/// Refreshes the calendar list and syncs events of the current view.
pub async fn sync(app: &App, full: bool) -> ClientResult<()> {
    let session = signed_in(app).await?;
    let calendars = session.engine.sync_calendars().await?;
    let report = session.engine.sync_events(full).await?;

    println!(
        "Synced {} of {} calendars, {} events stored.",
        report.calendars_synced,
        calendars.iter().filter(|c| c.selected).count(),
        report.events
    );
    for calendar in &report.calendars_failed {
        println!("  failed: {} (kept previous events)", calendar);
    }
    Ok(())
}

/// Creates an event from the form fields.
pub async fn create(app: &App, args: EventArgs) -> ClientResult<()> {
    let draft = apply_args(
        EventDraft {
            calendar_id: PRIMARY_CALENDAR_ID.to_string(),
            ..Default::default()
        },
        args,
    );
    let session = signed_in(app).await?;
    let created = session.engine.create_from_draft(&draft).await?;
    print_saved("Created", &created, &app.tz);
    Ok(())
}

/// Updates the stored event `event_id`; fields not given keep their value.
pub async fn update(app: &App, event_id: &str, args: EventArgs) -> ClientResult<()> {
    let existing = find_event(app, event_id, args.calendar.as_deref()).await?;
    let mut draft = apply_args(EventDraft::from_event(&existing, &app.tz), args);
    // Events stay in their calendar.
    draft.calendar_id = existing.calendar_id.clone();

    let session = signed_in(app).await?;
    let updated = session.engine.update_from_draft(event_id, &draft).await?;
    print_saved("Updated", &updated, &app.tz);
    Ok(())
}

/// Deletes an event.
pub async fn delete(app: &App, event_id: &str, calendar_id: &str) -> ClientResult<()> {
    let session = signed_in(app).await?;
    session.engine.delete_event(calendar_id, event_id).await?;
    println!("Deleted {}", event_id);
    Ok(())
}

async fn find_event(
    app: &App,
    event_id: &str,
    calendar_id: Option<&str>,
) -> ClientResult<Event> {
    let state = app.store().read().await;
    let mut found = state
        .events
        .iter()
        .filter(|e| e.id == event_id && calendar_id.is_none_or(|c| e.calendar_id == c));
    match (found.next(), found.next()) {
        (Some(event), None) => Ok(event.clone()),
        (Some(_), Some(_)) => Err(ClientError::InvalidInput(format!(
            "event `{}` exists in several calendars, pass --calendar",
            event_id
        ))),
        (None, _) => Err(ClientError::NotFound(format!(
            "event `{}`; run `calmirror sync` first",
            event_id
        ))),
    }
}

/// Overlays the given form fields on `draft`.
fn apply_args(mut draft: EventDraft, args: EventArgs) -> EventDraft {
    if let Some(title) = args.title {
        draft.title = title;
    }
    if let Some(description) = args.description {
        draft.description = Some(description);
    }
    if let Some(location) = args.location {
        draft.location = Some(location);
    }
    if let Some(calendar_id) = args.calendar {
        draft.calendar_id = calendar_id;
    }
    if args.start.is_some() {
        draft.start = args.start;
    }
    if args.end.is_some() {
        draft.end = args.end;
    }
    if args.all_day {
        draft.all_day = true;
    }
    draft
}

fn print_saved(verb: &str, event: &Event, tz: &Tz) {
    println!(
        "{} {} ({}) {}",
        verb,
        event.summary,
        format_event_time(&event.start, &event.end, tz),
        event.id
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use calmirror_core::{EventInput, EventTime};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn at(day: u32, hour: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn args_overlay_only_given_fields() {
        let base = EventDraft {
            title: "Standup".into(),
            location: Some("Room 1".into()),
            calendar_id: "primary".into(),
            start: Some(at(15, 9)),
            end: Some(at(15, 10)),
            ..Default::default()
        };
        let draft = apply_args(
            base.clone(),
            EventArgs {
                title: Some("Retro".into()),
                end: Some(at(15, 11)),
                ..Default::default()
            },
        );
        assert_eq!(draft.title, "Retro");
        assert_eq!(draft.location.as_deref(), Some("Room 1"));
        assert_eq!(draft.start, base.start);
        assert_eq!(draft.end, Some(at(15, 11)));
        assert!(!draft.all_day);

        let draft = apply_args(
            base,
            EventArgs {
                all_day: true,
                ..Default::default()
            },
        );
        assert!(draft.all_day);
    }

    #[tokio::test]
    async fn find_event_needs_calendar_when_ambiguous() {
        let tmp = tempfile::tempdir().unwrap();
        let app = App::open(
            ClientConfig {
                data_dir: Some(tmp.path().to_path_buf()),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
        let time = |h| EventTime::from_utc(Utc.with_ymd_and_hms(2024, 1, 15, h, 0, 0).unwrap());
        let input = EventInput::new("Sync", time(9), time(10));
        app.store()
            .set_events(vec![
                Event::from_input("shared", "primary", input.clone()),
                Event::from_input("shared", "team", input.clone()),
                Event::from_input("solo", "team", input),
            ])
            .await;

        assert_eq!(
            find_event(&app, "solo", None).await.unwrap().calendar_id,
            "team"
        );
        assert_eq!(
            find_event(&app, "shared", None).await.unwrap_err().exit_code(),
            4
        );
        assert_eq!(
            find_event(&app, "shared", Some("primary"))
                .await
                .unwrap()
                .calendar_id,
            "primary"
        );
        assert!(matches!(
            find_event(&app, "missing", None).await,
            Err(ClientError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn offline_show_never_connects() {
        let tmp = tempfile::tempdir().unwrap();
        let app = App::open(
            ClientConfig {
                data_dir: Some(tmp.path().to_path_buf()),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
        // No credentials are configured, so connecting would fail.
        show(&app, true, false, false).await.unwrap();
        assert!(matches!(
            show(&app, false, false, false).await,
            Err(ClientError::Config(_))
        ));
    }
}
