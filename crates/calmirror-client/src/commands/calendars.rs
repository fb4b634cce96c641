//! Calendar list commands.

use crate::app::App;
use crate::error::{ClientError, ClientResult};
use crate::render;

/// Prints the calendar list, fetching it first unless `offline`.
pub async fn list(app: &App, offline: bool, json: bool) -> ClientResult<()> {
    let calendars = if offline {
        app.store().read().await.calendars.clone()
    } else {
        let session = app.connect().await?;
        session.require_sign_in().await?;
        session.engine.sync_calendars().await?
    };

    if json {
        let out = serde_json::to_string_pretty(&calendars)
            .map_err(|e| ClientError::InvalidInput(format!("failed to serialize: {}", e)))?;
        println!("{}", out);
    } else {
        print!("{}", render::calendars(&calendars));
    }
    Ok(())
}

/// Shows or hides a calendar's events.
///
/// The selection is stored locally; the next sync fetches the newly shown
/// calendar.
pub async fn toggle(app: &App, calendar_id: &str) -> ClientResult<()> {
    let selected = app
        .store()
        .toggle_calendar(calendar_id)
        .await
        .ok_or_else(|| ClientError::NotFound(format!("calendar `{}`", calendar_id)))?;
    println!(
        "{} {}",
        if selected { "Showing" } else { "Hiding" },
        calendar_id
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use calmirror_core::Calendar;

    #[tokio::test]
    async fn toggle_flips_and_persists_selection() {
        let tmp = tempfile::tempdir().unwrap();
        let config = ClientConfig {
            data_dir: Some(tmp.path().to_path_buf()),
            ..Default::default()
        };
        let app = App::open(config.clone(), None).await.unwrap();
        app.store()
            .set_calendars(vec![
                Calendar::new("primary", "Me").with_primary(true).with_selected(true),
                Calendar::new("team", "Team"),
            ])
            .await;

        toggle(&app, "team").await.unwrap();
        toggle(&app, "primary").await.unwrap();
        let err = toggle(&app, "nope").await.unwrap_err();
        assert_eq!(err.exit_code(), 4);
        drop(app);

        let app = App::open(config, None).await.unwrap();
        let state = app.store().read().await;
        let selected: Vec<&str> = state.selected_calendars().map(|c| c.id.as_str()).collect();
        assert_eq!(selected, vec!["team"]);
    }
}
