//! View, navigation, shortcut and theme commands.

use calmirror_core::{CalendarView, Direction, KeyChord, Shortcut, Theme};
use tracing::debug;

use crate::app::App;
use crate::commands::events;
use crate::error::{ClientError, ClientResult};

/// Prints the current view, or switches to `view` and shows its agenda.
pub async fn view(app: &App, view: Option<CalendarView>, json: bool) -> ClientResult<()> {
    match view {
        Some(view) => {
            app.store().set_view(view).await;
            events::show(app, false, json, false).await
        }
        None => {
            println!("{}", app.store().view().await);
            Ok(())
        }
    }
}

/// Moves one period of the current view and shows its agenda.
pub async fn navigate(app: &App, direction: Direction, json: bool) -> ClientResult<()> {
    let date = app.store().navigate(direction).await;
    debug!(?direction, %date, "navigated");
    events::show(app, false, json, false).await
}

/// Jumps to today and shows its agenda.
pub async fn today(app: &App, json: bool) -> ClientResult<()> {
    app.store().go_to_today().await;
    events::show(app, false, json, false).await
}

/// Applies a keyboard shortcut as the calendar page would.
pub async fn key(app: &App, chord: &str, json: bool) -> ClientResult<()> {
    let chord: KeyChord = chord
        .parse::<KeyChord>()
        .map_err(|e| ClientError::InvalidInput(e.to_string()))?;
    let shortcut = chord
        .resolve(false)
        .ok_or_else(|| ClientError::InvalidInput(format!("`{}` is not bound", chord)))?;
    apply_shortcut(app, shortcut).await;
    events::show(app, false, json, false).await
}

async fn apply_shortcut(app: &App, shortcut: Shortcut) {
    let store = app.store();
    match shortcut {
        Shortcut::Navigate(direction) => {
            store.navigate(direction).await;
        }
        Shortcut::Today => {
            store.go_to_today().await;
        }
        Shortcut::SetView(view) => store.set_view(view).await,
    }
}

/// Prints the current theme, or switches to `theme`.
pub async fn theme(app: &App, theme: Option<Theme>) -> ClientResult<()> {
    if let Some(theme) = theme {
        app.store().set_theme(theme).await;
    }
    let current = app.store().theme().await;
    println!("{} ({})", current, current.css_class());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use chrono::NaiveDate;

    async fn app_on(dir: &std::path::Path, date: NaiveDate) -> App {
        let config = ClientConfig {
            data_dir: Some(dir.to_path_buf()),
            ..Default::default()
        };
        App::open(config, Some(date)).await.unwrap()
    }

    #[tokio::test]
    async fn shortcuts_move_and_switch_views() {
        let tmp = tempfile::tempdir().unwrap();
        let app = app_on(tmp.path(), NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()).await;

        apply_shortcut(&app, Shortcut::SetView(CalendarView::Month)).await;
        apply_shortcut(&app, Shortcut::Navigate(Direction::Next)).await;
        assert_eq!(app.store().view().await, CalendarView::Month);
        assert_eq!(
            app.store().current_date().await,
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[tokio::test]
    async fn unbound_or_malformed_keys_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let app = app_on(tmp.path(), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()).await;

        let err = key(&app, "ctrl+q", false).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidInput(_)));
        assert!(key(&app, "", false).await.is_err());
        assert_eq!(
            app.store().current_date().await,
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
    }

    #[tokio::test]
    async fn theme_is_persisted() {
        let tmp = tempfile::tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let app = app_on(tmp.path(), date).await;
        theme(&app, Some(Theme::DarkPurple)).await.unwrap();
        drop(app);

        let app = app_on(tmp.path(), date).await;
        assert_eq!(app.store().theme().await, Theme::DarkPurple);
    }
}
