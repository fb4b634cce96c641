//! Application state store.
//!
//! [`Store`] owns the in-memory calendar state behind a tokio `RwLock`. Every
//! mutation bumps a revision published on a `watch` channel so a front end can
//! re-render. View and theme preferences are persisted to the key-value
//! store; calendars, events and sync records optionally to a [`StateFile`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use calmirror_core::storage::{THEME_KEY, VIEW_KEY};
use calmirror_core::{
    Calendar, CalendarView, Direction, Event, KeyValueStore, Theme, TimeWindow,
};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use tokio::sync::{RwLock, RwLockReadGuard, watch};
use tracing::{debug, info, warn};

use crate::records::{StateFile, SyncRecord, SyncRecords, SyncSnapshot};

/// Everything a front end renders.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub view: CalendarView,
    pub current_date: NaiveDate,
    pub theme: Theme,
    pub calendars: Vec<Calendar>,
    pub events: Vec<Event>,
    pub selected_event: Option<Event>,
    pub loading: bool,
    pub error: Option<String>,
    pub sync_records: SyncRecords,
}

impl AppState {
    fn new(view: CalendarView, theme: Theme, current_date: NaiveDate) -> Self {
        Self {
            view,
            current_date,
            theme,
            calendars: Vec::new(),
            events: Vec::new(),
            selected_event: None,
            loading: false,
            error: None,
            sync_records: SyncRecords::default(),
        }
    }

    /// Selected calendars, in list order.
    pub fn selected_calendars(&self) -> impl Iterator<Item = &Calendar> {
        self.calendars.iter().filter(|c| c.selected)
    }

    pub fn find_event(&self, calendar_id: &str, event_id: &str) -> Option<&Event> {
        self.events
            .iter()
            .find(|e| e.calendar_id == calendar_id && e.id == event_id)
    }

    /// Events of selected calendars only.
    pub fn visible_events(&self) -> Vec<Event> {
        self.events
            .iter()
            .filter(|e| {
                self.calendars
                    .iter()
                    .any(|c| c.selected && c.id == e.calendar_id)
            })
            .cloned()
            .collect()
    }
}

/// Outcome of one event sync pass, committed atomically.
#[derive(Debug, Default)]
pub struct PassResult {
    pub events: Vec<Event>,
    /// New records for calendars whose fetch returned a token.
    pub records: Vec<(String, SyncRecord)>,
    /// Calendars whose sync token the server rejected. Applied before
    /// `records`, so a fresh token from the fallback fetch wins.
    pub cleared: Vec<String>,
}

/// Shared application state.
pub struct Store {
    prefs: Arc<dyn KeyValueStore>,
    tz: Tz,
    state: RwLock<AppState>,
    revision: watch::Sender<u64>,
    generation: AtomicU64,
    state_file: Option<StateFile>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("tz", &self.tz)
            .field("generation", &self.generation)
            .field("state_file", &self.state_file)
            .finish_non_exhaustive()
    }
}

impl Store {
    /// Creates a store, restoring the view and theme preferences.
    ///
    /// Unreadable or unknown preferences fall back to the defaults.
    pub fn new(prefs: Arc<dyn KeyValueStore>, tz: Tz) -> Self {
        let view = load_pref(prefs.as_ref(), VIEW_KEY).unwrap_or_default();
        let theme = load_pref(prefs.as_ref(), THEME_KEY).unwrap_or_default();
        let today = today_in(&tz);
        let (revision, _) = watch::channel(0);

        Self {
            prefs,
            tz,
            state: RwLock::new(AppState::new(view, theme, today)),
            revision,
            generation: AtomicU64::new(0),
            state_file: None,
        }
    }

    /// Attaches a state file and restores calendars, events and sync records
    /// from it.
    pub fn with_state_file(mut self, file: StateFile) -> Self {
        match file.load() {
            Ok(Some(snapshot)) => {
                let state = self.state.get_mut();
                state.calendars = snapshot.calendars;
                state.events = snapshot.events;
                state.sync_records = snapshot.sync_records;
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "failed to restore sync state, starting empty"),
        }
        self.state_file = Some(file);
        self
    }

    pub fn tz(&self) -> &Tz {
        &self.tz
    }

    /// Read access to the current state.
    pub async fn read(&self) -> RwLockReadGuard<'_, AppState> {
        self.state.read().await
    }

    /// A clone of the current state.
    pub async fn state(&self) -> AppState {
        self.state.read().await.clone()
    }

    /// Subscribes to change notifications. The value is a revision counter.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    async fn update<R>(&self, f: impl FnOnce(&mut AppState) -> R) -> R {
        let result = {
            let mut state = self.state.write().await;
            f(&mut state)
        };
        self.revision.send_modify(|r| *r += 1);
        result
    }

    pub async fn view(&self) -> CalendarView {
        self.state.read().await.view
    }

    pub async fn set_view(&self, view: CalendarView) {
        self.update(|s| s.view = view).await;
        self.save_pref(VIEW_KEY, view.as_str());
    }

    pub async fn current_date(&self) -> NaiveDate {
        self.state.read().await.current_date
    }

    pub async fn set_current_date(&self, date: NaiveDate) {
        self.update(|s| s.current_date = date).await;
    }

    pub async fn go_to_today(&self) -> NaiveDate {
        let today = today_in(&self.tz);
        self.set_current_date(today).await;
        today
    }

    /// Moves the current date one step of the current view.
    pub async fn navigate(&self, direction: Direction) -> NaiveDate {
        self.update(|s| {
            s.current_date = s.view.navigate(s.current_date, direction);
            s.current_date
        })
        .await
    }

    /// The padded window to sync for the current view and date.
    pub async fn sync_window(&self, buffer_days: i64) -> TimeWindow {
        let state = self.state.read().await;
        state
            .view
            .padded_sync_window(state.current_date, buffer_days, &self.tz)
    }

    pub async fn theme(&self) -> Theme {
        self.state.read().await.theme
    }

    pub async fn set_theme(&self, theme: Theme) {
        self.update(|s| s.theme = theme).await;
        self.save_pref(THEME_KEY, theme.as_str());
    }

    /// Replaces the calendar list. Sync records of calendars no longer
    /// listed are dropped.
    pub async fn set_calendars(&self, calendars: Vec<Calendar>) {
        self.update(|s| {
            s.sync_records
                .retain(|id| calendars.iter().any(|c| c.id == id));
            s.calendars = calendars;
        })
        .await;
        self.persist().await;
    }

    /// Flips the selected flag of a calendar and returns the new value.
    pub async fn toggle_calendar(&self, calendar_id: &str) -> Option<bool> {
        let selected = self
            .update(|s| {
                let calendar = s.calendars.iter_mut().find(|c| c.id == calendar_id)?;
                calendar.selected = !calendar.selected;
                Some(calendar.selected)
            })
            .await;
        if selected.is_some() {
            self.persist().await;
        }
        selected
    }

    pub async fn set_events(&self, events: Vec<Event>) {
        self.update(|s| s.events = events).await;
        self.persist().await;
    }

    pub async fn add_event(&self, event: Event) {
        self.update(|s| s.events.push(event)).await;
        self.persist().await;
    }

    /// Replaces the event with the same calendar and id, or adds it.
    pub async fn replace_event(&self, event: Event) {
        self.update(|s| {
            if let Some(selected) = &mut s.selected_event
                && selected.calendar_id == event.calendar_id
                && selected.id == event.id
            {
                *selected = event.clone();
            }
            match s
                .events
                .iter_mut()
                .find(|e| e.calendar_id == event.calendar_id && e.id == event.id)
            {
                Some(existing) => *existing = event,
                None => s.events.push(event),
            }
        })
        .await;
        self.persist().await;
    }

    /// Removes an event. Returns false if it was not present.
    pub async fn remove_event(&self, calendar_id: &str, event_id: &str) -> bool {
        let removed = self
            .update(|s| {
                let before = s.events.len();
                s.events
                    .retain(|e| !(e.calendar_id == calendar_id && e.id == event_id));
                if s
                    .selected_event
                    .as_ref()
                    .is_some_and(|e| e.calendar_id == calendar_id && e.id == event_id)
                {
                    s.selected_event = None;
                }
                s.events.len() != before
            })
            .await;
        if removed {
            self.persist().await;
        }
        removed
    }

    pub async fn set_selected_event(&self, event: Option<Event>) {
        self.update(|s| s.selected_event = event).await;
    }

    pub async fn set_loading(&self, loading: bool) {
        self.update(|s| s.loading = loading).await;
    }

    pub async fn set_error(&self, error: Option<String>) {
        self.update(|s| s.error = error).await;
    }

    pub async fn sync_record(&self, calendar_id: &str) -> Option<SyncRecord> {
        self.state
            .read()
            .await
            .sync_records
            .get(calendar_id)
            .cloned()
    }

    pub async fn sync_token(&self, calendar_id: &str) -> Option<String> {
        self.state
            .read()
            .await
            .sync_records
            .token(calendar_id)
            .map(str::to_string)
    }

    pub async fn set_sync_token(&self, calendar_id: &str, token: &str, window: TimeWindow) {
        self.update(|s| {
            s.sync_records
                .set(calendar_id, SyncRecord::new(token, window));
        })
        .await;
        self.persist().await;
    }

    /// Starts a new sync pass and returns its generation.
    pub fn begin_sync_pass(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Returns true if no pass has started after `generation`.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Writes the results of pass `generation` unless a newer pass has
    /// started. Returns whether the results were applied.
    pub async fn commit_sync_pass(&self, generation: u64, result: PassResult) -> bool {
        let applied = self
            .update(|s| {
                if !self.is_current(generation) {
                    return false;
                }
                s.events = result.events;
                for calendar_id in &result.cleared {
                    if s.sync_records.clear(calendar_id) {
                        debug!(calendar = %calendar_id, "cleared rejected sync token");
                    }
                }
                for (calendar_id, record) in result.records {
                    s.sync_records.set(calendar_id, record);
                }
                true
            })
            .await;
        if applied {
            self.persist().await;
        } else {
            info!(generation, "discarding results of superseded sync pass");
        }
        applied
    }

    /// Forgets all account data: calendars, events, selection and sync
    /// records. Used on sign-out.
    pub async fn clear_account_data(&self) {
        self.update(|s| {
            s.calendars.clear();
            s.events.clear();
            s.selected_event = None;
            s.sync_records.clear_all();
            s.error = None;
        })
        .await;
        if let Some(file) = &self.state_file
            && let Err(e) = file.remove()
        {
            warn!(error = %e, "failed to remove sync state file");
        }
    }

    pub async fn snapshot(&self) -> SyncSnapshot {
        let state = self.state.read().await;
        SyncSnapshot::new(
            state.calendars.clone(),
            state.events.clone(),
            state.sync_records.clone(),
        )
    }

    async fn persist(&self) {
        let Some(file) = &self.state_file else {
            return;
        };
        let snapshot = self.snapshot().await;
        if let Err(e) = file.save(&snapshot) {
            warn!(path = %file.path().display(), error = %e, "failed to save sync state");
        }
    }

    fn save_pref(&self, key: &str, value: &str) {
        if let Err(e) = self.prefs.set(key, value) {
            warn!(key, error = %e, "failed to save preference");
        }
    }
}

fn load_pref<T: std::str::FromStr>(prefs: &dyn KeyValueStore, key: &str) -> Option<T> {
    match prefs.get(key) {
        Ok(Some(value)) => match value.parse() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                warn!(key, value = %value, "ignoring unknown preference value");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            warn!(key, error = %e, "failed to load preference");
            None
        }
    }
}

fn today_in(tz: &Tz) -> NaiveDate {
    Utc::now().with_timezone(tz).date_naive()
}
