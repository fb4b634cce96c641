//! Sync orchestration.
//!
//! [`SyncEngine`] ties the calendar API, the token manager, the rate limiter
//! and the store together. Every public operation follows the same shape:
//! gate on a valid access token, take a rate-limit slot per request, call the
//! API, write the result into the store, and surface failures as a single
//! user-facing error message on the store.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use calmirror_core::{Calendar, Event, EventDraft, EventInput, SYNC_BUFFER_DAYS, TimeWindow};
use calmirror_providers::google::TokenManager;
use calmirror_providers::{
    CalendarApi, EventPage, ProviderErrorCode, ProviderResult, RateLimiter,
};
use tracing::{debug, error, info, warn};

use crate::error::{SyncError, SyncResult};
use crate::records::{SyncRecord, SyncRecords};
use crate::store::{PassResult, Store};

/// Calendar id Google accepts as an alias for the account's own calendar.
pub const PRIMARY_CALENDAR_ID: &str = "primary";

/// Summary of one event sync pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub calendars_synced: usize,
    /// Calendars whose fetch failed; their previous events were kept.
    pub calendars_failed: Vec<String>,
    /// Size of the event collection written by the pass.
    pub events: usize,
    /// True if a newer pass started first and these results were dropped.
    pub superseded: bool,
}

/// Drives calendar and event synchronization.
pub struct SyncEngine {
    api: Arc<dyn CalendarApi>,
    tokens: Arc<TokenManager>,
    limiter: Arc<RateLimiter>,
    store: Arc<Store>,
    buffer_days: i64,
}

impl SyncEngine {
    pub fn new(
        api: Arc<dyn CalendarApi>,
        tokens: Arc<TokenManager>,
        limiter: Arc<RateLimiter>,
        store: Arc<Store>,
    ) -> Self {
        Self {
            api,
            tokens,
            limiter,
            store,
            buffer_days: SYNC_BUFFER_DAYS,
        }
    }

    /// Days of padding added on each side of the visible range.
    pub fn with_buffer_days(mut self, days: i64) -> Self {
        self.buffer_days = days.max(0);
        self
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    /// Signs out and forgets everything synced for the account.
    pub async fn sign_out(&self) {
        self.tokens.sign_out().await;
        self.store.clear_account_data().await;
        self.limiter.reset().await;
        info!("signed out");
    }

    /// Refreshes the calendar list, keeping the user's selection.
    pub async fn sync_calendars(&self) -> SyncResult<Vec<Calendar>> {
        self.tracked("sync calendars", self.fetch_calendar_list())
            .await
    }

    /// Syncs events of the selected calendars for the current view.
    ///
    /// With `full_sync` stored sync tokens are ignored. A calendar whose fetch
    /// fails keeps its previous events and does not stop the others; the pass
    /// fails only when every selected calendar failed.
    pub async fn sync_events(&self, full_sync: bool) -> SyncResult<SyncReport> {
        self.tracked("sync events", self.run_event_pass(full_sync))
            .await
    }

    /// Creates an event, adds it to the store and resyncs.
    pub async fn create_event(&self, calendar_id: &str, input: &EventInput) -> SyncResult<Event> {
        let created = self
            .tracked("create event", self.insert(calendar_id, input))
            .await?;
        self.resync_after("create event").await;
        Ok(created)
    }

    /// Validates a form draft, then creates the event.
    pub async fn create_from_draft(&self, draft: &EventDraft) -> SyncResult<Event> {
        let valid = draft
            .validate(self.store.tz())
            .map_err(SyncError::validation)?;
        self.create_event(&valid.calendar_id, &valid.input).await
    }

    /// Updates an event, replaces it in the store and resyncs.
    pub async fn update_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        input: &EventInput,
    ) -> SyncResult<Event> {
        let updated = self
            .tracked("update event", self.update(calendar_id, event_id, input))
            .await?;
        self.resync_after("update event").await;
        Ok(updated)
    }

    /// Validates a form draft, then updates the event.
    pub async fn update_from_draft(&self, event_id: &str, draft: &EventDraft) -> SyncResult<Event> {
        let valid = draft
            .validate(self.store.tz())
            .map_err(SyncError::validation)?;
        self.update_event(&valid.calendar_id, event_id, &valid.input)
            .await
    }

    /// Deletes an event, removes it from the store and resyncs.
    pub async fn delete_event(&self, calendar_id: &str, event_id: &str) -> SyncResult<()> {
        self.tracked("delete event", self.delete(calendar_id, event_id))
            .await?;
        self.resync_after("delete event").await;
        Ok(())
    }

    async fn tracked<T>(
        &self,
        operation: &'static str,
        work: impl Future<Output = SyncResult<T>>,
    ) -> SyncResult<T> {
        self.store.set_loading(true).await;
        self.store.set_error(None).await;

        let result = work.await.map_err(|e| e.during(operation));
        if let Err(e) = &result {
            error!(operation, kind = %e.kind(), detail = e.detail(), "operation failed");
            self.store.set_error(Some(e.user_message())).await;
        }

        self.store.set_loading(false).await;
        result
    }

    async fn resync_after(&self, operation: &'static str) {
        if let Err(e) = self.sync_events(true).await {
            warn!(operation, error = %e, "resync after change failed");
        }
    }

    async fn access_token(&self) -> SyncResult<String> {
        self.tokens
            .ensure_valid_token()
            .await
            .ok_or_else(SyncError::not_signed_in)
    }

    async fn fetch_calendar_list(&self) -> SyncResult<Vec<Calendar>> {
        let token = self.access_token().await?;
        self.limiter.acquire().await?;
        let fetched = self.api.list_calendars(&token).await?;

        let calendars = {
            let state = self.store.read().await;
            merge_selection(fetched, &state.calendars)
        };
        info!(
            count = calendars.len(),
            selected = calendars.iter().filter(|c| c.selected).count(),
            "synced calendar list"
        );
        self.store.set_calendars(calendars.clone()).await;
        Ok(calendars)
    }

    async fn run_event_pass(&self, full_sync: bool) -> SyncResult<SyncReport> {
        let token = self.access_token().await?;
        let generation = self.store.begin_sync_pass();
        let window = self.store.sync_window(self.buffer_days).await;
        let (calendars, mut previous, records) = {
            let state = self.store.read().await;
            let calendars: Vec<Calendar> = state.selected_calendars().cloned().collect();
            (calendars, state.events.clone(), state.sync_records.clone())
        };
        debug!(
            generation,
            full_sync,
            calendars = calendars.len(),
            start = %window.start,
            end = %window.end,
            "starting event sync pass"
        );

        let mut pass = PassResult::default();
        let mut report = SyncReport::default();
        let mut first_error = None;

        for calendar in &calendars {
            let (kept, rest): (Vec<Event>, Vec<Event>) = previous
                .into_iter()
                .partition(|e| e.calendar_id == calendar.id);
            previous = rest;

            let sync_token = if full_sync {
                None
            } else {
                usable_token(&records, &calendar.id, &window)
            };

            match self
                .fetch_events(
                    &token,
                    &calendar.id,
                    &window,
                    sync_token.as_deref(),
                    &mut pass.cleared,
                )
                .await
            {
                Ok(fetch) => {
                    let EventPage {
                        events,
                        cancelled,
                        next_sync_token,
                    } = fetch.page;
                    let record_window = match records.get(&calendar.id) {
                        Some(record) if fetch.incremental => {
                            record.window.clone().unwrap_or_else(|| window.clone())
                        }
                        _ => window.clone(),
                    };
                    let events = if fetch.incremental {
                        apply_delta(kept, events, &cancelled)
                    } else {
                        events
                    };
                    debug!(
                        calendar = %calendar.id,
                        incremental = fetch.incremental,
                        events = events.len(),
                        "synced calendar"
                    );

                    if let Some(next) = next_sync_token {
                        pass.records
                            .push((calendar.id.clone(), SyncRecord::new(next, record_window)));
                    }
                    pass.events.extend(events);
                    report.calendars_synced += 1;
                }
                Err(e) => {
                    warn!(
                        calendar = %calendar.id,
                        error = %e,
                        "failed to sync calendar, keeping previous events"
                    );
                    pass.events.extend(kept);
                    report.calendars_failed.push(calendar.id.clone());
                    first_error.get_or_insert(e);
                }
            }
        }

        if report.calendars_synced == 0
            && let Some(e) = first_error
        {
            return Err(e.into());
        }

        report.events = pass.events.len();
        report.superseded = !self.store.commit_sync_pass(generation, pass).await;
        info!(
            generation,
            synced = report.calendars_synced,
            failed = report.calendars_failed.len(),
            events = report.events,
            superseded = report.superseded,
            "event sync pass finished"
        );
        Ok(report)
    }

    /// Fetches one calendar, falling back once to a full fetch when the
    /// server rejects the sync token. A rejected token is pushed to
    /// `rejected`; the store drops it only if this pass commits.
    async fn fetch_events(
        &self,
        token: &str,
        calendar_id: &str,
        window: &TimeWindow,
        sync_token: Option<&str>,
        rejected: &mut Vec<String>,
    ) -> ProviderResult<CalendarFetch> {
        self.limiter.acquire().await?;
        match self
            .api
            .list_events(token, calendar_id, window, sync_token)
            .await
        {
            Ok(page) => Ok(CalendarFetch {
                page,
                incremental: sync_token.is_some(),
            }),
            Err(e) if sync_token.is_some() && e.code() == ProviderErrorCode::SyncTokenInvalid => {
                info!(calendar = %calendar_id, "sync token rejected, running full fetch");
                rejected.push(calendar_id.to_string());
                self.limiter.acquire().await?;
                let page = self.api.list_events(token, calendar_id, window, None).await?;
                Ok(CalendarFetch {
                    page,
                    incremental: false,
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn insert(&self, calendar_id: &str, input: &EventInput) -> SyncResult<Event> {
        let token = self.access_token().await?;
        self.limiter.acquire().await?;
        let created = self.api.insert_event(&token, calendar_id, input).await?;
        info!(calendar = %calendar_id, event = %created.id, "created event");
        self.store.add_event(created.clone()).await;
        Ok(created)
    }

    async fn update(
        &self,
        calendar_id: &str,
        event_id: &str,
        input: &EventInput,
    ) -> SyncResult<Event> {
        let token = self.access_token().await?;
        self.limiter.acquire().await?;
        let updated = self
            .api
            .update_event(&token, calendar_id, event_id, input)
            .await?;
        info!(calendar = %calendar_id, event = %event_id, "updated event");
        self.store.replace_event(updated.clone()).await;
        Ok(updated)
    }

    async fn delete(&self, calendar_id: &str, event_id: &str) -> SyncResult<()> {
        let token = self.access_token().await?;
        self.limiter.acquire().await?;
        self.api.delete_event(&token, calendar_id, event_id).await?;
        info!(calendar = %calendar_id, event = %event_id, "deleted event");
        self.store.remove_event(calendar_id, event_id).await;
        Ok(())
    }
}

struct CalendarFetch {
    page: EventPage,
    incremental: bool,
}

fn usable_token(records: &SyncRecords, calendar_id: &str, window: &TimeWindow) -> Option<String> {
    let record = records.get(calendar_id)?;
    if record.covers(window) {
        Some(record.sync_token.clone())
    } else {
        debug!(calendar = %calendar_id, "view moved outside synced window, running full fetch");
        None
    }
}

/// Carries the `selected` flag over from `previous` by calendar id. New
/// calendars start selected only if they are the primary calendar.
pub fn merge_selection(fetched: Vec<Calendar>, previous: &[Calendar]) -> Vec<Calendar> {
    fetched
        .into_iter()
        .map(|mut calendar| {
            calendar.selected = previous
                .iter()
                .find(|p| p.id == calendar.id)
                .map(|p| p.selected)
                .unwrap_or(calendar.primary || calendar.id == PRIMARY_CALENDAR_ID);
            calendar
        })
        .collect()
}

/// Applies an incremental fetch to a calendar's previous events: cancelled
/// and changed events are dropped, then the changed versions appended.
pub fn apply_delta(previous: Vec<Event>, changed: Vec<Event>, cancelled: &[String]) -> Vec<Event> {
    let gone: HashSet<&str> = cancelled
        .iter()
        .map(String::as_str)
        .chain(changed.iter().map(|e| e.id.as_str()))
        .collect();
    let mut events: Vec<Event> = previous
        .into_iter()
        .filter(|e| !gone.contains(e.id.as_str()))
        .collect();
    events.extend(changed);
    events
}
