//! The calendar API abstraction used by the sync layer.
//!
//! [`CalendarApi`] is object-safe so the orchestrator can hold an
//! `Arc<dyn CalendarApi>`; tests substitute an in-memory implementation.

use std::future::Future;
use std::pin::Pin;

use calmirror_core::{Calendar, Event, EventInput, TimeWindow};

use crate::error::ProviderResult;

/// A boxed future for object-safe async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Events returned by one list call, across all pages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPage {
    pub events: Vec<Event>,
    /// Ids of events reported as cancelled. Only incremental fetches carry
    /// these; a full fetch simply omits deleted events.
    pub cancelled: Vec<String>,
    /// Token for the next incremental fetch of this calendar.
    pub next_sync_token: Option<String>,
}

impl EventPage {
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            events,
            cancelled: Vec::new(),
            next_sync_token: None,
        }
    }

    pub fn with_cancelled(mut self, ids: Vec<String>) -> Self {
        self.cancelled = ids;
        self
    }

    pub fn with_sync_token(mut self, token: impl Into<String>) -> Self {
        self.next_sync_token = Some(token.into());
        self
    }
}

/// Operations on a remote calendar service.
///
/// Every call takes the access token explicitly; token lifecycle lives in
/// [`TokenManager`](crate::google::TokenManager).
pub trait CalendarApi: Send + Sync {
    /// Lists the user's calendars. Returned calendars are unselected; the
    /// caller decides selection.
    fn list_calendars<'a>(&'a self, access_token: &'a str)
    -> BoxFuture<'a, ProviderResult<Vec<Calendar>>>;

    /// Lists events of one calendar.
    ///
    /// With `sync_token` only changes since that token are requested and
    /// `window` is ignored. A token the server no longer accepts yields
    /// [`ProviderErrorCode::SyncTokenInvalid`](crate::ProviderErrorCode::SyncTokenInvalid).
    fn list_events<'a>(
        &'a self,
        access_token: &'a str,
        calendar_id: &'a str,
        window: &'a TimeWindow,
        sync_token: Option<&'a str>,
    ) -> BoxFuture<'a, ProviderResult<EventPage>>;

    /// Creates an event and returns it as stored by the server.
    fn insert_event<'a>(
        &'a self,
        access_token: &'a str,
        calendar_id: &'a str,
        input: &'a EventInput,
    ) -> BoxFuture<'a, ProviderResult<Event>>;

    /// Replaces the writable fields of an event.
    fn update_event<'a>(
        &'a self,
        access_token: &'a str,
        calendar_id: &'a str,
        event_id: &'a str,
        input: &'a EventInput,
    ) -> BoxFuture<'a, ProviderResult<Event>>;

    fn delete_event<'a>(
        &'a self,
        access_token: &'a str,
        calendar_id: &'a str,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>>;
}
