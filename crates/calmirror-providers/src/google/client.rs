//! Google Calendar API client.
//!
//! A thin HTTP wrapper over Calendar API v3 that maps wire objects to the
//! core [`Event`] and [`Calendar`] types and classifies failures by status.

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use calmirror_core::{
    Attendee, Calendar, Event, EventInput, EventTime, ResponseStatus, TimeWindow, UNTITLED_EVENT,
};

use super::config::GoogleConfig;
use crate::api::{BoxFuture, CalendarApi, EventPage};
use crate::error::{ProviderError, ProviderResult};
use crate::retry::RetryPolicy;

/// Base URL for Google Calendar API v3.
pub const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Page size requested from list endpoints.
const PAGE_SIZE: u32 = 250;

/// Google Calendar API client.
#[derive(Debug, Clone)]
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl GoogleCalendarClient {
    pub fn new(config: &GoogleConfig) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                ProviderError::configuration(format!("failed to create HTTP client: {e}"))
                    .with_source(e)
            })?;

        Ok(Self {
            http_client,
            base_url: CALENDAR_API_BASE.to_string(),
            retry: RetryPolicy::default(),
        })
    }

    /// Points the client at another API root, e.g. a local test server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    fn events_url(&self, calendar_id: &str) -> String {
        format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(calendar_id)
        )
    }

    fn event_url(&self, calendar_id: &str, event_id: &str) -> String {
        format!(
            "{}/{}",
            self.events_url(calendar_id),
            urlencoding::encode(event_id)
        )
    }

    async fn fetch_calendars(&self, access_token: &str) -> ProviderResult<Vec<Calendar>> {
        let url = format!("{}/users/me/calendarList", self.base_url);
        let mut calendars = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page: CalendarListResponse = self
                .retry
                .run("list calendars", || {
                    let mut request = self
                        .http_client
                        .get(&url)
                        .bearer_auth(access_token)
                        .query(&[("maxResults", PAGE_SIZE.to_string())]);
                    if let Some(token) = page_token.as_deref() {
                        request = request.query(&[("pageToken", token)]);
                    }
                    async move { read_json(check_response(request.send().await?).await?).await }
                })
                .await?;

            calendars.extend(page.items.into_iter().map(CalendarListEntry::into_calendar));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!("fetched {} calendars", calendars.len());
        Ok(calendars)
    }

    async fn fetch_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        window: &TimeWindow,
        sync_token: Option<&str>,
    ) -> ProviderResult<EventPage> {
        let url = self.events_url(calendar_id);
        let mut result = EventPage::default();
        let mut page_token: Option<String> = None;

        loop {
            let page: EventListResponse = self
                .retry
                .run("list events", || {
                    let request = self
                        .http_client
                        .get(&url)
                        .bearer_auth(access_token)
                        .query(&list_events_query(window, sync_token, page_token.as_deref()));
                    async move { read_json(check_response(request.send().await?).await?).await }
                })
                .await?;

            for item in page.items {
                if item.status.as_deref() == Some("cancelled") {
                    if let Some(id) = item.id {
                        result.cancelled.push(id);
                    }
                    continue;
                }
                if let Some(event) = convert_event(item, calendar_id) {
                    result.events.push(event);
                }
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => {
                    result.next_sync_token = page.next_sync_token;
                    break;
                }
            }
        }

        debug!(
            "fetched {} events ({} cancelled) from calendar {}",
            result.events.len(),
            result.cancelled.len(),
            calendar_id
        );
        Ok(result)
    }

    async fn send_event(
        &self,
        request: reqwest::RequestBuilder,
        calendar_id: &str,
    ) -> ProviderResult<Event> {
        let item: ApiEvent = read_json(check_response(request.send().await?).await?).await?;
        convert_event(item, calendar_id)
            .ok_or_else(|| ProviderError::invalid_response("server returned an unusable event"))
    }
}

impl CalendarApi for GoogleCalendarClient {
    fn list_calendars<'a>(
        &'a self,
        access_token: &'a str,
    ) -> BoxFuture<'a, ProviderResult<Vec<Calendar>>> {
        Box::pin(self.fetch_calendars(access_token))
    }

    fn list_events<'a>(
        &'a self,
        access_token: &'a str,
        calendar_id: &'a str,
        window: &'a TimeWindow,
        sync_token: Option<&'a str>,
    ) -> BoxFuture<'a, ProviderResult<EventPage>> {
        Box::pin(self.fetch_events(access_token, calendar_id, window, sync_token))
    }

    fn insert_event<'a>(
        &'a self,
        access_token: &'a str,
        calendar_id: &'a str,
        input: &'a EventInput,
    ) -> BoxFuture<'a, ProviderResult<Event>> {
        Box::pin(async move {
            // No retry for inserts.
            let request = self
                .http_client
                .post(self.events_url(calendar_id))
                .bearer_auth(access_token)
                .json(&EventResource::from_input(input));
            self.send_event(request, calendar_id).await
        })
    }

    fn update_event<'a>(
        &'a self,
        access_token: &'a str,
        calendar_id: &'a str,
        event_id: &'a str,
        input: &'a EventInput,
    ) -> BoxFuture<'a, ProviderResult<Event>> {
        Box::pin(async move {
            let url = self.event_url(calendar_id, event_id);
            let body = EventResource::from_input(input);
            self.retry
                .run("update event", || {
                    let request = self
                        .http_client
                        .put(&url)
                        .bearer_auth(access_token)
                        .json(&body);
                    self.send_event(request, calendar_id)
                })
                .await
        })
    }

    fn delete_event<'a>(
        &'a self,
        access_token: &'a str,
        calendar_id: &'a str,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(async move {
            let url = self.event_url(calendar_id, event_id);
            let result = self
                .retry
                .run("delete event", || {
                    let request = self.http_client.delete(&url).bearer_auth(access_token);
                    async move {
                        check_response(request.send().await?).await?;
                        Ok(())
                    }
                })
                .await;

            match result {
                // The event is already gone on the server.
                Err(e) if e.status() == Some(410) => {
                    debug!("event {} was already deleted", event_id);
                    Ok(())
                }
                other => other,
            }
        })
    }
}

/// Query parameters for one events.list page.
///
/// Incremental requests carry only the sync token: the API rejects a sync
/// token combined with a time range or ordering.
fn list_events_query(
    window: &TimeWindow,
    sync_token: Option<&str>,
    page_token: Option<&str>,
) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("singleEvents", "true".to_string()),
        ("maxResults", PAGE_SIZE.to_string()),
    ];
    match sync_token {
        Some(token) => query.push(("syncToken", token.to_string())),
        None => {
            query.push(("timeMin", window.start.to_rfc3339()));
            query.push(("timeMax", window.end.to_rfc3339()));
            query.push(("orderBy", "startTime".to_string()));
        }
    }
    if let Some(token) = page_token {
        query.push(("pageToken", token.to_string()));
    }
    query
}

/// Turns a non-success response into a [`ProviderError`] carrying its status.
async fn check_response(response: reqwest::Response) -> ProviderResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = match status {
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            format!(
                "rate limit exceeded{}",
                retry_after
                    .map(|s| format!(", retry after {} seconds", s))
                    .unwrap_or_default()
            )
        }
        StatusCode::UNAUTHORIZED => "access token expired or invalid".to_string(),
        StatusCode::FORBIDDEN => "access denied to calendar".to_string(),
        StatusCode::GONE => "sync token is no longer valid".to_string(),
        _ => {
            let body = response.text().await.unwrap_or_default();
            format!("API error ({}): {}", status, api_error_message(&body))
        }
    };

    Err(ProviderError::from_status(status.as_u16(), message))
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> ProviderResult<T> {
    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::network(format!("failed to read response: {}", e)))?;
    serde_json::from_str(&body).map_err(|e| {
        ProviderError::invalid_response(format!("failed to parse response: {}", e))
    })
}

/// Extracts the message from a Google error body, or returns the body as is.
fn api_error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: ErrorDetail,
    }
    #[derive(Deserialize)]
    struct ErrorDetail {
        message: String,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) => body.trim().to_string(),
    }
}

/// Converts an API event to the core model.
///
/// Returns `None` for cancelled events, events without an id, and events
/// whose times cannot be parsed.
fn convert_event(event: ApiEvent, calendar_id: &str) -> Option<Event> {
    if event.status.as_deref() == Some("cancelled") {
        return None;
    }

    let id = event.id?;
    let start = event.start.to_event_time(&id, "start")?;
    let end = match (event.end.to_event_time(&id, "end")?, &start) {
        // The API's all-day end date is exclusive.
        (EventTime::AllDay(end), EventTime::AllDay(first)) => {
            EventTime::AllDay(end.pred_opt().unwrap_or(end).max(*first))
        }
        (end, _) => end,
    };

    let summary = event
        .summary
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| UNTITLED_EVENT.to_string());

    let attendees = event
        .attendees
        .unwrap_or_default()
        .into_iter()
        .filter_map(|a| {
            Some(Attendee {
                email: a.email?,
                display_name: a.display_name,
                response_status: a.response_status.as_deref().map(ResponseStatus::parse),
            })
        })
        .collect();

    Some(Event {
        id,
        calendar_id: calendar_id.to_string(),
        summary,
        description: event.description,
        location: event.location,
        start,
        end,
        time_zone: event.start.time_zone,
        attendees,
        recurring_event_id: event.recurring_event_id,
        color_id: event.color_id,
        created: event.created.as_deref().and_then(parse_timestamp),
        updated: event.updated.as_deref().and_then(parse_timestamp),
        html_link: event.html_link,
    })
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// Response from the events.list endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<ApiEvent>,
    next_page_token: Option<String>,
    next_sync_token: Option<String>,
}

/// A single event from the Google Calendar API.
///
/// Cancelled entries in incremental responses carry little more than an id
/// and status, so everything else is optional.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEvent {
    id: Option<String>,
    status: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    location: Option<String>,
    #[serde(default)]
    start: ApiEventTime,
    #[serde(default)]
    end: ApiEventTime,
    attendees: Option<Vec<ApiAttendee>>,
    recurring_event_id: Option<String>,
    color_id: Option<String>,
    created: Option<String>,
    updated: Option<String>,
    html_link: Option<String>,
}

/// Event time on the wire: `date` for all-day events, `dateTime` otherwise.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_zone: Option<String>,
}

impl ApiEventTime {
    fn to_event_time(&self, event_id: &str, which: &str) -> Option<EventTime> {
        match (&self.date_time, &self.date) {
            (Some(dt), _) => DateTime::parse_from_rfc3339(dt)
                .map(EventTime::from_local)
                .map_err(|e| warn!("event {}: failed to parse {} time: {}", event_id, which, e))
                .ok(),
            (None, Some(date)) => NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map(EventTime::AllDay)
                .map_err(|e| warn!("event {}: failed to parse {} date: {}", event_id, which, e))
                .ok(),
            (None, None) => {
                warn!("event {} has no {} time", event_id, which);
                None
            }
        }
    }

    fn from_event_time(time: &EventTime, time_zone: Option<&str>) -> Self {
        match time {
            EventTime::DateTime(dt) => Self {
                date: None,
                date_time: Some(dt.to_rfc3339()),
                time_zone: time_zone.map(String::from),
            },
            EventTime::AllDay(date) => Self {
                date: Some(date.format("%Y-%m-%d").to_string()),
                date_time: None,
                time_zone: None,
            },
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiAttendee {
    email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_status: Option<String>,
}

/// Request body for events.insert and events.update.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventResource {
    summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    start: ApiEventTime,
    end: ApiEventTime,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attendees: Vec<ApiAttendee>,
    #[serde(skip_serializing_if = "Option::is_none")]
    color_id: Option<String>,
}

impl EventResource {
    fn from_input(input: &EventInput) -> Self {
        let tz = input.time_zone.as_deref();
        let end = match (&input.start, &input.end) {
            // Back to the exclusive end date the API expects.
            (EventTime::AllDay(_), EventTime::AllDay(last)) => {
                EventTime::AllDay(last.succ_opt().unwrap_or(*last))
            }
            (_, end) => end.clone(),
        };

        Self {
            summary: input.summary.clone(),
            description: input.description.clone(),
            location: input.location.clone(),
            start: ApiEventTime::from_event_time(&input.start, tz),
            end: ApiEventTime::from_event_time(&end, tz),
            attendees: input
                .attendees
                .iter()
                .map(|a| ApiAttendee {
                    email: Some(a.email.clone()),
                    display_name: a.display_name.clone(),
                    response_status: a.response_status.map(|s| s.as_str().to_string()),
                })
                .collect(),
            color_id: input.color_id.clone(),
        }
    }
}

/// Response from the calendarList endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarListResponse {
    #[serde(default)]
    items: Vec<CalendarListEntry>,
    next_page_token: Option<String>,
}

/// A calendar from the calendar list.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarListEntry {
    id: String,
    summary: Option<String>,
    summary_override: Option<String>,
    description: Option<String>,
    #[serde(default)]
    primary: bool,
    background_color: Option<String>,
    foreground_color: Option<String>,
}

impl CalendarListEntry {
    fn into_calendar(self) -> Calendar {
        let name = self
            .summary_override
            .or(self.summary)
            .unwrap_or_else(|| self.id.clone());
        Calendar {
            id: self.id,
            name,
            description: self.description,
            background_color: self.background_color,
            foreground_color: self.foreground_color,
            primary: self.primary,
            selected: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn parse(json: &str) -> ApiEvent {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn parse_event_list_response() {
        let json = r#"{
            "items": [
                {
                    "id": "event1",
                    "summary": "Test Meeting",
                    "start": {"dateTime": "2024-03-15T10:00:00Z"},
                    "end": {"dateTime": "2024-03-15T11:00:00Z"},
                    "status": "confirmed"
                },
                {"id": "gone", "status": "cancelled"}
            ],
            "nextSyncToken": "sync-abc"
        }"#;

        let response: EventListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.items.len(), 2);
        assert_eq!(response.next_sync_token.as_deref(), Some("sync-abc"));
        assert!(response.next_page_token.is_none());
        assert!(response.items[1].start.date_time.is_none());
    }

    #[test]
    fn convert_timed_event() {
        let event = parse(
            r#"{
                "id": "e1",
                "summary": "Standup",
                "start": {"dateTime": "2024-01-15T09:00:00-05:00", "timeZone": "America/New_York"},
                "end": {"dateTime": "2024-01-15T09:30:00-05:00"},
                "attendees": [
                    {"email": "a@example.com", "responseStatus": "accepted"},
                    {"displayName": "no email"}
                ],
                "recurringEventId": "series",
                "colorId": "5",
                "created": "2024-01-01T00:00:00.000Z",
                "htmlLink": "https://calendar.google.com/event?eid=e1"
            }"#,
        );

        let converted = convert_event(event, "primary").unwrap();
        assert_eq!(converted.id, "e1");
        assert_eq!(converted.calendar_id, "primary");
        assert_eq!(
            converted.start,
            EventTime::DateTime(Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 0).unwrap())
        );
        assert_eq!(converted.time_zone.as_deref(), Some("America/New_York"));
        assert_eq!(converted.attendees.len(), 1);
        assert_eq!(
            converted.attendees[0].response_status,
            Some(ResponseStatus::Accepted)
        );
        assert_eq!(converted.recurring_event_id.as_deref(), Some("series"));
        assert_eq!(converted.color_id.as_deref(), Some("5"));
        assert!(converted.created.is_some());
        assert!(converted.updated.is_none());
    }

    #[test]
    fn convert_all_day_event_makes_end_inclusive() {
        let event = parse(
            r#"{
                "id": "offsite",
                "summary": "Offsite",
                "start": {"date": "2024-03-01"},
                "end": {"date": "2024-03-04"}
            }"#,
        );
        let converted = convert_event(event, "primary").unwrap();
        assert_eq!(converted.start, EventTime::AllDay(date(2024, 3, 1)));
        assert_eq!(converted.end, EventTime::AllDay(date(2024, 3, 3)));

        let single = parse(
            r#"{"id": "d", "start": {"date": "2024-03-01"}, "end": {"date": "2024-03-02"}}"#,
        );
        let converted = convert_event(single, "primary").unwrap();
        assert_eq!(converted.end, EventTime::AllDay(date(2024, 3, 1)));
    }

    #[test]
    fn convert_applies_defaults_and_drops_unusable() {
        let untitled = parse(
            r#"{"id": "x", "summary": "  ", "start": {"date": "2024-03-01"}, "end": {"date": "2024-03-02"}}"#,
        );
        assert_eq!(
            convert_event(untitled, "primary").unwrap().summary,
            UNTITLED_EVENT
        );

        let no_id = parse(r#"{"start": {"date": "2024-03-01"}, "end": {"date": "2024-03-02"}}"#);
        assert!(convert_event(no_id, "primary").is_none());

        let cancelled = parse(r#"{"id": "c", "status": "cancelled"}"#);
        assert!(convert_event(cancelled, "primary").is_none());

        let bad_time = parse(
            r#"{"id": "b", "start": {"dateTime": "yesterday"}, "end": {"dateTime": "2024-03-01T10:00:00Z"}}"#,
        );
        assert!(convert_event(bad_time, "primary").is_none());
    }

    #[test]
    fn event_resource_uses_exclusive_all_day_end() {
        let input = EventInput::new(
            "Offsite",
            EventTime::AllDay(date(2024, 3, 1)),
            EventTime::AllDay(date(2024, 3, 3)),
        );
        let json = serde_json::to_value(EventResource::from_input(&input)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "summary": "Offsite",
                "start": {"date": "2024-03-01"},
                "end": {"date": "2024-03-04"}
            })
        );
    }

    #[test]
    fn event_resource_timed_with_zone_and_attendees() {
        let mut input = EventInput::new(
            "Standup",
            EventTime::DateTime(Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 0).unwrap()),
            EventTime::DateTime(Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 0).unwrap()),
        );
        input.time_zone = Some("America/New_York".into());
        input.location = Some("Room 1".into());
        input.attendees = vec![Attendee::new("a@example.com")];

        let json = serde_json::to_value(EventResource::from_input(&input)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "summary": "Standup",
                "location": "Room 1",
                "start": {"dateTime": "2024-01-15T14:00:00+00:00", "timeZone": "America/New_York"},
                "end": {"dateTime": "2024-01-15T14:30:00+00:00", "timeZone": "America/New_York"},
                "attendees": [{"email": "a@example.com"}]
            })
        );
    }

    #[test]
    fn list_query_full_and_incremental() {
        let window = TimeWindow::new(
            Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 29, 0, 0, 0).unwrap(),
        );

        let full = list_events_query(&window, None, None);
        let keys: Vec<&str> = full.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            vec!["singleEvents", "maxResults", "timeMin", "timeMax", "orderBy"]
        );
        assert_eq!(full[2].1, "2024-01-08T00:00:00+00:00");

        let incremental = list_events_query(&window, Some("tok"), Some("page-2"));
        assert!(incremental.contains(&("syncToken", "tok".to_string())));
        assert!(incremental.contains(&("pageToken", "page-2".to_string())));
        assert!(!incremental.iter().any(|(k, _)| *k == "timeMin" || *k == "orderBy"));
    }

    #[test]
    fn parse_calendar_list() {
        let json = r##"{
            "items": [
                {
                    "id": "me@example.com",
                    "summary": "My Calendar",
                    "primary": true,
                    "backgroundColor": "#9fe1e7"
                },
                {
                    "id": "team@example.com",
                    "summary": "Team",
                    "summaryOverride": "Work"
                }
            ],
            "nextPageToken": "p2"
        }"##;

        let response: CalendarListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.next_page_token.as_deref(), Some("p2"));
        let calendars: Vec<Calendar> = response
            .items
            .into_iter()
            .map(CalendarListEntry::into_calendar)
            .collect();
        assert!(calendars[0].primary);
        assert!(!calendars[0].selected);
        assert_eq!(calendars[0].background_color.as_deref(), Some("#9fe1e7"));
        assert_eq!(calendars[1].name, "Work");
    }

    #[test]
    fn error_body_message() {
        let body = r#"{"error": {"code": 400, "message": "Invalid time range", "errors": []}}"#;
        assert_eq!(api_error_message(body), "Invalid time range");
        assert_eq!(api_error_message(" plain text \n"), "plain text");
    }

    #[test]
    fn client_urls_encode_ids() {
        let config = GoogleConfig::new(crate::google::OAuthCredentials::new(
            "id.apps.googleusercontent.com",
            "secret",
        ));
        let client = GoogleCalendarClient::new(&config)
            .unwrap()
            .with_base_url("http://localhost:9999/");
        assert_eq!(
            client.event_url("team@example.com", "abc"),
            "http://localhost:9999/calendars/team%40example.com/events/abc"
        );
        assert_eq!(client.retry_policy(), RetryPolicy::default());
    }
}
