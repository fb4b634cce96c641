//! Calendar API access for calmirror.
//!
//! - [`CalendarApi`] - the operations the sync layer needs from a backend
//! - [`RateLimiter`] - sliding-window request quota
//! - [`RetryPolicy`] - bounded exponential backoff for transient failures
//! - [`ProviderError`] - error taxonomy shared by all of the above
//! - [`google`] - the Google Calendar implementation, OAuth and token lifecycle
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ensure_valid_token()   ┌──────────────┐
//! │ TokenManager │ ◄──────────────────────  │  sync layer  │
//! └──────┬───────┘                          └──────┬───────┘
//!        │ refresh                                 │ acquire() / CalendarApi
//!        ▼                                         ▼
//! ┌──────────────┐                 ┌─────────────┐ ┌──────────────────────┐
//! │ OAuthClient  │                 │ RateLimiter │ │ GoogleCalendarClient │
//! └──────────────┘                 └─────────────┘ └──────────┬───────────┘
//!                                                             │ RetryPolicy
//!                                                             ▼
//!                                                   Google Calendar API v3
//! ```

pub mod api;
pub mod error;
pub mod google;
pub mod rate_limit;
pub mod retry;

pub use api::{BoxFuture, CalendarApi, EventPage};
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use rate_limit::RateLimiter;
pub use retry::RetryPolicy;
