//! Application state and calendar synchronization.
//!
//! ```text
//!   front end ──► SyncEngine ──► CalendarApi (Google)
//!      ▲             │  │
//!      │             │  └──► TokenManager, RateLimiter
//!      │             ▼
//!      └──watch── Store ──► StateFile, KeyValueStore
//! ```
//!
//! The [`Store`] holds everything a front end renders and notifies
//! subscribers on each change. The [`SyncEngine`] fills it from the calendar
//! API: calendar lists, incremental or full event fetches per calendar, and
//! event create/update/delete followed by a full resync.

pub mod error;
pub mod orchestrator;
pub mod records;
pub mod store;

pub use error::{SyncError, SyncErrorKind, SyncResult};
pub use orchestrator::{PRIMARY_CALENDAR_ID, SyncEngine, SyncReport, apply_delta, merge_selection};
pub use records::{StateFile, SyncRecord, SyncRecords, SyncSnapshot};
pub use store::{AppState, PassResult, Store};
