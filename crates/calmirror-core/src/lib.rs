//! Core types: events, calendars, views, validation, storage, formatting

pub mod event;
pub mod format;
pub mod keymap;
pub mod storage;
pub mod theme;
pub mod time;
pub mod tracing;
pub mod validate;
pub mod view;

pub use event::{
    Attendee, Calendar, DEFAULT_CALENDAR_COLOR, Event, EventInput, ResponseStatus,
    UNTITLED_EVENT, calendar_color, events_on,
};
pub use format::{AgendaOptions, format_agenda, format_event_time, format_view_title};
pub use keymap::{KeyChord, ParseChordError, Shortcut};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError, StorageResult};
pub use theme::{ParseThemeError, Theme};
pub use time::{EventTime, TimeWindow, local_midnight};
pub use self::tracing::{LogFormat, TracingConfig, TracingError, init_tracing};
pub use validate::{EventDraft, Field, FieldError, ValidDraft, ValidationErrors};
pub use view::{
    CalendarView, DateRange, Direction, MAX_SYNC_BUFFER_DAYS, ParseViewError, SYNC_BUFFER_DAYS,
};
