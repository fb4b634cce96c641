//! Per-calendar sync records and the on-disk state snapshot.
//!
//! A [`SyncRecord`] remembers the token returned by the last successful
//! fetch of a calendar together with the window that fetch covered. The
//! [`StateFile`] persists calendars, events and records between runs so an
//! incremental fetch can resume where the previous process stopped.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use calmirror_core::storage::write_atomic;
use calmirror_core::{Calendar, Event, StorageError, StorageResult, TimeWindow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Current layout version of the state file.
pub const STATE_VERSION: u32 = 1;

/// Sync state of one calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRecord {
    pub sync_token: String,
    pub last_sync: DateTime<Utc>,
    /// Window of the full fetch the token descends from.
    #[serde(default)]
    pub window: Option<TimeWindow>,
}

impl SyncRecord {
    pub fn new(sync_token: impl Into<String>, window: TimeWindow) -> Self {
        Self {
            sync_token: sync_token.into(),
            last_sync: Utc::now(),
            window: Some(window),
        }
    }

    /// Returns true if the token can serve an incremental fetch of `window`.
    ///
    /// Records without a window were set by hand and are trusted.
    pub fn covers(&self, window: &TimeWindow) -> bool {
        self.window.as_ref().is_none_or(|w| w.covers(window))
    }
}

/// Sync records keyed by calendar id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncRecords(BTreeMap<String, SyncRecord>);

impl SyncRecords {
    pub fn get(&self, calendar_id: &str) -> Option<&SyncRecord> {
        self.0.get(calendar_id)
    }

    pub fn token(&self, calendar_id: &str) -> Option<&str> {
        self.0.get(calendar_id).map(|r| r.sync_token.as_str())
    }

    pub fn set(&mut self, calendar_id: impl Into<String>, record: SyncRecord) {
        self.0.insert(calendar_id.into(), record);
    }

    /// Removes the record of one calendar, returning true if one existed.
    pub fn clear(&mut self, calendar_id: &str) -> bool {
        self.0.remove(calendar_id).is_some()
    }

    pub fn clear_all(&mut self) {
        self.0.clear();
    }

    /// Keeps only the records whose calendar id satisfies `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.0.retain(|id, _| keep(id));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SyncRecord)> {
        self.0.iter().map(|(id, r)| (id.as_str(), r))
    }
}

/// Everything the store persists between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSnapshot {
    pub version: u32,
    #[serde(default)]
    pub calendars: Vec<Calendar>,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub sync_records: SyncRecords,
    pub saved_at: DateTime<Utc>,
}

impl SyncSnapshot {
    pub fn new(calendars: Vec<Calendar>, events: Vec<Event>, sync_records: SyncRecords) -> Self {
        Self {
            version: STATE_VERSION,
            calendars,
            events,
            sync_records,
            saved_at: Utc::now(),
        }
    }
}

/// JSON file holding a [`SyncSnapshot`].
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the snapshot. A missing file yields `None`; so does a snapshot
    /// written by a different layout version, which is discarded with a
    /// warning.
    pub fn load(&self) -> StorageResult<Option<SyncSnapshot>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no sync state file");
                return Ok(None);
            }
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let snapshot: SyncSnapshot =
            serde_json::from_str(&content).map_err(|source| StorageError::Parse {
                path: self.path.clone(),
                source,
            })?;

        if snapshot.version != STATE_VERSION {
            warn!(
                path = %self.path.display(),
                version = snapshot.version,
                "ignoring sync state with unknown version"
            );
            return Ok(None);
        }

        debug!(
            path = %self.path.display(),
            calendars = snapshot.calendars.len(),
            events = snapshot.events.len(),
            "loaded sync state"
        );
        Ok(Some(snapshot))
    }

    pub fn save(&self, snapshot: &SyncSnapshot) -> StorageResult<()> {
        let content = serde_json::to_vec_pretty(snapshot)?;
        write_atomic(&self.path, &content)
    }

    /// Deletes the file. A missing file is not an error.
    pub fn remove(&self) -> StorageResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Write {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calmirror_core::{EventInput, EventTime};
    use chrono::TimeZone;

    fn window(first_day: u32, last_day: u32) -> TimeWindow {
        TimeWindow::new(
            Utc.with_ymd_and_hms(2024, 3, first_day, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, last_day, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn record_covers_nested_window_only() {
        let record = SyncRecord::new("tok", window(1, 20));
        assert!(record.covers(&window(3, 10)));
        assert!(record.covers(&window(1, 20)));
        assert!(!record.covers(&window(15, 25)));

        let unbounded = SyncRecord {
            window: None,
            ..record
        };
        assert!(unbounded.covers(&window(15, 25)));
    }

    #[test]
    fn records_by_calendar() {
        let mut records = SyncRecords::default();
        records.set("primary", SyncRecord::new("a", window(1, 2)));
        records.set("work", SyncRecord::new("b", window(1, 2)));
        assert_eq!(records.token("primary"), Some("a"));
        assert_eq!(records.token("other"), None);

        records.retain(|id| id != "work");
        assert_eq!(records.len(), 1);
        assert!(records.clear("primary"));
        assert!(!records.clear("primary"));
        assert!(records.is_empty());
    }

    #[test]
    fn state_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let file = StateFile::new(dir.path().join("state").join("sync.json"));
        assert_eq!(file.load().unwrap(), None);

        let start = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();
        let input = EventInput::new(
            "Standup",
            EventTime::from_utc(start),
            EventTime::from_utc(start + chrono::Duration::minutes(15)),
        );
        let mut records = SyncRecords::default();
        records.set("primary", SyncRecord::new("tok-1", window(1, 20)));
        let snapshot = SyncSnapshot::new(
            vec![Calendar::new("primary", "Me").with_selected(true)],
            vec![Event::from_input("e1", "primary", input)],
            records,
        );

        file.save(&snapshot).unwrap();
        assert_eq!(file.load().unwrap(), Some(snapshot));

        file.remove().unwrap();
        file.remove().unwrap();
        assert_eq!(file.load().unwrap(), None);
    }

    #[test]
    fn state_file_ignores_other_versions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sync.json");
        fs::write(&path, r#"{"version": 99, "saved_at": "2024-03-01T00:00:00Z"}"#).unwrap();
        assert_eq!(StateFile::new(&path).load().unwrap(), None);
    }

    #[test]
    fn state_file_reports_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sync.json");
        fs::write(&path, "not json").unwrap();
        let err = StateFile::new(&path).load().unwrap_err();
        assert!(matches!(err, StorageError::Parse { .. }));
    }
}
