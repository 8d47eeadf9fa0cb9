//! Flat-file calendar store.
//!
//! The calendar is one JSON document: `{"events": [...]}`. Events are kept
//! in file order; nothing guarantees they are sorted by time. Writes are a
//! full rewrite through a temp file + rename, so the document is either
//! fully replaced or left untouched.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::StoreError;

/// Status of a booked interval. Cancellation is a status change, never a
/// deletion — the record stays for auditability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    #[default]
    Active,
    Cancelled,
}

impl EventStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// One booked interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub requester: String,
    /// Timestamp as stored text; parsed at check time so a corrupt record
    /// aborts the check instead of being skipped.
    pub start: String,
    /// Duration in minutes.
    pub duration: i64,
    pub message: String,
    /// Omitted on disk while active, so a calendar that has never seen a
    /// cancellation keeps the minimal document format.
    #[serde(default, skip_serializing_if = "EventStatus::is_active")]
    pub status: EventStatus,
}

impl CalendarEvent {
    pub fn new(
        requester: impl Into<String>,
        start: DateTime<Utc>,
        duration: i64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            requester: requester.into(),
            start: start.to_rfc3339(),
            duration,
            message: message.into(),
            status: EventStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// The half-open interval `[start, start + duration)`.
    pub fn interval(&self) -> Result<(DateTime<Utc>, DateTime<Utc>), StoreError> {
        let start = parse_timestamp(&self.start)?;
        Ok((start, start + chrono::Duration::minutes(self.duration)))
    }
}

/// Parse a stored or caller-supplied timestamp.
///
/// Accepts RFC 3339 (`2024-01-01T10:00:00Z`) and the offset-less ISO-8601
/// form (`2024-01-01T10:00:00`), which is read as UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|_| StoreError::InvalidTimestamp {
            value: value.to_string(),
        })
}

/// Half-open interval overlap: two intervals share at least one instant.
pub fn overlaps(a: (DateTime<Utc>, DateTime<Utc>), b: (DateTime<Utc>, DateTime<Utc>)) -> bool {
    a.0 < b.1 && a.1 > b.0
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CalendarDocument {
    #[serde(default)]
    events: Vec<CalendarEvent>,
}

/// Durable collection of booked intervals for one owner.
pub struct CalendarStore {
    path: PathBuf,
}

impl CalendarStore {
    /// Create a store backed by the document at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all events in file order. A missing file is an empty calendar;
    /// unparseable content is `CorruptStorage` and the caller decides
    /// whether to rebuild or abort.
    pub async fn load(&self) -> Result<Vec<CalendarEvent>, StoreError> {
        match fs::read_to_string(&self.path).await {
            Ok(raw) => serde_json::from_str::<CalendarDocument>(&raw)
                .map(|doc| doc.events)
                .map_err(|e| StoreError::CorruptStorage {
                    path: self.path.clone(),
                    reason: e.to_string(),
                }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the whole document. Write goes through a temp file + rename
    /// so the store is unchanged on any failure.
    pub async fn persist(&self, events: &[CalendarEvent]) -> Result<(), StoreError> {
        let doc = CalendarDocument {
            events: events.to_vec(),
        };
        let raw = serde_json::to_string_pretty(&doc)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, raw).await?;
        fs::rename(&tmp, &self.path).await?;
        tracing::debug!(path = %self.path.display(), count = events.len(), "Persisted calendar");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, min, 0).unwrap()
    }

    #[test]
    fn parse_timestamp_accepts_rfc3339_and_naive_iso() {
        assert_eq!(parse_timestamp("2024-01-01T10:00:00Z").unwrap(), at(10, 0));
        assert_eq!(parse_timestamp("2024-01-01T10:00:00").unwrap(), at(10, 0));
        assert!(parse_timestamp("next tuesday").is_err());
    }

    #[test]
    fn overlap_is_symmetric() {
        let a = (at(10, 0), at(10, 30));
        let b = (at(10, 15), at(10, 45));
        assert!(overlaps(a, b));
        assert!(overlaps(b, a));
    }

    #[test]
    fn disjoint_and_abutting_intervals_do_not_overlap() {
        let a = (at(10, 0), at(10, 30));
        let abutting = (at(10, 30), at(10, 45));
        let disjoint = (at(11, 0), at(12, 0));
        assert!(!overlaps(a, abutting));
        assert!(!overlaps(abutting, a));
        assert!(!overlaps(a, disjoint));
        assert!(!overlaps(disjoint, a));
    }

    #[tokio::test]
    async fn load_missing_file_is_empty_calendar() {
        let dir = tempfile::tempdir().unwrap();
        let store = CalendarStore::new(dir.path().join("calendar.json"));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn load_corrupt_document_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calendar.json");
        tokio::fs::write(&path, "{not json").await.unwrap();

        let store = CalendarStore::new(&path);
        match store.load().await {
            Err(StoreError::CorruptStorage { .. }) => {}
            other => panic!("expected CorruptStorage, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn persist_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = CalendarStore::new(dir.path().join("calendar.json"));

        let events = vec![
            CalendarEvent::new("alice", at(10, 0), 30, "sync"),
            CalendarEvent::new("carol", at(10, 30), 15, "standup"),
        ];
        store.persist(&events).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, events);
    }

    #[tokio::test]
    async fn active_events_serialize_without_status_field() {
        let dir = tempfile::tempdir().unwrap();
        let store = CalendarStore::new(dir.path().join("calendar.json"));

        store
            .persist(&[CalendarEvent::new("alice", at(10, 0), 30, "sync")])
            .await
            .unwrap();

        let raw = tokio::fs::read_to_string(store.path()).await.unwrap();
        assert!(!raw.contains("status"));

        let mut cancelled = CalendarEvent::new("alice", at(11, 0), 30, "sync");
        cancelled.status = EventStatus::Cancelled;
        store.persist(&[cancelled]).await.unwrap();

        let raw = tokio::fs::read_to_string(store.path()).await.unwrap();
        assert!(raw.contains("cancelled"));
    }

    #[tokio::test]
    async fn minimal_document_without_status_loads_as_active() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calendar.json");
        let raw = r#"{"events": [{"requester": "alice", "start": "2024-01-01T10:00:00", "duration": 30, "message": "sync"}]}"#;
        tokio::fs::write(&path, raw).await.unwrap();

        let loaded = CalendarStore::new(&path).load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded[0].is_active());
    }

    #[test]
    fn interval_surfaces_corrupt_start() {
        let event = CalendarEvent {
            requester: "alice".to_string(),
            start: "not-a-time".to_string(),
            duration: 30,
            message: "sync".to_string(),
            status: EventStatus::Active,
        };
        assert!(matches!(
            event.interval(),
            Err(StoreError::InvalidTimestamp { .. })
        ));
    }
}
