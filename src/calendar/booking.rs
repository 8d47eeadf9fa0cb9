//! Booking decisions over the calendar store.
//!
//! The service owns a mutex spanning the whole load-check-write sequence,
//! so two concurrent bookings against the same calendar serialize instead
//! of both passing the conflict check.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::calendar::store::{CalendarEvent, CalendarStore, overlaps};
use crate::error::BookingError;

/// Terminal outcome of a booking request. Conflicts are expected, common
/// results, not failures.
#[derive(Debug)]
pub enum BookingOutcome {
    Success,
    Conflict,
    Error(BookingError),
}

impl BookingOutcome {
    /// The coarse-grained literal surfaced to tool callers.
    pub fn as_token(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Conflict => "CONFLICT",
            Self::Error(_) => "ERROR",
        }
    }
}

/// Commits or rejects requested intervals against one owner's calendar.
///
/// The store is passed in at construction; tests build isolated stores in
/// temp dirs.
pub struct BookingService {
    store: Arc<CalendarStore>,
    write_lock: Mutex<()>,
}

impl BookingService {
    pub fn new(store: Arc<CalendarStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<CalendarStore> {
        &self.store
    }

    /// Book `[start, start + duration)` for `requester`.
    ///
    /// The first conflicting active interval short-circuits the check. An
    /// unparseable stored start aborts the whole booking — a corrupt
    /// record must not create an overlap blind spot.
    pub async fn book(
        &self,
        requester: &str,
        start: DateTime<Utc>,
        duration: i64,
        message: &str,
    ) -> BookingOutcome {
        if duration <= 0 {
            return BookingOutcome::Error(BookingError::InvalidRequest(format!(
                "duration must be positive, got {duration}"
            )));
        }

        let _guard = self.write_lock.lock().await;

        let events = match self.store.load().await {
            Ok(events) => events,
            Err(e) => return BookingOutcome::Error(e.into()),
        };

        let requested = (start, start + chrono::Duration::minutes(duration));
        for event in events.iter().filter(|e| e.is_active()) {
            let existing = match event.interval() {
                Ok(interval) => interval,
                Err(e) => return BookingOutcome::Error(e.into()),
            };
            if overlaps(requested, existing) {
                tracing::debug!(
                    requester,
                    %start,
                    held_by = %event.requester,
                    "Booking conflict"
                );
                return BookingOutcome::Conflict;
            }
        }

        let mut updated = events;
        updated.push(CalendarEvent::new(requester, start, duration, message));
        match self.store.persist(&updated).await {
            Ok(()) => {
                tracing::info!(requester, %start, duration, "Booked meeting");
                BookingOutcome::Success
            }
            Err(e) => BookingOutcome::Error(e.into()),
        }
    }

    /// Cancel the active booking at `start` held by `requester`.
    ///
    /// The event's status flips to cancelled; the record is never removed.
    pub async fn cancel(&self, requester: &str, start: DateTime<Utc>) -> BookingOutcome {
        let _guard = self.write_lock.lock().await;

        let mut events = match self.store.load().await {
            Ok(events) => events,
            Err(e) => return BookingOutcome::Error(e.into()),
        };

        let mut found = false;
        for event in events.iter_mut().filter(|e| e.is_active()) {
            let (event_start, _) = match event.interval() {
                Ok(interval) => interval,
                Err(e) => return BookingOutcome::Error(e.into()),
            };
            if event.requester == requester && event_start == start {
                event.status = crate::calendar::store::EventStatus::Cancelled;
                found = true;
                break;
            }
        }

        if !found {
            return BookingOutcome::Error(BookingError::InvalidRequest(format!(
                "no active booking for {requester} at {start}"
            )));
        }

        match self.store.persist(&events).await {
            Ok(()) => {
                tracing::info!(requester, %start, "Cancelled meeting");
                BookingOutcome::Success
            }
            Err(e) => BookingOutcome::Error(e.into()),
        }
    }
}
