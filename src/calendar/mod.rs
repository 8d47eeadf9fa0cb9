//! Calendar persistence and booking decisions.

pub mod booking;
pub mod store;

pub use booking::{BookingOutcome, BookingService};
pub use store::{CalendarEvent, CalendarStore, EventStatus, overlaps, parse_timestamp};
