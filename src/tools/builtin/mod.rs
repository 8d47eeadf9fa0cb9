//! Built-in tools.

pub mod booking;

pub use booking::{BookMeetingTool, CancelMeetingTool};
