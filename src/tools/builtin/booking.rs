//! Meeting booking tools.
//!
//! The contract to the model is deliberately coarse: every call resolves
//! to exactly one of the literal tokens `SUCCESS`, `CONFLICT`, or `ERROR`,
//! with no structured error detail.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::calendar::{BookingOutcome, BookingService, parse_timestamp};
use crate::tools::tool::{Tool, ToolContext, ToolError, ToolOutput, require_i64, require_str};

/// Tool that books a meeting slot on the shared calendar.
pub struct BookMeetingTool {
    booking: Arc<BookingService>,
}

impl BookMeetingTool {
    pub fn new(booking: Arc<BookingService>) -> Self {
        Self { booking }
    }
}

#[async_trait]
impl Tool for BookMeetingTool {
    fn name(&self) -> &str {
        "book_meeting"
    }

    fn description(&self) -> &str {
        "Book a meeting slot on the calendar. Returns SUCCESS when the slot \
         was reserved, CONFLICT when it overlaps an existing booking, and \
         ERROR when the request was invalid or the calendar could not be \
         read or written."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "requester": {
                    "type": "string",
                    "description": "Who the meeting is for"
                },
                "start": {
                    "type": "string",
                    "description": "Start time as an ISO-8601 timestamp, e.g. 2024-01-01T10:00:00"
                },
                "duration": {
                    "type": "integer",
                    "description": "Meeting length in minutes (must be positive)"
                },
                "message": {
                    "type": "string",
                    "description": "Short note about the meeting"
                }
            },
            "required": ["requester", "start", "duration"]
        })
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        _ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let started = Instant::now();
        let requester = require_str(&params, "requester")?;
        let start_raw = require_str(&params, "start")?;
        let duration = require_i64(&params, "duration")?;
        let message = params
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("");

        let start = match parse_timestamp(start_raw) {
            Ok(start) => start,
            Err(e) => {
                tracing::warn!(start = start_raw, error = %e, "Rejected booking request");
                return Ok(ToolOutput::text("ERROR", started.elapsed()));
            }
        };

        let outcome = self.booking.book(requester, start, duration, message).await;
        if let BookingOutcome::Error(ref e) = outcome {
            tracing::warn!(requester, error = %e, "Booking failed");
        }
        Ok(ToolOutput::text(outcome.as_token(), started.elapsed()))
    }
}

/// Tool that cancels a previously booked slot.
pub struct CancelMeetingTool {
    booking: Arc<BookingService>,
}

impl CancelMeetingTool {
    pub fn new(booking: Arc<BookingService>) -> Self {
        Self { booking }
    }
}

#[async_trait]
impl Tool for CancelMeetingTool {
    fn name(&self) -> &str {
        "cancel_meeting"
    }

    fn description(&self) -> &str {
        "Cancel an existing booking. The slot becomes free again; the \
         booking record is kept with a cancelled status. Returns SUCCESS \
         or ERROR."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "requester": {
                    "type": "string",
                    "description": "Who booked the meeting"
                },
                "start": {
                    "type": "string",
                    "description": "Start time of the booking to cancel, ISO-8601"
                }
            },
            "required": ["requester", "start"]
        })
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        _ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let started = Instant::now();
        let requester = require_str(&params, "requester")?;
        let start_raw = require_str(&params, "start")?;

        let start = match parse_timestamp(start_raw) {
            Ok(start) => start,
            Err(e) => {
                tracing::warn!(start = start_raw, error = %e, "Rejected cancel request");
                return Ok(ToolOutput::text("ERROR", started.elapsed()));
            }
        };

        let outcome = self.booking.cancel(requester, start).await;
        if let BookingOutcome::Error(ref e) = outcome {
            tracing::warn!(requester, error = %e, "Cancel failed");
        }
        Ok(ToolOutput::text(outcome.as_token(), started.elapsed()))
    }
}
