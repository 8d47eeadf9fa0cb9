//! Event relay — ordered delivery of task events to caller-supplied sinks.

pub mod stream;
pub mod webhook;

pub use stream::StreamSink;
pub use webhook::WebhookSink;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RelayError;
use crate::task::event::{TaskEvent, TaskStatusUpdate};

/// A caller-supplied delivery target for task events.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Sink name for diagnostics.
    fn name(&self) -> &str;

    /// Deliver one update. Implementations must not reorder.
    async fn deliver(&self, update: &TaskStatusUpdate) -> Result<(), RelayError>;
}

/// Forwards lifecycle events to sinks, preserving emission order.
///
/// Delivery is best-effort: a failure is logged and never aborts the task.
/// The lifecycle's own state is the source of truth, not sink
/// acknowledgment.
pub struct EventRelay {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl EventRelay {
    /// Relay into a single sink.
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self { sinks: vec![sink] }
    }

    /// Relay into several sinks, each receiving every event in order.
    pub fn with_sinks(sinks: Vec<Arc<dyn EventSink>>) -> Self {
        Self { sinks }
    }

    /// Forward one event to every sink, in order. Sequential awaits keep
    /// per-task ordering strict.
    pub async fn forward(&self, event: &TaskEvent) {
        tracing::trace!(
            task_id = %event.task_id,
            kind = ?event.kind,
            state = %event.state,
            "Relaying task event"
        );
        let update = event.to_update();
        for sink in &self.sinks {
            if let Err(e) = sink.deliver(&update).await {
                if event.is_final {
                    tracing::error!(
                        sink = sink.name(),
                        task_id = %event.task_id,
                        error = %e,
                        "Failed to deliver final task event; task remains terminal locally"
                    );
                } else {
                    tracing::warn!(
                        sink = sink.name(),
                        task_id = %event.task_id,
                        error = %e,
                        "Failed to deliver task event"
                    );
                }
            }
        }
    }
}
