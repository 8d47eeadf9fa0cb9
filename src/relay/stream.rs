//! In-process response stream sink backed by a bounded channel.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::RelayError;
use crate::relay::EventSink;
use crate::task::event::TaskStatusUpdate;

/// Delivers updates into an mpsc channel the caller consumes as a stream.
pub struct StreamSink {
    tx: mpsc::Sender<TaskStatusUpdate>,
}

impl StreamSink {
    /// Create a sink and the stream that receives its updates.
    pub fn channel(capacity: usize) -> (Self, ReceiverStream<TaskStatusUpdate>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, ReceiverStream::new(rx))
    }
}

#[async_trait]
impl EventSink for StreamSink {
    fn name(&self) -> &str {
        "stream"
    }

    async fn deliver(&self, update: &TaskStatusUpdate) -> Result<(), RelayError> {
        self.tx
            .send(update.clone())
            .await
            .map_err(|_| RelayError::Closed)
    }
}
