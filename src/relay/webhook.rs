//! Push-notification sink — POSTs task updates to a webhook URL.

use async_trait::async_trait;

use crate::error::RelayError;
use crate::relay::EventSink;
use crate::task::event::TaskStatusUpdate;

/// Delivers updates as JSON POSTs to a caller-registered URL.
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl EventSink for WebhookSink {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn deliver(&self, update: &TaskStatusUpdate) -> Result<(), RelayError> {
        let response = self
            .client
            .post(&self.url)
            .json(update)
            .send()
            .await
            .map_err(|e| RelayError::DeliveryFailed {
                sink: "webhook".to_string(),
                reason: e.to_string(),
            })?;

        response
            .error_for_status()
            .map_err(|e| RelayError::DeliveryFailed {
                sink: "webhook".to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }
}
