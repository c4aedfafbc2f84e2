use async_trait::async_trait;
use reqwest::{header, Client};
use std::time::Duration;
use tracing::{debug, warn};

use super::{NotificationSender, SenderError};
use crate::notifications::models::NotifyRequest;
use crate::version::user_agent;

/// Posts messages to Slack-style incoming webhooks.
#[derive(Debug, Clone)]
pub struct WebhookSender {
    client: Client,
    timeout: Duration,
}

impl WebhookSender {
    /// Builds a sender whose every call is bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, SenderError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent())
            .build()
            .map_err(|e| {
                SenderError::InvalidConfiguration(format!("failed to build HTTP client: {e}"))
            })?;
        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl NotificationSender for WebhookSender {
    async fn send(&self, webhook_url: &str, message: &NotifyRequest) -> Result<(), SenderError> {
        let body = serde_json::to_vec(message)?;

        let response = self
            .client
            .post(webhook_url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                // The webhook URL is the channel's secret; keep it out of errors.
                let e = e.without_url();
                if e.is_timeout() {
                    SenderError::Unreachable(format!(
                        "no response within {}s",
                        self.timeout.as_secs_f32()
                    ))
                } else {
                    SenderError::Unreachable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            warn!(status = %status, body = %error_body, "Webhook returned non-success status.");
            return Err(SenderError::Rejected(status.as_u16()));
        }

        debug!(status = %status, "Webhook accepted the message.");
        Ok(())
    }
}
