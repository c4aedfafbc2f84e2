use async_trait::async_trait;
use thiserror::Error;

use super::models::NotifyRequest;

pub mod webhook;

#[derive(Error, Debug)]
pub enum SenderError {
    #[error("webhook unreachable: {0}")]
    Unreachable(String),
    #[error("webhook rejected the message with status {0}")]
    Rejected(u16),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid configuration for sender: {0}")]
    InvalidConfiguration(String),
}

/// Delivers an already formatted message to a chat webhook.
///
/// Implementations make exactly one attempt per call.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, webhook_url: &str, message: &NotifyRequest) -> Result<(), SenderError>;
}
