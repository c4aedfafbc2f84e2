use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use super::formatter::format_message;
use super::models::NotifyRequest;
use super::payload::PayloadError;
use super::senders::{NotificationSender, SenderError};
use crate::registry::{AuthError, ConfigError, RelayConfig, Registry, Token};

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error(transparent)]
    Payload(#[from] PayloadError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Error sending message : {0}")]
    Sender(#[from] SenderError),
}

/// Messages relayed and failures seen since the last self notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayStats {
    pub messages: u64,
    pub errors: u64,
    pub since: DateTime<Utc>,
}

impl RelayStats {
    fn new(since: DateTime<Utc>) -> Self {
        Self {
            messages: 0,
            errors: 0,
            since,
        }
    }
}

/// Owns the published registry generation and relays messages through it.
///
/// The registry lock is only held long enough to clone the current `Arc`;
/// outbound webhook calls run without any lock so one slow endpoint cannot
/// stall every other request.
pub struct RelayService {
    registry: RwLock<Arc<Registry>>,
    sender: Arc<dyn NotificationSender>,
    stats: Mutex<RelayStats>,
}

impl RelayService {
    pub fn new(registry: Registry, sender: Arc<dyn NotificationSender>) -> Self {
        Self {
            registry: RwLock::new(Arc::new(registry)),
            sender,
            stats: Mutex::new(RelayStats::new(Utc::now())),
        }
    }

    /// The registry generation currently published.
    pub async fn snapshot(&self) -> Arc<Registry> {
        self.registry.read().await.clone()
    }

    /// Resolves, formats and forwards one message against `registry`.
    pub async fn relay(
        &self,
        registry: &Registry,
        client_token: &Token,
        channel: &str,
        request: NotifyRequest,
    ) -> Result<(), NotificationError> {
        let (client, channel) = registry.resolve(client_token, channel)?;
        let message = format_message(request, client);

        debug!(client = %client.name, channel = %channel.name, "Relaying message.");
        self.sender.send(&channel.webhook_url, &message).await?;
        info!(client = %client.name, channel = %channel.name, "Message relayed.");
        Ok(())
    }

    /// Counts one handled request.
    pub async fn record(&self, success: bool) {
        let mut stats = self.stats.lock().await;
        if success {
            stats.messages += 1;
        } else {
            stats.errors += 1;
        }
    }

    pub async fn stats(&self) -> RelayStats {
        self.stats.lock().await.clone()
    }

    /// Builds a registry from `config` and publishes it.
    ///
    /// On error the current generation stays in place untouched.
    pub async fn reload(&self, config: &RelayConfig) -> Result<Arc<Registry>, ConfigError> {
        let registry = Arc::new(Registry::build(config)?);
        *self.registry.write().await = registry.clone();
        info!(
            clients = registry.client_count(),
            channels = registry.channel_count(),
            "Relay configuration reloaded."
        );
        Ok(registry)
    }

    pub async fn reload_from_file(&self, path: &Path) -> Result<Arc<Registry>, ConfigError> {
        let config = RelayConfig::load(path)?;
        self.reload(&config).await
    }

    /// Posts the liveness message to the self notify channel.
    ///
    /// Counters reported in the message are subtracted once it is delivered;
    /// on failure they are kept for the next attempt.
    pub async fn self_notify(&self) -> Result<(), NotificationError> {
        let registry = self.snapshot().await;
        let reported = self.stats().await;
        let now = Utc::now();

        let text = format!(
            "I'm still running. {} message(s) sent :tada:, {} error(s) :doh: since {}",
            reported.messages,
            reported.errors,
            format_elapsed(now - reported.since)
        );

        let self_token = registry.self_client().token.clone();
        self.relay(
            &registry,
            &self_token,
            registry.self_notify_channel(),
            NotifyRequest::from_text(text),
        )
        .await?;

        let mut stats = self.stats.lock().await;
        stats.messages = stats.messages.saturating_sub(reported.messages);
        stats.errors = stats.errors.saturating_sub(reported.errors);
        stats.since = now;
        Ok(())
    }

    /// Logs every published relay URL. Channel webhook URLs are never logged.
    pub async fn log_routes(&self) {
        let registry = self.snapshot().await;
        for route in registry.route_table() {
            info!(client = %route.client, channel = %route.channel, url = %route.relay_url, "Relay route.");
        }
    }

    pub async fn self_check_interval(&self) -> Duration {
        self.registry.read().await.self_check_interval()
    }
}

/// Renders a duration as `1h2m3s`, dropping leading zero units.
pub fn format_elapsed(elapsed: chrono::Duration) -> String {
    let total = elapsed.num_seconds().max(0);
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}
