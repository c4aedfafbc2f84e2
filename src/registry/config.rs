use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use super::SELF_CLIENT_NAME;

/// Paths served next to the notify route; the notify route may not shadow them.
pub const RESERVED_ROUTES: &[&str] = &["channels", "clients", "health"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read relay config at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse relay config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("secret must be specified")]
    MissingSecret,
    #[error("base url must be specified")]
    MissingBaseUrl,
    #[error("notify route must be specified")]
    MissingNotifyRoute,
    #[error("notify route '{0}' is invalid: it must be a single path segment not used by another route")]
    InvalidNotifyRoute(String),
    #[error("self notify channel must be specified")]
    MissingSelfNotifyChannel,
    #[error("self check every x hours must be greater than zero")]
    InvalidSelfCheckInterval,
    #[error("channel name must be specified")]
    ChannelMissingName,
    #[error("channel '{0}' must have a webhook url")]
    ChannelMissingWebhook(String),
    #[error("channel '{0}' is defined more than once")]
    DuplicateChannel(String),
    #[error("client name must be specified")]
    ClientMissingName,
    #[error("client '{0}' is defined more than once")]
    DuplicateClient(String),
    #[error("client name '{0}' is reserved")]
    ReservedClientName(String),
    #[error("client '{client}' allows unknown channel '{channel}'")]
    UnknownAuthorizedChannel { client: String, channel: String },
    #[error("self notify channel '{0}' does not exist")]
    UnknownSelfNotifyChannel(String),
    #[error("{kind} '{first}' and '{second}' derive the same token")]
    DuplicateToken {
        kind: &'static str,
        first: String,
        second: String,
    },
    #[error("self client cannot post to self notify channel '{0}'")]
    SelfClientNotEligible(String),
}

/// The relay document: shared secret, public base URL, channels and clients.
///
/// Unknown keys anywhere in the document are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub notify_route: String,
    #[serde(default)]
    pub self_notify_channel: String,
    #[serde(default)]
    pub self_check_every_x_hours: u64,
    #[serde(default)]
    pub channels: Vec<ChannelDefinition>,
    #[serde(default)]
    pub clients: Vec<ClientDefinition>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelDefinition {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub webhook_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientDefinition {
    #[serde(default)]
    pub name: String,
    /// Display prefix such as an emoji shortcode; may be empty.
    #[serde(default)]
    pub icon: String,
    /// Channels this client may post to. Empty means every channel.
    #[serde(default)]
    pub channels_allowed: Vec<String>,
}

impl RelayConfig {
    /// Reads, parses and validates the relay document at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: RelayConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the document for missing values, duplicates and dangling
    /// channel references. Token collisions are checked when the registry is
    /// built, since they depend on the derivation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        if self.base_url.is_empty() {
            return Err(ConfigError::MissingBaseUrl);
        }

        let route = self.notify_route.trim_matches('/');
        if route.is_empty() {
            return Err(ConfigError::MissingNotifyRoute);
        }
        if route.contains('/') || RESERVED_ROUTES.contains(&route) {
            return Err(ConfigError::InvalidNotifyRoute(self.notify_route.clone()));
        }

        if self.self_notify_channel.is_empty() {
            return Err(ConfigError::MissingSelfNotifyChannel);
        }
        if self.self_check_every_x_hours == 0 {
            return Err(ConfigError::InvalidSelfCheckInterval);
        }

        let mut channel_names = HashSet::new();
        for channel in &self.channels {
            if channel.name.is_empty() {
                return Err(ConfigError::ChannelMissingName);
            }
            if channel.webhook_url.is_empty() {
                return Err(ConfigError::ChannelMissingWebhook(channel.name.clone()));
            }
            if !channel_names.insert(channel.name.as_str()) {
                return Err(ConfigError::DuplicateChannel(channel.name.clone()));
            }
        }

        if !channel_names.contains(self.self_notify_channel.as_str()) {
            return Err(ConfigError::UnknownSelfNotifyChannel(
                self.self_notify_channel.clone(),
            ));
        }

        let mut client_names = HashSet::new();
        for client in &self.clients {
            if client.name.is_empty() {
                return Err(ConfigError::ClientMissingName);
            }
            if client.name == SELF_CLIENT_NAME {
                return Err(ConfigError::ReservedClientName(client.name.clone()));
            }
            if !client_names.insert(client.name.as_str()) {
                return Err(ConfigError::DuplicateClient(client.name.clone()));
            }
            if let Some(unknown) = client
                .channels_allowed
                .iter()
                .find(|name| !channel_names.contains(name.as_str()))
            {
                return Err(ConfigError::UnknownAuthorizedChannel {
                    client: client.name.clone(),
                    channel: unknown.clone(),
                });
            }
        }

        Ok(())
    }

    pub fn self_check_interval(&self) -> Duration {
        Duration::from_secs(self.self_check_every_x_hours.saturating_mul(3600))
    }
}
