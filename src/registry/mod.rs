use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Duration;

pub mod config;
pub mod resolver;
pub mod token;

pub use config::{ChannelDefinition, ClientDefinition, ConfigError, RelayConfig};
pub use resolver::AuthError;
pub use token::{derive_token, Token};

/// Name of the synthetic client the relay uses for its own notifications.
pub const SELF_CLIENT_NAME: &str = "self";

#[derive(Debug, Clone)]
pub struct Client {
    pub name: String,
    pub icon: String,
    /// Empty means every channel is allowed.
    pub authorized_channels: BTreeSet<String>,
    pub token: Token,
    /// Relay URL per channel this client may post to, keyed by channel name.
    pub webhooks: BTreeMap<String, String>,
}

impl Client {
    pub fn is_allowed_channel(&self, channel: &str) -> bool {
        self.authorized_channels.is_empty() || self.authorized_channels.contains(channel)
    }

    pub fn is_self(&self) -> bool {
        self.name == SELF_CLIENT_NAME
    }
}

#[derive(Debug, Clone)]
pub struct Channel {
    pub name: String,
    pub webhook_url: String,
    pub token: Token,
}

/// Public projection of a channel; never carries the token or webhook URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelSummary {
    pub name: String,
}

/// Public projection of a client; never carries the token or relay URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientSummary {
    pub name: String,
    pub channels_allowed: Vec<String>,
}

/// One client/channel pair and the relay URL published for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub client: String,
    pub channel: String,
    pub relay_url: String,
}

/// One immutable generation of clients and channels.
///
/// A registry is never mutated after [`Registry::build`]; a reload builds a
/// new one and swaps it in whole.
#[derive(Debug)]
pub struct Registry {
    notify_route: String,
    self_notify_channel: String,
    self_check_interval: Duration,
    clients_by_token: HashMap<Token, Client>,
    channels_by_name: HashMap<String, Channel>,
    channel_names_by_token: HashMap<Token, String>,
    self_client: Client,
}

impl Registry {
    pub fn build(config: &RelayConfig) -> Result<Self, ConfigError> {
        Self::build_with(config, derive_token)
    }

    /// Same as [`Registry::build`] with a custom token deriver.
    pub(crate) fn build_with<F>(config: &RelayConfig, derive: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str, &str) -> Token,
    {
        config.validate()?;

        let notify_route = config.notify_route.trim_matches('/').to_string();
        let base_url = config.base_url.trim_end_matches('/');

        let mut channels_by_name = HashMap::with_capacity(config.channels.len());
        let mut channel_names_by_token: HashMap<Token, String> =
            HashMap::with_capacity(config.channels.len());
        // Channel order from the document, used to build client webhooks.
        let mut ordered_channels = Vec::with_capacity(config.channels.len());

        for definition in &config.channels {
            let token = derive(&config.secret, &definition.name);
            if let Some(existing) = channel_names_by_token.get(&token) {
                return Err(ConfigError::DuplicateToken {
                    kind: "channel",
                    first: existing.clone(),
                    second: definition.name.clone(),
                });
            }
            channel_names_by_token.insert(token.clone(), definition.name.clone());
            ordered_channels.push((definition.name.clone(), token.clone()));
            channels_by_name.insert(
                definition.name.clone(),
                Channel {
                    name: definition.name.clone(),
                    webhook_url: definition.webhook_url.clone(),
                    token,
                },
            );
        }

        let self_definition = ClientDefinition {
            name: SELF_CLIENT_NAME.to_string(),
            ..Default::default()
        };

        let mut clients_by_token: HashMap<Token, Client> =
            HashMap::with_capacity(config.clients.len() + 1);
        let mut self_client = None;

        for definition in config.clients.iter().chain(std::iter::once(&self_definition)) {
            let token = derive(&config.secret, &definition.name);
            if let Some(existing) = clients_by_token.get(&token) {
                return Err(ConfigError::DuplicateToken {
                    kind: "client",
                    first: existing.name.clone(),
                    second: definition.name.clone(),
                });
            }

            let authorized_channels: BTreeSet<String> =
                definition.channels_allowed.iter().cloned().collect();
            let mut client = Client {
                name: definition.name.clone(),
                icon: definition.icon.clone(),
                authorized_channels,
                token: token.clone(),
                webhooks: BTreeMap::new(),
            };

            for (channel_name, channel_token) in &ordered_channels {
                if client.is_allowed_channel(channel_name) {
                    let relay_url = format!("{base_url}/{notify_route}/{token}/{channel_token}");
                    client.webhooks.insert(channel_name.clone(), relay_url);
                }
            }

            if client.is_self() {
                self_client = Some(client.clone());
            }
            clients_by_token.insert(token, client);
        }

        let self_client = match self_client {
            Some(client) if client.webhooks.contains_key(&config.self_notify_channel) => client,
            _ => {
                return Err(ConfigError::SelfClientNotEligible(
                    config.self_notify_channel.clone(),
                ))
            }
        };

        Ok(Registry {
            notify_route,
            self_notify_channel: config.self_notify_channel.clone(),
            self_check_interval: config.self_check_interval(),
            clients_by_token,
            channels_by_name,
            channel_names_by_token,
            self_client,
        })
    }

    /// Route segment (without slashes) under which notifications are accepted.
    pub fn notify_route(&self) -> &str {
        &self.notify_route
    }

    pub fn self_notify_channel(&self) -> &str {
        &self.self_notify_channel
    }

    pub fn self_check_interval(&self) -> Duration {
        self.self_check_interval
    }

    pub fn self_client(&self) -> &Client {
        &self.self_client
    }

    pub fn client_count(&self) -> usize {
        self.clients_by_token.len()
    }

    pub fn channel_count(&self) -> usize {
        self.channels_by_name.len()
    }

    pub fn client_by_token(&self, token: &Token) -> Option<&Client> {
        self.clients_by_token.get(token)
    }

    pub fn channel_by_name(&self, name: &str) -> Option<&Channel> {
        self.channels_by_name.get(name)
    }

    /// Looks a channel up by token first, then by name.
    pub fn find_channel(&self, key: &str) -> Option<&Channel> {
        self.channel_names_by_token
            .get(key)
            .and_then(|name| self.channels_by_name.get(name))
            .or_else(|| self.channels_by_name.get(key))
    }

    pub fn channel_summaries(&self) -> Vec<ChannelSummary> {
        let mut channels: Vec<ChannelSummary> = self
            .channels_by_name
            .keys()
            .map(|name| ChannelSummary { name: name.clone() })
            .collect();
        channels.sort_by(|a, b| a.name.cmp(&b.name));
        channels
    }

    /// Configured clients; the synthetic self client is left out.
    pub fn client_summaries(&self) -> Vec<ClientSummary> {
        let mut clients: Vec<ClientSummary> = self
            .clients_by_token
            .values()
            .filter(|client| !client.is_self())
            .map(|client| ClientSummary {
                name: client.name.clone(),
                channels_allowed: client.authorized_channels.iter().cloned().collect(),
            })
            .collect();
        clients.sort_by(|a, b| a.name.cmp(&b.name));
        clients
    }

    /// Every published relay URL, sorted by client then channel.
    pub fn route_table(&self) -> Vec<RouteEntry> {
        let mut routes: Vec<RouteEntry> = self
            .clients_by_token
            .values()
            .flat_map(|client| {
                client.webhooks.iter().map(move |(channel, url)| RouteEntry {
                    client: client.name.clone(),
                    channel: channel.clone(),
                    relay_url: url.clone(),
                })
            })
            .collect();
        routes.sort_by(|a, b| (&a.client, &a.channel).cmp(&(&b.client, &b.channel)));
        routes
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_config() -> RelayConfig {
        RelayConfig {
            secret: "s3cret".to_string(),
            base_url: "https://relay.example.com/".to_string(),
            notify_route: "notify".to_string(),
            self_notify_channel: "ops".to_string(),
            self_check_every_x_hours: 12,
            channels: vec![
                ChannelDefinition {
                    name: "general".to_string(),
                    webhook_url: "https://x/1".to_string(),
                },
                ChannelDefinition {
                    name: "eng".to_string(),
                    webhook_url: "https://x/2".to_string(),
                },
                ChannelDefinition {
                    name: "ops".to_string(),
                    webhook_url: "https://x/3".to_string(),
                },
            ],
            clients: vec![
                ClientDefinition {
                    name: "alice".to_string(),
                    ..Default::default()
                },
                ClientDefinition {
                    name: "bob".to_string(),
                    icon: ":wrench:".to_string(),
                    channels_allowed: vec!["eng".to_string()],
                },
            ],
        }
    }

    #[test]
    fn test_build_derives_tokens_for_everyone() {
        let registry = Registry::build(&sample_config()).unwrap();
        assert_eq!(registry.channel_count(), 3);
        // alice, bob and the self client.
        assert_eq!(registry.client_count(), 3);

        let alice_token = derive_token("s3cret", "alice");
        let alice = registry.client_by_token(&alice_token).unwrap();
        assert_eq!(alice.name, "alice");
        assert_eq!(
            registry.channel_by_name("eng").unwrap().token,
            derive_token("s3cret", "eng")
        );
    }

    #[test]
    fn test_relay_urls_use_base_route_and_tokens() {
        let registry = Registry::build(&sample_config()).unwrap();
        let bob = registry.client_by_token(&derive_token("s3cret", "bob")).unwrap();

        assert_eq!(bob.webhooks.len(), 1);
        let expected = format!(
            "https://relay.example.com/notify/{}/{}",
            derive_token("s3cret", "bob"),
            derive_token("s3cret", "eng")
        );
        assert_eq!(bob.webhooks.get("eng"), Some(&expected));
    }

    #[test]
    fn test_unrestricted_client_gets_every_channel() {
        let registry = Registry::build(&sample_config()).unwrap();
        let alice = registry.client_by_token(&derive_token("s3cret", "alice")).unwrap();
        let channels: Vec<&str> = alice.webhooks.keys().map(String::as_str).collect();
        assert_eq!(channels, vec!["eng", "general", "ops"]);
    }

    #[test]
    fn test_self_client_is_synthesized() {
        let registry = Registry::build(&sample_config()).unwrap();
        let me = registry.self_client();
        assert!(me.is_self());
        assert!(me.icon.is_empty());
        assert!(me.webhooks.contains_key("ops"));
        assert!(registry.client_by_token(&me.token).is_some());
    }

    #[test]
    fn test_find_channel_accepts_token_or_name() {
        let registry = Registry::build(&sample_config()).unwrap();
        let token = derive_token("s3cret", "general");
        assert_eq!(registry.find_channel(token.as_str()).unwrap().name, "general");
        assert_eq!(registry.find_channel("general").unwrap().name, "general");
        assert!(registry.find_channel("random").is_none());
    }

    #[test]
    fn test_colliding_client_tokens_fail_the_build() {
        let result = Registry::build_with(&sample_config(), |secret, name| {
            if name == "alice" || name == "bob" {
                Token::from_raw("collision")
            } else {
                derive_token(secret, name)
            }
        });
        assert!(matches!(
            result,
            Err(ConfigError::DuplicateToken { kind: "client", .. })
        ));
    }

    #[test]
    fn test_colliding_channel_tokens_fail_the_build() {
        let result = Registry::build_with(&sample_config(), |_, _| Token::from_raw("same"));
        assert!(matches!(
            result,
            Err(ConfigError::DuplicateToken { kind: "channel", .. })
        ));
    }

    #[test]
    fn test_summaries_hide_tokens_and_self() {
        let registry = Registry::build(&sample_config()).unwrap();
        let clients = registry.client_summaries();
        assert_eq!(
            clients,
            vec![
                ClientSummary {
                    name: "alice".to_string(),
                    channels_allowed: vec![],
                },
                ClientSummary {
                    name: "bob".to_string(),
                    channels_allowed: vec!["eng".to_string()],
                },
            ]
        );
        let names: Vec<String> = registry
            .channel_summaries()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["eng", "general", "ops"]);
    }

    #[test]
    fn test_route_table_lists_every_eligible_pair() {
        let registry = Registry::build(&sample_config()).unwrap();
        let routes = registry.route_table();
        // alice: 3, bob: 1, self: 3
        assert_eq!(routes.len(), 7);
        assert_eq!(routes[0].client, "alice");
        assert!(routes.iter().all(|r| !r.relay_url.contains("https://x/")));
    }
}
