use thiserror::Error;

use super::{Channel, Client, Registry, Token};

/// Why a client may not post to a channel. Each variant maps to its own
/// HTTP status.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Unauthorized")]
    UnknownClient,
    #[error("Channel not found")]
    UnknownChannel,
    #[error("channel {channel} not allowed for client {client}")]
    Forbidden { client: String, channel: String },
}

impl Registry {
    /// Resolves a client token and a channel (token or name).
    ///
    /// The client is looked up first, then the channel, then the permission,
    /// and the first failure wins: an unknown token is `UnknownClient` even
    /// when the channel does not exist either.
    pub fn resolve(
        &self,
        client_token: &Token,
        channel: &str,
    ) -> Result<(&Client, &Channel), AuthError> {
        let client = self
            .client_by_token(client_token)
            .ok_or(AuthError::UnknownClient)?;

        let channel = self.find_channel(channel).ok_or(AuthError::UnknownChannel)?;

        if !client.is_allowed_channel(&channel.name) {
            return Err(AuthError::Forbidden {
                client: client.name.clone(),
                channel: channel.name.clone(),
            });
        }

        Ok((client, channel))
    }
}
