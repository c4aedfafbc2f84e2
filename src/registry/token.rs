use sha2::{Digest, Sha256};
use std::borrow::Borrow;
use std::fmt;

/// Opaque capability token identifying a client or a channel.
///
/// Kept distinct from plain names so a channel name can never be passed where
/// a token is expected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(String);

impl Token {
    /// Wraps a token presented by a caller, e.g. a URL segment. Nothing is
    /// validated: an unknown value simply fails to resolve.
    pub fn from_raw(value: impl Into<String>) -> Self {
        Token(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Token {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derives the token for `name` as `hex(sha256(name ++ secret))`.
///
/// The result is stable for a given pair, so tokens handed out to clients
/// survive reloads as long as neither the name nor the secret changes.
///
/// This is a capability token, not a credential: anyone who knows the secret
/// can compute every token, and rotating the secret invalidates all of them.
pub fn derive_token(secret: &str, name: &str) -> Token {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(secret.as_bytes());
    Token(hex::encode(hasher.finalize()))
}
