use crate::registry::Token;

/// Result of matching a request path against the notify route grammar
/// `/<notify-route>/<client-token>/<channel>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMatch {
    Matched { client_token: Token, channel: String },
    NoMatch,
}

/// Matches `path` against the notify route named `notify_route`.
///
/// Both trailing segments must be present and non-empty; the channel segment
/// is percent-decoded so channel names with spaces can be addressed by name.
pub fn match_notify_route(notify_route: &str, path: &str) -> RouteMatch {
    let Some(rest) = path
        .strip_prefix('/')
        .and_then(|p| p.strip_prefix(notify_route))
        .and_then(|p| p.strip_prefix('/'))
    else {
        return RouteMatch::NoMatch;
    };

    let Some((client_token, channel)) = rest.split_once('/') else {
        return RouteMatch::NoMatch;
    };
    if client_token.is_empty() || channel.is_empty() || channel.contains('/') {
        return RouteMatch::NoMatch;
    }

    match urlencoding::decode(channel) {
        Ok(channel) => RouteMatch::Matched {
            client_token: Token::from_raw(client_token),
            channel: channel.into_owned(),
        },
        Err(_) => RouteMatch::NoMatch,
    }
}
