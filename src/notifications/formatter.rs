use super::models::NotifyRequest;
use crate::registry::Client;

/// Prefix that identifies the sender in the posted message.
///
/// `[icon + " "] + "*name* :" + separator`, where the separator is a newline
/// when the message carries attachments and a space otherwise. The relay's
/// own client posts without a prefix.
pub fn message_prefix(client: &Client, has_attachments: bool) -> String {
    if client.is_self() {
        return String::new();
    }

    let separator = if has_attachments { "\n" } else { " " };
    let mut prefix = String::with_capacity(client.icon.len() + client.name.len() + 6);
    if !client.icon.is_empty() {
        prefix.push_str(&client.icon);
        prefix.push(' ');
    }
    prefix.push('*');
    prefix.push_str(&client.name);
    prefix.push_str("* :");
    prefix.push_str(separator);
    prefix
}

/// Rewrites the top-level text of `request` with the sender prefix.
pub fn format_message(mut request: NotifyRequest, client: &Client) -> NotifyRequest {
    let prefix = message_prefix(client, request.has_attachments());
    let text = request.text.take().unwrap_or_default();
    request.text = Some(prefix + &text);
    request
}
