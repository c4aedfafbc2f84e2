use serde::Deserialize;
use thiserror::Error;

use super::models::NotifyRequest;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("Invalid request: empty body")]
    EmptyBody,
    #[error("Invalid request: missing text")]
    MissingText,
    #[error("Invalid form body: {0}")]
    InvalidForm(String),
    #[error("Error parsing JSON: {0}")]
    InvalidJson(String),
}

#[derive(Deserialize, Default)]
struct TextForm {
    #[serde(default)]
    text: String,
}

/// Builds a [`NotifyRequest`] from an inbound request.
///
/// A non-empty `text` query parameter or form field wins. Otherwise the body
/// must be a JSON message carrying text or attachments.
pub fn parse_payload(
    content_type: Option<&str>,
    query: Option<&str>,
    body: &[u8],
) -> Result<NotifyRequest, PayloadError> {
    if let Some(query) = query {
        let form: TextForm = serde_urlencoded::from_str(query).unwrap_or_default();
        if !form.text.is_empty() {
            return Ok(NotifyRequest::from_text(form.text));
        }
    }

    let is_form = content_type
        .map(|value| value.trim_start().starts_with(FORM_CONTENT_TYPE))
        .unwrap_or(false);

    if is_form {
        let form: TextForm = serde_urlencoded::from_bytes(body)
            .map_err(|e| PayloadError::InvalidForm(e.to_string()))?;
        if form.text.is_empty() {
            return Err(PayloadError::MissingText);
        }
        return Ok(NotifyRequest::from_text(form.text));
    }

    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(PayloadError::EmptyBody);
    }

    let request: NotifyRequest =
        serde_json::from_slice(body).map_err(|e| PayloadError::InvalidJson(e.to_string()))?;
    if request.is_empty() {
        return Err(PayloadError::MissingText);
    }
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_text_field() {
        let request = parse_payload(
            Some("application/x-www-form-urlencoded"),
            None,
            b"text=hello+there%21&other=1",
        )
        .unwrap();
        assert_eq!(request, NotifyRequest::from_text("hello there!"));
    }

    #[test]
    fn test_form_without_text_is_rejected() {
        let err = parse_payload(Some("application/x-www-form-urlencoded"), None, b"foo=bar")
            .unwrap_err();
        assert_eq!(err, PayloadError::MissingText);
    }

    #[test]
    fn test_query_text_wins_over_body() {
        let request = parse_payload(None, Some("text=from%20query"), b"{not json").unwrap();
        assert_eq!(request.text.as_deref(), Some("from query"));
    }

    #[test]
    fn test_json_body() {
        let request = parse_payload(
            Some("application/json"),
            None,
            br#"{"text":"hi","attachments":[{"title":"t"}]}"#,
        )
        .unwrap();
        assert_eq!(request.text.as_deref(), Some("hi"));
        assert_eq!(request.attachments.len(), 1);
    }

    #[test]
    fn test_json_accepts_loose_slack_shapes() {
        let bodies: [&[u8]; 3] = [
            br#"{"text":"hi","attachments":[{"title":"t","ts":1700000000.123}]}"#,
            br#"{"text":"hi","attachments":[{"title":"t","ts":"1700000000"}]}"#,
            br#"{"text":"hi","attachments":null}"#,
        ];
        for body in bodies {
            let request = parse_payload(Some("application/json"), None, body).unwrap();
            assert_eq!(request.text.as_deref(), Some("hi"));
        }

        let request = parse_payload(None, None, bodies[0]).unwrap();
        let ts = request.attachments[0].ts.as_ref().and_then(|ts| ts.as_f64()).unwrap();
        assert!((ts - 1700000000.123).abs() < 1e-3);
    }

    #[test]
    fn test_json_without_content_type() {
        let request = parse_payload(None, None, br#"{"text":"hi"}"#).unwrap();
        assert_eq!(request, NotifyRequest::from_text("hi"));
    }

    #[test]
    fn test_broken_json_is_rejected() {
        let err = parse_payload(Some("application/json"), None, b"{\"text\":").unwrap_err();
        assert!(matches!(err, PayloadError::InvalidJson(_)));
    }

    #[test]
    fn test_empty_body_is_rejected() {
        assert_eq!(
            parse_payload(None, None, b"").unwrap_err(),
            PayloadError::EmptyBody
        );
        assert_eq!(
            parse_payload(None, Some("text="), b"  \n").unwrap_err(),
            PayloadError::EmptyBody
        );
    }

    #[test]
    fn test_json_without_content_is_rejected() {
        assert_eq!(
            parse_payload(None, None, br#"{"username":"ci"}"#).unwrap_err(),
            PayloadError::MissingText
        );
    }
}
