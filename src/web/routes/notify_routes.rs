use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, Uri},
};
use std::sync::Arc;
use tracing::warn;

use crate::notifications::payload::parse_payload;
use crate::web::{
    error::AppError,
    route::{match_notify_route, RouteMatch},
    AppState,
};

/// Accepts `POST /<notify-route>/<client-token>/<channel>`.
///
/// Mounted as the router fallback because the route name comes from the
/// relay document and may change on reload. Every path that matches the
/// notify route is counted in the relay stats, successful or not.
pub async fn notify_channel(
    State(app_state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str, AppError> {
    let registry = app_state.relay.snapshot().await;

    let (client_token, channel) = match match_notify_route(registry.notify_route(), uri.path()) {
        RouteMatch::Matched {
            client_token,
            channel,
        } => (client_token, channel),
        RouteMatch::NoMatch => return Err(AppError::NotFound("Invalid route".to_string())),
    };

    let result = async {
        if method != Method::POST {
            return Err(AppError::MethodNotAllowed(
                "Only POST method is allowed".to_string(),
            ));
        }

        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok());
        let request = parse_payload(content_type, uri.query(), &body)?;

        app_state
            .relay
            .relay(&registry, &client_token, &channel, request)
            .await
            .map_err(|e| {
                AppError::from_notification(e, app_state.config.permission_denied_status)
            })
    }
    .await;

    app_state.relay.record(result.is_ok()).await;

    match result {
        Ok(()) => Ok("Message sent"),
        Err(e) => {
            warn!(status = %e.status(), error = %e, "Notification request failed.");
            Err(e)
        }
    }
}
