use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::notifications::payload::PayloadError;
use crate::notifications::service::NotificationError;
use crate::registry::AuthError;
use crate::server::config::PermissionDeniedStatus;

/// Errors returned to HTTP callers as a status and a plain-text body.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    MethodNotAllowed(String),
    #[error("{0}")]
    RelayFailed(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::RelayFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Maps a relay failure to its response, using `denied` for clients
    /// posting outside their channel scope.
    pub fn from_notification(err: NotificationError, denied: PermissionDeniedStatus) -> Self {
        match err {
            NotificationError::Payload(e) => AppError::from(e),
            NotificationError::Auth(AuthError::UnknownClient) => {
                AppError::Unauthorized(AuthError::UnknownClient.to_string())
            }
            NotificationError::Auth(AuthError::UnknownChannel) => {
                AppError::NotFound(AuthError::UnknownChannel.to_string())
            }
            NotificationError::Auth(e @ AuthError::Forbidden { .. }) => match denied {
                PermissionDeniedStatus::Unauthorized => AppError::Unauthorized(e.to_string()),
                PermissionDeniedStatus::Forbidden => AppError::Forbidden(e.to_string()),
            },
            e @ NotificationError::Sender(_) => AppError::RelayFailed(e.to_string()),
        }
    }
}

impl From<PayloadError> for AppError {
    fn from(err: PayloadError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, self.to_string()).into_response()
    }
}
