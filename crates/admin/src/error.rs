//! Unified error handling for admin.
//!
//! Handlers return `Result<T, AppError>`; errors render as
//! `{"message": "..."}`. Server-side and courier failures are captured to
//! Sentry, and their details stay in the logs.

use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use dokan_shared::db::RepositoryError;
use dokan_shared::receipt::ReceiptError;

use crate::auth::PasswordError;
use crate::steadfast::SteadfastError;
use crate::uploads::UploadError;

/// Application-level error type for the admin API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Steadfast API call failed.
    #[error("Courier error: {0}")]
    Courier(#[from] SteadfastError),

    /// Storing or validating an image failed.
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    /// Malformed multipart body.
    #[error("Invalid form data: {0}")]
    Multipart(#[from] MultipartError),

    /// Receipt rendering failed.
    #[error("Receipt error: {0}")]
    Receipt(#[from] ReceiptError),

    /// Hashing or checking a password failed.
    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Admin is not authenticated.
    #[error("{0}")]
    Unauthorized(String),

    /// Admin lacks permission.
    #[error("{0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),

    /// The request conflicts with the current state of the resource.
    #[error("{0}")]
    Conflict(String),

    /// Something the request depends on is not set up yet.
    #[error("{0}")]
    PreconditionFailed(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Database(_)
            | Self::Receipt(_)
            | Self::Internal(_)
            | Self::Password(PasswordError::Hash(_) | PasswordError::InvalidHash(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Courier(SteadfastError::InvalidRequest(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Courier(_) => StatusCode::BAD_GATEWAY,
            Self::Upload(UploadError::TooLarge) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Upload(UploadError::UnsupportedType(_) | UploadError::Empty)
            | Self::Multipart(_)
            | Self::Password(PasswordError::Length { .. })
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upload(_) => StatusCode::BAD_GATEWAY,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::PreconditionFailed(_) => StatusCode::PRECONDITION_FAILED,
        }
    }

    /// Client-facing message. Internal details are never exposed.
    fn message(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(RepositoryError::Conflict(msg)) => msg.clone(),
            Self::Courier(SteadfastError::InvalidRequest(msg)) => msg.clone(),
            Self::Courier(_) => "Courier service error".to_string(),
            Self::Upload(e) if e.is_client_error() => e.to_string(),
            Self::Upload(_) => "Image storage error".to_string(),
            Self::Multipart(e) => format!("Invalid form data: {}", e.body_text()),
            Self::Password(e @ PasswordError::Length { .. }) => e.to_string(),
            Self::Database(_)
            | Self::Receipt(_)
            | Self::Password(_)
            | Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let message = self.message();
        (status, Json(ErrorBody { message: &message })).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the signed-in admin.
pub fn set_sentry_user(admin_id: &impl ToString, email: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(admin_id.to_string()),
            email: Some(email.to_string()),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_not_found_order() {
        let (status, body) = body_of(AppError::NotFound("Order not found".to_string())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Order not found");
    }

    #[tokio::test]
    async fn test_courier_details_hidden() {
        let (status, body) = body_of(
            SteadfastError::Api {
                status: 400,
                message: "The invoice has already been taken.".to_string(),
            }
            .into(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["message"], "Courier service error");
    }

    #[tokio::test]
    async fn test_upload_client_errors() {
        let (status, body) = body_of(UploadError::UnsupportedType("image/svg+xml".into()).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Unsupported image type: image/svg+xml");

        let (status, _) = body_of(UploadError::TooLarge.into()).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

        let (status, body) = body_of(UploadError::Cloudinary("Invalid Signature".into()).into()).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["message"], "Image storage error");
    }

    #[tokio::test]
    async fn test_password_length_message() {
        let (status, body) = body_of(
            PasswordError::Length {
                min: 8,
                max: 128,
            }
            .into(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "password must be between 8 and 128 characters");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::Forbidden("Super admin access required".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::PreconditionFailed("No active courier".into()).status(),
            StatusCode::PRECONDITION_FAILED
        );
        assert_eq!(
            AppError::Database(RepositoryError::Conflict("slug taken".into())).status(),
            StatusCode::CONFLICT
        );
    }
}
