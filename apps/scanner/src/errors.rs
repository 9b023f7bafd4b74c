use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::ValidationError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("A scan is already running")]
    ScanInProgress,

    #[error("Invalid upload: {0}")]
    Upload(#[from] MultipartError),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(
                e @ (ValidationError::FileTooLarge { .. } | ValidationError::UploadTooLarge { .. }),
            ) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                e.to_string(),
            ),
            AppError::Validation(e) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string()),
            AppError::ScanInProgress => (
                StatusCode::CONFLICT,
                "SCAN_IN_PROGRESS",
                "A scan is already running".to_string(),
            ),
            AppError::Upload(e) => {
                tracing::warn!("Upload error: {e}");
                (e.status(), "INVALID_UPLOAD", e.body_text())
            }
            AppError::Template(e) => {
                tracing::error!("Template error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "TEMPLATE_ERROR",
                    "The page could not be rendered".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let response = AppError::from(ValidationError::MissingInput).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_oversized_file_maps_to_payload_too_large() {
        let response = AppError::from(ValidationError::FileTooLarge {
            size: 2048,
            limit: 1024,
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_truncated_upload_maps_to_payload_too_large() {
        let response =
            AppError::from(ValidationError::UploadTooLarge { limit: 1024 }).into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_scan_in_progress_maps_to_conflict() {
        assert_eq!(
            AppError::ScanInProgress.into_response().status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_template_error_hides_detail() {
        let response = AppError::from(askama::Error::Custom("secret detail".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
