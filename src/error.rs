//! Error types for the Pharmacy Assistant server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::ocr::OcrError;
use crate::orders::OrderStatus;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) | Self::InvalidStatus(_) | Self::InvalidTransition { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) | Self::Database(_) | Self::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidStatus(_) => "INVALID_STATUS",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::Conflict(_) => "CONFLICT",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Database(_) => "STORAGE_ERROR",
            Self::Io(_) => "IO_ERROR",
        }
    }
}

impl From<OcrError> for AppError {
    fn from(err: OcrError) -> Self {
        match err {
            OcrError::InvalidInput(msg) => AppError::InvalidInput(msg),
            OcrError::PayloadTooLarge { size, max } => AppError::PayloadTooLarge { size, max },
            other => AppError::Internal(other.to_string()),
        }
    }
}

/// Byte count in the largest unit that keeps it at least 1
fn human_size(bytes: usize) -> String {
    const KIB: usize = 1024;
    const MIB: usize = 1024 * 1024;

    if bytes >= MIB {
        format!("{}MB", bytes / MIB)
    } else if bytes >= KIB {
        format!("{}KB", bytes / KIB)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                "Database error".to_string()
            }
            AppError::Io(e) => {
                tracing::error!("IO error: {}", e);
                "IO error".to_string()
            }
            AppError::PayloadTooLarge { max, .. } => {
                format!("File too large. Maximum size is {}.", human_size(*max))
            }
            other => other.to_string(),
        };

        let details = if cfg!(debug_assertions) && status.is_server_error() {
            Some(self.to_string())
        } else {
            None
        };

        let body = Json(ErrorResponse {
            success: false,
            error: message,
            code: self.code(),
            details,
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::InvalidInput("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::PayloadTooLarge { size: 11, max: 10 }.status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            AppError::InvalidTransition {
                from: OrderStatus::Pending,
                to: OrderStatus::Dispensed,
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Database(sqlx::Error::RowNotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(10 * 1024 * 1024), "10MB");
        assert_eq!(human_size(512 * 1024), "512KB");
        assert_eq!(human_size(1000), "1000 bytes");
    }

    #[tokio::test]
    async fn test_payload_too_large_message_below_one_megabyte() {
        let response = AppError::PayloadTooLarge {
            size: 600 * 1024,
            max: 512 * 1024,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "File too large. Maximum size is 512KB.");
        assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
    }

    #[test]
    fn test_ocr_validation_errors_keep_their_kind() {
        let err: AppError = OcrError::PayloadTooLarge { size: 20, max: 10 }.into();
        assert!(matches!(err, AppError::PayloadTooLarge { size: 20, max: 10 }));

        let err: AppError = OcrError::InvalidInput("not an image".into()).into();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let err: AppError = OcrError::EmptyResult.into();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
