/// Error types for Wall Service
///
/// Errors are converted to `error_types::ErrorResponse` bodies for API
/// clients. The inner message of each variant is what the composer shows.
use crate::services::media::{accept_attribute, MAX_FILE_SIZE};
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use error_types::{error_codes, error_types as kinds, ErrorResponse};
use std::fmt;
use supabase_client::SupabaseError;

/// Result type for wall-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Input rejected before any backend call
    Validation(String),

    /// Attachment type outside the accepted media types
    UnsupportedMedia(String),

    /// Attachment over the size limit
    MediaTooLarge(String),

    /// Media upload to object storage failed
    Upload(String),

    /// Hosted backend call failed
    Backend(String),

    /// Resource not found
    NotFound(String),

    /// Malformed request
    BadRequest(String),

    /// Internal server error
    Internal(String),
}

impl AppError {
    /// The bare message, without the category prefix
    pub fn message(&self) -> &str {
        match self {
            AppError::Validation(msg)
            | AppError::UnsupportedMedia(msg)
            | AppError::MediaTooLarge(msg)
            | AppError::Upload(msg)
            | AppError::Backend(msg)
            | AppError::NotFound(msg)
            | AppError::BadRequest(msg)
            | AppError::Internal(msg) => msg,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "Validation error: {}", msg),
            AppError::UnsupportedMedia(msg) => write!(f, "Unsupported media: {}", msg),
            AppError::MediaTooLarge(msg) => write!(f, "Media too large: {}", msg),
            AppError::Upload(msg) => write!(f, "Upload failed: {}", msg),
            AppError::Backend(msg) => write!(f, "Backend error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::UnsupportedMedia(_)
            | AppError::MediaTooLarge(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Upload(_) | AppError::Backend(_) => StatusCode::BAD_GATEWAY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let (error_type, code) = match self {
            AppError::Validation(_) => (kinds::VALIDATION_ERROR, error_codes::POST_INVALID),
            AppError::UnsupportedMedia(_) => {
                (kinds::VALIDATION_ERROR, error_codes::UNSUPPORTED_FORMAT)
            }
            AppError::MediaTooLarge(_) => (kinds::VALIDATION_ERROR, error_codes::UPLOAD_TOO_LARGE),
            AppError::BadRequest(_) => (kinds::VALIDATION_ERROR, error_codes::INVALID_REQUEST),
            AppError::Upload(_) => (kinds::UPSTREAM_ERROR, error_codes::UPLOAD_FAILED),
            AppError::Backend(_) => (kinds::UPSTREAM_ERROR, error_codes::BACKEND_ERROR),
            AppError::NotFound(_) => (kinds::NOT_FOUND_ERROR, error_codes::POST_NOT_FOUND),
            AppError::Internal(_) => (kinds::SERVER_ERROR, error_codes::INTERNAL_SERVER_ERROR),
        };

        let mut response = ErrorResponse::new(
            status.canonical_reason().unwrap_or("Error"),
            self.message(),
            status.as_u16(),
            error_type,
            code,
        );
        match self {
            AppError::UnsupportedMedia(_) => {
                response = response.with_details(format!("accepted: {}", accept_attribute()));
            }
            AppError::MediaTooLarge(_) => {
                response = response.with_details(format!("limit: {} bytes", MAX_FILE_SIZE));
            }
            _ => {}
        }

        HttpResponse::build(status).json(response)
    }
}

impl From<SupabaseError> for AppError {
    fn from(err: SupabaseError) -> Self {
        AppError::Backend(err.to_string())
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Internal(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Internal(msg.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
