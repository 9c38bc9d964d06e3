//! Shared API error body for wall HTTP surfaces.
use serde::{Deserialize, Serialize};

/// Unified API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short HTTP reason, e.g. "Bad Request"
    pub error: String,

    /// Human-readable message, safe to show next to the composer
    pub message: String,

    pub status: u16,

    /// Coarse category for client-side routing, see [`error_types`]
    pub error_type: String,

    /// Stable machine code, see [`error_codes`]
    pub code: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    /// ISO 8601
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str, status: u16, error_type: &str, code: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
            status,
            error_type: error_type.to_string(),
            code: code.to_string(),
            details: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn with_details(mut self, details: String) -> Self {
        self.details = Some(details);
        self
    }
}

pub mod error_codes {
    // Posts
    pub const POST_NOT_FOUND: &str = "POST_NOT_FOUND";
    pub const POST_INVALID: &str = "POST_INVALID";

    // Media
    pub const UPLOAD_FAILED: &str = "UPLOAD_FAILED";
    pub const UPLOAD_TOO_LARGE: &str = "UPLOAD_TOO_LARGE";
    pub const UNSUPPORTED_FORMAT: &str = "UNSUPPORTED_FORMAT";

    // Backend platform / system
    pub const BACKEND_ERROR: &str = "BACKEND_ERROR";
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    pub const INTERNAL_SERVER_ERROR: &str = "INTERNAL_SERVER_ERROR";
}

pub mod error_types {
    pub const VALIDATION_ERROR: &str = "validation_error";
    pub const NOT_FOUND_ERROR: &str = "not_found_error";
    pub const UPSTREAM_ERROR: &str = "upstream_error";
    pub const SERVER_ERROR: &str = "server_error";
}
