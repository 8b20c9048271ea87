//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::store::StoreError;

/// Application-wide error type.
///
/// Each variant maps to a specific HTTP status code and error message.
/// Upstream failures are deliberately absent: they are reported inside a
/// 200 response body, see `services::upstream`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// License store failed (connectivity, timeout, unreadable record).
    ///
    /// Returns HTTP 500 with a generic message.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// No `license` in the query string or JSON body.
    #[error("Missing license key")]
    MissingLicenseKey,

    /// The license key does not exist.
    #[error("Invalid license key")]
    InvalidLicenseKey,

    #[error("License disabled")]
    LicenseDisabled,

    /// A limited license has used up today's requests.
    ///
    /// Returns HTTP 429 Too Many Requests.
    #[error("Daily request limit exceeded")]
    QuotaExceeded,

    /// Missing or wrong admin bearer token.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Invalid admin token")]
    InvalidAdminToken,

    /// Requested license does not exist.
    #[error("Not found")]
    NotFound,

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    /// The String contains details about what was invalid.
    #[error("Invalid request")]
    InvalidRequest(String),
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// { "error": "Human-readable error message" }
/// ```
///
/// # Status Code Mapping
///
/// - `MissingLicenseKey`, `InvalidLicenseKey`, `LicenseDisabled` → 403 Forbidden
/// - `QuotaExceeded` → 429 Too Many Requests
/// - `InvalidAdminToken` → 401 Unauthorized
/// - `NotFound` → 404 Not Found
/// - `InvalidRequest` → 400 Bad Request
/// - `Store` → 500 Internal Server Error (hides details from client)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::MissingLicenseKey | AppError::InvalidLicenseKey | AppError::LicenseDisabled => {
                (StatusCode::FORBIDDEN, self.to_string())
            }
            AppError::QuotaExceeded => (StatusCode::TOO_MANY_REQUESTS, self.to_string()),
            AppError::InvalidAdminToken => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::InvalidRequest(ref msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Store(ref err) => {
                tracing::error!(error = %err, "license store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
