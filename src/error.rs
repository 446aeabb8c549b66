use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Main error type for the application.
///
/// Failures are classified once, where they leave the document store or the
/// catalog API, and matched on by variant everywhere else.
#[derive(Error, Debug)]
pub enum AppError {
    /// Transport failure talking to a remote service.
    #[error("Network error: {0}")]
    Network(String),

    /// A remote call did not complete within its deadline.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// The store refused access to a document or collection.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// No user is bound to the session.
    #[error("Not signed in")]
    Unauthenticated,

    /// The store needs a composite index for the query shape.
    #[error("Missing index: {0}")]
    MissingIndex(String),

    /// Record, story or chapter not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Catalog API answered with a non-success status.
    #[error("API returned status '{status}': {message}")]
    ApiStatus {
        /// Status field from the envelope.
        status: String,
        /// Message field from the envelope.
        message: String,
    },

    /// Invalid input supplied by a caller.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this failure came from the transport layer.
    pub fn is_transport(&self) -> bool {
        matches!(self, AppError::Network(_) | AppError::Timeout(_))
    }

    /// Message suitable for showing to a reader.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Network(_) | AppError::Timeout(_) => {
                "Network error. Please check your connection and try again.".to_string()
            }
            AppError::PermissionDenied(_) => {
                "You do not have permission to access this data.".to_string()
            }
            AppError::Unauthenticated => "You are not signed in. Please sign in again.".to_string(),
            AppError::MissingIndex(_) => "The library is being prepared. Try again shortly.".to_string(),
            AppError::NotFound(what) => format!("Not found: {}", what),
            AppError::ApiStatus { message, .. } if !message.is_empty() => message.clone(),
            AppError::ApiStatus { .. } => "The story catalog request failed.".to_string(),
            AppError::InvalidInput(msg) => msg.clone(),
            AppError::Config(_) | AppError::Io(_) | AppError::Internal(_) => {
                "Something went wrong.".to_string()
            }
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Network(_) | AppError::Timeout(_) | AppError::ApiStatus { .. } => {
                StatusCode::BAD_GATEWAY
            }
            AppError::MissingIndex(_)
            | AppError::Config(_)
            | AppError::Io(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        match &e {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::PermissionDenied
                    || err.code == rusqlite::ErrorCode::ReadOnly =>
            {
                AppError::PermissionDenied(e.to_string())
            }
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::DatabaseBusy
                    || err.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                AppError::Network(format!("Store unavailable: {}", e))
            }
            _ => AppError::Internal(format!("Store error: {}", e)),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AppError::Timeout(e.to_string())
        } else if e.is_decode() {
            AppError::Internal(format!("Malformed catalog response: {}", e))
        } else {
            AppError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Internal(format!("Malformed document: {}", e))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        tracing::error!(error = %self, "Request error");

        let body = serde_json::json!({ "error": self.user_message() });
        (status, Json(body)).into_response()
    }
}

/// Result type alias for the application.
pub type Result<T> = std::result::Result<T, AppError>;
