//! Conference Controller error types.
//!
//! Every error maps to an HTTP status and is rendered in the standard
//! `{success: false, error: "..."}` envelope. Internal details (database,
//! provider responses) are logged server-side and never exposed to clients.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Conference Controller error type.
///
/// Mapping to HTTP status codes:
/// - `Validation`, `InvalidState`: 400
/// - `NotFound`: 404
/// - `Provider`, `Database`, `Internal`: 500
#[derive(Debug, Error)]
pub enum CcError {
    /// Malformed or missing input, including uniqueness violations surfaced
    /// at the API boundary (duplicate tenant domain, duplicate user email).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced tenant/user/meeting/participant does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation not permitted given the current meeting status.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Video-session or auth provider call failed.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error with context.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorEnvelope {
    success: bool,
    error: String,
}

impl CcError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            CcError::Validation(_) | CcError::InvalidState(_) => StatusCode::BAD_REQUEST,
            CcError::NotFound(_) => StatusCode::NOT_FOUND,
            CcError::Provider(_) | CcError::Database(_) | CcError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns a bounded label string for the error variant (for metrics).
    ///
    /// Uses enum variant names, not error message content, so label
    /// cardinality stays bounded.
    pub fn error_type_label(&self) -> &'static str {
        match self {
            CcError::Validation(_) => "validation",
            CcError::NotFound(_) => "not_found",
            CcError::InvalidState(_) => "invalid_state",
            CcError::Provider(_) => "provider",
            CcError::Database(_) => "database",
            CcError::Internal(_) => "internal",
        }
    }

    /// Returns a client-safe error message (no internal details).
    pub fn client_message(&self) -> String {
        match self {
            CcError::Validation(msg) | CcError::InvalidState(msg) | CcError::NotFound(msg) => {
                msg.clone()
            }
            CcError::Provider(_) => "Upstream provider request failed".to_string(),
            CcError::Database(_) | CcError::Internal(_) => "An internal error occurred".to_string(),
        }
    }
}

impl IntoResponse for CcError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        crate::observability::metrics::record_error(self.error_type_label(), status.as_u16());

        if status.is_server_error() {
            tracing::error!(target: "cc.errors", error = %self, "Request failed");
        }

        let envelope = ErrorEnvelope {
            success: false,
            error: self.client_message(),
        };

        (status, Json(envelope)).into_response()
    }
}

impl From<sqlx::Error> for CcError {
    fn from(err: sqlx::Error) -> Self {
        CcError::Database(err.to_string())
    }
}

impl From<reqwest::Error> for CcError {
    fn from(err: reqwest::Error) -> Self {
        CcError::Provider(err.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(
            CcError::Validation("bad".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CcError::InvalidState("ended".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CcError::NotFound("meeting".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            CcError::Provider("timeout".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            CcError::Database("conn".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            CcError::Internal("oops".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_client_messages_hide_internal_details() {
        let db_err = CcError::Database("connection refused at 10.0.0.5:5432".to_string());
        assert!(!db_err.client_message().contains("10.0.0.5"));
        assert_eq!(db_err.client_message(), "An internal error occurred");

        let provider_err = CcError::Provider("500 from https://provider.internal".to_string());
        assert!(!provider_err.client_message().contains("provider.internal"));

        // Client-facing variants pass their message through
        let nf = CcError::NotFound("Meeting not found".to_string());
        assert_eq!(nf.client_message(), "Meeting not found");
    }

    #[test]
    fn test_error_type_label_exhaustive() {
        assert_eq!(
            CcError::Validation("x".to_string()).error_type_label(),
            "validation"
        );
        assert_eq!(
            CcError::NotFound("x".to_string()).error_type_label(),
            "not_found"
        );
        assert_eq!(
            CcError::InvalidState("x".to_string()).error_type_label(),
            "invalid_state"
        );
        assert_eq!(
            CcError::Provider("x".to_string()).error_type_label(),
            "provider"
        );
        assert_eq!(
            CcError::Database("x".to_string()).error_type_label(),
            "database"
        );
        assert_eq!(
            CcError::Internal("x".to_string()).error_type_label(),
            "internal"
        );
    }

    #[test]
    fn test_display_formatting() {
        assert_eq!(
            format!("{}", CcError::InvalidState("meeting has ended".to_string())),
            "Invalid state: meeting has ended"
        );
        assert_eq!(
            format!("{}", CcError::NotFound("Tenant not found".to_string())),
            "Not found: Tenant not found"
        );
    }

    #[test]
    fn test_from_sqlx_error() {
        let err: CcError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, CcError::Database(_)));
    }
}
