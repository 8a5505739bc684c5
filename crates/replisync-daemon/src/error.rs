//! Error types for replisync-daemon

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use replisync_types::{ObjectKey, PatchError, ResourceVersion};
use serde::Serialize;
use thiserror::Error;

/// Daemon-level errors
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server startup error
    #[error("Server error: {0}")]
    Server(String),

    /// Store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Resource store errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Target object does not exist
    #[error("Not found: {0}")]
    NotFound(ObjectKey),

    /// Conditional write against a stale version
    #[error("Version conflict on {key}: expected {expected}, found {actual}")]
    VersionConflict {
        key: ObjectKey,
        expected: ResourceVersion,
        actual: ResourceVersion,
    },

    /// Backend unreachable, throttled, or timed out
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Stored or patched data could not be (de)serialized
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<PatchError> for StoreError {
    fn from(err: PatchError) -> Self {
        StoreError::InvalidData(err.to_string())
    }
}

/// Reconciliation failures. Every variant is retryable.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Failed to get primary {key}: {source}")]
    GetPrimary {
        key: ObjectKey,
        #[source]
        source: StoreError,
    },

    #[error("Failed to get secondary {key}: {source}")]
    GetSecondary {
        key: ObjectKey,
        #[source]
        source: StoreError,
    },

    #[error("Secondary {key} changed concurrently: {source}")]
    Conflict {
        key: ObjectKey,
        #[source]
        source: StoreError,
    },

    #[error("Failed to patch secondary {key}: {source}")]
    Patch {
        key: ObjectKey,
        #[source]
        source: StoreError,
    },
}

impl ReconcileError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, ReconcileError::Conflict { .. })
    }
}

/// API-specific errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Conflict
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Store(StoreError::NotFound(_)) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Store(StoreError::VersionConflict { .. }) => {
                (StatusCode::CONFLICT, "VERSION_CONFLICT")
            }
            ApiError::Store(StoreError::Unavailable(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE")
            }
            ApiError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR"),
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type alias for daemon operations
pub type DaemonResult<T> = Result<T, DaemonError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_status_codes() {
        assert_eq!(
            ApiError::NotFound("test".to_string()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::BadRequest("test".to_string())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Store(StoreError::VersionConflict {
                key: ObjectKey::new("ns", "cache-1"),
                expected: ResourceVersion::new(1),
                actual: ResourceVersion::new(2),
            })
            .into_response()
            .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Store(StoreError::Unavailable("down".to_string()))
                .into_response()
                .status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_reconcile_error_conflict_flag() {
        let key = ObjectKey::new("ns", "cache-1");
        let conflict = ReconcileError::Conflict {
            key: key.clone(),
            source: StoreError::VersionConflict {
                key: key.clone(),
                expected: ResourceVersion::new(1),
                actual: ResourceVersion::new(2),
            },
        };
        assert!(conflict.is_conflict());

        let transient = ReconcileError::GetPrimary {
            key: key.clone(),
            source: StoreError::Unavailable("timeout".to_string()),
        };
        assert!(!transient.is_conflict());
        assert!(transient.to_string().contains("ns/cache-1"));
    }
}
