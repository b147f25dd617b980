//! # API Error Type
//!
//! Unified error type for bridge responses.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  Error Flow in the Bridge                       │
//! │                                                                 │
//! │  {"op":"stock_exit","code":"A-1","quantity":99}                 │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  dispatch → StockLedger::exit                                   │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  DbError::Domain(InsufficientStock { .. })                      │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  ApiError { code: INSUFFICIENT_STOCK, message: "..." }          │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  {"ok":false,"error":{"code":"INSUFFICIENT_STOCK",...}}         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The caller gets both a machine-readable `code` and a human-readable
//! `message`; internal detail (sqlx messages, paths) stays in the log.

use serde::Serialize;
use stok_core::CoreError;
use stok_db::DbError;

/// API error returned in the response envelope.
///
/// ## Serialization
/// ```json
/// { "code": "NOT_FOUND", "message": "article 'A-001' does not exist" }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for bridge responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// A stock exit asked for more than is on hand
    InsufficientStock,

    /// The store is closed and must be reopened first
    StoreClosed,

    /// Database or filesystem operation failed
    StorageError,

    /// The request line was not a recognized operation
    BadRequest,

    /// Internal error
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a bad-request error for an unparseable request line.
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::BadRequest, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts storage errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        let code = match &err {
            DbError::NotFound { .. } => ErrorCode::NotFound,
            DbError::Closed => ErrorCode::StoreClosed,
            DbError::Domain(CoreError::ArticleNotFound(_)) => ErrorCode::NotFound,
            DbError::Domain(CoreError::InsufficientStock { .. }) => ErrorCode::InsufficientStock,
            DbError::Domain(CoreError::Validation(_)) => ErrorCode::ValidationError,
            DbError::ConnectionFailed(_)
            | DbError::MigrationFailed(_)
            | DbError::QueryFailed(_)
            | DbError::Io(_) => ErrorCode::StorageError,
            DbError::Internal(_) => ErrorCode::Internal,
        };
        ApiError::new(code, err.to_string())
    }
}

/// Result type for dispatch handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_maps_to_its_own_code() {
        let err: ApiError = DbError::Domain(CoreError::InsufficientStock {
            code: "A-1".to_string(),
            available: 3,
            requested: 5,
        })
        .into();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert!(err.message.contains("A-1"));
    }

    #[test]
    fn test_closed_store_maps_to_store_closed() {
        let err: ApiError = DbError::Closed.into();
        assert_eq!(err.code, ErrorCode::StoreClosed);
    }

    #[test]
    fn test_error_code_serializes_screaming_snake() {
        let err = ApiError::new(ErrorCode::ValidationError, "bad input");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["message"], "bad input");
    }
}
