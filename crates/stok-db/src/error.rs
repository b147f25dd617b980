//! # Storage Error Types
//!
//! Error types for database and backup operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                            │
//! │                                                                 │
//! │  SQLite Error (sqlx::Error) / std::io::Error                    │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  DbError (this module) ← adds context and categorization,       │
//! │       │                  carries CoreError for domain failures  │
//! │       ▼                                                         │
//! │  ApiError (in the bridge) ← serialized for the caller           │
//! │                                                                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use stok_core::CoreError;
use thiserror::Error;

/// Storage operation errors.
///
/// Wraps sqlx and filesystem errors with enough context for user
/// feedback, and transports domain errors raised inside storage
/// transactions (not-found, insufficient stock, validation).
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in the store.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The store handle was explicitly closed and not reopened.
    ///
    /// ## When This Occurs
    /// - A restore left the store closed (`reopen = false`)
    /// - Access after shutdown
    ///
    /// There is no silent re-open: callers must `Store::reopen` first.
    #[error("store is closed; reopen it before further access")]
    Closed,

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file doesn't exist and can't be created
    /// - File permissions issue
    /// - Disk full
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Filesystem I/O failure (backup copy, snapshot pruning, export).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Domain error raised inside a storage operation
    /// (validation, article-not-found, insufficient stock).
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Internal database error.
    #[error("internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and id.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

impl From<csv::Error> for DbError {
    fn from(err: csv::Error) -> Self {
        DbError::Io(std::io::Error::new(std::io::ErrorKind::Other, err))
    }
}

impl From<stok_core::ValidationError> for DbError {
    fn from(err: stok_core::ValidationError) -> Self {
        DbError::Domain(CoreError::Validation(err))
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound  → DbError::NotFound
/// sqlx::Error::Database     → DbError::QueryFailed (with message)
/// sqlx::Error::PoolClosed   → DbError::Closed
/// Other                     → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "record",
                id: "unknown".to_string(),
            },
            sqlx::Error::Database(db_err) => DbError::QueryFailed(db_err.message().to_string()),
            sqlx::Error::PoolClosed => DbError::Closed,
            sqlx::Error::PoolTimedOut => {
                DbError::ConnectionFailed("connection pool exhausted".to_string())
            }
            _ => DbError::Internal(err.to_string()),
        }
    }
}

/// Result type for storage operations.
pub type DbResult<T> = Result<T, DbError>;
