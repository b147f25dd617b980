//! # Error Types
//!
//! Domain-specific error types for stok-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Error Types                             │
//! │                                                                 │
//! │  stok-core errors (this file)                                   │
//! │  ├── CoreError        - Business rule violations                │
//! │  └── ValidationError  - Input validation failures               │
//! │                                                                 │
//! │  stok-db errors (separate crate)                                │
//! │  └── DbError          - Storage operation failures              │
//! │                                                                 │
//! │  Bridge errors (in app)                                         │
//! │  └── ApiError         - What the caller sees (serialized)       │
//! │                                                                 │
//! │  Flow: ValidationError → CoreError → DbError → ApiError         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (article code, quantities, ...)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. They are caught at
/// the bridge boundary and translated to user-facing messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No article exists with the given code.
    #[error("article '{0}' does not exist")]
    ArticleNotFound(String),

    /// Stock exit requested beyond the available quantity.
    ///
    /// Carries both sides so the caller can present an informative
    /// message ("insufficient stock: available 3, requested 5").
    #[error("insufficient stock for '{code}': available {available}, requested {requested}")]
    InsufficientStock {
        code: String,
        available: i64,
        requested: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input doesn't meet the contract. Used for
/// early validation before any storage work runs, so a failed call has
/// no effect.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: &'static str },

    /// Value must be strictly greater than zero.
    #[error("{field} must be greater than 0")]
    MustBePositive { field: &'static str },

    /// Value must be zero or greater.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: &'static str },

    /// Numeric value is not a usable number.
    #[error("{field} is not a valid number")]
    InvalidNumber { field: &'static str },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message() {
        let err = CoreError::InsufficientStock {
            code: "A-001".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "insufficient stock for 'A-001': available 3, requested 5"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required { field: "codigo" };
        assert_eq!(err.to_string(), "codigo is required");

        let err = ValidationError::MustBePositive { field: "cantidad" };
        assert_eq!(err.to_string(), "cantidad must be greater than 0");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required { field: "codigo" };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
