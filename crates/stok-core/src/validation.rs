//! # Validation Module
//!
//! Standalone input validators used at the storage and bridge
//! boundaries, in addition to [`crate::Article::validate`].
//!
//! ## Usage
//! ```rust
//! use stok_core::validation::{validate_code, validate_quantity};
//!
//! validate_code("A-001").unwrap();
//! validate_quantity(5).unwrap();
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates an article code.
///
/// ## Rules
/// - Must not be empty after trimming
/// - Must be at most 64 characters
pub fn validate_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required { field: "code" });
    }
    if code.len() > 64 {
        return Err(ValidationError::TooLong {
            field: "code",
            max: 64,
        });
    }
    Ok(())
}

/// Validates a stock movement quantity.
///
/// Entry and exit both require a strictly positive quantity. There is
/// deliberately no upper bound: movement size is unbounded.
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive { field: "quantity" });
    }
    Ok(())
}

/// Validates a lookup-entity name (brand, supplier, category).
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required { field: "name" });
    }
    if name.len() > 128 {
        return Err(ValidationError::TooLong {
            field: "name",
            max: 128,
        });
    }
    Ok(())
}

/// Validates a percent value used by mass tax/margin updates.
pub fn validate_percent(value: f64) -> ValidationResult<()> {
    if !value.is_finite() {
        return Err(ValidationError::InvalidNumber { field: "percent" });
    }
    if value < 0.0 {
        return Err(ValidationError::MustBeNonNegative { field: "percent" });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_rules() {
        assert!(validate_code("A-001").is_ok());
        assert!(validate_code("   ").is_err());
        assert!(validate_code(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_quantity_rules() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(i64::MAX).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
    }

    #[test]
    fn test_name_rules() {
        assert!(validate_name("Acme").is_ok());
        assert!(validate_name("").is_err());
    }

    #[test]
    fn test_percent_rules() {
        assert!(validate_percent(21.0).is_ok());
        assert!(validate_percent(0.0).is_ok());
        assert!(validate_percent(-1.0).is_err());
        assert!(validate_percent(f64::NAN).is_err());
    }
}
