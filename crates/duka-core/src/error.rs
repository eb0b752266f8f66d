//! # Error Types
//!
//! Domain-specific error types for duka-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  duka-core errors (this file)                                          │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  duka-db errors                                                        │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  duka-engine errors                                                    │
//! │  └── EngineError      - What callers see (coded, serializable)         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ─┐                                  │
//! │                            DbError ─┴→ EngineError → caller            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found or is inactive.
    ///
    /// ## When This Occurs
    /// - Product ID doesn't exist
    /// - Product was deactivated
    /// - Product belongs to a different shop than the sale
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Shop cannot be found, is inactive, or is not visible to the actor.
    #[error("Shop not found: {0}")]
    ShopNotFound(String),

    /// Applying a stock delta would drive quantity below zero.
    ///
    /// ## User Workflow
    /// ```text
    /// Sale line (qty: 5)
    ///      │
    ///      ▼
    /// Ledger: available=2
    ///      │
    ///      ▼
    /// InsufficientStock { product_name: "Sukari 1kg", available: 2, requested: 5 }
    ///      │
    ///      ▼
    /// Whole sale rolled back, nothing persisted
    /// ```
    #[error("Insufficient stock for {product_name}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        product_name: String,
        available: i64,
        requested: i64,
    },

    /// A computed amount does not fit in 64-bit cents.
    #[error("Amount overflow while computing {field}")]
    AmountOverflow { field: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or greater.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid date, malformed payload).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Shorthand for [`ValidationError::InvalidFormat`].
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
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
            product_id: "p-1".to_string(),
            product_name: "Sukari 1kg".to_string(),
            available: 2,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Sukari 1kg: available 2, requested 5"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(ValidationError::required("items").to_string(), "items is required");

        let err = ValidationError::MustBePositive {
            field: "items[0].quantity".to_string(),
        };
        assert_eq!(err.to_string(), "items[0].quantity must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("category").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
