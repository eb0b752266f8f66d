//! # Engine Error Types
//!
//! The error taxonomy every operation reports.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       EngineError Categories                            │
//! │                                                                         │
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────────┐  │
//! │  │  Request Errors  │  │  Stock Errors    │  │  Store Errors        │  │
//! │  │                  │  │                  │  │                      │  │
//! │  │  Validation      │  │  Insufficient-   │  │  StoreUnavailable    │  │
//! │  │  NotFound        │  │  Stock           │  │  (logged, never      │  │
//! │  │  Conflict        │  │                  │  │   swallowed)         │  │
//! │  └──────────────────┘  └──────────────────┘  └──────────────────────┘  │
//! │                                                                         │
//! │  Every variant aborts the enclosing transaction.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Conversions
//! ```text
//! CoreError::InsufficientStock  → InsufficientStock
//! CoreError::*NotFound          → NotFound
//! CoreError::* / ValidationError→ Validation
//! DbError::NotFound / FK        → NotFound
//! DbError::UniqueViolation      → Conflict
//! DbError::InvalidState         → Conflict
//! DbError::CheckViolation       → Validation
//! DbError::* (store failures)   → StoreUnavailable
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;
use ts_rs::TS;

use duka_core::{CoreError, ValidationError};
use duka_db::DbError;

/// Errors returned by engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed or out-of-range input.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Referenced entity is missing, inactive or not visible to the actor.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A ledger delta would drive stock below zero.
    ///
    /// ## When This Occurs
    /// - Cart quantity (summed per product) exceeds committed stock
    /// - A concurrent sale took the last units first
    #[error("Insufficient stock for {product_name}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        product_name: String,
        available: i64,
        requested: i64,
    },

    /// A uniqueness rule could not be satisfied.
    ///
    /// ## When This Occurs
    /// - Business number still colliding after every retry
    /// - Duplicate phone number or SKU
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The store failed independently of the request.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        EngineError::Validation(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::Validation(_) => ErrorCode::ValidationError,
            EngineError::NotFound { .. } => ErrorCode::NotFound,
            EngineError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            EngineError::Conflict(_) => ErrorCode::Conflict,
            EngineError::StoreUnavailable(_) => ErrorCode::StoreUnavailable,
        }
    }

    /// Serializable form stored on failed sync records.
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

// =============================================================================
// Error Codes
// =============================================================================

/// Stable machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    NotFound,
    InsufficientStock,
    Conflict,
    StoreUnavailable,
}

impl ErrorCode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::InsufficientStock => "INSUFFICIENT_STOCK",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::StoreUnavailable => "STORE_UNAVAILABLE",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{code, message}` as persisted in `sync_records.error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorReport {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| format!(r#"{{"code":"{}","message":""}}"#, self.code))
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Validation(err.to_string())
    }
}

impl From<CoreError> for EngineError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InsufficientStock {
                product_id,
                product_name,
                available,
                requested,
            } => EngineError::InsufficientStock {
                product_id,
                product_name,
                available,
                requested,
            },
            CoreError::ProductNotFound(id) => EngineError::not_found("Product", id),
            CoreError::ShopNotFound(id) => EngineError::not_found("Shop", id),
            CoreError::Validation(inner) => inner.into(),
            other => EngineError::Validation(other.to_string()),
        }
    }
}

impl From<DbError> for EngineError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            DbError::ForeignKeyViolation { message } => EngineError::not_found("Reference", message),
            DbError::UniqueViolation { field } => EngineError::Conflict(format!("duplicate {field}")),
            DbError::CheckViolation { message } => EngineError::Validation(message),
            DbError::InvalidState { entity, id, expected } => {
                EngineError::Conflict(format!("{entity} {id} is not {expected}"))
            }
            other => {
                error!(error = %other, "Store failure");
                EngineError::StoreUnavailable(other.to_string())
            }
        }
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        DbError::from(err).into()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_serialize_screaming_snake() {
        let report = EngineError::validation("items is required").report();
        assert_eq!(
            report.to_json(),
            r#"{"code":"VALIDATION_ERROR","message":"Validation failed: items is required"}"#
        );

        let parsed: ErrorReport = serde_json::from_str(&report.to_json()).unwrap();
        assert_eq!(parsed.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_core_conversion() {
        let err: EngineError = CoreError::InsufficientStock {
            product_id: "p-1".into(),
            product_name: "Sukari".into(),
            available: 2,
            requested: 5,
        }
        .into();
        assert_eq!(err.code(), ErrorCode::InsufficientStock);

        let err: EngineError = CoreError::AmountOverflow { field: "total".into() }.into();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        let err: EngineError = CoreError::ShopNotFound("s-1".into()).into();
        assert!(matches!(err, EngineError::NotFound { ref entity, .. } if entity == "Shop"));
    }

    #[test]
    fn test_db_conversion() {
        let err: EngineError = DbError::UniqueViolation {
            field: "users.phone".into(),
        }
        .into();
        assert_eq!(err.code(), ErrorCode::Conflict);

        let err: EngineError = DbError::PoolExhausted.into();
        assert_eq!(err.code(), ErrorCode::StoreUnavailable);

        let err: EngineError = DbError::not_found("Alert", "a-1").into();
        assert_eq!(err.to_string(), "Alert not found: a-1");
    }
}
