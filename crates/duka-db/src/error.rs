//! # Database Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← constraint kind + offending columns           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  EngineError (duka-engine) ← NotFound / Conflict / StoreUnavailable    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Generated sale/order number collided
    /// - Idempotency key reused for the same shop or user
    /// - Duplicate phone or SKU
    ///
    /// `field` holds the columns SQLite reported, e.g. `sales.sale_number`
    /// or `sales.shop_id, sales.client_ref`.
    #[error("Duplicate {field}")]
    UniqueViolation { field: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// CHECK constraint violation (e.g. `quantity >= 0`).
    #[error("Check constraint violation: {message}")]
    CheckViolation { message: String },

    /// A status transition found the row in an unexpected state.
    #[error("{entity} {id} is not {expected}")]
    InvalidState {
        entity: String,
        id: String,
        expected: String,
    },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Runtime SQL error.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Stored value could not be decoded.
    #[error("Decode failed: {0}")]
    Decode(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// True when this is a UNIQUE violation involving `column`
    /// (`table.column` as SQLite reports it).
    pub fn is_unique_violation_on(&self, column: &str) -> bool {
        matches!(self, DbError::UniqueViolation { field } if field.split(", ").any(|c| c == column))
    }

    /// True for failures of the store itself rather than of the request.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            DbError::ConnectionFailed(_)
                | DbError::MigrationFailed(_)
                | DbError::QueryFailed(_)
                | DbError::Decode(_)
                | DbError::PoolExhausted
                | DbError::Internal(_)
        )
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → constraint kind from the SQLite message
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// sqlx::Error::ColumnDecode   → DbError::Decode
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // "UNIQUE constraint failed: <table>.<column>[, <table>.<column>]"
                if let Some(columns) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::UniqueViolation {
                        field: columns.to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("CHECK constraint failed") {
                    DbError::CheckViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => DbError::Decode(err.to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_column_match() {
        let err = DbError::UniqueViolation {
            field: "sales.shop_id, sales.client_ref".to_string(),
        };
        assert!(err.is_unique_violation_on("sales.client_ref"));
        assert!(!err.is_unique_violation_on("sales.sale_number"));
        assert!(!DbError::PoolExhausted.is_unique_violation_on("sales.client_ref"));
    }

    #[test]
    fn test_unavailable_classification() {
        assert!(DbError::PoolExhausted.is_unavailable());
        assert!(!DbError::not_found("Product", "p-1").is_unavailable());
    }
}
