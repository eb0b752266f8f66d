//! # Validation Module
//!
//! Field validators shared by the engine and the replay path.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Client forms / offline queue                                 │
//! │  └── Basic format checks, immediate feedback                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Engine (Rust)                                                │
//! │  └── THIS MODULE: field rules, before any transaction opens            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                       │
//! │  ├── CHECK (quantity >= 0)                                             │
//! │  ├── UNIQUE (sale_number, order_number, sku, phone)                    │
//! │  └── FOREIGN KEY constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::{MAX_ITEM_QUANTITY, MAX_SALE_ITEMS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required free-text field and returns it trimmed.
///
/// ```rust
/// use duka_core::validation::validate_text;
///
/// assert_eq!(validate_text("name", "  Duka la Mama ", 200).unwrap(), "Duka la Mama");
/// assert!(validate_text("name", "   ", 200).is_err());
/// ```
pub fn validate_text(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value.to_string())
}

/// Trims an optional field, mapping blank strings to `None`.
pub fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Validates a phone number.
///
/// ## Rules
/// - Optional leading `+`
/// - 9 to 15 digits, spaces ignored
pub fn validate_phone(phone: &str) -> ValidationResult<String> {
    let compact: String = phone.chars().filter(|c| !c.is_whitespace()).collect();

    if compact.is_empty() {
        return Err(ValidationError::required("phone"));
    }

    let digits = compact.strip_prefix('+').unwrap_or(&compact);
    if !digits.chars().all(|c| c.is_ascii_digit()) || !(9..=15).contains(&digits.len()) {
        return Err(ValidationError::invalid_format(
            "phone",
            "must be 9 to 15 digits with an optional leading +",
        ));
    }

    Ok(compact)
}

/// Validates a client idempotency key.
pub fn validate_idempotency_key(key: &str) -> ValidationResult<String> {
    let key = validate_text("idempotency_key", key, 128)?;

    if key.chars().any(char::is_control) {
        return Err(ValidationError::invalid_format(
            "idempotency_key",
            "must not contain control characters",
        ));
    }

    Ok(key)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity (1 ..= MAX_ITEM_QUANTITY).
pub fn validate_quantity(field: &str, quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    if quantity > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a monetary amount in cents (zero allowed, negative not).
pub fn validate_amount_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates an absolute stock count or threshold (zero allowed).
pub fn validate_stock_level(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates the number of lines of a sale or order.
pub fn validate_line_count(count: usize) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::required("items"));
    }

    if count > MAX_SALE_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_SALE_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_text() {
        assert!(validate_text("name", "Sukari", 10).is_ok());
        assert!(matches!(
            validate_text("name", "", 10),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_text("name", "Mchele wa Mbeya", 10),
            Err(ValidationError::TooLong { max: 10, .. })
        ));
    }

    #[test]
    fn test_normalize_optional() {
        assert_eq!(normalize_optional(Some("  Kariakoo ")), Some("Kariakoo".to_string()));
        assert_eq!(normalize_optional(Some("   ")), None);
        assert_eq!(normalize_optional(None), None);
    }

    #[test]
    fn test_validate_phone() {
        assert_eq!(validate_phone("+255 712 345 678").unwrap(), "+255712345678");
        assert!(validate_phone("0712345678").is_ok());
        assert!(validate_phone("12ab").is_err());
        assert!(validate_phone("").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity("quantity", 1).is_ok());
        assert!(validate_quantity("quantity", MAX_ITEM_QUANTITY).is_ok());
        assert!(matches!(
            validate_quantity("quantity", 0),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(validate_quantity("quantity", -3).is_err());
        assert!(validate_quantity("quantity", MAX_ITEM_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_amounts() {
        assert!(validate_amount_cents("price", 0).is_ok());
        assert!(validate_amount_cents("price", -1).is_err());
        assert!(validate_stock_level("reorder_level", 0).is_ok());
        assert!(validate_stock_level("quantity", -1).is_err());
    }

    #[test]
    fn test_validate_line_count() {
        assert!(validate_line_count(0).is_err());
        assert!(validate_line_count(1).is_ok());
        assert!(validate_line_count(MAX_SALE_ITEMS + 1).is_err());
    }

    #[test]
    fn test_validate_idempotency_key() {
        assert_eq!(validate_idempotency_key(" offline-42 ").unwrap(), "offline-42");
        assert!(validate_idempotency_key("").is_err());
        assert!(validate_idempotency_key(&"k".repeat(129)).is_err());
    }
}
