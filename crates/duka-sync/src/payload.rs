//! # Queued Operation Payloads
//!
//! JSON shapes an offline client uploads. Each wraps the online request DTO
//! and adds the two offline-only fields.
//!
//! ## Wire Format
//! ```json
//! {
//!   "shop_id": "…",
//!   "items": [{ "product_id": "…", "quantity": 2, "unit_price_cents": 1500 }],
//!   "payment_method": "mpesa",
//!   "created_at": "2026-03-10T07:12:00Z",
//!   "idempotency_key": "c0ffee-17"
//! }
//! ```
//! `created_at` defaults to the time of replay. `idempotency_key` is
//! optional; without it every replay is a new operation.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use duka_core::{NewExpense, NewSale};
use duka_engine::{EngineError, EngineResult};

/// Field carrying the client's idempotency key.
pub const IDEMPOTENCY_KEY_FIELD: &str = "idempotency_key";

/// A sale recorded while offline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalePayload {
    #[serde(flatten)]
    pub sale: NewSale,
    /// When the sale happened on the device.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

/// An expense recorded while offline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpensePayload {
    #[serde(flatten)]
    pub expense: NewExpense,
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

/// Decodes a payload, reporting shape errors as `Validation`.
pub fn decode<T: DeserializeOwned>(payload: &Value) -> EngineResult<T> {
    T::deserialize(payload).map_err(|err| EngineError::validation(format!("malformed payload: {err}")))
}

/// The idempotency key of a raw payload, read before the payload is
/// decoded so even a malformed upload is recorded under its key.
pub fn peek_idempotency_key(payload: &Value) -> Option<String> {
    payload
        .get(IDEMPOTENCY_KEY_FIELD)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use duka_core::{PaymentMethod, SaleLine};
    use serde_json::json;

    #[test]
    fn test_sale_payload_reads_offline_fields() {
        let payload = json!({
            "shop_id": "shop-1",
            "items": [{ "product_id": "p-1", "quantity": 2, "unit_price_cents": 1500 }],
            "payment_method": "mpesa",
            "created_at": "2026-03-10T07:12:00Z",
            "idempotency_key": "c0ffee-17"
        });

        let decoded: SalePayload = decode(&payload).unwrap();
        assert_eq!(decoded.sale.shop_id, "shop-1");
        assert_eq!(decoded.sale.items, vec![SaleLine::new("p-1", 2, 1_500)]);
        assert_eq!(decoded.sale.payment_method, PaymentMethod::Mpesa);
        assert_eq!(decoded.created_at.unwrap().to_rfc3339(), "2026-03-10T07:12:00+00:00");
        assert_eq!(decoded.idempotency_key.as_deref(), Some("c0ffee-17"));
    }

    #[test]
    fn test_missing_items_is_validation_error() {
        let err = decode::<SalePayload>(&json!({ "shop_id": "shop-1" })).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn test_peek_key_ignores_blank_and_non_string() {
        assert_eq!(peek_idempotency_key(&json!({ "idempotency_key": " k-1 " })).as_deref(), Some("k-1"));
        assert_eq!(peek_idempotency_key(&json!({ "idempotency_key": "  " })), None);
        assert_eq!(peek_idempotency_key(&json!({ "idempotency_key": 7 })), None);
        assert_eq!(peek_idempotency_key(&json!("not an object")), None);
    }
}
