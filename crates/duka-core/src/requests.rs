//! # Operation Inputs and Receipts
//!
//! DTOs that cross the operation contract between the presentation layer
//! and the engine. Monetary fields are always cents.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{PaymentMethod, Role};

// =============================================================================
// Sales
// =============================================================================

/// One cart line submitted for a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleLine {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

impl SaleLine {
    pub fn new(product_id: impl Into<String>, quantity: i64, unit_price_cents: i64) -> Self {
        SaleLine {
            product_id: product_id.into(),
            quantity,
            unit_price_cents,
        }
    }
}

/// Input of `createSale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSale {
    pub shop_id: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub payment_reference: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub items: Vec<SaleLine>,
    /// Total as computed by the client. Never persisted; the engine derives
    /// the total from the lines and only logs a mismatch.
    #[serde(default)]
    pub client_total_cents: Option<i64>,
}

impl NewSale {
    /// A cash sale with no customer details.
    pub fn new(shop_id: impl Into<String>, items: Vec<SaleLine>) -> Self {
        NewSale {
            shop_id: shop_id.into(),
            customer_name: None,
            customer_phone: None,
            payment_method: PaymentMethod::Cash,
            payment_reference: None,
            notes: None,
            items,
            client_total_cents: None,
        }
    }
}

/// Result of a committed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleReceipt {
    pub sale_id: String,
    pub sale_number: String,
    pub total_cents: i64,
}

// =============================================================================
// Expenses
// =============================================================================

/// Input of `recordExpense`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewExpense {
    pub category: String,
    pub amount_cents: i64,
    #[ts(as = "String")]
    pub date: NaiveDate,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub receipt_number: Option<String>,
}

// =============================================================================
// Users & Shops
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewUser {
    pub phone: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewShop {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

// =============================================================================
// Products
// =============================================================================

/// Input of `addProduct`. Absent optional fields take shop defaults
/// (unit `pcs`, reorder level 10, generated SKU).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub shop_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub cost_cents: Option<i64>,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub reorder_level: Option<i64>,
}

/// Direct administrative edit of a product. `None` leaves a field as is.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price_cents: Option<i64>,
    #[serde(default)]
    pub cost_cents: Option<i64>,
    /// Absolute stock count. Bypasses the ledger but not the
    /// non-negative rule.
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub reorder_level: Option<i64>,
}

// =============================================================================
// Suppliers & Orders
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSupplier {
    pub name: String,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// One line of a supplier order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderLine {
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

impl OrderLine {
    pub fn new(product_name: impl Into<String>, quantity: i64, unit_price_cents: i64) -> Self {
        OrderLine {
            product_name: product_name.into(),
            quantity,
            unit_price_cents,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewOrder {
    pub supplier_id: String,
    pub items: Vec<OrderLine>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub delivery_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderReceipt {
    pub order_id: String,
    pub order_number: String,
    pub total_cents: i64,
}

// =============================================================================
// Payments
// =============================================================================

/// Mobile money payment request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentRequest {
    pub payment_method: PaymentMethod,
    pub phone_number: String,
    pub amount_cents: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
}

/// Synthetic acknowledgement returned by the payment stub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentInitiation {
    pub payment_reference: String,
    pub status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub amount_cents: i64,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sale_defaults_from_json() {
        let sale: NewSale = serde_json::from_value(serde_json::json!({
            "shop_id": "s-1",
            "items": [{ "product_id": "p-1", "quantity": 2, "unit_price_cents": 500 }]
        }))
        .unwrap();

        assert_eq!(sale.payment_method, PaymentMethod::Cash);
        assert_eq!(sale.items, vec![SaleLine::new("p-1", 2, 500)]);
        assert!(sale.client_total_cents.is_none());
    }
}
