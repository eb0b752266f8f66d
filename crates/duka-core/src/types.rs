//! # Domain Types
//!
//! Stored entities used throughout Duka POS.
//!
//! ## Ownership Graph
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │   User ──owns──► Shop ──owns──► Product ◄──references── SaleItem       │
//! │    │               │                                       ▲            │
//! │    │               └──owns──► Sale ──owns──────────────────┘            │
//! │    │                                                                    │
//! │    ├──owns──► Expense                                                   │
//! │    ├──owns──► Alert (generated, never user-created)                     │
//! │    ├──owns──► SyncRecord (append-only audit trail)                      │
//! │    └──buys──► Order ──owns──► OrderItem        Supplier ◄── Order       │
//! │                                                                         │
//! │  "owns" edges cascade on delete; "references" edges never do.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every entity has a UUID v4 `id`. Sales and orders also carry a
//! human-readable business number (`sale_number`, `order_number`) guarded by
//! a UNIQUE constraint in the store.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Roles and Acting User
// =============================================================================

/// Closed set of user roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Owns shops, sells, records expenses.
    Vendor,
    /// Oversees every tenant.
    Admin,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Vendor => "vendor",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vendor" => Ok(Role::Vendor),
            "admin" => Ok(Role::Admin),
            _ => Err(ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: vec!["vendor".to_string(), "admin".to_string()],
            }),
        }
    }
}

/// The authenticated caller of an engine operation.
///
/// Passed explicitly into every operation. Authentication happens before
/// the engine is reached; the engine only scopes data by it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ActingUser {
    pub user_id: String,
    pub role: Role,
}

impl ActingUser {
    pub fn vendor(user_id: impl Into<String>) -> Self {
        ActingUser {
            user_id: user_id.into(),
            role: Role::Vendor,
        }
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        ActingUser {
            user_id: user_id.into(),
            role: Role::Admin,
        }
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}

// =============================================================================
// User
// =============================================================================

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: String,
    /// Login identifier, unique across the store.
    pub phone: String,
    pub name: String,
    pub email: Option<String>,
    pub role: Role,
    pub is_active: bool,
    /// UI language code (`sw`, `en`).
    pub language: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Shop
// =============================================================================

/// A vendor's shop. Owns its products and sales.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Shop {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub category: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A stock-keeping item in a shop.
///
/// `quantity` is never negative after a committed operation. It changes only
/// through the inventory ledger or a direct administrative edit, and every
/// change bumps `version`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub shop_id: String,
    pub name: String,
    pub description: Option<String>,
    /// Selling price in cents.
    pub price_cents: i64,
    /// Purchase cost in cents (for margins).
    pub cost_cents: Option<i64>,
    /// Units on hand.
    pub quantity: i64,
    /// Unit of measure (`pcs`, `kg`, `ltr`).
    pub unit: String,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub category: Option<String>,
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<NaiveDate>,
    /// At or below this quantity the product is "low stock".
    pub reorder_level: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    /// Incremented on every stock or field change.
    pub version: i64,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// True when stock has reached the reorder threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        crate::ledger::is_low_stock(self.quantity, self.reorder_level)
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// Lifecycle of a sale: `created → completed`, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Created,
    Completed,
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Mpesa,
    #[serde(rename = "tigopesa")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "tigopesa"))]
    TigoPesa,
    AirtelMoney,
}

impl PaymentMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Mpesa => "mpesa",
            PaymentMethod::TigoPesa => "tigopesa",
            PaymentMethod::AirtelMoney => "airtel_money",
        }
    }

    /// Mobile money methods go through the payment initiation stub.
    pub const fn is_mobile_money(&self) -> bool {
        !matches!(self, PaymentMethod::Cash)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Sale & SaleItem
// =============================================================================

/// A committed point-of-sale transaction.
///
/// `total_cents` always equals the sum of its items' `subtotal_cents`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub shop_id: String,
    /// Human-readable unique number (`SALE-YYMMDD-XXXXXXXX`).
    pub sale_number: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub payment_reference: Option<String>,
    pub status: SaleStatus,
    pub notes: Option<String>,
    /// Client idempotency key for offline replays.
    pub client_ref: Option<String>,
    /// Server time online, client time for offline replays.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line of a sale. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// `quantity × unit_price_cents`.
    pub subtotal_cents: i64,
}

// =============================================================================
// Expense
// =============================================================================

/// A business expense recorded by a user. Independent of inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Expense {
    pub id: String,
    pub user_id: String,
    pub category: String,
    pub amount_cents: i64,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub payment_method: Option<PaymentMethod>,
    pub receipt_number: Option<String>,
    pub client_ref: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Supplier, Order & OrderItem
// =============================================================================

/// A wholesaler vendors can order stock from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub category: Option<String>,
    /// Average rating, 0.0 to 5.0.
    pub rating: f64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Supplier order lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Approved,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Approved,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Approved => "approved",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: OrderStatus::ALL
                    .iter()
                    .map(|status| status.as_str().to_string())
                    .collect(),
            })
    }
}

/// A purchase request from a vendor to a supplier.
///
/// Orders never touch the inventory ledger; they are request records only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    /// Human-readable unique number (`ORD-YYMMDD-XXXXXXXX`).
    pub order_number: String,
    pub buyer_id: String,
    pub supplier_id: String,
    pub status: OrderStatus,
    pub total_cents: i64,
    #[ts(as = "Option<String>")]
    pub delivery_date: Option<NaiveDate>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A line of a supplier order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

// =============================================================================
// Alert
// =============================================================================

/// Kind of generated notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    LowStock,
    System,
}

/// A notification for a user. Generated by the engine, never user-created.
///
/// At most one unread alert exists per `(user_id, product_id, alert_type)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Alert {
    pub id: String,
    pub user_id: String,
    pub product_id: Option<String>,
    pub title: String,
    pub message: String,
    pub alert_type: AlertType,
    pub is_read: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sync Record
// =============================================================================

/// Kind of operation replayed from an offline client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum SyncKind {
    Sale,
    Expense,
}

impl SyncKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SyncKind::Sale => "sale",
            SyncKind::Expense => "expense",
        }
    }
}

impl FromStr for SyncKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sale" => Ok(SyncKind::Sale),
            "expense" => Ok(SyncKind::Expense),
            _ => Err(ValidationError::NotAllowed {
                field: "kind".to_string(),
                allowed: vec!["sale".to_string(), "expense".to_string()],
            }),
        }
    }
}

/// Status of one reconciliation attempt.
///
/// ```text
///   pending ──► completed
///      │
///      └──────► failed
/// ```
/// No other transition is ever written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Pending,
    Completed,
    Failed,
}

/// Durable audit entry for one replay of an offline operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SyncRecord {
    pub id: String,
    pub user_id: String,
    pub kind: SyncKind,
    /// The submitted payload, verbatim JSON.
    pub payload: String,
    pub idempotency_key: Option<String>,
    pub status: SyncStatus,
    /// Serialized `{code, message}` when `status == failed`.
    pub error: Option<String>,
    /// Id of the Sale or Expense the replay produced or matched.
    pub result_id: Option<String>,
    #[ts(as = "String")]
    pub submitted_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub completed_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_parse() {
        assert_eq!("shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);

        let err = "lost".parse::<OrderStatus>().unwrap_err();
        assert!(matches!(err, ValidationError::NotAllowed { ref allowed, .. } if allowed.len() == 5));
    }

    #[test]
    fn test_payment_method_wire_names() {
        let json = serde_json::to_string(&PaymentMethod::TigoPesa).unwrap();
        assert_eq!(json, "\"tigopesa\"");
        let parsed: PaymentMethod = serde_json::from_str("\"airtel_money\"").unwrap();
        assert_eq!(parsed, PaymentMethod::AirtelMoney);
        assert_eq!(PaymentMethod::default(), PaymentMethod::Cash);
        assert!(!PaymentMethod::Cash.is_mobile_money());
    }

    #[test]
    fn test_role_and_kind_parse() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("owner".parse::<Role>().is_err());
        assert_eq!("expense".parse::<SyncKind>().unwrap(), SyncKind::Expense);
        assert!("refund".parse::<SyncKind>().is_err());
    }

    #[test]
    fn test_acting_user() {
        assert!(ActingUser::admin("u-1").is_admin());
        assert!(!ActingUser::vendor("u-2").is_admin());
    }
}
