//! # duka-core: Pure Business Logic for Duka POS
//!
//! Domain types and rules shared by every other crate. Nothing in here
//! touches a database, a socket or the system clock.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Duka POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Presentation layer (out of this workspace)         │   │
//! │  │     shop pages ──► sale form ──► offline queue ──► dashboards  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ operation contract                     │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        duka-sync (replay)  ──►  duka-engine (transactions)      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ duka-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  types  │ │  money  │ │ pricing │ │ ledger  │ │analytics│  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    duka-db (Entity Store)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Stored entities (Product, Sale, Alert, SyncRecord, ...)
//! - [`requests`] - Operation inputs and receipts
//! - [`money`] - Integer money in cents
//! - [`pricing`] - Server-side line and total computation
//! - [`ledger`] - Stock delta staging and the non-negative rule
//! - [`alert`] - Low-stock alert wording
//! - [`analytics`] - Reporting windows and aggregation math
//! - [`clock`] - Injectable time source
//! - [`numbering`] - Sale/order/payment reference generation
//! - [`validation`] - Field validators
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use duka_core::money::Money;
//! use duka_core::pricing::price_sale;
//! use duka_core::requests::SaleLine;
//!
//! let lines = vec![
//!     SaleLine::new("p-1", 3, 1_500),
//!     SaleLine::new("p-2", 1, 250),
//! ];
//! let priced = price_sale(&lines).unwrap();
//! assert_eq!(priced.total, Money::from_cents(4_750));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod alert;
pub mod analytics;
pub mod clock;
pub mod error;
pub mod ledger;
pub mod money;
pub mod numbering;
pub mod pricing;
pub mod requests;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use numbering::{RandomReference, ReferenceGenerator};
pub use requests::*;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed in a single sale or supplier order.
pub const MAX_SALE_ITEMS: usize = 100;

/// Maximum quantity of a single line.
///
/// ## Business Reason
/// Catches typos like 10000 instead of 10 before they drain a shop's stock.
pub const MAX_ITEM_QUANTITY: i64 = 10_000;

/// Reorder threshold applied when a product is created without one.
pub const DEFAULT_REORDER_LEVEL: i64 = 10;

/// Unit of measure applied when a product is created without one.
pub const DEFAULT_UNIT: &str = "pcs";

/// Interface language for newly registered users (Swahili).
pub const DEFAULT_LANGUAGE: &str = "sw";
