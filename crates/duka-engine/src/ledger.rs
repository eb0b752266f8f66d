//! # Inventory Ledger
//!
//! Owns the rule that committed stock never goes negative.
//!
//! ## Delta Application
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Applying Staged Deltas                               │
//! │                                                                         │
//! │  StagedDeltas (sorted)         caller's transaction                    │
//! │  ─────────────────────         ───────────────────────────────────     │
//! │  Mchele  -1  ───────────────►  UPDATE ... WHERE quantity - 1 >= 0      │
//! │  Sukari  -5  ───────────────►  UPDATE ... WHERE quantity - 5 >= 0      │
//! │                                   │                                    │
//! │                      no row back ─┴─► classify:                        │
//! │                                        product of shop, active         │
//! │                                          → InsufficientStock           │
//! │                                        otherwise → NotFound            │
//! │                                                                         │
//! │  Any error aborts the whole transaction; the caller never commits.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`InventoryLedger::ensure_known`] runs before the transaction opens, so an
//! unknown or inactive product is reported as `NotFound` whatever the stock
//! of the other lines. The classification above still covers a product
//! deactivated in between.
//!
//! The ledger never opens or commits transactions. Low-stock signals in
//! [`LedgerEntry`] are acted on after the caller commits.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use duka_core::ledger::{is_low_stock, StagedDeltas};
use duka_db::ProductRepository;

/// Outcome of one applied delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    pub product_id: String,
    pub delta: i64,
    pub new_quantity: i64,
    pub reorder_level: i64,
    /// `new_quantity <= reorder_level`
    pub low_stock: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryLedger;

impl InventoryLedger {
    /// Applies one signed delta to an active product of `shop_id`.
    ///
    /// ## Returns
    /// * `Err(InsufficientStock)` - the product exists but has too little stock
    /// * `Err(NotFound)` - missing, inactive, or belongs to another shop
    pub async fn apply(
        conn: &mut SqliteConnection,
        shop_id: &str,
        product_id: &str,
        delta: i64,
        now: DateTime<Utc>,
    ) -> EngineResult<LedgerEntry> {
        let level = ProductRepository::adjust_quantity(&mut *conn, product_id, shop_id, delta, now).await?;

        match level {
            Some(level) => {
                debug!(product_id, delta, quantity = level.quantity, "Ledger delta applied");
                Ok(LedgerEntry {
                    product_id: product_id.to_string(),
                    delta,
                    new_quantity: level.quantity,
                    reorder_level: level.reorder_level,
                    low_stock: is_low_stock(level.quantity, level.reorder_level),
                })
            }
            None => Err(Self::classify_rejection(conn, shop_id, product_id, delta).await?),
        }
    }

    /// Checks that every staged product is an active product of `shop_id`.
    ///
    /// ## Returns
    /// * `Err(NotFound)` - for the first staged id that is missing, inactive
    ///   or belongs to another shop
    pub async fn ensure_known(
        products: &ProductRepository,
        shop_id: &str,
        deltas: &StagedDeltas,
    ) -> EngineResult<()> {
        let ids: Vec<&str> = deltas.product_ids().collect();
        let found = products.active_ids_in_shop(shop_id, &ids).await?;

        match ids.into_iter().find(|id| !found.iter().any(|known| known == id)) {
            Some(missing) => {
                debug!(shop_id, product_id = missing, "Staged product is not sellable");
                Err(EngineError::not_found("Product", missing))
            }
            None => Ok(()),
        }
    }

    /// Applies every staged delta in product id order.
    pub async fn apply_all(
        conn: &mut SqliteConnection,
        shop_id: &str,
        deltas: &StagedDeltas,
        now: DateTime<Utc>,
    ) -> EngineResult<Vec<LedgerEntry>> {
        let mut entries = Vec::with_capacity(deltas.len());
        for (product_id, delta) in deltas.iter() {
            entries.push(Self::apply(&mut *conn, shop_id, product_id, delta, now).await?);
        }
        Ok(entries)
    }

    async fn classify_rejection(
        conn: &mut SqliteConnection,
        shop_id: &str,
        product_id: &str,
        delta: i64,
    ) -> EngineResult<EngineError> {
        let product = ProductRepository::get_by_id_with(conn, product_id).await?;

        Ok(match product {
            Some(p) if p.is_active && p.shop_id == shop_id => {
                debug!(product_id, available = p.quantity, delta, "Ledger delta rejected");
                EngineError::InsufficientStock {
                    product_id: p.id,
                    product_name: p.name,
                    available: p.quantity,
                    requested: -delta,
                }
            }
            _ => EngineError::not_found("Product", product_id),
        })
    }
}

/// Product ids whose entries crossed into low stock.
pub fn low_stock_products(entries: &[LedgerEntry]) -> Vec<String> {
    entries
        .iter()
        .filter(|entry| entry.low_stock)
        .map(|entry| entry.product_id.clone())
        .collect()
}
