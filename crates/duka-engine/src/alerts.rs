//! # Alert Generator
//!
//! Derives low-stock notifications from inventory state.
//!
//! ## De-duplication
//! ```text
//! key = (user_id, product_id, low_stock)
//!
//!   scan_low_stock(U)  P low, no unread alert   → alert created
//!   scan_low_stock(U)  P low, unread alert      → nothing (idempotent)
//!   mark_read(U, a)                             → key released
//!   scan_low_stock(U)  P still low              → alert created again
//! ```
//! The store enforces the key with a partial unique index, so concurrent
//! scans cannot both insert.

use tracing::{debug, info};

use crate::error::EngineResult;
use crate::Engine;
use duka_core::alert::{low_stock_message, LOW_STOCK_TITLE};
use duka_core::numbering::new_id;
use duka_core::{Alert, AlertType, Product};

#[derive(Debug, Clone, Copy)]
pub struct AlertGenerator<'a> {
    engine: &'a Engine,
}

impl<'a> AlertGenerator<'a> {
    pub(crate) fn new(engine: &'a Engine) -> Self {
        AlertGenerator { engine }
    }

    /// Raises a low-stock alert for every low active product in the
    /// user's active shops. Returns the number of alerts created.
    pub async fn scan_low_stock(&self, user_id: &str) -> EngineResult<usize> {
        let products = self.engine.db().products().low_stock_for_owner(user_id).await?;

        let mut created = 0;
        for product in &products {
            if self.raise(user_id, product).await? {
                created += 1;
            }
        }

        info!(user_id, low = products.len(), created, "Low-stock scan complete");
        Ok(created)
    }

    /// Raises alerts for the given products that are currently low.
    /// Used after a sale commits.
    pub async fn raise_for_products(&self, owner_id: &str, product_ids: &[String]) -> EngineResult<usize> {
        let mut created = 0;
        for product_id in product_ids {
            let Some(product) = self.engine.db().products().get_by_id(product_id).await? else {
                continue;
            };
            if product.is_active && product.is_low_stock() && self.raise(owner_id, &product).await? {
                created += 1;
            }
        }
        Ok(created)
    }

    /// Inserts one low-stock alert unless an unread one exists.
    pub(crate) async fn raise(&self, user_id: &str, product: &Product) -> EngineResult<bool> {
        let alert = Alert {
            id: new_id(),
            user_id: user_id.to_string(),
            product_id: Some(product.id.clone()),
            title: LOW_STOCK_TITLE.to_string(),
            message: low_stock_message(product),
            alert_type: AlertType::LowStock,
            is_read: false,
            created_at: self.engine.now(),
        };

        let created = self.engine.db().alerts().insert_if_absent(&alert).await?;
        debug!(user_id, product_id = %product.id, created, "Low-stock alert");
        Ok(created)
    }

    /// Unread low-stock alerts, newest first.
    pub async fn list_low_stock_alerts(&self, user_id: &str) -> EngineResult<Vec<Alert>> {
        Ok(self
            .engine
            .db()
            .alerts()
            .list_unread_of_type(user_id, AlertType::LowStock)
            .await?)
    }

    /// All of a user's alerts, newest first.
    pub async fn list_alerts(&self, user_id: &str, unread_only: bool) -> EngineResult<Vec<Alert>> {
        Ok(self.engine.db().alerts().list_for_user(user_id, unread_only).await?)
    }

    /// Marks one of the user's alerts read. Other users' alerts are `NotFound`.
    pub async fn mark_read(&self, user_id: &str, alert_id: &str) -> EngineResult<()> {
        Ok(self.engine.db().alerts().mark_read(user_id, alert_id).await?)
    }

    pub async fn unread_count(&self, user_id: &str) -> EngineResult<i64> {
        Ok(self.engine.db().alerts().unread_count(user_id).await?)
    }
}
