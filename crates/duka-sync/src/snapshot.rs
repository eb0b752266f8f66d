//! # Download Snapshot
//!
//! The catalog slice an offline client caches: the vendor's active shops
//! and their active products, ordered by name then id so repeated reads
//! of an unchanged catalog are identical.
//!
//! Administrators have no till to run offline and receive an empty bundle.

use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use duka_core::{ActingUser, Product, Shop};
use duka_engine::{Engine, EngineResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SnapshotShop {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
}

impl From<Shop> for SnapshotShop {
    fn from(shop: Shop) -> Self {
        SnapshotShop {
            id: shop.id,
            name: shop.name,
            category: shop.category,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SnapshotProduct {
    pub id: String,
    pub name: String,
    pub price_cents: i64,
    pub quantity: i64,
    pub shop_id: String,
    pub unit: String,
}

impl From<Product> for SnapshotProduct {
    fn from(product: Product) -> Self {
        SnapshotProduct {
            id: product.id,
            name: product.name,
            price_cents: product.price_cents,
            quantity: product.quantity,
            shop_id: product.shop_id,
            unit: product.unit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DownloadSnapshot {
    pub shops: Vec<SnapshotShop>,
    pub products: Vec<SnapshotProduct>,
}

impl DownloadSnapshot {
    /// Reads the bundle for `actor`. Read-only.
    pub async fn for_actor(engine: &Engine, actor: &ActingUser) -> EngineResult<Self> {
        if actor.is_admin() {
            return Ok(DownloadSnapshot::default());
        }

        let shops = engine.db().shops().list_by_owner(&actor.user_id).await?;
        let products = engine.db().products().list_for_owner(&actor.user_id).await?;
        debug!(user_id = %actor.user_id, shops = shops.len(), products = products.len(), "Snapshot read");

        Ok(DownloadSnapshot {
            shops: shops.into_iter().map(SnapshotShop::from).collect(),
            products: products.into_iter().map(SnapshotProduct::from).collect(),
        })
    }
}
