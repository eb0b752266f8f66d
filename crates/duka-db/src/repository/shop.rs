//! # Shop Repository
//!
//! Shops and the explicit cascade that removes everything a shop owns.
//!
//! ## Cascade Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  delete_cascade(shop_id)          one transaction, children first       │
//! │                                                                         │
//! │   1. sale_items  of the shop's sales                                   │
//! │   2. sales       of the shop                                           │
//! │   3. alerts      pointing at the shop's products                       │
//! │   4. products    of the shop                                           │
//! │   5. the shop row                                                      │
//! │                                                                         │
//! │  Products are only referenced by sale items of the same shop (the      │
//! │  sale engine rejects foreign products), so step 4 never trips a        │
//! │  foreign key.                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use duka_core::Shop;

/// Row counts removed by [`ShopRepository::delete_cascade`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ShopDeletion {
    pub sale_items: u64,
    pub sales: u64,
    pub alerts: u64,
    pub products: u64,
}

#[derive(Debug, Clone)]
pub struct ShopRepository {
    pool: SqlitePool,
}

impl ShopRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ShopRepository { pool }
    }

    pub async fn insert(&self, shop: &Shop) -> DbResult<()> {
        debug!(id = %shop.id, owner_id = %shop.owner_id, "Inserting shop");

        sqlx::query(
            r#"
            INSERT INTO shops (id, owner_id, name, category, location, description, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&shop.id)
        .bind(&shop.owner_id)
        .bind(&shop.name)
        .bind(&shop.category)
        .bind(&shop.location)
        .bind(&shop.description)
        .bind(shop.is_active)
        .bind(shop.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Shop>> {
        let shop = sqlx::query_as::<_, Shop>(
            r#"
            SELECT id, owner_id, name, category, location, description, is_active, created_at
            FROM shops
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(shop)
    }

    /// Active shops of one owner, ordered by name then id.
    pub async fn list_by_owner(&self, owner_id: &str) -> DbResult<Vec<Shop>> {
        let shops = sqlx::query_as::<_, Shop>(
            r#"
            SELECT id, owner_id, name, category, location, description, is_active, created_at
            FROM shops
            WHERE owner_id = ?1 AND is_active = 1
            ORDER BY name, id
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(shops)
    }

    /// Every shop, ordered by name then id.
    pub async fn list_all(&self) -> DbResult<Vec<Shop>> {
        let shops = sqlx::query_as::<_, Shop>(
            r#"
            SELECT id, owner_id, name, category, location, description, is_active, created_at
            FROM shops
            ORDER BY name, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(shops)
    }

    /// Deletes a shop with its products, sales, sale items and product
    /// alerts in one transaction.
    pub async fn delete_cascade(&self, id: &str) -> DbResult<ShopDeletion> {
        let mut tx = self.pool.begin().await?;

        let sale_items = sqlx::query(
            "DELETE FROM sale_items WHERE sale_id IN (SELECT id FROM sales WHERE shop_id = ?1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let sales = sqlx::query("DELETE FROM sales WHERE shop_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let alerts = sqlx::query(
            "DELETE FROM alerts WHERE product_id IN (SELECT id FROM products WHERE shop_id = ?1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let products = sqlx::query("DELETE FROM products WHERE shop_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let shops = sqlx::query("DELETE FROM shops WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if shops == 0 {
            // Dropping tx rolls back the child deletes
            return Err(DbError::not_found("Shop", id));
        }

        tx.commit().await?;

        let deletion = ShopDeletion {
            sale_items,
            sales,
            alerts,
            products,
        };
        info!(shop_id = %id, ?deletion, "Shop deleted with owned records");
        Ok(deletion)
    }
}
