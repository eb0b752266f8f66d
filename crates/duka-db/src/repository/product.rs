//! # Product Repository
//!
//! Database operations for products, including the guarded stock update the
//! inventory ledger is built on.
//!
//! ## Guarded Delta Update
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                                │
//! │                                                                         │
//! │  ❌ WRONG: read, check in Rust, write back                             │
//! │     SELECT quantity ...; if q >= 3 { UPDATE ... SET quantity = q - 3 } │
//! │     Two sales can both read q = 3 and both succeed.                    │
//! │                                                                         │
//! │  ✅ CORRECT: one statement that checks and writes                      │
//! │     UPDATE products SET quantity = quantity + ?delta                   │
//! │     WHERE id = ? AND shop_id = ? AND is_active = 1                     │
//! │       AND quantity + ?delta >= 0                                       │
//! │     RETURNING quantity, reorder_level                                  │
//! │                                                                         │
//! │  No row back ⇒ product missing/inactive/foreign, or stock too low.     │
//! │  The statement takes SQLite's write lock, so concurrent sales of the   │
//! │  same product are serialized.                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use duka_core::Product;

/// Stock figures returned by a successful delta update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct StockLevel {
    pub quantity: i64,
    pub reorder_level: i64,
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, shop_id = %product.shop_id, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, shop_id, name, description, price_cents, cost_cents,
                quantity, unit, sku, barcode, category, expiry_date,
                reorder_level, is_active, created_at, updated_at, version
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10, ?11, ?12,
                ?13, ?14, ?15, ?16, ?17
            )
            "#,
        )
        .bind(&product.id)
        .bind(&product.shop_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.quantity)
        .bind(&product.unit)
        .bind(&product.sku)
        .bind(&product.barcode)
        .bind(&product.category)
        .bind(product.expiry_date)
        .bind(product.reorder_level)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .bind(product.version)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        Self::get_by_id_with(&mut conn, id).await
    }

    /// Gets a product by its ID on the caller's connection or transaction.
    pub async fn get_by_id_with(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, shop_id, name, description, price_cents, cost_cents,
                   quantity, unit, sku, barcode, category, expiry_date,
                   reorder_level, is_active, created_at, updated_at, version
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(product)
    }

    /// The subset of `ids` that are active products of `shop_id`.
    pub async fn active_ids_in_shop(&self, shop_id: &str, ids: &[&str]) -> DbResult<Vec<String>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = QueryBuilder::<Sqlite>::new("SELECT id FROM products WHERE is_active = 1 AND shop_id = ");
        query.push_bind(shop_id).push(" AND id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let found = query.build_query_scalar::<String>().fetch_all(&self.pool).await?;
        Ok(found)
    }

    /// Active products of a shop, ordered by name then id.
    pub async fn list_by_shop(&self, shop_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, shop_id, name, description, price_cents, cost_cents,
                   quantity, unit, sku, barcode, category, expiry_date,
                   reorder_level, is_active, created_at, updated_at, version
            FROM products
            WHERE shop_id = ?1 AND is_active = 1
            ORDER BY name, id
            "#,
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Active products in the owner's active shops, ordered by name then id.
    pub async fn list_for_owner(&self, owner_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT p.id, p.shop_id, p.name, p.description, p.price_cents, p.cost_cents,
                   p.quantity, p.unit, p.sku, p.barcode, p.category, p.expiry_date,
                   p.reorder_level, p.is_active, p.created_at, p.updated_at, p.version
            FROM products p
            INNER JOIN shops s ON s.id = p.shop_id
            WHERE s.owner_id = ?1 AND s.is_active = 1 AND p.is_active = 1
            ORDER BY p.name, p.id
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Every active product, ordered by name then id.
    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, shop_id, name, description, price_cents, cost_cents,
                   quantity, unit, sku, barcode, category, expiry_date,
                   reorder_level, is_active, created_at, updated_at, version
            FROM products
            WHERE is_active = 1
            ORDER BY name, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Active products at or below their reorder level in the owner's
    /// active shops.
    pub async fn low_stock_for_owner(&self, owner_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT p.id, p.shop_id, p.name, p.description, p.price_cents, p.cost_cents,
                   p.quantity, p.unit, p.sku, p.barcode, p.category, p.expiry_date,
                   p.reorder_level, p.is_active, p.created_at, p.updated_at, p.version
            FROM products p
            INNER JOIN shops s ON s.id = p.shop_id
            WHERE s.owner_id = ?1
              AND s.is_active = 1
              AND p.is_active = 1
              AND p.quantity <= p.reorder_level
            ORDER BY p.name, p.id
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Writes every editable field of a product (direct administrative edit).
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - product doesn't exist
    /// * `Err(DbError::CheckViolation)` - negative quantity or price
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                description = ?3,
                price_cents = ?4,
                cost_cents = ?5,
                quantity = ?6,
                unit = ?7,
                barcode = ?8,
                category = ?9,
                expiry_date = ?10,
                reorder_level = ?11,
                updated_at = ?12,
                version = version + 1
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.quantity)
        .bind(&product.unit)
        .bind(&product.barcode)
        .bind(&product.category)
        .bind(product.expiry_date)
        .bind(product.reorder_level)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Applies a signed stock delta if, and only if, the result stays
    /// non-negative and the product is an active product of `shop_id`.
    ///
    /// Runs on the caller's transaction so the change commits or rolls back
    /// with the sale that caused it.
    ///
    /// ## Returns
    /// * `Ok(Some(StockLevel))` - delta applied, new figures
    /// * `Ok(None)` - nothing written (use [`Self::get_by_id_with`] to tell
    ///   a missing product from insufficient stock)
    pub async fn adjust_quantity(
        conn: &mut SqliteConnection,
        id: &str,
        shop_id: &str,
        delta: i64,
        now: DateTime<Utc>,
    ) -> DbResult<Option<StockLevel>> {
        debug!(id = %id, delta, "Adjusting stock");

        let level = sqlx::query_as::<_, StockLevel>(
            r#"
            UPDATE products
            SET quantity = quantity + ?3,
                updated_at = ?4,
                version = version + 1
            WHERE id = ?1
              AND shop_id = ?2
              AND is_active = 1
              AND quantity + ?3 >= 0
            RETURNING quantity, reorder_level
            "#,
        )
        .bind(id)
        .bind(shop_id)
        .bind(delta)
        .bind(now)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(level)
    }

    /// Soft-deletes a product. Historical sale items keep referencing it.
    pub async fn deactivate(&self, id: &str, now: DateTime<Utc>) -> DbResult<()> {
        debug!(id = %id, "Deactivating product");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET is_active = 0, updated_at = ?2, version = version + 1
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }
}
