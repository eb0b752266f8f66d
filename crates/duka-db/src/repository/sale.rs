//! # Sale Repository
//!
//! Sales and their line items.
//!
//! ## Write Path
//! Sales are only ever written inside the sale engine's transaction:
//! ```text
//! BEGIN
//!   products  UPDATE quantity (one guarded statement per product)
//!   sales     INSERT            ← UNIQUE(sale_number), UNIQUE(shop_id, client_ref)
//!   sale_items INSERT × N
//! COMMIT
//! ```
//! A collision on `sale_number` surfaces as `DbError::UniqueViolation` and
//! the engine retries with a fresh number.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use duka_core::{Sale, SaleItem};

#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Inserts a sale header on the caller's transaction.
    pub async fn insert_with(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id, sale_number = %sale.sale_number, "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, shop_id, sale_number, customer_name, customer_phone,
                total_cents, payment_method, payment_reference, status,
                notes, client_ref, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.shop_id)
        .bind(&sale.sale_number)
        .bind(&sale.customer_name)
        .bind(&sale.customer_phone)
        .bind(sale.total_cents)
        .bind(sale.payment_method)
        .bind(&sale.payment_reference)
        .bind(sale.status)
        .bind(&sale.notes)
        .bind(&sale.client_ref)
        .bind(sale.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts the line items of a sale on the caller's transaction.
    pub async fn insert_items_with(conn: &mut SqliteConnection, items: &[SaleItem]) -> DbResult<()> {
        for item in items {
            sqlx::query(
                r#"
                INSERT INTO sale_items (id, sale_id, product_id, quantity, unit_price_cents, subtotal_cents)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&item.id)
            .bind(&item.sale_id)
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(item.unit_price_cents)
            .bind(item.subtotal_cents)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, shop_id, sale_number, customer_name, customer_phone, total_cents,
                   payment_method, payment_reference, status, notes, client_ref, created_at
            FROM sales
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Finds the sale a shop recorded under a client idempotency key.
    pub async fn find_by_client_ref(&self, shop_id: &str, client_ref: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, shop_id, sale_number, customer_name, customer_phone, total_cents,
                   payment_method, payment_reference, status, notes, client_ref, created_at
            FROM sales
            WHERE shop_id = ?1 AND client_ref = ?2
            "#,
        )
        .bind(shop_id)
        .bind(client_ref)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Line items of a sale in insertion order.
    pub async fn items_for_sale(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT id, sale_id, product_id, quantity, unit_price_cents, subtotal_cents
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Most recent sales across the owner's shops.
    pub async fn list_for_owner(&self, owner_id: &str, limit: u32) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT sa.id, sa.shop_id, sa.sale_number, sa.customer_name, sa.customer_phone,
                   sa.total_cents, sa.payment_method, sa.payment_reference, sa.status,
                   sa.notes, sa.client_ref, sa.created_at
            FROM sales sa
            INNER JOIN shops s ON s.id = sa.shop_id
            WHERE s.owner_id = ?1
            ORDER BY sa.created_at DESC, sa.id
            LIMIT ?2
            "#,
        )
        .bind(owner_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Most recent sales across every shop.
    pub async fn list_all(&self, limit: u32) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, shop_id, sale_number, customer_name, customer_phone, total_cents,
                   payment_method, payment_reference, status, notes, client_ref, created_at
            FROM sales
            ORDER BY created_at DESC, id
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Number of sales of a shop (diagnostics and tests).
    pub async fn count_for_shop(&self, shop_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE shop_id = ?1")
            .bind(shop_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
