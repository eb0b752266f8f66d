//! # Order Repository
//!
//! Supplier orders. No stock is reserved or received through orders.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use duka_core::{Order, OrderItem, OrderStatus};

#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Inserts an order with its items on the caller's transaction.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` on `orders.order_number` when the
    ///   generated number collided
    pub async fn insert_with(conn: &mut SqliteConnection, order: &Order, items: &[OrderItem]) -> DbResult<()> {
        debug!(id = %order.id, order_number = %order.order_number, "Inserting order");

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_number, buyer_id, supplier_id, status,
                total_cents, delivery_date, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&order.id)
        .bind(&order.order_number)
        .bind(&order.buyer_id)
        .bind(&order.supplier_id)
        .bind(order.status)
        .bind(order.total_cents)
        .bind(order.delivery_date)
        .bind(&order.notes)
        .bind(order.created_at)
        .execute(&mut *conn)
        .await?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, product_name, quantity, unit_price_cents, subtotal_cents)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&item.id)
            .bind(&item.order_id)
            .bind(&item.product_name)
            .bind(item.quantity)
            .bind(item.unit_price_cents)
            .bind(item.subtotal_cents)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, order_number, buyer_id, supplier_id, status,
                   total_cents, delivery_date, notes, created_at
            FROM orders
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    pub async fn items_for_order(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT id, order_id, product_name, quantity, unit_price_cents, subtotal_cents
            FROM order_items
            WHERE order_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Orders placed by one buyer, newest first. `None` lists every order.
    pub async fn list(&self, buyer_id: Option<&str>) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, order_number, buyer_id, supplier_id, status,
                   total_cents, delivery_date, notes, created_at
            FROM orders
            WHERE (?1 IS NULL OR buyer_id = ?1)
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(buyer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    pub async fn update_status(&self, id: &str, status: OrderStatus) -> DbResult<()> {
        debug!(id = %id, status = status.as_str(), "Updating order status");

        let result = sqlx::query("UPDATE orders SET status = ?2 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        Ok(())
    }
}
