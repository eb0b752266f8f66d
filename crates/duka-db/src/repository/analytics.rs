//! # Analytics Repository
//!
//! Read-only aggregate queries behind the dashboards.
//!
//! Every query takes an optional owner: `Some(user_id)` restricts to that
//! vendor's shops, `None` covers the whole platform (administrators).
//! Timestamp bounds are compared through `julianday()` so fractional
//! seconds of any precision order correctly.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::DbResult;
use duka_core::analytics::TopProduct;

#[derive(Debug, Clone)]
pub struct AnalyticsRepository {
    pool: SqlitePool,
}

impl AnalyticsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AnalyticsRepository { pool }
    }

    /// `(created_at, total_cents)` of every sale since `since`.
    pub async fn sales_since(
        &self,
        owner_id: Option<&str>,
        since: DateTime<Utc>,
    ) -> DbResult<Vec<(DateTime<Utc>, i64)>> {
        let rows = sqlx::query_as::<_, (DateTime<Utc>, i64)>(
            r#"
            SELECT sa.created_at, sa.total_cents
            FROM sales sa
            INNER JOIN shops s ON s.id = sa.shop_id
            WHERE (?1 IS NULL OR s.owner_id = ?1)
              AND julianday(sa.created_at) >= julianday(?2)
            ORDER BY sa.created_at
            "#,
        )
        .bind(owner_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Units sold per product name, best sellers first.
    pub async fn top_products(&self, owner_id: Option<&str>, limit: u32) -> DbResult<Vec<TopProduct>> {
        let rows = sqlx::query_as::<_, TopProduct>(
            r#"
            SELECT p.name AS name, SUM(si.quantity) AS total_sold
            FROM sale_items si
            INNER JOIN products p ON p.id = si.product_id
            INNER JOIN sales sa ON sa.id = si.sale_id
            INNER JOIN shops s ON s.id = sa.shop_id
            WHERE (?1 IS NULL OR s.owner_id = ?1)
            GROUP BY p.name
            ORDER BY total_sold DESC, p.name
            LIMIT ?2
            "#,
        )
        .bind(owner_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Sum of sale totals in `[from, to)`. Open bounds are `None`.
    pub async fn revenue(
        &self,
        owner_id: Option<&str>,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(sa.total_cents), 0)
            FROM sales sa
            INNER JOIN shops s ON s.id = sa.shop_id
            WHERE (?1 IS NULL OR s.owner_id = ?1)
              AND (?2 IS NULL OR julianday(sa.created_at) >= julianday(?2))
              AND (?3 IS NULL OR julianday(sa.created_at) < julianday(?3))
            "#,
        )
        .bind(owner_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    /// Sum of all expenses of one user, or of everyone.
    pub async fn expenses_total(&self, user_id: Option<&str>) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_cents), 0) FROM expenses WHERE (?1 IS NULL OR user_id = ?1)",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    /// `(shops, products, low-stock products)` counted over active rows.
    pub async fn catalog_counts(&self, owner_id: &str) -> DbResult<(i64, i64, i64)> {
        let counts = sqlx::query_as::<_, (i64, i64, i64)>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM shops WHERE owner_id = ?1 AND is_active = 1),
                COUNT(p.id),
                COALESCE(SUM(CASE WHEN p.quantity <= p.reorder_level THEN 1 ELSE 0 END), 0)
            FROM products p
            INNER JOIN shops s ON s.id = p.shop_id
            WHERE s.owner_id = ?1 AND s.is_active = 1 AND p.is_active = 1
            "#,
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(counts)
    }
}
