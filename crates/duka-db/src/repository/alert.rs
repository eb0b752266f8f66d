//! # Alert Repository
//!
//! ## De-duplication
//! ```text
//! idx_alerts_unread_dedup: UNIQUE (user_id, product_id, alert_type)
//!                          WHERE is_read = 0 AND product_id IS NOT NULL
//!
//!   INSERT OR IGNORE low_stock(user U, product P)   → 1 row   (created)
//!   INSERT OR IGNORE low_stock(user U, product P)   → 0 rows  (unread exists)
//!   mark_read(...)                                  → index slot freed
//!   INSERT OR IGNORE low_stock(user U, product P)   → 1 row   (created again)
//! ```
//! The key is structural, so renaming a product never defeats it.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use duka_core::{Alert, AlertType};

#[derive(Debug, Clone)]
pub struct AlertRepository {
    pool: SqlitePool,
}

impl AlertRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AlertRepository { pool }
    }

    /// Inserts an alert unless an unread alert with the same
    /// `(user_id, product_id, alert_type)` already exists.
    ///
    /// ## Returns
    /// * `Ok(true)` - alert created
    /// * `Ok(false)` - duplicate suppressed
    pub async fn insert_if_absent(&self, alert: &Alert) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO alerts (
                id, user_id, product_id, title, message, alert_type, is_read, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&alert.id)
        .bind(&alert.user_id)
        .bind(&alert.product_id)
        .bind(&alert.title)
        .bind(&alert.message)
        .bind(alert.alert_type)
        .bind(alert.is_read)
        .bind(alert.created_at)
        .execute(&self.pool)
        .await?;

        let created = result.rows_affected() == 1;
        debug!(
            user_id = %alert.user_id,
            product_id = ?alert.product_id,
            created,
            "Alert insert"
        );
        Ok(created)
    }

    /// A user's alerts, newest first.
    pub async fn list_for_user(&self, user_id: &str, unread_only: bool) -> DbResult<Vec<Alert>> {
        let alerts = sqlx::query_as::<_, Alert>(
            r#"
            SELECT id, user_id, product_id, title, message, alert_type, is_read, created_at
            FROM alerts
            WHERE user_id = ?1 AND (?2 = 0 OR is_read = 0)
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(user_id)
        .bind(unread_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(alerts)
    }

    /// A user's unread alerts of one type, newest first.
    pub async fn list_unread_of_type(&self, user_id: &str, alert_type: AlertType) -> DbResult<Vec<Alert>> {
        let alerts = sqlx::query_as::<_, Alert>(
            r#"
            SELECT id, user_id, product_id, title, message, alert_type, is_read, created_at
            FROM alerts
            WHERE user_id = ?1 AND alert_type = ?2 AND is_read = 0
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(user_id)
        .bind(alert_type)
        .fetch_all(&self.pool)
        .await?;

        Ok(alerts)
    }

    /// Marks one of the user's alerts as read.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - no such alert for this user
    pub async fn mark_read(&self, user_id: &str, alert_id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE alerts SET is_read = 1 WHERE id = ?1 AND user_id = ?2")
            .bind(alert_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Alert", alert_id));
        }

        Ok(())
    }

    pub async fn unread_count(&self, user_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM alerts WHERE user_id = ?1 AND is_read = 0")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
