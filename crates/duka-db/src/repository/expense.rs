//! # Expense Repository

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use duka_core::analytics::CategoryTotal;
use duka_core::Expense;

#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    pub async fn insert(&self, expense: &Expense) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        Self::insert_with(&mut conn, expense).await
    }

    /// Inserts an expense on the caller's connection or transaction.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` on `expenses.client_ref` when the
    ///   user already recorded an expense under the same idempotency key
    pub async fn insert_with(conn: &mut SqliteConnection, expense: &Expense) -> DbResult<()> {
        debug!(id = %expense.id, user_id = %expense.user_id, "Inserting expense");

        sqlx::query(
            r#"
            INSERT INTO expenses (
                id, user_id, category, amount_cents, description, date,
                payment_method, receipt_number, client_ref, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&expense.id)
        .bind(&expense.user_id)
        .bind(&expense.category)
        .bind(expense.amount_cents)
        .bind(&expense.description)
        .bind(expense.date)
        .bind(expense.payment_method)
        .bind(&expense.receipt_number)
        .bind(&expense.client_ref)
        .bind(expense.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    pub async fn find_by_client_ref(&self, user_id: &str, client_ref: &str) -> DbResult<Option<Expense>> {
        let expense = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, user_id, category, amount_cents, description, date,
                   payment_method, receipt_number, client_ref, created_at
            FROM expenses
            WHERE user_id = ?1 AND client_ref = ?2
            "#,
        )
        .bind(user_id)
        .bind(client_ref)
        .fetch_optional(&self.pool)
        .await?;

        Ok(expense)
    }

    /// A user's expenses, most recent date first.
    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<Expense>> {
        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, user_id, category, amount_cents, description, date,
                   payment_method, receipt_number, client_ref, created_at
            FROM expenses
            WHERE user_id = ?1
            ORDER BY date DESC, created_at DESC, id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }

    pub async fn list_all(&self) -> DbResult<Vec<Expense>> {
        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, user_id, category, amount_cents, description, date,
                   payment_method, receipt_number, client_ref, created_at
            FROM expenses
            ORDER BY date DESC, created_at DESC, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }

    /// Sum of expenses per category, largest first. `None` covers every user.
    pub async fn totals_by_category(&self, user_id: Option<&str>) -> DbResult<Vec<CategoryTotal>> {
        let totals = sqlx::query_as::<_, CategoryTotal>(
            r#"
            SELECT category, SUM(amount_cents) AS total_cents
            FROM expenses
            WHERE (?1 IS NULL OR user_id = ?1)
            GROUP BY category
            ORDER BY total_cents DESC, category
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(totals)
    }
}
