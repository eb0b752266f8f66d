//! # User Repository
//!
//! Accounts and their active flag. Authentication is handled outside this
//! workspace; the store only keeps identity and role.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use duka_core::User;

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a new user.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - phone already registered
    pub async fn insert(&self, user: &User) -> DbResult<()> {
        debug!(id = %user.id, role = user.role.as_str(), "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (id, phone, name, email, role, is_active, language, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&user.id)
        .bind(&user.phone)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role)
        .bind(user.is_active)
        .bind(&user.language)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, phone, name, email, role, is_active, language, created_at
            FROM users
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_by_phone(&self, phone: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, phone, name, email, role, is_active, language, created_at
            FROM users
            WHERE phone = ?1
            "#,
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// All users, newest first.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, phone, name, email, role, is_active, language, created_at
            FROM users
            ORDER BY created_at DESC, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Activates or deactivates an account.
    pub async fn set_active(&self, id: &str, is_active: bool) -> DbResult<()> {
        debug!(id = %id, is_active, "Setting user active flag");

        let result = sqlx::query("UPDATE users SET is_active = ?2 WHERE id = ?1")
            .bind(id)
            .bind(is_active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }
}
