//! # Supplier Repository

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use duka_core::Supplier;

#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    pub async fn insert(&self, supplier: &Supplier) -> DbResult<()> {
        debug!(id = %supplier.id, name = %supplier.name, "Inserting supplier");

        sqlx::query(
            r#"
            INSERT INTO suppliers (
                id, name, contact_person, phone, email, address,
                category, rating, is_active, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&supplier.id)
        .bind(&supplier.name)
        .bind(&supplier.contact_person)
        .bind(&supplier.phone)
        .bind(&supplier.email)
        .bind(&supplier.address)
        .bind(&supplier.category)
        .bind(supplier.rating)
        .bind(supplier.is_active)
        .bind(supplier.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Supplier>> {
        let supplier = sqlx::query_as::<_, Supplier>(
            r#"
            SELECT id, name, contact_person, phone, email, address,
                   category, rating, is_active, created_at
            FROM suppliers
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(supplier)
    }

    /// Active suppliers, best rated first.
    pub async fn list_active(&self) -> DbResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(
            r#"
            SELECT id, name, contact_person, phone, email, address,
                   category, rating, is_active, created_at
            FROM suppliers
            WHERE is_active = 1
            ORDER BY rating DESC, name, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(suppliers)
    }
}
