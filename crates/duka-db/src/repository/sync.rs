//! # Sync Record Repository
//!
//! Append-only audit trail of offline replays.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Sync Record Lifecycle                               │
//! │                                                                         │
//! │  insert_pending()  ── committed BEFORE the replay transaction opens    │
//! │       │                                                                 │
//! │       ├── replay committed ──► mark_completed(result_id)               │
//! │       │                                                                 │
//! │       └── replay failed    ──► mark_failed(error JSON)                 │
//! │                                                                         │
//! │  Both transitions are guarded by `WHERE status = 'pending'`, so a      │
//! │  record is never overwritten once it has left `pending`.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use duka_core::{SyncKind, SyncRecord, SyncStatus};

#[derive(Debug, Clone)]
pub struct SyncRecordRepository {
    pool: SqlitePool,
}

impl SyncRecordRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SyncRecordRepository { pool }
    }

    /// Durably records a replay attempt in `pending` status.
    pub async fn insert_pending(&self, record: &SyncRecord) -> DbResult<()> {
        debug!(id = %record.id, kind = record.kind.as_str(), "Recording pending replay");

        sqlx::query(
            r#"
            INSERT INTO sync_records (
                id, user_id, kind, payload, idempotency_key, status,
                error, result_id, submitted_at, completed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, NULL, ?7, NULL)
            "#,
        )
        .bind(&record.id)
        .bind(&record.user_id)
        .bind(record.kind)
        .bind(&record.payload)
        .bind(&record.idempotency_key)
        .bind(SyncStatus::Pending)
        .bind(record.submitted_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// `pending → completed`, pointing at the Sale or Expense produced.
    pub async fn mark_completed(&self, id: &str, result_id: &str, at: DateTime<Utc>) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE sync_records
            SET status = ?2, result_id = ?3, completed_at = ?4
            WHERE id = ?1 AND status = ?5
            "#,
        )
        .bind(id)
        .bind(SyncStatus::Completed)
        .bind(result_id)
        .bind(at)
        .bind(SyncStatus::Pending)
        .execute(&self.pool)
        .await?;

        Self::check_transition(id, result.rows_affected())
    }

    /// `pending → failed`, keeping the serialized cause.
    pub async fn mark_failed(&self, id: &str, error: &str, at: DateTime<Utc>) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE sync_records
            SET status = ?2, error = ?3, completed_at = ?4
            WHERE id = ?1 AND status = ?5
            "#,
        )
        .bind(id)
        .bind(SyncStatus::Failed)
        .bind(error)
        .bind(at)
        .bind(SyncStatus::Pending)
        .execute(&self.pool)
        .await?;

        Self::check_transition(id, result.rows_affected())
    }

    fn check_transition(id: &str, rows_affected: u64) -> DbResult<()> {
        if rows_affected == 0 {
            return Err(DbError::InvalidState {
                entity: "SyncRecord".to_string(),
                id: id.to_string(),
                expected: "pending".to_string(),
            });
        }
        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<SyncRecord>> {
        let record = sqlx::query_as::<_, SyncRecord>(
            r#"
            SELECT id, user_id, kind, payload, idempotency_key, status,
                   error, result_id, submitted_at, completed_at
            FROM sync_records
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// The earliest completed replay of `kind` a user submitted under `key`.
    pub async fn find_completed_by_key(
        &self,
        user_id: &str,
        kind: SyncKind,
        key: &str,
    ) -> DbResult<Option<SyncRecord>> {
        let record = sqlx::query_as::<_, SyncRecord>(
            r#"
            SELECT id, user_id, kind, payload, idempotency_key, status,
                   error, result_id, submitted_at, completed_at
            FROM sync_records
            WHERE user_id = ?1 AND kind = ?2 AND idempotency_key = ?3 AND status = ?4
            ORDER BY submitted_at, id
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(kind)
        .bind(key)
        .bind(SyncStatus::Completed)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// A user's replay history, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<SyncRecord>> {
        let records = sqlx::query_as::<_, SyncRecord>(
            r#"
            SELECT id, user_id, kind, payload, idempotency_key, status,
                   error, result_id, submitted_at, completed_at
            FROM sync_records
            WHERE user_id = ?1
            ORDER BY submitted_at DESC, id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
