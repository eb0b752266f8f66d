//! # Offline Reconciliation Engine
//!
//! Replays one queued operation and records the attempt.
//!
//! ## SyncRecord Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     replay(actor, kind, payload)                        │
//! │                                                                         │
//! │  INSERT sync_records (pending)          committed before any work      │
//! │         │                                                               │
//! │         ├── key already completed ──────► completed, same result_id    │
//! │         │                                 deduplicated = true          │
//! │         │                                                               │
//! │         ├── decode payload ── malformed ─► failed {VALIDATION_ERROR}   │
//! │         │                                                               │
//! │         ├── sale    → SaleEngine::commit_sale(Replay{created_at, key}) │
//! │         └── expense → Expenses::commit_expense(key)                    │
//! │                    │                                                    │
//! │                    ├── Ok  ─► completed(result_id, completed_at)       │
//! │                    └── Err ─► failed({code, message}), Err returned    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There are no automatic retries. A client retries by uploading again;
//! with an idempotency key that is always safe.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};
use ts_rs::TS;

use crate::payload::{decode, peek_idempotency_key, ExpensePayload, SalePayload};
use crate::snapshot::DownloadSnapshot;
use duka_core::numbering::new_id;
use duka_core::validation::validate_idempotency_key;
use duka_core::{ActingUser, SyncKind, SyncRecord, SyncStatus};
use duka_engine::{Engine, EngineError, EngineResult, SaleOrigin};

/// What a replay did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReplayOutcome {
    pub sync_record_id: String,
    pub status: SyncStatus,
    /// Sale or expense id, new or matched.
    pub result_id: Option<String>,
    /// True when the idempotency key had already produced the result.
    pub deduplicated: bool,
}

/// Replays offline operations through the engine.
#[derive(Debug, Clone)]
pub struct ReconciliationEngine {
    engine: Engine,
}

impl ReconciliationEngine {
    pub fn new(engine: Engine) -> Self {
        ReconciliationEngine { engine }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Entry point for uploads that name the kind as a string
    /// (`"sale"` / `"expense"`). Unknown kinds are rejected before anything
    /// is recorded.
    pub async fn replay_synced_operation(
        &self,
        actor: &ActingUser,
        kind: &str,
        payload: Value,
    ) -> EngineResult<ReplayOutcome> {
        let kind: SyncKind = kind.parse()?;
        self.replay(actor, kind, payload).await
    }

    /// Replays one queued operation.
    ///
    /// ## Returns
    /// * `Ok(outcome)` - the SyncRecord is `completed`
    /// * `Err(err)` - the SyncRecord is `failed` with `err` serialized as
    ///   `{code, message}`, unless the store itself failed
    pub async fn replay(&self, actor: &ActingUser, kind: SyncKind, payload: Value) -> EngineResult<ReplayOutcome> {
        let key = peek_idempotency_key(&payload);

        let record = SyncRecord {
            id: new_id(),
            user_id: actor.user_id.clone(),
            kind,
            payload: payload.to_string(),
            idempotency_key: key.clone(),
            status: SyncStatus::Pending,
            error: None,
            result_id: None,
            submitted_at: self.engine.now(),
            completed_at: None,
        };
        self.engine.db().sync_records().insert_pending(&record).await?;
        info!(
            sync_record_id = %record.id,
            user_id = %actor.user_id,
            kind = kind.as_str(),
            key = ?key,
            "Replay received"
        );

        match self.execute(actor, kind, &payload, key.as_deref()).await {
            Ok((result_id, deduplicated)) => {
                self.engine
                    .db()
                    .sync_records()
                    .mark_completed(&record.id, &result_id, self.engine.now())
                    .await?;
                info!(sync_record_id = %record.id, result_id = %result_id, deduplicated, "Replay completed");

                Ok(ReplayOutcome {
                    sync_record_id: record.id,
                    status: SyncStatus::Completed,
                    result_id: Some(result_id),
                    deduplicated,
                })
            }
            Err(err) => {
                let report = err.report();
                warn!(sync_record_id = %record.id, code = %report.code, error = %err, "Replay failed");

                if let Err(mark_err) = self
                    .engine
                    .db()
                    .sync_records()
                    .mark_failed(&record.id, &report.to_json(), self.engine.now())
                    .await
                {
                    error!(sync_record_id = %record.id, error = %mark_err, "Could not record replay failure");
                }
                Err(err)
            }
        }
    }

    /// Runs the operation. Returns the result id and whether it was matched
    /// rather than created.
    async fn execute(
        &self,
        actor: &ActingUser,
        kind: SyncKind,
        payload: &Value,
        key: Option<&str>,
    ) -> EngineResult<(String, bool)> {
        let key = key.map(validate_idempotency_key).transpose()?;

        if let Some(key) = key.as_deref() {
            let previous = self
                .engine
                .db()
                .sync_records()
                .find_completed_by_key(&actor.user_id, kind, key)
                .await?;
            if let Some(result_id) = previous.and_then(|record| record.result_id) {
                info!(key, result_id = %result_id, "Key already replayed");
                return Ok((result_id, true));
            }
        }

        match kind {
            SyncKind::Sale => {
                let payload: SalePayload = decode(payload)?;
                let origin = SaleOrigin::Replay {
                    created_at: payload.created_at.unwrap_or_else(|| self.engine.now()),
                    client_ref: key,
                };
                let commit = self.engine.sales().commit_sale(actor, payload.sale, origin).await?;
                let deduplicated = commit.is_existing();
                Ok((commit.into_receipt().sale_id, deduplicated))
            }
            SyncKind::Expense => {
                let payload: ExpensePayload = decode(payload)?;
                let commit = self
                    .engine
                    .expenses()
                    .commit_expense(actor, payload.expense, key.as_deref())
                    .await?;
                Ok((commit.expense().id.clone(), commit.is_existing()))
            }
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The actor's replay history, newest first.
    pub async fn list_sync_records(&self, actor: &ActingUser) -> EngineResult<Vec<SyncRecord>> {
        Ok(self.engine.db().sync_records().list_for_user(&actor.user_id).await?)
    }

    /// One of the actor's sync records. Administrators may read any.
    pub async fn get_sync_record(&self, actor: &ActingUser, id: &str) -> EngineResult<SyncRecord> {
        self.engine
            .db()
            .sync_records()
            .get_by_id(id)
            .await?
            .filter(|record| actor.is_admin() || record.user_id == actor.user_id)
            .ok_or_else(|| EngineError::not_found("SyncRecord", id))
    }

    /// Bundle the client caches before going offline.
    pub async fn get_download_snapshot(&self, actor: &ActingUser) -> EngineResult<DownloadSnapshot> {
        DownloadSnapshot::for_actor(&self.engine, actor).await
    }
}
