//! # duka-sync: Offline Reconciliation for Duka POS
//!
//! A client that lost connectivity keeps selling and recording expenses
//! against a cached bundle, then uploads its queue. This crate replays each
//! queued operation through the engine's normal atomic paths and keeps an
//! audit trail of every attempt.
//!
//! ## Offline Round Trip
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Offline Round Trip                                │
//! │                                                                         │
//! │  ONLINE                                                                │
//! │  ──────                                                                │
//! │  client ───► download_snapshot(actor)                                  │
//! │         ◄─── { shops: [...], products: [...] }      (cached locally)   │
//! │                                                                         │
//! │  OFFLINE                                                               │
//! │  ───────                                                               │
//! │  client queues { kind: "sale", payload, idempotency_key }              │
//! │                                                                         │
//! │  BACK ONLINE                                                           │
//! │  ───────────                                                           │
//! │  client ───► replay(actor, kind, payload)                              │
//! │                 1. SyncRecord(pending) committed                       │
//! │                 2. key seen before? → completed, same result           │
//! │                 3. SaleEngine::commit_sale / Expenses::commit_expense  │
//! │                 4. SyncRecord → completed(result_id) | failed({code})  │
//! │         ◄─── ReplayOutcome | EngineError                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock is never forced: a replayed sale that no longer fits committed
//! stock fails exactly like an online sale would.
//!
//! ## Module Organization
//! - [`payload`] - Wire shapes of queued operations
//! - [`reconcile`] - `ReconciliationEngine` and `ReplayOutcome`
//! - [`snapshot`] - Download bundle for offline use

pub mod payload;
pub mod reconcile;
pub mod snapshot;

pub use payload::{ExpensePayload, SalePayload};
pub use reconcile::{ReconciliationEngine, ReplayOutcome};
pub use snapshot::{DownloadSnapshot, SnapshotProduct, SnapshotShop};
