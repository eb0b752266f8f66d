//! # duka-engine: Sale Transaction Engine and Operations
//!
//! Every operation the presentation layer calls goes through [`Engine`].
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Duka POS Operation Flow                          │
//! │                                                                         │
//! │  Presentation layer (web app, offline client upload)                   │
//! │       │   ActingUser { user_id, role } passed into every call           │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   duka-engine (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   Engine ──► sales()     SaleEngine      ──┐                    │   │
//! │  │         ──► catalog()   Catalog          ──┼─► InventoryLedger  │   │
//! │  │         ──► alerts()    AlertGenerator     │   (guarded deltas) │   │
//! │  │         ──► expenses() / orders() / users()│                    │   │
//! │  │         ──► payments() / analytics()       │                    │   │
//! │  └────────────────────────────────────────────┼────────────────────┘   │
//! │                                               ▼                         │
//! │  duka-db (repositories, one sqlx Transaction per operation)            │
//! │                                                                         │
//! │  duka-sync replays offline operations through SaleEngine/Expenses.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use duka_core::{ActingUser, NewSale, SaleLine};
//! use duka_engine::Engine;
//!
//! let engine = Engine::open(EngineConfig::load_or_default(None)).await?;
//! let vendor = ActingUser::vendor(&user_id);
//!
//! let receipt = engine
//!     .sales()
//!     .create_sale(&vendor, NewSale::new(&shop_id, vec![SaleLine::new(&product_id, 3, 1_500)]))
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod alerts;
pub mod analytics;
pub mod catalog;
pub mod config;
pub mod error;
pub mod expenses;
pub mod ledger;
pub mod orders;
pub mod payments;
pub mod sales;
pub mod users;

// =============================================================================
// Re-exports
// =============================================================================

pub use alerts::AlertGenerator;
pub use analytics::Analytics;
pub use catalog::Catalog;
pub use config::{ConfigError, EngineConfig};
pub use error::{EngineError, EngineResult, ErrorCode, ErrorReport};
pub use expenses::{ExpenseCommit, Expenses};
pub use ledger::{InventoryLedger, LedgerEntry};
pub use orders::Orders;
pub use payments::Payments;
pub use sales::{SaleCommit, SaleEngine, SaleOrigin};
pub use users::Users;

use chrono::{DateTime, Utc};
use std::sync::Arc;

use duka_core::{ActingUser, Clock, RandomReference, ReferenceGenerator, Shop, SystemClock};
use duka_db::Database;

// =============================================================================
// Engine
// =============================================================================

/// Shared handle to the store and the engine's collaborators.
///
/// Cheap to clone. Operation groups are borrowed views:
/// `engine.sales()`, `engine.catalog()`, `engine.alerts()` ...
#[derive(Debug, Clone)]
pub struct Engine {
    db: Database,
    clock: Arc<dyn Clock>,
    references: Arc<dyn ReferenceGenerator>,
    config: Arc<EngineConfig>,
}

impl Engine {
    /// Engine over an existing database with the system clock, random
    /// business numbers and default configuration.
    pub fn new(db: Database) -> Self {
        Engine {
            db,
            clock: Arc::new(SystemClock),
            references: Arc::new(RandomReference),
            config: Arc::new(EngineConfig::default()),
        }
    }

    /// Connects to the database named by `config` and runs migrations.
    pub async fn open(config: EngineConfig) -> EngineResult<Self> {
        let db = Database::new(config.db_config()).await?;
        Ok(Engine::new(db).with_config(config))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_references(mut self, references: Arc<dyn ReferenceGenerator>) -> Self {
        self.references = references;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub(crate) fn next_reference(&self, prefix: &str, at: DateTime<Utc>) -> String {
        self.references.generate(prefix, at)
    }

    // =========================================================================
    // Operation Groups
    // =========================================================================

    pub fn sales(&self) -> SaleEngine<'_> {
        SaleEngine::new(self)
    }

    pub fn catalog(&self) -> Catalog<'_> {
        Catalog::new(self)
    }

    pub fn alerts(&self) -> AlertGenerator<'_> {
        AlertGenerator::new(self)
    }

    pub fn users(&self) -> Users<'_> {
        Users::new(self)
    }

    pub fn expenses(&self) -> Expenses<'_> {
        Expenses::new(self)
    }

    pub fn orders(&self) -> Orders<'_> {
        Orders::new(self)
    }

    pub fn payments(&self) -> Payments<'_> {
        Payments::new(self)
    }

    pub fn analytics(&self) -> Analytics<'_> {
        Analytics::new(self)
    }

    // =========================================================================
    // Visibility
    // =========================================================================

    /// Resolves a shop the actor may operate on.
    ///
    /// Missing, inactive and foreign shops are all `NotFound`, so a vendor
    /// cannot probe for other vendors' shop ids.
    pub async fn visible_shop(&self, actor: &ActingUser, shop_id: &str) -> EngineResult<Shop> {
        match self.db.shops().get_by_id(shop_id).await? {
            Some(shop) if shop.is_active && (actor.is_admin() || shop.owner_id == actor.user_id) => {
                Ok(shop)
            }
            _ => Err(EngineError::not_found("Shop", shop_id)),
        }
    }
}

/// Row filter for role-scoped listings: administrators see everything,
/// vendors only what they own.
pub(crate) fn owner_scope(actor: &ActingUser) -> Option<&str> {
    if actor.is_admin() {
        None
    } else {
        Some(actor.user_id.as_str())
    }
}
