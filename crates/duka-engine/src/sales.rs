//! # Sale Transaction Engine
//!
//! Turns a cart into a persisted sale while decrementing stock, all or
//! nothing.
//!
//! ## Sale Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       create_sale(actor, NewSale)                       │
//! │                                                                         │
//! │  1. price_sale()            validate lines, server-derived total        │
//! │  2. visible_shop()          active, owned by actor (admins: any)        │
//! │  3. StagedDeltas            one delta per product, sorted               │
//! │     ensure_known()          every product active in the shop, else      │
//! │                             NotFound before any stock is checked        │
//! │                                                                         │
//! │  ┌─ BEGIN ───────────────────────────────────────────────────────────┐  │
//! │  │ 4. InventoryLedger::apply_all   first writes → takes write lock   │  │
//! │  │ 5. INSERT sales                 UNIQUE(sale_number) may collide   │  │
//! │  │ 6. INSERT sale_items                                              │  │
//! │  └─ COMMIT ──────────────────────────────────────────────────────────┘  │
//! │         │ sale_number collision → rollback, fresh number, retry         │
//! │         ▼                                                               │
//! │  7. AlertGenerator::raise_for_products (best effort, after commit)      │
//! │                                                                         │
//! │  Result: SaleReceipt { sale_id, sale_number, total_cents }              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Offline replays enter at [`SaleEngine::commit_sale`] with a
//! [`SaleOrigin::Replay`], which carries the client timestamp and the
//! idempotency key stored as `client_ref`.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};
use crate::ledger::{low_stock_products, InventoryLedger};
use crate::{owner_scope, Engine};
use duka_core::ledger::StagedDeltas;
use duka_core::numbering::new_id;
use duka_core::pricing::{price_sale, PricedSale};
use duka_core::validation::{normalize_optional, validate_idempotency_key, validate_phone};
use duka_core::{ActingUser, NewSale, Sale, SaleItem, SaleReceipt, SaleStatus, Shop};
use duka_db::{DbError, SaleRepository};

/// Default page size of sale listings.
pub const DEFAULT_SALE_LIMIT: u32 = 100;

/// Where a sale request comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SaleOrigin {
    /// Point-of-sale call; timestamped by the engine clock.
    #[default]
    Online,
    /// Replay of a sale first recorded offline.
    Replay {
        created_at: DateTime<Utc>,
        client_ref: Option<String>,
    },
}

impl SaleOrigin {
    fn client_ref(&self) -> Option<&str> {
        match self {
            SaleOrigin::Online => None,
            SaleOrigin::Replay { client_ref, .. } => client_ref.as_deref(),
        }
    }
}

/// Result of [`SaleEngine::commit_sale`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaleCommit {
    /// A new sale was committed.
    Created(SaleReceipt),
    /// The idempotency key already produced this sale; nothing was written.
    Existing(SaleReceipt),
}

impl SaleCommit {
    pub fn receipt(&self) -> &SaleReceipt {
        match self {
            SaleCommit::Created(receipt) | SaleCommit::Existing(receipt) => receipt,
        }
    }

    pub fn into_receipt(self) -> SaleReceipt {
        match self {
            SaleCommit::Created(receipt) | SaleCommit::Existing(receipt) => receipt,
        }
    }

    pub fn is_existing(&self) -> bool {
        matches!(self, SaleCommit::Existing(_))
    }
}

fn receipt_for(sale: &Sale) -> SaleReceipt {
    SaleReceipt {
        sale_id: sale.id.clone(),
        sale_number: sale.sale_number.clone(),
        total_cents: sale.total_cents,
    }
}

/// Sale operations. Borrowed from [`Engine::sales`].
#[derive(Debug, Clone, Copy)]
pub struct SaleEngine<'a> {
    engine: &'a Engine,
}

impl<'a> SaleEngine<'a> {
    pub(crate) fn new(engine: &'a Engine) -> Self {
        SaleEngine { engine }
    }

    /// Records a point-of-sale transaction.
    ///
    /// ## Errors
    /// * `Validation` - empty/oversized cart, bad quantity or price
    /// * `NotFound` - shop or product missing, inactive or not the actor's
    /// * `InsufficientStock` - nothing persisted
    /// * `Conflict` - no unique sale number after the configured attempts
    pub async fn create_sale(&self, actor: &ActingUser, request: NewSale) -> EngineResult<SaleReceipt> {
        Ok(self
            .commit_sale(actor, request, SaleOrigin::Online)
            .await?
            .into_receipt())
    }

    /// The atomic sale path shared by online sales and offline replays.
    pub async fn commit_sale(
        &self,
        actor: &ActingUser,
        request: NewSale,
        origin: SaleOrigin,
    ) -> EngineResult<SaleCommit> {
        let priced = price_sale(&request.items)?;

        if let Some(client_total) = request.client_total_cents {
            if client_total != priced.total.cents() {
                warn!(
                    shop_id = %request.shop_id,
                    client_total,
                    computed_total = priced.total.cents(),
                    "Client total differs from line items, using computed total"
                );
            }
        }

        let customer_phone = request
            .customer_phone
            .as_deref()
            .and_then(|phone| normalize_optional(Some(phone)))
            .map(|phone| validate_phone(&phone))
            .transpose()?;
        let client_ref = origin
            .client_ref()
            .map(validate_idempotency_key)
            .transpose()?;

        let shop = self.engine.visible_shop(actor, &request.shop_id).await?;

        if let Some(key) = client_ref.as_deref() {
            if let Some(existing) = self.engine.db().sales().find_by_client_ref(&shop.id, key).await? {
                info!(sale_id = %existing.id, client_ref = key, "Sale already recorded for key");
                return Ok(SaleCommit::Existing(receipt_for(&existing)));
            }
        }

        let deltas = StagedDeltas::for_sale(&priced)?;
        InventoryLedger::ensure_known(&self.engine.db().products(), &shop.id, &deltas).await?;
        let created_at = match &origin {
            SaleOrigin::Online => self.engine.now(),
            SaleOrigin::Replay { created_at, .. } => *created_at,
        };

        let template = Sale {
            id: String::new(),
            shop_id: shop.id.clone(),
            sale_number: String::new(),
            customer_name: normalize_optional(request.customer_name.as_deref()),
            customer_phone,
            total_cents: priced.total.cents(),
            payment_method: request.payment_method,
            payment_reference: normalize_optional(request.payment_reference.as_deref()),
            status: SaleStatus::Completed,
            notes: normalize_optional(request.notes.as_deref()),
            client_ref,
            created_at,
        };

        let max_attempts = self.engine.config().numbering.max_attempts;
        for attempt in 1..=max_attempts {
            let mut sale = template.clone();
            sale.id = new_id();
            sale.sale_number = self
                .engine
                .next_reference(&self.engine.config().numbering.sale_prefix, created_at);

            match self.try_commit(&shop, &sale, &priced, &deltas).await {
                Ok(low_stock) => {
                    info!(
                        sale_id = %sale.id,
                        sale_number = %sale.sale_number,
                        shop_id = %shop.id,
                        total_cents = sale.total_cents,
                        items = priced.lines.len(),
                        "Sale committed"
                    );
                    self.alert_after_commit(&shop, &low_stock).await;
                    return Ok(SaleCommit::Created(receipt_for(&sale)));
                }
                Err(CommitError::NumberTaken) => {
                    warn!(
                        attempt,
                        sale_number = %sale.sale_number,
                        "Sale number collision, retrying with a fresh number"
                    );
                }
                Err(CommitError::KeyTaken) => {
                    let key = sale.client_ref.as_deref().unwrap_or_default();
                    return match self.engine.db().sales().find_by_client_ref(&shop.id, key).await? {
                        Some(existing) => {
                            info!(sale_id = %existing.id, client_ref = key, "Concurrent replay won the key");
                            Ok(SaleCommit::Existing(receipt_for(&existing)))
                        }
                        None => Err(EngineError::Conflict(format!("client_ref {key} is taken"))),
                    };
                }
                Err(CommitError::Engine(err)) => return Err(err),
            }
        }

        Err(EngineError::Conflict(format!(
            "no unique sale number after {max_attempts} attempts"
        )))
    }

    /// One transaction attempt. Returns the products left at low stock.
    async fn try_commit(
        &self,
        shop: &Shop,
        sale: &Sale,
        priced: &PricedSale,
        deltas: &StagedDeltas,
    ) -> Result<Vec<String>, CommitError> {
        let mut tx = self.engine.db().begin().await.map_err(EngineError::from)?;

        // Ledger first: the first write takes SQLite's write lock, so no
        // other transaction can have read the stock this one is checking.
        let entries = InventoryLedger::apply_all(&mut tx, &shop.id, deltas, self.engine.now()).await?;

        if let Err(err) = SaleRepository::insert_with(&mut tx, sale).await {
            return Err(CommitError::from_insert(err));
        }

        let items: Vec<SaleItem> = priced
            .lines
            .iter()
            .map(|line| SaleItem {
                id: new_id(),
                sale_id: sale.id.clone(),
                product_id: line.product_id.clone(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price.cents(),
                subtotal_cents: line.subtotal.cents(),
            })
            .collect();
        SaleRepository::insert_items_with(&mut tx, &items)
            .await
            .map_err(EngineError::from)?;

        tx.commit().await.map_err(EngineError::from)?;

        Ok(low_stock_products(&entries))
    }

    async fn alert_after_commit(&self, shop: &Shop, low_stock: &[String]) {
        if low_stock.is_empty() || !self.engine.config().alerts.after_sale {
            return;
        }

        match self
            .engine
            .alerts()
            .raise_for_products(&shop.owner_id, low_stock)
            .await
        {
            Ok(created) => debug!(shop_id = %shop.id, created, "Post-sale low-stock alerts"),
            Err(err) => warn!(shop_id = %shop.id, error = %err, "Post-sale alerting failed"),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// A sale with its line items, if visible to the actor.
    pub async fn get_sale(&self, actor: &ActingUser, sale_id: &str) -> EngineResult<(Sale, Vec<SaleItem>)> {
        let sale = self
            .engine
            .db()
            .sales()
            .get_by_id(sale_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Sale", sale_id))?;

        if !actor.is_admin() {
            let owned = self
                .engine
                .db()
                .shops()
                .get_by_id(&sale.shop_id)
                .await?
                .is_some_and(|shop| shop.owner_id == actor.user_id);
            if !owned {
                return Err(EngineError::not_found("Sale", sale_id));
            }
        }

        let items = self.engine.db().sales().items_for_sale(&sale.id).await?;
        Ok((sale, items))
    }

    /// Most recent sales visible to the actor.
    pub async fn list_sales(&self, actor: &ActingUser, limit: Option<u32>) -> EngineResult<Vec<Sale>> {
        let limit = limit.unwrap_or(DEFAULT_SALE_LIMIT);
        let sales = match owner_scope(actor) {
            Some(owner_id) => self.engine.db().sales().list_for_owner(owner_id, limit).await?,
            None => self.engine.db().sales().list_all(limit).await?,
        };
        Ok(sales)
    }
}

/// Why a single commit attempt failed.
enum CommitError {
    NumberTaken,
    KeyTaken,
    Engine(EngineError),
}

impl CommitError {
    fn from_insert(err: DbError) -> Self {
        if err.is_unique_violation_on("sales.sale_number") {
            CommitError::NumberTaken
        } else if err.is_unique_violation_on("sales.client_ref") {
            CommitError::KeyTaken
        } else {
            CommitError::Engine(err.into())
        }
    }
}

impl From<EngineError> for CommitError {
    fn from(err: EngineError) -> Self {
        CommitError::Engine(err)
    }
}
