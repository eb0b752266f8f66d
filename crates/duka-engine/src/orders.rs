//! # Suppliers & Orders
//!
//! Vendors place purchase requests with suppliers. Orders are records only:
//! delivering one does not restock anything, stock arrives through
//! [`crate::Catalog::restock`].
//!
//! ## Order Lifecycle
//! ```text
//!   pending ──► approved ──► shipped ──► delivered
//!      │            │           │
//!      └────────────┴───────────┴──────► cancelled
//! ```
//! Transitions are not enforced beyond the closed status set.

use tracing::{info, warn};

use crate::error::{EngineError, EngineResult};
use crate::{owner_scope, Engine};
use duka_core::numbering::new_id;
use duka_core::pricing::price_order;
use duka_core::validation::{normalize_optional, validate_phone, validate_text};
use duka_core::{
    ActingUser, NewOrder, NewSupplier, Order, OrderItem, OrderReceipt, OrderStatus, Supplier,
};
use duka_db::OrderRepository;

#[derive(Debug, Clone, Copy)]
pub struct Orders<'a> {
    engine: &'a Engine,
}

impl<'a> Orders<'a> {
    pub(crate) fn new(engine: &'a Engine) -> Self {
        Orders { engine }
    }

    // =========================================================================
    // Suppliers
    // =========================================================================

    pub async fn add_supplier(&self, actor: &ActingUser, request: NewSupplier) -> EngineResult<Supplier> {
        let phone = normalize_optional(request.phone.as_deref())
            .map(|phone| validate_phone(&phone))
            .transpose()?;

        let supplier = Supplier {
            id: new_id(),
            name: validate_text("name", &request.name, 200)?,
            contact_person: normalize_optional(request.contact_person.as_deref()),
            phone,
            email: normalize_optional(request.email.as_deref()),
            address: normalize_optional(request.address.as_deref()),
            category: normalize_optional(request.category.as_deref()),
            rating: 0.0,
            is_active: true,
            created_at: self.engine.now(),
        };

        self.engine.db().suppliers().insert(&supplier).await?;
        info!(supplier_id = %supplier.id, by = %actor.user_id, "Supplier added");
        Ok(supplier)
    }

    /// Active suppliers, visible to every role.
    pub async fn list_suppliers(&self) -> EngineResult<Vec<Supplier>> {
        Ok(self.engine.db().suppliers().list_active().await?)
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Places an order with an active supplier.
    ///
    /// The total is derived from the lines. A taken order number is retried
    /// with a fresh one up to the configured attempt count.
    pub async fn create_order(&self, actor: &ActingUser, request: NewOrder) -> EngineResult<OrderReceipt> {
        let priced = price_order(&request.items)?;

        let supplier = self
            .engine
            .db()
            .suppliers()
            .get_by_id(&request.supplier_id)
            .await?
            .filter(|supplier| supplier.is_active)
            .ok_or_else(|| EngineError::not_found("Supplier", &request.supplier_id))?;

        let created_at = self.engine.now();
        let numbering = &self.engine.config().numbering;

        for attempt in 1..=numbering.max_attempts {
            let order = Order {
                id: new_id(),
                order_number: self.engine.next_reference(&numbering.order_prefix, created_at),
                buyer_id: actor.user_id.clone(),
                supplier_id: supplier.id.clone(),
                status: OrderStatus::Pending,
                total_cents: priced.total.cents(),
                delivery_date: request.delivery_date,
                notes: normalize_optional(request.notes.as_deref()),
                created_at,
            };
            let items: Vec<OrderItem> = priced
                .lines
                .iter()
                .map(|line| OrderItem {
                    id: new_id(),
                    order_id: order.id.clone(),
                    product_name: line.product_name.clone(),
                    quantity: line.quantity,
                    unit_price_cents: line.unit_price.cents(),
                    subtotal_cents: line.subtotal.cents(),
                })
                .collect();

            let mut tx = self.engine.db().begin().await?;
            match OrderRepository::insert_with(&mut tx, &order, &items).await {
                Ok(()) => {
                    tx.commit().await?;
                    info!(
                        order_id = %order.id,
                        order_number = %order.order_number,
                        supplier_id = %supplier.id,
                        total_cents = order.total_cents,
                        "Order placed"
                    );
                    return Ok(OrderReceipt {
                        order_id: order.id,
                        order_number: order.order_number,
                        total_cents: order.total_cents,
                    });
                }
                Err(err) if err.is_unique_violation_on("orders.order_number") => {
                    warn!(attempt, order_number = %order.order_number, "Order number collision, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(EngineError::Conflict(format!(
            "no unique order number after {} attempts",
            numbering.max_attempts
        )))
    }

    /// Moves an order to another status. Unknown status strings are a
    /// `Validation` error; only the buyer or an administrator may update.
    pub async fn update_order_status(&self, actor: &ActingUser, order_id: &str, status: &str) -> EngineResult<Order> {
        let status: OrderStatus = status.parse()?;
        let order = self.get_order(actor, order_id).await?.0;

        self.engine.db().orders().update_status(&order.id, status).await?;
        info!(order_id = %order.id, from = order.status.as_str(), to = status.as_str(), "Order status changed");

        Ok(Order { status, ..order })
    }

    /// Administrators see every order, vendors the orders they placed.
    pub async fn list_orders(&self, actor: &ActingUser) -> EngineResult<Vec<Order>> {
        Ok(self.engine.db().orders().list(owner_scope(actor)).await?)
    }

    pub async fn get_order(&self, actor: &ActingUser, order_id: &str) -> EngineResult<(Order, Vec<OrderItem>)> {
        let order = self
            .engine
            .db()
            .orders()
            .get_by_id(order_id)
            .await?
            .filter(|order| actor.is_admin() || order.buyer_id == actor.user_id)
            .ok_or_else(|| EngineError::not_found("Order", order_id))?;

        let items = self.engine.db().orders().items_for_order(&order.id).await?;
        Ok((order, items))
    }
}
