//! # Catalog
//!
//! Shops and products: creation, edits, restocking and the explicit shop
//! cascade delete.
//!
//! ## Stock Paths
//! ```text
//! add_product(quantity)        initial stock, low-stock alert if at/below
//!                              reorder level
//! restock(+n)                  InventoryLedger delta in its own transaction
//! update_product(quantity)     administrative absolute edit; CHECK keeps
//!                              it non-negative
//! sales                        InventoryLedger deltas (sales.rs)
//! ```

use tracing::{info, warn};

use crate::error::{EngineError, EngineResult};
use crate::ledger::{InventoryLedger, LedgerEntry};
use crate::{owner_scope, Engine};
use duka_core::numbering::new_id;
use duka_core::validation::{
    normalize_optional, validate_amount_cents, validate_quantity, validate_stock_level, validate_text,
};
use duka_core::{
    ActingUser, NewProduct, NewShop, Product, ProductUpdate, Shop, DEFAULT_REORDER_LEVEL, DEFAULT_UNIT,
};
use duka_db::ShopDeletion;

/// Prefix of generated SKUs.
pub const SKU_PREFIX: &str = "PRD";

#[derive(Debug, Clone, Copy)]
pub struct Catalog<'a> {
    engine: &'a Engine,
}

impl<'a> Catalog<'a> {
    pub(crate) fn new(engine: &'a Engine) -> Self {
        Catalog { engine }
    }

    // =========================================================================
    // Shops
    // =========================================================================

    /// Opens a shop owned by the actor.
    pub async fn create_shop(&self, actor: &ActingUser, request: NewShop) -> EngineResult<Shop> {
        let shop = Shop {
            id: new_id(),
            owner_id: actor.user_id.clone(),
            name: validate_text("name", &request.name, 200)?,
            category: normalize_optional(request.category.as_deref()),
            location: normalize_optional(request.location.as_deref()),
            description: normalize_optional(request.description.as_deref()),
            is_active: true,
            created_at: self.engine.now(),
        };

        self.engine.db().shops().insert(&shop).await?;
        info!(shop_id = %shop.id, owner_id = %shop.owner_id, "Shop created");
        Ok(shop)
    }

    /// Administrators see every shop, vendors their own active shops.
    pub async fn list_shops(&self, actor: &ActingUser) -> EngineResult<Vec<Shop>> {
        let shops = match owner_scope(actor) {
            Some(owner_id) => self.engine.db().shops().list_by_owner(owner_id).await?,
            None => self.engine.db().shops().list_all().await?,
        };
        Ok(shops)
    }

    pub async fn get_shop(&self, actor: &ActingUser, shop_id: &str) -> EngineResult<Shop> {
        self.engine.visible_shop(actor, shop_id).await
    }

    /// Deletes a shop together with its products, sales, sale items and
    /// product alerts.
    pub async fn delete_shop(&self, actor: &ActingUser, shop_id: &str) -> EngineResult<ShopDeletion> {
        let shop = self.engine.visible_shop(actor, shop_id).await?;
        let deletion = self.engine.db().shops().delete_cascade(&shop.id).await?;
        info!(shop_id = %shop.id, ?deletion, "Shop deleted");
        Ok(deletion)
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Adds a product to one of the actor's shops.
    ///
    /// Absent fields take defaults: unit `pcs`, reorder level 10 and a
    /// generated `PRD-…` SKU.
    pub async fn add_product(&self, actor: &ActingUser, request: NewProduct) -> EngineResult<Product> {
        let shop = self.engine.visible_shop(actor, &request.shop_id).await?;

        validate_amount_cents("price_cents", request.price_cents)?;
        if let Some(cost) = request.cost_cents {
            validate_amount_cents("cost_cents", cost)?;
        }
        validate_stock_level("quantity", request.quantity)?;
        let reorder_level = request.reorder_level.unwrap_or(DEFAULT_REORDER_LEVEL);
        validate_stock_level("reorder_level", reorder_level)?;

        let now = self.engine.now();
        let unit = match normalize_optional(request.unit.as_deref()) {
            Some(unit) => validate_text("unit", &unit, 20)?,
            None => DEFAULT_UNIT.to_string(),
        };
        let sku = normalize_optional(request.sku.as_deref())
            .unwrap_or_else(|| self.engine.next_reference(SKU_PREFIX, now));

        let product = Product {
            id: new_id(),
            shop_id: shop.id.clone(),
            name: validate_text("name", &request.name, 200)?,
            description: normalize_optional(request.description.as_deref()),
            price_cents: request.price_cents,
            cost_cents: request.cost_cents,
            quantity: request.quantity,
            unit,
            sku: Some(sku),
            barcode: normalize_optional(request.barcode.as_deref()),
            category: normalize_optional(request.category.as_deref()),
            expiry_date: request.expiry_date,
            reorder_level,
            is_active: true,
            created_at: now,
            updated_at: now,
            version: 1,
        };

        self.engine.db().products().insert(&product).await?;
        info!(product_id = %product.id, shop_id = %shop.id, quantity = product.quantity, "Product added");

        if product.is_low_stock() {
            if let Err(err) = self.engine.alerts().raise(&shop.owner_id, &product).await {
                warn!(product_id = %product.id, error = %err, "Initial low-stock alert failed");
            }
        }

        Ok(product)
    }

    /// Direct administrative edit. Fields left `None` are unchanged.
    pub async fn update_product(
        &self,
        actor: &ActingUser,
        product_id: &str,
        update: ProductUpdate,
    ) -> EngineResult<Product> {
        let mut product = self.visible_product(actor, product_id).await?;

        if let Some(name) = update.name.as_deref() {
            product.name = validate_text("name", name, 200)?;
        }
        if let Some(description) = update.description.as_deref() {
            product.description = normalize_optional(Some(description));
        }
        if let Some(price) = update.price_cents {
            validate_amount_cents("price_cents", price)?;
            product.price_cents = price;
        }
        if let Some(cost) = update.cost_cents {
            validate_amount_cents("cost_cents", cost)?;
            product.cost_cents = Some(cost);
        }
        if let Some(quantity) = update.quantity {
            validate_stock_level("quantity", quantity)?;
            product.quantity = quantity;
        }
        if let Some(unit) = update.unit.as_deref() {
            product.unit = validate_text("unit", unit, 20)?;
        }
        if let Some(barcode) = update.barcode.as_deref() {
            product.barcode = normalize_optional(Some(barcode));
        }
        if let Some(category) = update.category.as_deref() {
            product.category = normalize_optional(Some(category));
        }
        if update.expiry_date.is_some() {
            product.expiry_date = update.expiry_date;
        }
        if let Some(reorder_level) = update.reorder_level {
            validate_stock_level("reorder_level", reorder_level)?;
            product.reorder_level = reorder_level;
        }
        product.updated_at = self.engine.now();

        self.engine.db().products().update(&product).await?;
        info!(product_id = %product.id, "Product updated");

        self.engine
            .db()
            .products()
            .get_by_id(&product.id)
            .await?
            .ok_or_else(|| EngineError::not_found("Product", &product.id))
    }

    /// Adds stock through the ledger.
    pub async fn restock(&self, actor: &ActingUser, product_id: &str, quantity: i64) -> EngineResult<LedgerEntry> {
        validate_quantity("quantity", quantity)?;
        let product = self.visible_product(actor, product_id).await?;

        let mut tx = self.engine.db().begin().await?;
        let entry = InventoryLedger::apply(&mut tx, &product.shop_id, &product.id, quantity, self.engine.now()).await?;
        tx.commit().await?;

        info!(product_id = %product.id, added = quantity, quantity = entry.new_quantity, "Product restocked");
        Ok(entry)
    }

    /// Soft-deletes a product. Past sale items keep referencing it.
    pub async fn deactivate_product(&self, actor: &ActingUser, product_id: &str) -> EngineResult<()> {
        let product = self.visible_product(actor, product_id).await?;
        self.engine
            .db()
            .products()
            .deactivate(&product.id, self.engine.now())
            .await?;
        info!(product_id = %product.id, "Product deactivated");
        Ok(())
    }

    /// Products of one shop, or of every shop visible to the actor.
    pub async fn list_products(&self, actor: &ActingUser, shop_id: Option<&str>) -> EngineResult<Vec<Product>> {
        let products = match (shop_id, owner_scope(actor)) {
            (Some(shop_id), _) => {
                let shop = self.engine.visible_shop(actor, shop_id).await?;
                self.engine.db().products().list_by_shop(&shop.id).await?
            }
            (None, Some(owner_id)) => self.engine.db().products().list_for_owner(owner_id).await?,
            (None, None) => self.engine.db().products().list_all().await?,
        };
        Ok(products)
    }

    pub async fn get_product(&self, actor: &ActingUser, product_id: &str) -> EngineResult<Product> {
        self.visible_product(actor, product_id).await
    }

    async fn visible_product(&self, actor: &ActingUser, product_id: &str) -> EngineResult<Product> {
        let product = self
            .engine
            .db()
            .products()
            .get_by_id(product_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| EngineError::not_found("Product", product_id))?;

        // Foreign products look missing
        match self.engine.visible_shop(actor, &product.shop_id).await {
            Ok(_) => Ok(product),
            Err(EngineError::NotFound { .. }) => Err(EngineError::not_found("Product", product_id)),
            Err(err) => Err(err),
        }
    }
}
