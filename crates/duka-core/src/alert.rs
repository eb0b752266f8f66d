//! # Alert Wording
//!
//! Titles and messages of generated alerts. Users default to Swahili, so
//! the stored text is Swahili; de-duplication never looks at it.

use crate::types::Product;

/// Title of every low-stock alert ("stock is running low").
pub const LOW_STOCK_TITLE: &str = "Bidhaa zimepungua";

/// Message of a low-stock alert, e.g. `Sukari 1kg iko chini ya kiwango (2 kg)`.
pub fn low_stock_message(product: &Product) -> String {
    format!(
        "{} iko chini ya kiwango ({} {})",
        product.name, product.quantity, product.unit
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_low_stock_message() {
        let product = Product {
            id: "p-1".to_string(),
            shop_id: "s-1".to_string(),
            name: "Sukari 1kg".to_string(),
            description: None,
            price_cents: 3_000,
            cost_cents: None,
            quantity: 2,
            unit: "kg".to_string(),
            sku: None,
            barcode: None,
            category: None,
            expiry_date: None,
            reorder_level: 10,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            version: 1,
        };

        assert_eq!(low_stock_message(&product), "Sukari 1kg iko chini ya kiwango (2 kg)");
    }
}
