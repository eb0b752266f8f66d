//! # Ledger Math
//!
//! Pure half of the inventory ledger: staging of signed stock deltas and
//! the non-negative rule. The transactional half lives in `duka-engine`.
//!
//! ## Staging
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cart                              Staged deltas (sorted by product)    │
//! │  ─────────────────────             ──────────────────────────────────   │
//! │  Sukari   qty 2         ──┐                                             │
//! │  Mchele   qty 1         ──┼──────► Mchele  -1                           │
//! │  Sukari   qty 3         ──┘        Sukari  -5   (lines of one product   │
//! │                                                  are checked together)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Aggregating first means two lines of the same product cannot each pass
//! the stock check on their own while failing together. Applying in sorted
//! order gives every transaction the same lock order.

use std::collections::BTreeMap;

use crate::error::{CoreError, CoreResult};
use crate::pricing::PricedSale;

/// Net stock change per product, ordered by product id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedDeltas {
    deltas: BTreeMap<String, i64>,
}

impl StagedDeltas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages the stock decrements of a priced sale.
    pub fn for_sale(sale: &PricedSale) -> CoreResult<Self> {
        let mut staged = StagedDeltas::new();
        for line in &sale.lines {
            staged.stage(&line.product_id, -line.quantity)?;
        }
        Ok(staged)
    }

    /// Adds `delta` to whatever is already staged for `product_id`.
    pub fn stage(&mut self, product_id: &str, delta: i64) -> CoreResult<()> {
        let entry = self.deltas.entry(product_id.to_string()).or_insert(0);
        *entry = entry.checked_add(delta).ok_or_else(|| CoreError::AmountOverflow {
            field: format!("stock delta for {product_id}"),
        })?;
        Ok(())
    }

    /// Staged deltas in product id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.deltas.iter().map(|(id, delta)| (id.as_str(), *delta))
    }

    pub fn product_ids(&self) -> impl Iterator<Item = &str> {
        self.deltas.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }
}

/// Applies a delta to a quantity. `None` when the result would be negative.
///
/// ```rust
/// use duka_core::ledger::apply_delta;
///
/// assert_eq!(apply_delta(5, -3), Some(2));
/// assert_eq!(apply_delta(2, -5), None);
/// assert_eq!(apply_delta(0, 10), Some(10));
/// ```
#[inline]
pub fn apply_delta(quantity: i64, delta: i64) -> Option<i64> {
    quantity.checked_add(delta).filter(|q| *q >= 0)
}

/// Low stock means at or below the reorder level.
#[inline]
pub fn is_low_stock(quantity: i64, reorder_level: i64) -> bool {
    quantity <= reorder_level
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::price_sale;
    use crate::requests::SaleLine;

    #[test]
    fn test_lines_of_same_product_aggregate() {
        let priced = price_sale(&[
            SaleLine::new("sukari", 2, 100),
            SaleLine::new("mchele", 1, 100),
            SaleLine::new("sukari", 3, 100),
        ])
        .unwrap();

        let staged = StagedDeltas::for_sale(&priced).unwrap();
        let deltas: Vec<_> = staged.iter().collect();
        assert_eq!(deltas, vec![("mchele", -1), ("sukari", -5)]);
        assert_eq!(staged.len(), 2);
    }

    #[test]
    fn test_apply_delta_boundaries() {
        assert_eq!(apply_delta(3, -3), Some(0));
        assert_eq!(apply_delta(3, -4), None);
        assert_eq!(apply_delta(i64::MAX, 1), None);
    }

    #[test]
    fn test_low_stock_is_inclusive() {
        assert!(is_low_stock(10, 10));
        assert!(is_low_stock(2, 10));
        assert!(!is_low_stock(11, 10));
    }
}
