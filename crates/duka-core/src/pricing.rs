//! # Pricing
//!
//! Server-side computation of line subtotals and totals for sales and
//! supplier orders.
//!
//! ```text
//! SaleLine { qty: 3, unit: 1500 } ──► subtotal 4500 ─┐
//! SaleLine { qty: 1, unit:  250 } ──► subtotal  250 ─┴─► total 4750
//! ```
//!
//! A total sent by the client is never used: `Sale.total_cents` is always
//! the sum computed here.

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::requests::{OrderLine, SaleLine};
use crate::validation::{validate_amount_cents, validate_line_count, validate_quantity, validate_text};

/// A validated sale line with its subtotal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub subtotal: Money,
}

/// A validated sale cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedSale {
    pub lines: Vec<PricedLine>,
    pub total: Money,
}

/// A validated supplier order line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedOrderLine {
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub subtotal: Money,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedOrder {
    pub lines: Vec<PricedOrderLine>,
    pub total: Money,
}

/// Validates one line and returns its subtotal.
fn line_subtotal(index: usize, quantity: i64, unit_price_cents: i64) -> CoreResult<Money> {
    validate_quantity(&format!("items[{index}].quantity"), quantity)?;
    validate_amount_cents(&format!("items[{index}].unit_price_cents"), unit_price_cents)?;

    Money::from_cents(unit_price_cents)
        .checked_multiply_quantity(quantity)
        .ok_or_else(|| CoreError::AmountOverflow {
            field: format!("items[{index}].subtotal"),
        })
}

fn checked_total<'a>(mut subtotals: impl Iterator<Item = &'a Money>) -> CoreResult<Money> {
    subtotals.try_fold(Money::zero(), |acc, subtotal| {
        acc.checked_add(*subtotal).ok_or_else(|| CoreError::AmountOverflow {
            field: "total".to_string(),
        })
    })
}

/// Validates a sale cart and computes every subtotal and the total.
///
/// ## Errors
/// - `Validation` for an empty or oversized cart, a blank product id, a
///   quantity outside `1..=MAX_ITEM_QUANTITY` or a negative unit price
/// - `AmountOverflow` when cents do not fit in 64 bits
pub fn price_sale(lines: &[SaleLine]) -> CoreResult<PricedSale> {
    validate_line_count(lines.len())?;

    let lines = lines
        .iter()
        .enumerate()
        .map(|(index, line)| -> CoreResult<_> {
            let product_id = validate_text(&format!("items[{index}].product_id"), &line.product_id, 64)?;
            let subtotal = line_subtotal(index, line.quantity, line.unit_price_cents)?;
            Ok(PricedLine {
                product_id,
                quantity: line.quantity,
                unit_price: Money::from_cents(line.unit_price_cents),
                subtotal,
            })
        })
        .collect::<CoreResult<Vec<_>>>()?;

    let total = checked_total(lines.iter().map(|l| &l.subtotal))?;
    Ok(PricedSale { lines, total })
}

/// Validates a supplier order and computes every subtotal and the total.
pub fn price_order(lines: &[OrderLine]) -> CoreResult<PricedOrder> {
    validate_line_count(lines.len())?;

    let lines = lines
        .iter()
        .enumerate()
        .map(|(index, line)| -> CoreResult<_> {
            let product_name =
                validate_text(&format!("items[{index}].product_name"), &line.product_name, 200)?;
            let subtotal = line_subtotal(index, line.quantity, line.unit_price_cents)?;
            Ok(PricedOrderLine {
                product_name,
                quantity: line.quantity,
                unit_price: Money::from_cents(line.unit_price_cents),
                subtotal,
            })
        })
        .collect::<CoreResult<Vec<_>>>()?;

    let total = checked_total(lines.iter().map(|l| &l.subtotal))?;
    Ok(PricedOrder { lines, total })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::{MAX_ITEM_QUANTITY, MAX_SALE_ITEMS};

    #[test]
    fn test_total_is_sum_of_subtotals() {
        let priced = price_sale(&[SaleLine::new("p-1", 3, 1_500), SaleLine::new("p-2", 1, 250)]).unwrap();

        assert_eq!(priced.lines[0].subtotal, Money::from_cents(4_500));
        assert_eq!(priced.lines[1].subtotal, Money::from_cents(250));
        assert_eq!(priced.total, Money::from_cents(4_750));
    }

    #[test]
    fn test_free_item_is_allowed() {
        let priced = price_sale(&[SaleLine::new("p-1", 2, 0)]).unwrap();
        assert_eq!(priced.total, Money::zero());
    }

    #[test]
    fn test_rejects_bad_lines() {
        assert!(matches!(
            price_sale(&[]),
            Err(CoreError::Validation(ValidationError::Required { .. }))
        ));
        assert!(matches!(
            price_sale(&[SaleLine::new("p-1", 0, 100)]),
            Err(CoreError::Validation(ValidationError::MustBePositive { .. }))
        ));
        assert!(matches!(
            price_sale(&[SaleLine::new("p-1", 1, -100)]),
            Err(CoreError::Validation(ValidationError::MustNotBeNegative { .. }))
        ));
        assert!(matches!(
            price_sale(&[SaleLine::new(" ", 1, 100)]),
            Err(CoreError::Validation(ValidationError::Required { .. }))
        ));
        assert!(matches!(
            price_sale(&[SaleLine::new("p-1", MAX_ITEM_QUANTITY + 1, 100)]),
            Err(CoreError::Validation(ValidationError::OutOfRange { max: MAX_ITEM_QUANTITY, .. }))
        ));
    }

    #[test]
    fn test_rejects_oversized_cart() {
        let lines: Vec<_> = (0..=MAX_SALE_ITEMS)
            .map(|i| SaleLine::new(format!("p-{i}"), 1, 100))
            .collect();
        assert!(matches!(
            price_sale(&lines),
            Err(CoreError::Validation(ValidationError::OutOfRange { ref field, .. })) if field == "items"
        ));
    }

    #[test]
    fn test_overflow_is_an_error() {
        let result = price_sale(&[SaleLine::new("p-1", 2, i64::MAX / 2 + 1)]);
        assert!(matches!(result, Err(CoreError::AmountOverflow { .. })));
    }

    #[test]
    fn test_price_order() {
        let priced = price_order(&[OrderLine::new("Unga 2kg", 10, 3_200), OrderLine::new("Sabuni", 5, 900)]).unwrap();
        assert_eq!(priced.total, Money::from_cents(36_500));
        assert!(price_order(&[OrderLine::new("", 1, 100)]).is_err());
    }
}
