//! Invoice total calculation
//!
//! Totals are derived, never stored independently: subtotal is the sum of
//! item amounts, tax is `subtotal × rate / 100` and total is their sum. All
//! three are kept at full precision; only display rounds.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::TaxRate;

use crate::error::ValidationError;
use crate::line_item::{parse_line_items, LineItem, LineItemInput};

/// The three derived amounts of an invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

/// Pure totals computation
pub struct InvoiceCalculator;

impl InvoiceCalculator {
    /// Computes totals for validated items
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` on `items` when the sum does not fit a
    /// `Decimal`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use core_kernel::TaxRate;
    /// use domain_invoicing::{InvoiceCalculator, LineItem};
    /// use rust_decimal_macros::dec;
    ///
    /// let items = vec![
    ///     LineItem::new("Design", dec!(2), dec!(50.00)).unwrap(),
    ///     LineItem::new("Hosting", dec!(1), dec!(30.00)).unwrap(),
    /// ];
    /// let tax = TaxRate::from_percentage(dec!(10)).unwrap();
    /// let totals = InvoiceCalculator::compute(&items, tax).unwrap();
    /// assert_eq!(totals.subtotal, dec!(130.00));
    /// assert_eq!(totals.tax_amount, dec!(13.00));
    /// assert_eq!(totals.total, dec!(143.00));
    /// ```
    pub fn compute(items: &[LineItem], tax_rate: TaxRate) -> Result<InvoiceTotals, ValidationError> {
        let subtotal = items
            .iter()
            .try_fold(Decimal::ZERO, |sum, item| sum.checked_add(item.amount()))
            .ok_or_else(too_large)?;
        let tax_amount = tax_rate.tax_on(subtotal);
        let total = subtotal.checked_add(tax_amount).ok_or_else(too_large)?;

        Ok(InvoiceTotals {
            subtotal,
            tax_amount,
            total,
        })
    }

    /// Parses raw rows and computes totals in one step
    ///
    /// Blank rows are skipped; any invalid row rejects the whole batch.
    pub fn compute_rows(
        rows: &[LineItemInput],
        tax_rate: TaxRate,
    ) -> Result<(Vec<LineItem>, InvoiceTotals), ValidationError> {
        let items = parse_line_items(rows)?;
        let totals = Self::compute(&items, tax_rate)?;
        Ok((items, totals))
    }
}

fn too_large() -> ValidationError {
    ValidationError::field("items", "invoice total is too large")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_item::{MAX_QUANTITY, MAX_RATE};
    use rust_decimal_macros::dec;

    fn rate(pct: Decimal) -> TaxRate {
        TaxRate::from_percentage(pct).unwrap()
    }

    #[test]
    fn test_empty_items() {
        let totals = InvoiceCalculator::compute(&[], rate(dec!(20))).unwrap();
        assert_eq!(totals, InvoiceTotals::default());
    }

    #[test]
    fn test_tax_kept_at_full_precision() {
        let items = vec![LineItem::new("Consulting", dec!(1), dec!(10.01)).unwrap()];
        let totals = InvoiceCalculator::compute(&items, rate(dec!(7.5))).unwrap();
        assert_eq!(totals.tax_amount, dec!(0.75075));
        assert_eq!(totals.total, dec!(10.76075));
    }

    #[test]
    fn test_largest_rows_still_total() {
        let item = LineItem::new("Bulk", MAX_QUANTITY, MAX_RATE).unwrap();
        let items = vec![item; 1000];
        let totals = InvoiceCalculator::compute(&items, rate(dec!(100))).unwrap();
        assert_eq!(totals.total, totals.subtotal * dec!(2));
    }

    #[test]
    fn test_compute_rows_skips_blank_rows() {
        let rows = vec![
            LineItemInput::new("Design", "2", "50.00"),
            LineItemInput::new("", "7", ""),
            LineItemInput::new("Hosting", "1", "30.00"),
        ];
        let (items, totals) = InvoiceCalculator::compute_rows(&rows, rate(dec!(10))).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(totals.subtotal, dec!(130.00));
        assert_eq!(totals.total, dec!(143.00));
    }

    #[test]
    fn test_compute_rows_rejects_batch() {
        let rows = vec![
            LineItemInput::new("Design", "2", "50.00"),
            LineItemInput::new("Hosting", "1", "-30.00"),
        ];
        let err = InvoiceCalculator::compute_rows(&rows, TaxRate::ZERO).unwrap_err();
        assert_eq!(err.row, Some(2));
    }
}
