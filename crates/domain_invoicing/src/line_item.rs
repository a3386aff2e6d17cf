//! Invoice line items
//!
//! A line item's amount is always `quantity × rate`, computed on demand.
//! No client-supplied amount is ever accepted.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use core_kernel::{sanitize_text, LineItemId};

use crate::error::ValidationError;

/// Maximum stored length of a line item description
pub const MAX_DESCRIPTION_LENGTH: usize = 500;

/// Largest accepted quantity on one row
pub const MAX_QUANTITY: Decimal = dec!(1000000000);

/// Largest accepted unit rate
pub const MAX_RATE: Decimal = dec!(1000000000000);

/// One row exactly as submitted by a form or API client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemInput {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub rate: String,
}

impl LineItemInput {
    pub fn new(
        description: impl Into<String>,
        quantity: impl Into<String>,
        rate: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            quantity: quantity.into(),
            rate: rate.into(),
        }
    }

    /// Rows without a description are leftovers from dynamic form UIs
    pub fn is_blank(&self) -> bool {
        sanitize_text(&self.description, MAX_DESCRIPTION_LENGTH).is_empty()
    }
}

/// A validated billable row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    id: LineItemId,
    description: String,
    quantity: Decimal,
    rate: Decimal,
}

impl LineItem {
    /// Creates a line item
    ///
    /// # Arguments
    ///
    /// * `description` - Sanitized and truncated to [`MAX_DESCRIPTION_LENGTH`]
    /// * `quantity` - Greater than zero, at most [`MAX_QUANTITY`]
    /// * `rate` - Unit price, zero up to [`MAX_RATE`]
    ///
    /// # Errors
    ///
    /// Returns a field-level `ValidationError`; the caller attaches the row.
    pub fn new(description: &str, quantity: Decimal, rate: Decimal) -> Result<Self, ValidationError> {
        Self::restore(LineItemId::new_v7(), description, quantity, rate)
    }

    /// Rebuilds a stored line item, re-checking its invariants
    pub fn restore(
        id: LineItemId,
        description: &str,
        quantity: Decimal,
        rate: Decimal,
    ) -> Result<Self, ValidationError> {
        let description = sanitize_text(description, MAX_DESCRIPTION_LENGTH);
        if description.is_empty() {
            return Err(ValidationError::field("description", "is required"));
        }
        if quantity <= Decimal::ZERO {
            return Err(ValidationError::field("quantity", "must be greater than zero"));
        }
        if quantity > MAX_QUANTITY {
            return Err(ValidationError::field(
                "quantity",
                format!("must not exceed {}", MAX_QUANTITY),
            ));
        }
        if rate < Decimal::ZERO {
            return Err(ValidationError::field("rate", "must not be negative"));
        }
        if rate > MAX_RATE {
            return Err(ValidationError::field("rate", format!("must not exceed {}", MAX_RATE)));
        }

        Ok(Self {
            id,
            description,
            quantity,
            rate,
        })
    }

    /// Parses one submitted row
    ///
    /// Returns `Ok(None)` for blank rows so callers can skip them. `row` is
    /// the 1-based position used in error messages.
    pub fn parse(input: &LineItemInput, row: usize) -> Result<Option<Self>, ValidationError> {
        if input.is_blank() {
            return Ok(None);
        }

        let quantity = parse_decimal(&input.quantity, row, "quantity")?;
        let rate = parse_decimal(&input.rate, row, "rate")?;

        Self::new(&input.description, quantity, rate)
            .map(Some)
            .map_err(|e| ValidationError {
                row: Some(row),
                ..e
            })
    }

    pub fn id(&self) -> LineItemId {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn rate(&self) -> Decimal {
        self.rate
    }

    /// `quantity × rate` at full precision
    ///
    /// Both factors are bounded on construction, so the product always fits.
    pub fn amount(&self) -> Decimal {
        self.quantity
            .checked_mul(self.rate)
            .unwrap_or(Decimal::MAX)
    }
}

/// Parses a sequence of submitted rows, skipping blanks
///
/// The whole batch fails on the first invalid row.
pub fn parse_line_items(inputs: &[LineItemInput]) -> Result<Vec<LineItem>, ValidationError> {
    let mut items = Vec::with_capacity(inputs.len());
    for (index, input) in inputs.iter().enumerate() {
        if let Some(item) = LineItem::parse(input, index + 1)? {
            items.push(item);
        }
    }
    Ok(items)
}

fn parse_decimal(raw: &str, row: usize, field: &str) -> Result<Decimal, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::row(row, field, "is required"));
    }
    Decimal::from_str(trimmed)
        .map_err(|_| ValidationError::row(row, field, format!("'{}' is not a number", trimmed)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_is_quantity_times_rate() {
        let item = LineItem::new("Design", dec!(2), dec!(50.00)).unwrap();
        assert_eq!(item.amount(), dec!(100.00));
    }

    #[test]
    fn test_zero_rate_allowed() {
        assert!(LineItem::new("Pro bono", dec!(1), Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_quantity_must_be_positive() {
        let err = LineItem::new("Design", Decimal::ZERO, dec!(10)).unwrap_err();
        assert_eq!(err.field.as_deref(), Some("quantity"));
    }

    #[test]
    fn test_negative_rate_rejected() {
        let err = LineItem::new("Refund", dec!(1), dec!(-5)).unwrap_err();
        assert_eq!(err.field.as_deref(), Some("rate"));
    }

    #[test]
    fn test_magnitude_limits() {
        assert!(LineItem::new("Bulk", MAX_QUANTITY, MAX_RATE).is_ok());
        assert_eq!(
            LineItem::new("Bulk", MAX_QUANTITY, MAX_RATE).unwrap().amount(),
            dec!(1000000000000000000000)
        );

        let err = LineItem::new("Bulk", MAX_QUANTITY + dec!(0.001), dec!(1)).unwrap_err();
        assert_eq!(err.field.as_deref(), Some("quantity"));
        let err = LineItem::new("Bulk", dec!(1), MAX_RATE + dec!(1)).unwrap_err();
        assert_eq!(err.field.as_deref(), Some("rate"));
    }

    #[test]
    fn test_extreme_quantity_rejected_with_row() {
        let rows = vec![
            LineItemInput::new("Design", "2", "50"),
            LineItemInput::new("Huge", "79228162514264337593543950335", "2"),
        ];
        let err = parse_line_items(&rows).unwrap_err();
        assert_eq!(err.row, Some(2));
        assert_eq!(err.field.as_deref(), Some("quantity"));
    }

    #[test]
    fn test_unrepresentable_number_is_not_a_number() {
        let rows = vec![LineItemInput::new("Huge", "1", "1e40")];
        let err = parse_line_items(&rows).unwrap_err();
        assert_eq!(err.row, Some(1));
        assert_eq!(err.field.as_deref(), Some("rate"));
    }

    #[test]
    fn test_blank_row_skipped_even_with_numbers() {
        let input = LineItemInput::new("   ", "3", "abc");
        assert_eq!(LineItem::parse(&input, 1).unwrap(), None);
    }

    #[test]
    fn test_parse_reports_row() {
        let rows = vec![
            LineItemInput::new("Design", "2", "50"),
            LineItemInput::new("", "", ""),
            LineItemInput::new("Hosting", "lots", "30"),
        ];
        let err = parse_line_items(&rows).unwrap_err();
        assert_eq!(err.row, Some(3));
        assert_eq!(err.field.as_deref(), Some("quantity"));
    }

    #[test]
    fn test_domain_error_gets_row_attached() {
        let rows = vec![LineItemInput::new("Design", "-1", "50")];
        let err = parse_line_items(&rows).unwrap_err();
        assert_eq!(err.row, Some(1));
        assert_eq!(err.field.as_deref(), Some("quantity"));
    }

    #[test]
    fn test_description_sanitized() {
        let item = LineItem::parse(&LineItemInput::new(" <i>Design</i> ", "1", "10"), 1)
            .unwrap()
            .unwrap();
        assert_eq!(item.description(), "iDesign/i");
    }
}
