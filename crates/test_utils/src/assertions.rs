//! Custom Test Assertions
//!
//! Assertions for invoice totals and for decimals carried in JSON bodies.

use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use domain_invoicing::{Invoice, InvoiceCalculator};

/// Asserts the stored totals match a recomputation from the items
pub fn assert_totals_consistent(invoice: &Invoice) {
    let expected = InvoiceCalculator::compute(invoice.items(), invoice.tax_rate())
        .expect("stored totals fit a decimal");
    let totals = invoice.totals();

    assert_eq!(totals, expected, "totals drifted from line items");
    assert_eq!(
        totals.total,
        totals.subtotal + totals.tax_amount,
        "total must equal subtotal + tax"
    );
}

/// Asserts invoices are ordered by creation time, newest first
pub fn assert_newest_first(invoices: &[Invoice]) {
    for pair in invoices.windows(2) {
        assert!(
            pair[0].created_at() >= pair[1].created_at(),
            "{} created before {}",
            pair[0].number(),
            pair[1].number()
        );
    }
}

/// Reads a decimal that may be serialized as a JSON string or number
pub fn json_decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s)
            .unwrap_or_else(|_| panic!("not a decimal string: {}", s)),
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .unwrap_or_else(|_| panic!("not a decimal number: {}", n)),
        other => panic!("expected a decimal, got {}", other),
    }
}

/// Asserts a JSON decimal equals `expected` numerically (scale ignored)
pub fn assert_json_decimal_eq(value: &Value, expected: Decimal) {
    let actual = json_decimal(value);
    assert_eq!(
        actual.normalize(),
        expected.normalize(),
        "expected {}, got {}",
        expected,
        actual
    );
}
