//! Kernel error classification

use core_kernel::error::CoreError;
use core_kernel::money::MoneyError;
use core_kernel::{CurrencyTable, InvoiceId};
use rust_decimal_macros::dec;

#[test]
fn unsupported_currency_is_caller_error() {
    let table = CurrencyTable::standard();
    let err = table.require("xyz").unwrap_err();

    assert!(matches!(err, CoreError::UnsupportedCurrency(code) if code.as_str() == "XYZ"));
    assert!(err.is_validation());
    assert_eq!(err.to_string(), "Unsupported currency: XYZ");
}

#[test]
fn malformed_currency_is_caller_error() {
    let err = CurrencyTable::standard().require("US").unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
}

#[test]
fn tax_rate_out_of_range_mentions_bounds() {
    let error: CoreError = MoneyError::TaxRateOutOfRange(dec!(120)).into();
    let display = error.to_string();

    assert!(error.is_validation());
    assert!(display.contains("120"));
    assert!(display.contains("0-100"));
}

#[test]
fn bad_id_converts() {
    let err: CoreError = "IVC-nope".parse::<InvoiceId>().unwrap_err().into();
    assert!(err.is_validation());
    assert!(err.to_string().contains("IVC-nope"));
}

#[test]
fn configuration_is_not_caller_error() {
    let error = CoreError::Configuration("rate table has no base currency".to_string());
    assert!(!error.is_validation());
}
