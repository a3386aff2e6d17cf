//! Property-Based Test Generators
//!
//! Proptest strategies for invoice inputs that satisfy the validation rules,
//! plus `fake` helpers for realistic client details.

use fake::faker::address::en::{BuildingNumber, CityName, StreetName};
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::SafeEmail;
use fake::Fake;
use proptest::prelude::*;
use rust_decimal::Decimal;

use core_kernel::CurrencyCode;
use domain_invoicing::{ClientDetails, LineItem, LineItemInput};
use domain_membership::MembershipTier;

/// Codes present in the standard currency table
pub const STANDARD_CODES: [&str; 11] = [
    "USD", "EUR", "GBP", "JPY", "CAD", "AUD", "CHF", "CNY", "INR", "BRL", "KRW",
];

/// Strategy for supported currency codes
pub fn currency_code_strategy() -> impl Strategy<Value = CurrencyCode> {
    proptest::sample::select(STANDARD_CODES.to_vec())
        .prop_map(|code| code.parse().expect("standard code"))
}

/// Strategy for quantities: strictly positive, up to two decimal places
pub fn quantity_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..100_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for unit rates: zero allowed, up to two decimal places
pub fn rate_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for non-negative decimals of any magnitude, up to `Decimal::MAX`
pub fn extreme_amount_strategy() -> impl Strategy<Value = Decimal> {
    (any::<u32>(), any::<u32>(), any::<u32>(), 0u32..=28)
        .prop_map(|(lo, mid, hi, scale)| Decimal::from_parts(lo, mid, hi, false, scale))
}

/// Strategy for tax percentages in [0, 100] with two decimal places
pub fn tax_rate_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for validated line items
pub fn line_item_strategy() -> impl Strategy<Value = LineItem> {
    ("[A-Za-z][A-Za-z ]{0,30}", quantity_strategy(), rate_strategy()).prop_map(
        |(description, quantity, rate)| {
            LineItem::new(&description, quantity, rate).expect("generated item is valid")
        },
    )
}

/// Strategy for one to `max` validated line items
pub fn line_items_strategy(max: usize) -> impl Strategy<Value = Vec<LineItem>> {
    proptest::collection::vec(line_item_strategy(), 1..=max.max(1))
}

/// Strategy for raw rows as a form would submit them
pub fn line_item_input_strategy() -> impl Strategy<Value = LineItemInput> {
    ("[A-Za-z][A-Za-z ]{0,30}", quantity_strategy(), rate_strategy()).prop_map(
        |(description, quantity, rate)| {
            LineItemInput::new(description, quantity.to_string(), rate.to_string())
        },
    )
}

/// Strategy for rows with no description, which parsing skips
pub fn blank_row_strategy() -> impl Strategy<Value = LineItemInput> {
    ("[ \t]{0,4}", quantity_strategy(), rate_strategy()).prop_map(|(description, quantity, rate)| {
        LineItemInput::new(description, quantity.to_string(), rate.to_string())
    })
}

pub fn tier_strategy() -> impl Strategy<Value = MembershipTier> {
    prop_oneof![
        Just(MembershipTier::Free),
        Just(MembershipTier::Starter),
        Just(MembershipTier::Professional),
        Just(MembershipTier::Business),
    ]
}

/// Random but plausible client details
pub fn fake_client() -> ClientDetails {
    let number: String = BuildingNumber().fake();
    let street: String = StreetName().fake();
    let city: String = CityName().fake();

    ClientDetails {
        name: CompanyName().fake(),
        email: Some(SafeEmail().fake()),
        address: Some(format!("{} {}, {}", number, street, city)),
    }
}
