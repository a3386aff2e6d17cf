//! Property tests for invoice totals

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{TaxRate, UserId};
use domain_invoicing::{InvoiceCalculator, LineItem, LineItemInput, MAX_QUANTITY, MAX_RATE};
use test_utils::{
    assert_totals_consistent, extreme_amount_strategy, fake_client, line_items_strategy,
    tax_rate_strategy, InvoiceBuilder,
};

/// Quantities up to the accepted maximum with up to 3 decimal places
fn quantity() -> impl Strategy<Value = Decimal> {
    prop_oneof![
        (1i64..=1_000_000).prop_map(|n| Decimal::new(n, 3)),
        (1i64..=1_000_000_000_000).prop_map(|n| Decimal::new(n, 3)),
    ]
}

/// Rates up to the accepted maximum in cents
fn rate() -> impl Strategy<Value = Decimal> {
    prop_oneof![
        (0i64..=10_000_000).prop_map(|n| Decimal::new(n, 2)),
        (0i64..=100_000_000_000_000).prop_map(|n| Decimal::new(n, 2)),
    ]
}

/// Tax percentages 0 to 100 with two decimals
fn tax_rate() -> impl Strategy<Value = TaxRate> {
    (0i64..=10_000).prop_map(|n| TaxRate::from_percentage(Decimal::new(n, 2)).unwrap())
}

fn items() -> impl Strategy<Value = Vec<LineItem>> {
    prop::collection::vec((quantity(), rate()), 1..20).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (q, r))| LineItem::new(&format!("Item {}", i), q, r).unwrap())
            .collect()
    })
}

proptest! {
    #[test]
    fn subtotal_is_sum_of_quantity_times_rate(items in items(), tax in tax_rate()) {
        let expected: Decimal = items.iter().map(|i| i.quantity() * i.rate()).sum();
        prop_assert_eq!(InvoiceCalculator::compute(&items, tax).unwrap().subtotal, expected);
    }

    #[test]
    fn subtotal_independent_of_order(items in items(), tax in tax_rate()) {
        let mut reversed = items.clone();
        reversed.reverse();
        prop_assert_eq!(
            InvoiceCalculator::compute(&items, tax).unwrap(),
            InvoiceCalculator::compute(&reversed, tax).unwrap()
        );
    }

    #[test]
    fn total_is_subtotal_plus_tax(items in items(), tax in tax_rate()) {
        let totals = InvoiceCalculator::compute(&items, tax).unwrap();
        let expected_tax = totals.subtotal * tax.as_percentage() / dec!(100);
        prop_assert!((totals.tax_amount - expected_tax).abs() <= dec!(0.0001));
        prop_assert!(totals.tax_amount <= totals.subtotal);
        prop_assert_eq!(totals.total, totals.subtotal + totals.tax_amount);
    }

    #[test]
    fn blank_rows_never_change_totals(
        rows in prop::collection::vec((quantity(), rate()), 1..10),
        blanks in prop::collection::vec(("[ ]{0,3}", "[0-9]{0,3}", "[a-z0-9.]{0,4}"), 0..5),
    ) {
        let filled: Vec<LineItemInput> = rows
            .iter()
            .enumerate()
            .map(|(i, (q, r))| LineItemInput::new(format!("Item {}", i), q.to_string(), r.to_string()))
            .collect();
        let mut mixed = filled.clone();
        for (description, quantity, rate) in blanks {
            mixed.push(LineItemInput::new(description, quantity, rate));
        }

        let (_, expected) = InvoiceCalculator::compute_rows(&filled, TaxRate::ZERO).unwrap();
        let (items, actual) = InvoiceCalculator::compute_rows(&mixed, TaxRate::ZERO).unwrap();
        prop_assert_eq!(items.len(), filled.len());
        prop_assert_eq!(actual, expected);
    }
}

proptest! {
    #[test]
    fn any_magnitude_is_accepted_or_rejected_by_row(
        quantity in extreme_amount_strategy(),
        rate in extreme_amount_strategy(),
        tax in tax_rate(),
    ) {
        let rows = vec![
            LineItemInput::new("Design", "2", "50.00"),
            LineItemInput::new("Bulk", quantity.to_string(), rate.to_string()),
        ];

        match InvoiceCalculator::compute_rows(&rows, tax) {
            Ok((items, totals)) => {
                prop_assert!(quantity > Decimal::ZERO && quantity <= MAX_QUANTITY);
                prop_assert!(rate <= MAX_RATE);
                prop_assert_eq!(items.len(), 2);
                prop_assert_eq!(totals.total, totals.subtotal + totals.tax_amount);
            }
            Err(err) => {
                prop_assert_eq!(err.row, Some(2));
                prop_assert!(quantity.is_zero() || quantity > MAX_QUANTITY || rate > MAX_RATE);
            }
        }
    }

    #[test]
    fn restored_invoices_keep_consistent_totals(
        items in line_items_strategy(8),
        tax in tax_rate_strategy(),
    ) {
        let mut builder = InvoiceBuilder::new(UserId::new_v7())
            .with_client(fake_client())
            .with_tax_rate(tax);
        for item in &items {
            builder = builder.with_item(item.description(), item.quantity(), item.rate());
        }
        let invoice = builder.build();

        prop_assert_eq!(invoice.items().len(), items.len());
        assert_totals_consistent(&invoice);
    }
}

#[test]
fn scenario_design_and_hosting() {
    let rows = vec![
        LineItemInput::new("Design", "2", "50.00"),
        LineItemInput::new("Hosting", "1", "30.00"),
    ];
    let (_, totals) =
        InvoiceCalculator::compute_rows(&rows, TaxRate::from_percentage(dec!(10)).unwrap()).unwrap();
    assert_eq!(totals.subtotal, dec!(130.00));
    assert_eq!(totals.tax_amount, dec!(13.00));
    assert_eq!(totals.total, dec!(143.00));
}

#[test]
fn largest_decimal_quantity_is_a_row_error() {
    let rows = vec![LineItemInput::new("Huge", "79228162514264337593543950335", "2")];
    let err = InvoiceCalculator::compute_rows(&rows, TaxRate::ZERO).unwrap_err();
    assert_eq!(err.row, Some(1));
    assert_eq!(err.field.as_deref(), Some("quantity"));
}
