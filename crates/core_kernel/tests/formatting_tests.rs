//! Money formatting behaviour across the currency table
//!
//! Covers grouping, precision, truncation for zero-decimal currencies and
//! the default-currency fallback.

use std::sync::Arc;

use core_kernel::{CurrencyTable, Money, MoneyFormatter};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn formatter() -> MoneyFormatter {
    MoneyFormatter::new(Arc::new(CurrencyTable::standard()))
}

mod scenarios {
    use super::*;

    #[test]
    fn test_yen_drops_fraction_without_rounding() {
        assert_eq!(formatter().format(dec!(1500.75), "JPY"), "¥1,500");
    }

    #[test]
    fn test_thousand_in_two_decimal_currency() {
        assert_eq!(formatter().format(dec!(1000), "USD"), "$1,000.00");
    }

    #[test]
    fn test_thousand_in_zero_decimal_currency() {
        let formatted = formatter().format(dec!(1000), "KRW");
        assert_eq!(formatted, "₩1,000");
        assert!(!formatted.contains('.'));
    }

    #[test]
    fn test_lowercase_code_is_accepted() {
        assert_eq!(formatter().format(dec!(5), "eur"), "€5.00");
    }

    #[test]
    fn test_unknown_code_falls_back_to_usd() {
        assert_eq!(formatter().format(dec!(1234.5), "ZZZ"), "$1,234.50");
    }

    #[test]
    fn test_format_money_uses_own_currency() {
        let chf = Money::new(dec!(99.999), "CHF".parse().unwrap());
        assert_eq!(formatter().format_money(&chf), "CHF100.00");
    }

    #[test]
    fn test_multi_letter_symbols() {
        assert_eq!(formatter().format(dec!(12), "CAD"), "C$12.00");
        assert_eq!(formatter().format(dec!(12), "BRL"), "R$12.00");
    }
}

proptest! {
    #[test]
    fn two_decimal_output_has_exactly_two_fraction_digits(
        minor in -10_000_000_000i64..10_000_000_000i64,
        scale in 0u32..6u32,
    ) {
        let amount = Decimal::new(minor, scale);
        let formatted = formatter().format(amount, "EUR");
        let (_, fraction) = formatted.rsplit_once('.').unwrap();
        prop_assert_eq!(fraction.len(), 2);
    }

    #[test]
    fn zero_decimal_output_matches_truncated_integer(
        minor in 0i64..10_000_000_000i64,
        scale in 0u32..4u32,
    ) {
        let amount = Decimal::new(minor, scale);
        let formatted = formatter().format(amount, "JPY");
        prop_assert!(!formatted.contains('.'));

        let digits: String = formatted.chars().filter(|c| c.is_ascii_digit()).collect();
        prop_assert_eq!(digits, amount.trunc().to_string());
    }

    #[test]
    fn grouping_separators_every_three_digits(whole in 0i64..1_000_000_000_000i64) {
        let formatted = formatter().format(Decimal::new(whole, 0), "USD");
        let integer = formatted
            .trim_start_matches('$')
            .split('.')
            .next()
            .unwrap()
            .to_string();

        let groups: Vec<&str> = integer.split(',').collect();
        prop_assert!(groups[0].len() >= 1 && groups[0].len() <= 3);
        for group in &groups[1..] {
            prop_assert_eq!(group.len(), 3);
        }
    }
}
